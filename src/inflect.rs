//! English pluralization and singularization of identifiers.
//!
//! Only the last word of an identifier is inflected, so `post_tag`,
//! `PostTag` and `POST_TAG` all become plurals of their final word with the
//! word's own capitalization kept.

use once_cell::sync::Lazy;
use regex::Regex;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn new(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid inflection rule"),
            replacement,
        }
    }

    fn apply(&self, word: &str) -> Option<String> {
        if self.pattern.is_match(word) {
            Some(self.pattern.replace(word, self.replacement).into_owned())
        } else {
            None
        }
    }
}

/// Highest priority first.
static PLURALS: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"(quiz)$", "${1}zes"),
        Rule::new(r"^(oxen)$", "${1}"),
        Rule::new(r"^(ox)$", "${1}en"),
        Rule::new(r"^(m|l)ice$", "${1}ice"),
        Rule::new(r"^(m|l)ouse$", "${1}ice"),
        Rule::new(r"(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
        Rule::new(r"(x|ch|ss|sh)$", "${1}es"),
        Rule::new(r"([^aeiouy]|qu)y$", "${1}ies"),
        Rule::new(r"(hive)$", "${1}s"),
        Rule::new(r"(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
        Rule::new(r"sis$", "ses"),
        Rule::new(r"([ti])a$", "${1}a"),
        Rule::new(r"([ti])um$", "${1}a"),
        Rule::new(r"(buffal|tomat)o$", "${1}oes"),
        Rule::new(r"(bu)s$", "${1}ses"),
        Rule::new(r"(alias|status)$", "${1}es"),
        Rule::new(r"(octop|vir)i$", "${1}i"),
        Rule::new(r"(octop|vir)us$", "${1}i"),
        Rule::new(r"^(ax|test)is$", "${1}es"),
        Rule::new(r"s$", "s"),
        Rule::new(r"$", "s"),
    ]
});

/// Highest priority first.
static SINGULARS: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"(database)s$", "${1}"),
        Rule::new(r"(quiz)zes$", "${1}"),
        Rule::new(r"(matr)ices$", "${1}ix"),
        Rule::new(r"(vert|ind)ices$", "${1}ex"),
        Rule::new(r"^(ox)en", "${1}"),
        Rule::new(r"(alias|status)(es)?$", "${1}"),
        Rule::new(r"(octop|vir)(us|i)$", "${1}us"),
        Rule::new(r"^(a)x[ie]s$", "${1}xis"),
        Rule::new(r"(cris|test)(is|es)$", "${1}is"),
        Rule::new(r"(shoe)s$", "${1}"),
        Rule::new(r"(o)es$", "${1}"),
        Rule::new(r"(bus)(es)?$", "${1}"),
        Rule::new(r"^(m|l)ice$", "${1}ouse"),
        Rule::new(r"(x|ch|ss|sh)es$", "${1}"),
        Rule::new(r"(m)ovies$", "${1}ovie"),
        Rule::new(r"(s)eries$", "${1}eries"),
        Rule::new(r"([^aeiouy]|qu)ies$", "${1}y"),
        Rule::new(r"([lr])ves$", "${1}f"),
        Rule::new(r"(tive)s$", "${1}"),
        Rule::new(r"(hive)s$", "${1}"),
        Rule::new(r"([^f])ves$", "${1}fe"),
        Rule::new(r"(^analy)(sis|ses)$", "${1}sis"),
        Rule::new(
            r"((a)naly|(b)a|(d)iagno|(p)arenthe|(p)rogno|(s)ynop|(t)he)(sis|ses)$",
            "${1}sis",
        ),
        Rule::new(r"([ti])a$", "${1}um"),
        Rule::new(r"(n)ews$", "${1}ews"),
        Rule::new(r"(ss)$", "${1}"),
        Rule::new(r"s$", ""),
    ]
});

/// (singular, plural)
const IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("datum", "data"),
];

const UNCOUNTABLES: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
    "news",
];

/// Plural form of `word`. Never returns `word` itself for non-empty input:
/// when inflection leaves the word unchanged, a literal `s` is appended.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let plural = inflect_last_word(word, plural_of);
    if plural == word {
        format!("{}s", word)
    } else {
        plural
    }
}

/// Singular form of `word`; also undoes the `s` that [`pluralize`] appends to
/// uncountable and irregular plural words.
pub fn singularize(word: &str) -> String {
    inflect_last_word(word, singular_of)
}

fn plural_of(word: &str) -> String {
    if UNCOUNTABLES.contains(&word) {
        return word.to_string();
    }
    for (singular, plural) in IRREGULARS {
        if word == *singular || word == *plural {
            return plural.to_string();
        }
    }
    apply_rules(&PLURALS, word)
}

fn singular_of(word: &str) -> String {
    if UNCOUNTABLES.contains(&word) {
        return word.to_string();
    }
    for (singular, plural) in IRREGULARS {
        if word == *singular || word == *plural {
            return singular.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        let self_plural =
            UNCOUNTABLES.contains(&stem) || IRREGULARS.iter().any(|(_, plural)| *plural == stem);
        if self_plural {
            return singular_of(stem);
        }
    }
    apply_rules(&SINGULARS, word)
}

fn apply_rules(rules: &[Rule], word: &str) -> String {
    rules
        .iter()
        .find_map(|rule| rule.apply(word))
        .unwrap_or_else(|| word.to_string())
}

/// Byte offset where the last word of an identifier starts.
fn last_word_start(value: &str) -> usize {
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (i, c) in value.char_indices() {
        if matches!(c, '_' | '-' | ' ' | '.') {
            start = i + c.len_utf8();
        } else if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
        {
            start = i;
        }
        prev = Some(c);
    }
    start
}

fn inflect_last_word(value: &str, inflect: fn(&str) -> String) -> String {
    let start = last_word_start(value);
    let (head, word) = value.split_at(start);
    if word.is_empty() {
        return value.to_string();
    }

    let inflected = inflect(&word.to_lowercase());
    let all_upper = word.chars().count() > 1
        && word.chars().any(char::is_alphabetic)
        && word.chars().all(|c| !c.is_lowercase());

    let restored = if all_upper {
        inflected.to_uppercase()
    } else if word.chars().next().is_some_and(char::is_uppercase) {
        capitalize(&inflected)
    } else {
        inflected
    };
    format!("{}{}", head, restored)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
