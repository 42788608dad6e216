//! Tokenizer for schema dumps.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Unterminated string starting on line {0}")]
    UnterminatedString(usize),
    #[error("Unterminated quoted identifier starting on line {0}")]
    UnterminatedIdentifier(usize),
    #[error("Unterminated block comment starting on line {0}")]
    UnterminatedComment(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords the parser branches on
    Create,
    Alter,
    Add,
    Table,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Delete,
    Update,
    Cascade,
    Restrict,
    Constraint,
    Index,
    If,
    Exists,
    /// MySQL `AUTO_INCREMENT`, SQLite `AUTOINCREMENT`
    AutoIncrement,
    Check,

    Ident(String),
    Str(String),
    Num(String),

    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    /// `::`
    Cast,
    /// `[]`
    ArraySuffix,

    Eof,
}

/// A token and the line it starts on.
pub type Spanned = (Token, usize);

fn keyword(word: &str) -> Option<Token> {
    let token = match word.to_ascii_uppercase().as_str() {
        "CREATE" => Token::Create,
        "ALTER" => Token::Alter,
        "ADD" => Token::Add,
        "TABLE" => Token::Table,
        "ONLY" => Token::Only,
        "PRIMARY" => Token::Primary,
        "KEY" => Token::Key,
        "FOREIGN" => Token::Foreign,
        "REFERENCES" => Token::References,
        "NOT" => Token::Not,
        "NULL" => Token::Null,
        "UNIQUE" => Token::Unique,
        "DEFAULT" => Token::Default,
        "ON" => Token::On,
        "DELETE" => Token::Delete,
        "UPDATE" => Token::Update,
        "CASCADE" => Token::Cascade,
        "RESTRICT" => Token::Restrict,
        "CONSTRAINT" => Token::Constraint,
        "INDEX" => Token::Index,
        "IF" => Token::If,
        "EXISTS" => Token::Exists,
        "AUTO_INCREMENT" | "AUTOINCREMENT" => Token::AutoIncrement,
        "CHECK" => Token::Check,
        _ => return None,
    };
    Some(token)
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current: Option<char>,
    line: usize,
    /// Open MySQL `/*!NNNNN ... */` comments; their content is lexed
    versioned_comments: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current = chars.next();
        Self {
            chars,
            current,
            line: 1,
            versioned_comments: 0,
        }
    }

    fn advance(&mut self) {
        if self.current == Some('\n') {
            self.line += 1;
        }
        self.current = self.chars.next();
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    /// After `/*`.
    fn skip_block_comment(&mut self, start: usize) -> Result<(), LexError> {
        if self.current == Some('!') {
            self.advance();
            while self.current.is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            self.versioned_comments += 1;
            return Ok(());
        }
        loop {
            let next = self.peek();
            match self.current {
                Some('*') if next == Some('/') => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                Some(_) => self.advance(),
                None => return Err(LexError::UnterminatedComment(start)),
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.current.filter(|c| c.is_alphanumeric() || *c == '_' || *c == '$') {
            word.push(c);
            self.advance();
        }
        word
    }

    /// Body of a quoted string or identifier; a doubled `close` is a literal one.
    fn read_quoted(&mut self, close: char, backslash: bool) -> Option<String> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.current? {
                c if c == close => {
                    self.advance();
                    if self.current != Some(close) {
                        return Some(text);
                    }
                    text.push(close);
                    self.advance();
                }
                '\\' if backslash => {
                    self.advance();
                    let escaped = self.current?;
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                    self.advance();
                }
                c => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    /// `$tag$ ... $tag$`. `Ok(None)` when the `$` opens no tag.
    fn read_dollar_quoted(&mut self, start: usize) -> Result<Option<String>, LexError> {
        self.advance(); // $
        let mut tag = String::from("$");
        loop {
            match self.current {
                Some('$') => {
                    tag.push('$');
                    self.advance();
                    break;
                }
                Some(c) if c.is_alphanumeric() || c == '_' => {
                    tag.push(c);
                    self.advance();
                }
                _ => return Ok(None),
            }
        }

        let mut body = String::new();
        while let Some(c) = self.current {
            body.push(c);
            self.advance();
            if let Some(text) = body.strip_suffix(tag.as_str()) {
                return Ok(Some(text.to_string()));
            }
        }
        Err(LexError::UnterminatedString(start))
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        if self.current == Some('-') {
            num.push('-');
            self.advance();
        }
        let mut seen_dot = false;
        while let Some(c) = self.current {
            match c {
                '0'..='9' => num.push(c),
                '.' if !seen_dot => {
                    seen_dot = true;
                    num.push(c);
                }
                _ => break,
            }
            self.advance();
        }
        num
    }

    /// Next token with its starting line.
    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        loop {
            while self.current.is_some_and(char::is_whitespace) {
                self.advance();
            }
            let line = self.line;
            let Some(c) = self.current else {
                return Ok((Token::Eof, line));
            };

            let token = match c {
                '-' if self.peek() == Some('-') => {
                    self.skip_line_comment();
                    continue;
                }
                '#' => {
                    self.skip_line_comment();
                    continue;
                }
                '/' if self.peek() == Some('*') => {
                    self.advance();
                    self.advance();
                    self.skip_block_comment(line)?;
                    continue;
                }
                '*' if self.versioned_comments > 0 && self.peek() == Some('/') => {
                    self.advance();
                    self.advance();
                    self.versioned_comments -= 1;
                    continue;
                }
                '-' if self.peek().is_some_and(|n| n.is_ascii_digit()) => Token::Num(self.read_number()),
                '0'..='9' => Token::Num(self.read_number()),
                ':' if self.peek() == Some(':') => {
                    self.advance();
                    self.advance();
                    Token::Cast
                }
                '[' if self.peek() == Some(']') => {
                    self.advance();
                    self.advance();
                    Token::ArraySuffix
                }
                '$' => match self.read_dollar_quoted(line)? {
                    Some(body) => Token::Str(body),
                    None => continue,
                },
                '\'' => Token::Str(
                    self.read_quoted('\'', true)
                        .ok_or(LexError::UnterminatedString(line))?,
                ),
                '"' | '`' | '[' => {
                    let close = if c == '[' { ']' } else { c };
                    Token::Ident(
                        self.read_quoted(close, false)
                            .ok_or(LexError::UnterminatedIdentifier(line))?,
                    )
                }
                c if c.is_alphabetic() || c == '_' => {
                    let word = self.read_word();
                    keyword(&word).unwrap_or(Token::Ident(word))
                }
                _ => {
                    let symbol = match c {
                        '(' => Some(Token::LParen),
                        ')' => Some(Token::RParen),
                        ',' => Some(Token::Comma),
                        ';' => Some(Token::Semicolon),
                        '.' => Some(Token::Dot),
                        // Operators and stray punctuation carry nothing for the schema
                        _ => None,
                    };
                    self.advance();
                    match symbol {
                        Some(token) => token,
                        None => continue,
                    }
                }
            };
            return Ok((token, line));
        }
    }

    /// Every token up to and including `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.0 == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}
