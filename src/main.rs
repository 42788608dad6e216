use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use rustauto::erd;
use rustauto::generate_from_sql;
use rustauto::options::AutoOptions;
use rustauto::sql::Dialect;

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Entity-relationship text
    Erd,
    /// Full generation result as JSON
    Json,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Schema dump (pg_dump --schema-only, mysqldump --no-data or plain DDL)
    input: PathBuf,
    /// SQL dialect: auto, generic, postgres, mysql
    #[arg(short, long, default_value = "auto", value_parser = parse_dialect)]
    dialect: Dialect,
    /// JSON options file (caseModel, caseProp, typeOverrides, ...)
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = Format::Erd)]
    format: Format,
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_dialect(s: &str) -> Result<Dialect, String> {
    Dialect::parse(s).ok_or_else(|| format!("unknown dialect {:?}", s))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let options = match &cli.config {
        Some(path) => {
            let json = match fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Failed to read {}: {}", path.display(), e);
                    process::exit(1);
                }
            };
            match AutoOptions::from_json(&json) {
                Ok(options) => options,
                Err(e) => {
                    eprintln!("Invalid config {}: {}", path.display(), e);
                    process::exit(1);
                }
            }
        }
        None => AutoOptions::default(),
    };

    let input = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let generated = match generate_from_sql(&input, cli.dialect, &options) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    tracing::info!(
        models = generated.models.len(),
        relations = generated.table_data.relations.len(),
        diagnostics = generated.diagnostics.len(),
        "Generated models"
    );

    let rendered = match cli.format {
        Format::Erd => erd::serialize(&generated),
        Format::Json => match serde_json::to_string_pretty(&generated) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Failed to serialize: {}", e);
                process::exit(1);
            }
        },
    };

    match cli.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &rendered) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", rendered),
    }
}
