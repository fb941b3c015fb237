use std::fmt;
use std::path::PathBuf;

use dotenvy::dotenv;
use storage::catalog::Catalog;
use storage::repository::Storage;

const DEFAULT_DB_URL: &str = "sqlite:brainwave.sqlite3";

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    from: Option<PathBuf>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    /// `.env` first, then the process environment, then flags.
    fn from_env() -> Result<Self, ArgsError> {
        dotenv().ok();
        Self::parse(|key| std::env::var(key).ok(), std::env::args().skip(1))
    }

    fn parse(
        lookup: impl Fn(&str) -> Option<String>,
        mut args: impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut db_url = set("BRAINWAVE_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.into());
        let mut from = set("BRAINWAVE_CATALOG").map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--from" => {
                    from = Some(PathBuf::from(require_value(&mut args, "--from")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, from })
    }
}

/// Seeding creates the database file when it is missing.
fn with_create_mode(db_url: &str) -> String {
    if db_url.starts_with("sqlite:") && !db_url.contains(":memory:") && !db_url.contains("mode=") {
        let sep = if db_url.contains('?') { '&' } else { '?' };
        format!("{db_url}{sep}mode=rwc")
    } else {
        db_url.to_string()
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>    SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --from <file.json>   Catalog of assessments and students to import");
    eprintln!("                       (default: built-in sample catalog)");
    eprintln!("  -h, --help           Show this help");
    eprintln!();
    eprintln!("Environment (same as flags, also read from .env):");
    eprintln!("  BRAINWAVE_DB_URL, BRAINWAVE_CATALOG");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_env().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog = match &args.from {
        Some(path) => Catalog::from_json(&std::fs::read_to_string(path)?)?,
        None => Catalog::sample(),
    };

    let storage = Storage::sqlite(&with_create_mode(&args.db_url)).await?;
    let summary = catalog.import(&storage).await?;

    println!(
        "Seeded {} assessments and {} students into {}",
        summary.assessments, summary.students, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(env: &[(&str, &str)], flags: &[&str]) -> Result<Args, ArgsError> {
        let env: Vec<(String, String)> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let lookup = move |key: &str| {
            env.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        Args::parse(lookup, flags.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn defaults_match_the_app_database() {
        let args = parse(&[], &[]).unwrap();
        assert_eq!(args.db_url, "sqlite:brainwave.sqlite3");
        assert!(args.from.is_none());
    }

    #[test]
    fn environment_is_used_and_flags_override_it() {
        let env = [
            ("BRAINWAVE_DB_URL", "sqlite:from-env.sqlite3"),
            ("BRAINWAVE_CATALOG", "catalog.json"),
        ];
        let args = parse(&env, &[]).unwrap();
        assert_eq!(args.db_url, "sqlite:from-env.sqlite3");
        assert_eq!(args.from, Some(PathBuf::from("catalog.json")));

        let args = parse(&env, &["--db", "sqlite:flag.sqlite3"]).unwrap();
        assert_eq!(args.db_url, "sqlite:flag.sqlite3");
    }

    #[test]
    fn blank_environment_values_fall_back_to_defaults() {
        let args = parse(&[("BRAINWAVE_DB_URL", "  ")], &[]).unwrap();
        assert_eq!(args.db_url, DEFAULT_DB_URL);
    }

    #[test]
    fn bad_flags_are_rejected() {
        assert!(matches!(
            parse(&[], &["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(
            parse(&[], &["--bogus"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn file_urls_gain_create_mode() {
        assert_eq!(
            with_create_mode("sqlite:brainwave.sqlite3"),
            "sqlite:brainwave.sqlite3?mode=rwc"
        );
        assert_eq!(
            with_create_mode("sqlite:///tmp/bw.sqlite3?cache=shared"),
            "sqlite:///tmp/bw.sqlite3?cache=shared&mode=rwc"
        );
        assert_eq!(
            with_create_mode("sqlite:bw.sqlite3?mode=ro"),
            "sqlite:bw.sqlite3?mode=ro"
        );
        assert_eq!(with_create_mode("sqlite::memory:"), "sqlite::memory:");
    }
}
