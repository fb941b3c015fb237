use std::fmt;
use std::path::PathBuf;

use brainwave_core::model::{AssessmentId, AssessmentKind, AssessmentLocator, StudentId};
use services::{AppServices, Clock};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod render;
mod serve;
mod take;

use config::{Config, normalize_sqlite_url};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidKind { raw: String },
    InvalidLink { raw: String, reason: String },
    InvalidDbUrl { raw: String },
    MissingLocator,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidKind { raw } => {
                write!(f, "invalid --type value: {raw} (quiz, assignment, exam, mock)")
            }
            ArgsError::InvalidLink { raw, reason } => write!(f, "invalid --url {raw}: {reason}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingLocator => write!(f, "take needs --id and --type, or --url"),
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

fn parse_number<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  brainwave take    (--id <id> --type <kind> | --url <link>) [--review] [--db <sqlite_url>] [--student <id>]");
    eprintln!("  brainwave results [--limit <n>] [--json] [--db <sqlite_url>] [--student <id>]");
    eprintln!("  brainwave serve   [--root <dir>] [--port <port>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:brainwave.sqlite3");
    eprintln!("  --root public  --port 8080  --limit 10");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  BRAINWAVE_DB_URL, BRAINWAVE_STUDENT_ID, BRAINWAVE_STATIC_ROOT, BRAINWAVE_PORT, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    Results,
    Serve,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "results" => Some(Self::Results),
            "serve" => Some(Self::Serve),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    student_id: Option<StudentId>,
    static_root: PathBuf,
    port: u16,
    locator: Option<AssessmentLocator>,
    review: bool,
    limit: u32,
    json: bool,
}

impl Args {
    fn parse(
        cmd: Command,
        config: &Config,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: normalize_sqlite_url(&config.db_url),
            student_id: config.student_id,
            static_root: config.static_root.clone(),
            port: config.port,
            locator: None,
            review: false,
            limit: 10,
            json: false,
        };
        let mut id: Option<AssessmentId> = None;
        let mut kind: Option<AssessmentKind> = None;

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (Command::Take | Command::Results, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(&value);
                }
                (Command::Take | Command::Results, "--student") => {
                    parsed.student_id = Some(StudentId::new(parse_number(args, "--student")?));
                }
                (Command::Take, "--id") => {
                    id = Some(AssessmentId::new(parse_number(args, "--id")?));
                }
                (Command::Take, "--type") => {
                    let raw = require_value(args, "--type")?;
                    kind = Some(raw.parse().map_err(|_| ArgsError::InvalidKind { raw })?);
                }
                (Command::Take, "--url") => {
                    let raw = require_value(args, "--url")?;
                    let locator = AssessmentLocator::from_link(&raw).map_err(|e| {
                        ArgsError::InvalidLink {
                            raw: raw.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    parsed.locator = Some(locator);
                }
                (Command::Take, "--review") => parsed.review = true,
                (Command::Results, "--limit") => parsed.limit = parse_number(args, "--limit")?,
                (Command::Results, "--json") => parsed.json = true,
                (Command::Serve, "--root") => {
                    parsed.static_root = PathBuf::from(require_value(args, "--root")?);
                }
                (Command::Serve, "--port") => parsed.port = parse_number(args, "--port")?,
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if let (Some(id), Some(kind)) = (id, kind) {
            parsed.locator = Some(AssessmentLocator::new(id, kind));
        }
        if cmd == Command::Take && parsed.locator.is_none() {
            return Err(ArgsError::MissingLocator);
        }
        Ok(parsed)
    }
}

fn init_tracing(rust_log: &str) {
    // stdout belongs to the terminal UI; logs go to stderr.
    let layer = log_fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(EnvFilter::new(rust_log))
        .with(layer)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(&config.rust_log);

    let mut argv = std::env::args().skip(1);
    let cmd = match argv.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(cmd, &config, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if cmd == Command::Serve {
        return serve::run(&parsed.static_root, parsed.port).await;
    }

    // Open + migrate SQLite in the binary glue so services stay storage-agnostic.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), parsed.student_id).await?;

    match cmd {
        Command::Take => {
            let locator = parsed.locator.ok_or(ArgsError::MissingLocator)?;
            take::run(&services, locator, parsed.review).await
        }
        Command::Results => print_results(&services, &parsed).await,
        Command::Serve => Ok(()),
    }
}

async fn print_results(
    services: &AppServices,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let reports = services.reports();
    let history = match args.student_id {
        Some(student) => reports.recent_results(student, args.limit).await?,
        None => Vec::new(),
    };
    let overview = reports.overview().await?;

    if args.json {
        let doc = serde_json::json!({ "results": history, "assessments": overview });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    if args.student_id.is_some() {
        println!("Recent results");
        print!("{}", render::history(&history));
        println!();
    }
    println!("Assessments");
    print!("{}", render::overview(&overview));
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

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

    fn config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    fn parse(cmd: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        Args::parse(cmd, &config(), &mut iter)
    }

    #[test]
    fn take_accepts_id_and_type() {
        let args = parse(Command::Take, &["--id", "3", "--type", "Exam", "--review"]).unwrap();
        assert_eq!(
            args.locator,
            Some(AssessmentLocator::new(AssessmentId::new(3), AssessmentKind::Exam))
        );
        assert!(args.review);
    }

    #[test]
    fn take_accepts_a_link() {
        let args = parse(
            Command::Take,
            &["--url", "http://localhost/take-assessment.html?id=2&type=assignment"],
        )
        .unwrap();
        assert_eq!(
            args.locator,
            Some(AssessmentLocator::new(AssessmentId::new(2), AssessmentKind::Assignment))
        );
    }

    #[test]
    fn take_requires_a_locator() {
        assert!(matches!(
            parse(Command::Take, &["--id", "3"]),
            Err(ArgsError::MissingLocator)
        ));
        assert!(matches!(
            parse(Command::Take, &["--id", "3", "--type", "essay"]),
            Err(ArgsError::InvalidKind { .. })
        ));
    }

    #[test]
    fn flags_are_scoped_to_their_command() {
        assert!(matches!(
            parse(Command::Serve, &["--db", "sqlite::memory:"]),
            Err(ArgsError::UnknownArg(_))
        ));
        let args = parse(Command::Results, &["--limit", "3", "--json", "--student", "7"]).unwrap();
        assert_eq!(args.limit, 3);
        assert!(args.json);
        assert_eq!(args.student_id, Some(StudentId::new(7)));
    }

    #[test]
    fn serve_overrides_root_and_port() {
        let args = parse(Command::Serve, &["--root", "site", "--port", "9001"]).unwrap();
        assert_eq!(args.static_root, PathBuf::from("site"));
        assert_eq!(args.port, 9001);
        assert!(matches!(
            parse(Command::Serve, &["--port", "high"]),
            Err(ArgsError::InvalidNumber { flag: "--port", .. })
        ));
    }
}
