mod terminal;

use std::fmt;
use std::path::PathBuf;

use quiz_core::model::BankId;
use quiz_core::session::SessionMode;
use services::{Clock, QuizLoopService};
use storage::json::HttpBankSource;
use storage::repository::Storage;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use terminal::Driver;

/// Bank run when neither `--bank` nor `QUIZ_BANK` names one. It ships in
/// `banks/`, so a plain `quiz run` works from a checkout.
const DEFAULT_BANK: BankId = BankId::Questions;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidBank { raw: String },
    InvalidMode { raw: String },
    InvalidDir { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBank { raw } => write!(f, "invalid --bank value: {raw}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value (expected exam or study): {raw}")
            }
            ArgsError::InvalidDir { raw } => write!(f, "invalid --dir value: {raw}"),
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

#[derive(Debug, Clone)]
struct Args {
    bank: BankId,
    mode: SessionMode,
    dir: PathBuf,
    url: Option<String>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz list");
    eprintln!("  quiz run [--bank <id>] [--mode exam|study] [--dir <path>] [--url <base>]");
    eprintln!();
    eprintln!("Defaults for run:");
    eprintln!("  --bank {}", DEFAULT_BANK.as_str());
    eprintln!("  --mode exam");
    eprintln!("  --dir  ./banks");
    eprintln!("  With --url, banks are fetched over HTTP and --dir is the fallback.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BANK, QUIZ_MODE, QUIZ_BANK_DIR, QUIZ_BANK_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Run,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "run" => Some(Self::Run),
            _ => None,
        }
    }
}

impl Args {
    /// `list` takes no arguments; sources still come from the environment.
    fn parse_list(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        if let Some(arg) = args.next() {
            if matches!(arg.as_str(), "--help" | "-h") {
                print_usage();
                std::process::exit(0);
            }
            return Err(ArgsError::UnknownArg(arg));
        }
        Self::parse_run(&mut std::iter::empty::<String>())
    }

    fn parse_run(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut bank = std::env::var("QUIZ_BANK")
            .ok()
            .and_then(|value| value.parse::<BankId>().ok())
            .unwrap_or(DEFAULT_BANK);
        let mut mode = std::env::var("QUIZ_MODE")
            .ok()
            .and_then(|value| value.parse::<SessionMode>().ok())
            .unwrap_or(SessionMode::Exam);
        let mut dir = std::env::var("QUIZ_BANK_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from("banks"), PathBuf::from);
        let mut url = std::env::var("QUIZ_BANK_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => {
                    let value = require_value(args, "--bank")?;
                    bank = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidBank { raw: value.clone() })?;
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    mode = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                }
                "--dir" => {
                    let value = require_value(args, "--dir")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDir { raw: value });
                    }
                    dir = PathBuf::from(value);
                }
                "--url" => {
                    url = Some(require_value(args, "--url")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bank,
            mode,
            dir,
            url,
        })
    }

    fn storage(&self) -> Result<Storage, Box<dyn std::error::Error>> {
        Ok(match &self.url {
            Some(url) => Storage::http_with_fallback(HttpBankSource::new(url)?, &self.dir),
            None => Storage::json_dir(&self.dir),
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Quiz output owns stdout; logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn list_banks(service: &QuizLoopService) {
    for id in service.list_banks() {
        println!("{id:<10} {}", id.document_name());
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Flags without a subcommand run a quiz.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = match cmd {
        Command::List => Args::parse_list(&mut iter),
        Command::Run => Args::parse_run(&mut iter),
    }
    .map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Sources are chosen here so the library crates never read the environment.
    let storage = parsed.storage()?;
    let service = QuizLoopService::from_storage(Clock::system(), &storage);

    match cmd {
        Command::List => {
            list_banks(&service);
            Ok(())
        }
        Command::Run => {
            tracing::debug!(
                bank = %parsed.bank,
                mode = %parsed.mode,
                dir = %parsed.dir.display(),
                url = parsed.url.as_deref().unwrap_or("-"),
                "starting quiz"
            );
            let stdin = BufReader::new(tokio::io::stdin());
            Driver::new(&service, stdin, std::io::stdout())
                .run(parsed.bank, parsed.mode)
                .await
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
