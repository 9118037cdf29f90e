use std::fmt;
use std::path::PathBuf;

use quiz_core::model::BankId;
use storage::json::JsonDirSource;
use storage::repository::{BankSource, StorageError};

#[derive(Debug, Clone)]
struct Args {
    dir: PathBuf,
    banks: Vec<BankId>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidBank { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBank { raw } => write!(f, "invalid --bank value: {raw}"),
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
    fn parse() -> Result<Self, ArgsError> {
        let mut dir =
            std::env::var("QUIZ_BANK_DIR").map_or_else(|_| PathBuf::from("banks"), PathBuf::from);
        let mut banks = Vec::new();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--dir" => {
                    dir = PathBuf::from(require_value(&mut args, "--dir")?);
                }
                "--bank" => {
                    let value = require_value(&mut args, "--bank")?;
                    let id = value
                        .parse::<BankId>()
                        .map_err(|_| ArgsError::InvalidBank { raw: value.clone() })?;
                    banks.push(id);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if banks.is_empty() {
            banks = BankId::ALL.to_vec();
        }

        Ok(Self { dir, banks })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin check_banks -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --dir <path>              Directory holding bank documents (default: banks)");
    eprintln!("  --bank <id>               Bank to check; repeatable (default: every bank)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_BANK_DIR");
}

async fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let source = JsonDirSource::new(&args.dir);
    let mut all_ok = true;

    for id in args.banks {
        let outcome = match source.fetch_bank(id).await {
            Ok(record) => record.into_bank(id),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(bank) => println!(
                "{id:<10} ok       {} questions, pass at {}%",
                bank.len(),
                bank.pass_percent().value()
            ),
            Err(StorageError::NotFound(_)) => {
                println!("{id:<10} missing  {}", source.path_for(id).display());
            }
            Err(err) => {
                all_ok = false;
                println!("{id:<10} invalid  {err}");
            }
        }
    }

    Ok(all_ok)
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}
