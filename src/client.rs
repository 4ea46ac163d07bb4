use std::fs;
use std::path::PathBuf;

use chrono::Local;
use clap::Parser;

use crate::config::Config;
use crate::error::BoxedErrorTrait;
use crate::prover::{self, VerifyError};

/// Every declaration was accepted
pub const EXIT_ACCEPTED: i32 = 0;
/// At least one proof was rejected
pub const EXIT_REJECTED: i32 = 1;
/// The source did not parse, or could not be read
pub const EXIT_FAILURE: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "chain-prover")]
#[command(about = "Checks the relation chain proofs of an .i2 source file")]
#[command(version)]
struct Cli {
    /// Source file to verify
    file: PathBuf,
    /// Configuration file (defaults to prover.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only report failures
    #[arg(short, long)]
    quiet: bool,
}

fn run(cli: &Cli) -> Result<i32, BoxedErrorTrait> {
    let config = Config::discover(cli.config.as_deref())?;
    let source = fs::read_to_string(&cli.file)?;
    info!("verifying {}, started at {}", cli.file.display(), Local::now());
    let (transcript, result) = prover::verify_with(&source, &config);
    if !cli.quiet {
        print!("{}", transcript);
    }
    let code = match result {
        Ok(()) => EXIT_ACCEPTED,
        Err(err @ VerifyError::Syntax(_)) => {
            eprintln!("{}", err);
            EXIT_FAILURE
        }
        Err(err @ VerifyError::Rejected(_)) => {
            eprintln!("{}", err);
            EXIT_REJECTED
        }
    };
    info!("finished {} at {} with exit code {}", cli.file.display(), Local::now(), code);
    Ok(code)
}

/// Parse the command line and verify the named file, returning the process exit code
pub fn start() -> i32 {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(why) => {
            error!("error verifying {}: {}", cli.file.display(), why);
            eprintln!("{}", why);
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::client::Cli;

    #[test]
    fn cli_arguments() {
        let cli = Cli::try_parse_from(["chain-prover", "peano.i2", "--config", "p.toml", "-q"]).expect("valid arguments");
        assert_eq!(cli.file.to_str(), Some("peano.i2"));
        assert_eq!(cli.config.as_ref().and_then(|p| p.to_str()), Some("p.toml"));
        assert!(cli.quiet);
        assert!(Cli::try_parse_from(["chain-prover"]).is_err());
    }
}
