//! xuproc CLI - JUnit XML post-processor.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::error::ErrorKind;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use xuproc::{FailureKind, ProcessError};

#[derive(Parser)]
#[command(name = "xuproc")]
#[command(
    about = "JUnit XML file processing. Prepend classname to method name for each test case.",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Update each test case in the file
    #[arg(short = 'j')]
    update: bool,

    /// Verbose output (on stderr)
    #[arg(short, long)]
    verbose: bool,

    /// File to process
    file: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => FailureKind::MissingArgument.exit_code(),
            };
            if e.use_stderr() {
                eprint!("{}", e.render());
            } else {
                print!("{}", e.render());
            }
            std::process::exit(code);
        }
    };

    let result = init_logging(cli.verbose)
        .map_err(ProcessError::from)
        .and_then(|()| run(&cli));

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the document, so logs must stay on stderr
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")?;

    Ok(())
}

fn run(cli: &Cli) -> Result<(), ProcessError> {
    if cli.file.is_some() && !cli.update {
        return Err(ProcessError::MissingArgument("Missing -j option".into()));
    }

    let xml = xuproc::process(cli.file.as_deref())?;
    debug!("Writing {} bytes to stdout", xml.len());

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{xml}")
        .and_then(|()| stdout.flush())
        .context("Failed to write to stdout")?;

    Ok(())
}
