use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use obfuscate::{logging_dispatch, ObfuscateConfig, Obfuscator};
use obfuscate_codegen::rustfmt::DEFAULT_FORMATTER;
use tracing::{error, Dispatch};

#[derive(Parser)]
#[command(name = "obfuscate")]
#[command(
    about = "Generate redacting Display and Debug impls for a type of the crate in the current directory",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Formatter run in place on the generated file
    #[arg(long, env = "OBFUSCATE_FORMATTER", default_value = DEFAULT_FORMATTER)]
    formatter: String,

    /// Type to obfuscate, e.g. `Token` or `auth::Token`
    type_name: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let dispatch = logging_dispatch(cli.verbose, cli.debug);

    match run(cli, dispatch.clone()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::dispatcher::with_default(&dispatch, || error!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, dispatch: Dispatch) -> Result<()> {
    let working_dir =
        std::env::current_dir().context("could not determine the working directory")?;

    let config = ObfuscateConfig::new(cli.type_name, working_dir).with_formatter(cli.formatter);
    Obfuscator::new(config, dispatch).run_blocking()?;
    Ok(())
}
