#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};

use rload::cli::args::CliArgs;
use rload::cli::{driver, reporter::Reporter};

const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing if RLOAD_LOG or RUST_LOG is set.
    rload::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;

    match driver::run(&args, &cwd).await {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(output.as_bytes())
                .context("failed to write output")?;
            stdout.flush().context("failed to write output")?;
            Ok(())
        }
        Err(err) => {
            let color = !args.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", Reporter::new(color).render(&err));
            std::process::exit(EXIT_FAILURE);
        }
    }
}
