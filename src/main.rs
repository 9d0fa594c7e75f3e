use std::process::ExitCode;

use clap::Parser;
use rentenrechner::cli::{Cli, LogFormat, run};
use rentenrechner::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format == LogFormat::Json);
    run(cli).await
}
