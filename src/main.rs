mod cli;
mod commands;
mod formatting;
mod logging;
mod settings;

use std::process::ExitCode;

use commands::run_capture;
use settings::FlagSources;

#[tokio::main]
async fn main() -> ExitCode {
    let (args, matches) = cli::parse();
    let flags = FlagSources::from_matches(&matches);
    run_capture(args, flags).await
}
