use std::process::ExitCode;

use toolbox_lib::{run, CdpLauncher, ToolboxError};
use tracing::debug;

use crate::cli::Cli;
use crate::formatting::render_error;
use crate::logging;
use crate::settings::{
    format_effective_config, load_config, resolve_loglevel, resolve_run_options, FlagSources,
};

/// Run the capture command.
pub async fn run_capture(cli: Cli, flags: FlagSources) -> ExitCode {
    let config_path = cli.config.clone();
    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(&err),
    };
    logging::init(resolve_loglevel(&cli, &config, &flags));

    let options = resolve_run_options(cli, &config, &flags);
    debug!("{}", format_effective_config(&options, config_path.as_deref()));

    let plan = match options.validate() {
        Ok(plan) => plan,
        Err(err) => return render_error(&err),
    };

    let mut stdout = std::io::stdout().lock();
    match run(&plan, &CdpLauncher::default(), &mut stdout).await {
        Ok(report) => {
            debug!(?report, "Capture run finished");
            ExitCode::SUCCESS
        }
        Err(err) => fail(err),
    }
}

fn fail(err: ToolboxError) -> ExitCode {
    tracing::error!(error = %err, "Capture run failed");
    render_error(&err)
}
