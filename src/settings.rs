use std::path::Path;
use std::time::Duration;

use clap::parser::ValueSource;
use clap::ArgMatches;
use toolbox_lib::{ActionSet, Config, RunOptions, ToolboxError};

use crate::cli::Cli;

/// Tracks which CLI flags were explicitly provided vs. defaulted.
#[derive(Debug, Default)]
pub struct FlagSources {
    pub timeout: bool,
    pub delay: bool,
    pub loglevel: bool,
    pub output_dir: bool,
}

impl FlagSources {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            timeout: given_on_command_line(matches, "timeout"),
            delay: given_on_command_line(matches, "delay"),
            loglevel: given_on_command_line(matches, "loglevel"),
            output_dir: given_on_command_line(matches, "output_dir"),
        }
    }
}

/// True when clap took the argument's value from the command line, in any
/// spelling (`--flag v`, `--flag=v`, `-f v`, `-fv`, grouped `-bf v`).
fn given_on_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.value_source(id), Some(ValueSource::CommandLine))
}

/// Merge CLI arguments with the config file, preferring CLI when flags are
/// present.
pub fn resolve_run_options(cli: Cli, config: &Config, flags: &FlagSources) -> RunOptions {
    RunOptions {
        target: cli.target,
        timeout: if flags.timeout {
            Duration::from_secs(cli.timeout)
        } else {
            config.timeout
        },
        delay_secs: if flags.delay {
            cli.delay
        } else {
            i64::try_from(config.delay.as_secs()).unwrap_or(i64::MAX)
        },
        remote_endpoint: cli
            .remote_debugging_port
            .or_else(|| config.remote_debugging_port.clone()),
        js: cli.js,
        js_file: cli.js_file,
        actions: ActionSet {
            console_log: cli.console_log,
            screenshot: cli.screenshot,
            pdf: cli.print_to_pdf,
            body: cli.body,
            selector: cli.selector.filter(|selector| !selector.is_empty()),
        },
        output_dir: if flags.output_dir {
            cli.output_dir
        } else {
            config.output_dir.clone()
        },
    }
}

pub fn resolve_loglevel<'a>(cli: &'a Cli, config: &'a Config, flags: &FlagSources) -> &'a str {
    if flags.loglevel {
        &cli.loglevel
    } else {
        &config.loglevel
    }
}

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/that-cli-web-toolbox/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, ToolboxError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(Path::to_path_buf)
            .or_else(Config::central_config_path)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "defaults".to_string());
        ToolboxError::Config(format!("Failed to read config {loc}: {e}"))
    })?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {e}"));
        ToolboxError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Single-line summary of the effective run settings.
pub fn format_effective_config(options: &RunOptions, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    format!(
        "Effective config [{source}]: timeout={}s, delay={}s, remote={}, output_dir={}",
        options.timeout.as_secs(),
        options.delay_secs,
        options.remote_endpoint.as_deref().unwrap_or("none"),
        options.output_dir.display(),
    )
}
