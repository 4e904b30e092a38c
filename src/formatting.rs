use std::fmt::Write as FmtWrite;
use std::io::IsTerminal;
use std::process::ExitCode;

use toolbox_lib::{ErrorPayload, ToolboxError};

/// Render an error to stderr and return the fatal exit code.
pub fn render_error(err: &ToolboxError) -> ExitCode {
    let colorize = std::io::stderr().is_terminal();
    eprint!("{}", format_error(&err.to_payload(), colorize));

    // Exit code 2 is reserved for every fatal error.
    ExitCode::from(2)
}

/// `Error: <message>` followed by `Hint: <remediation>` when one exists.
pub fn format_error(payload: &ErrorPayload, colorize: bool) -> String {
    let mut buf = String::new();
    writeln!(buf, "{} {}", color("Error:", "31", colorize), payload.message).ok();
    if let Some(remediation) = &payload.remediation {
        writeln!(buf, "{} {}", color("Hint:", "33", colorize), remediation).ok();
    }
    buf
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}
