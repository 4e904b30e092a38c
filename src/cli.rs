use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;

const EXAMPLES: &str = "Examples:
  that-cli-web-toolbox -b https://example.com
  that-cli-web-toolbox -s -p -d 5 ./report.html
  that-cli-web-toolbox -g 'h1, h2' -j 'document.querySelector(\"#accept\").click()' https://example.com
  that-cli-web-toolbox -c -t 30 -r localhost:9222 https://example.com";

#[derive(Parser, Debug)]
#[command(name = "that-cli-web-toolbox")]
#[command(
    version,
    about = "Load a web page in headless Chrome and extract screenshots, PDFs, text and console output",
    long_about = "that-cli-web-toolbox\n\nLoads one target (URL or local HTML file) in headless Chrome, waits a fixed delay for scripts to settle, optionally runs custom JavaScript, then performs the requested actions:\n- --gettextbycssselector: print the text of matching elements\n- --body: print the page body text\n- --screenshot: save a full-page JPEG\n- --printtopdf: save the page as PDF\n- --consolelog: log console messages, uncaught exceptions and dialogs\n\nLogs go to stderr; extracted text and saved paths go to stdout.",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// URL or path of a local HTML file
    #[arg(value_name = "TARGET")]
    pub target: String,

    #[arg(short = 'c', long = "consolelog", help = "Capture console output, exceptions and dialogs")]
    pub console_log: bool,

    #[arg(short = 's', long, help = "Save a full-page screenshot")]
    pub screenshot: bool,

    #[arg(short = 'p', long = "printtopdf", help = "Save the page as PDF")]
    pub print_to_pdf: bool,

    #[arg(short = 'b', long, help = "Print the page body text")]
    pub body: bool,

    #[arg(
        short = 'g',
        long = "gettextbycssselector",
        value_name = "SELECTOR",
        help = "Print the text of every element matching the CSS selector"
    )]
    pub selector: Option<String>,

    #[arg(
        short = 't',
        long,
        default_value_t = 10,
        value_name = "SECS",
        help = "Session timeout in seconds (raised to delay + 10 when lower)"
    )]
    pub timeout: u64,

    #[arg(
        short = 'd',
        long,
        default_value_t = 2,
        value_name = "SECS",
        allow_negative_numbers = true,
        help = "Seconds to wait after navigation before running script and actions"
    )]
    pub delay: i64,

    #[arg(
        short = 'l',
        long,
        default_value = "info",
        value_name = "LEVEL",
        help = "Log level: debug, info, warn, error"
    )]
    pub loglevel: String,

    #[arg(
        short = 'r',
        long = "remote-debugging-port",
        value_name = "HOST:PORT",
        help = "Attach to a running Chrome instead of launching one"
    )]
    pub remote_debugging_port: Option<String>,

    #[arg(
        short = 'j',
        long = "js",
        value_name = "CODE",
        help = "JavaScript to run after the delay (wrapped in an async function when it uses await)"
    )]
    pub js: Option<String>,

    #[arg(long = "js-file", value_name = "PATH", help = "Read the JavaScript to run from a file")]
    pub js_file: Option<PathBuf>,

    #[arg(
        short = 'o',
        long = "output-dir",
        default_value = ".",
        value_name = "DIR",
        help = "Directory for screenshots and PDFs; created if missing"
    )]
    pub output_dir: PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        help = "Optional config file (TOML) with defaults for timeout/delay/loglevel/remote_debugging_port/output_dir; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

/// Parse process arguments, keeping the matches so explicit flags can be
/// told apart from defaults.
pub fn parse() -> (Cli, ArgMatches) {
    let matches = Cli::command().get_matches();
    match Cli::from_arg_matches(&matches) {
        Ok(cli) => (cli, matches),
        Err(err) => err.exit(),
    }
}
