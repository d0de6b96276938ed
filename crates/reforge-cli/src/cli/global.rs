//! Flags accepted by every subcommand, flattened into [`super::Cli`].

use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "More log output (-v info, -vv debug, -vvv trace)",
        long_help = "Raise the log level written to stderr:
    (none)  warnings and errors
    -v      batch progress
    -vv     per-stage diagnostics
    -vvv    everything

RUST_LOG, when set, takes precedence."
    )]
    pub verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Print nothing but errors and JSON documents"
    )]
    pub quiet: bool,

    /// Honours `NO_COLOR` (<https://no-color.org>).
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        help = "Never emit ANSI colours"
    )]
    pub no_color: bool,

    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        env = "REFORGE_CONFIG",
        help = "Settings file (defaults to the platform config dir)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "How results are printed on stdout"
    )]
    pub output_format: OutputFormat,

    #[arg(long = "log-json", global = true, help = "Emit log events as JSON lines")]
    pub log_json: bool,

    #[arg(
        long = "log-file",
        global = true,
        value_name = "FILE",
        help = "Also append log events to FILE"
    )]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human on a terminal, plain when piped.
    #[default]
    Auto,
    /// Coloured summary tables.
    Human,
    /// Same layout, no ANSI codes.
    Plain,
    /// One pretty-printed JSON document.
    Json,
}
