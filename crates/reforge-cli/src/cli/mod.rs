//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use reforge_core::domain::Category;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "reforge",
    bin_name = "reforge",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Mine reusable templates from scripts and configs, regenerate them per environment",
    long_about = "Reforge inspects a tree of Python scripts and configuration files, \
                  extracts the high-quality ones into parameterized templates, and \
                  regenerates them for a target environment with syntax validation.",
    after_help = "EXAMPLES:\n\
        \x20 reforge run --root ./scripts --environment staging\n\
        \x20 reforge run --priority 2 --category database\n\
        \x20 reforge analyze scripts/db_sync.py\n\
        \x20 reforge templates --category database\n\
        \x20 reforge completions bash > /usr/share/bash-completion/completions/reforge",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one regeneration batch.
    #[command(
        visible_alias = "r",
        about = "Run a regeneration batch",
        after_help = "EXAMPLES:\n\
            \x20 reforge run\n\
            \x20 reforge run --root ./scripts --priority 2\n\
            \x20 reforge run --category database --environment production\n\
            \x20 reforge --output-format json run > summary.json"
    )]
    Run(RunArgs),

    /// Inspect a single file without touching the catalog.
    #[command(
        about = "Analyze one script or config file",
        after_help = "EXAMPLES:\n\
            \x20 reforge analyze scripts/db_sync.py\n\
            \x20 reforge --output-format json analyze config/app.yaml"
    )]
    Analyze(AnalyzeArgs),

    /// List templates stored in the catalog.
    #[command(
        visible_alias = "ls",
        about = "List catalog templates",
        after_help = "EXAMPLES:\n\
            \x20 reforge templates\n\
            \x20 reforge templates --category database\n\
            \x20 reforge templates --prefix db_ --environment staging"
    )]
    Templates(TemplatesArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 reforge completions bash > ~/.local/share/bash-completion/completions/reforge\n\
            \x20 reforge completions zsh  > ~/.zfunc/_reforge\n\
            \x20 reforge completions fish > ~/.config/fish/completions/reforge.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the effective configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 reforge config show\n\
            \x20 reforge config path"
    )]
    Config(ConfigCommands),
}

// ── run ───────────────────────────────────────────────────────────────────────

/// Arguments for `reforge run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Only process artifacts with priority at or below this value.
    #[arg(
        short = 'p',
        long = "priority",
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(1..),
        help = "Highest priority value to process (1 = most important)"
    )]
    pub priority: Option<u8>,

    /// Only process artifacts in this category.
    #[arg(
        short = 'k',
        long = "category",
        value_name = "CATEGORY",
        value_parser = parse_category,
        help = "Restrict the batch to one category"
    )]
    pub category: Option<Category>,

    /// Environment to render against (overrides configuration).
    #[arg(
        short = 'e',
        long = "environment",
        value_name = "NAME",
        help = "Target environment"
    )]
    pub environment: Option<String>,

    /// Directory to discover artifacts under (overrides configuration).
    #[arg(
        short = 'r',
        long = "root",
        value_name = "DIR",
        help = "Root directory to scan"
    )]
    pub root: Option<PathBuf>,

    /// Worker pool size (overrides configuration).
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "N",
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Number of concurrent workers"
    )]
    pub workers: Option<u16>,

    /// Include the per-artifact table in human output.
    #[arg(long = "details", help = "Show every processed artifact")]
    pub details: bool,
}

// ── analyze ───────────────────────────────────────────────────────────────────

/// Arguments for `reforge analyze`.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// File to inspect.
    #[arg(value_name = "FILE", help = "Script or config file to analyze")]
    pub file: PathBuf,
}

// ── templates ─────────────────────────────────────────────────────────────────

/// Arguments for `reforge templates`.
#[derive(Debug, Args)]
pub struct TemplatesArgs {
    /// Filter by category.
    #[arg(
        short = 'k',
        long = "category",
        value_parser = parse_category,
        help = "Filter by category"
    )]
    pub category: Option<Category>,

    /// Filter by environment.
    #[arg(short = 'e', long = "environment", help = "Filter by environment")]
    pub environment: Option<String>,

    /// Filter by template name prefix.
    #[arg(long = "prefix", value_name = "PREFIX", help = "Filter by name prefix")]
    pub prefix: Option<String>,

    /// Output layout for human output.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Listing layout"
    )]
    pub format: ListFormat,
}

/// Output layout for the `templates` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// CSV rows.
    Csv,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `reforge completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `reforge config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration after all layers are merged.
    Show,
    /// Print the path of the default configuration file.
    Path,
}

// ── value parsers ─────────────────────────────────────────────────────────────

fn parse_category(raw: &str) -> Result<Category, String> {
    raw.parse::<Category>().map_err(|_| {
        let known: Vec<_> = Category::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown category '{raw}' (expected one of: {})", known.join(", "))
    })
}

// ── tests ─────────────────────────────────────────────────────────────────────
