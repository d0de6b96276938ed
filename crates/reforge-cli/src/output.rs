//! Output management and formatting.

use std::io::{self, IsTerminal};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Writes command results to stdout in the resolved format.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Colour is only ever emitted for human output.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let resolved_format = match args.output_format {
            OutputFormat::Auto if io::stdout().is_terminal() => OutputFormat::Human,
            OutputFormat::Auto => OutputFormat::Plain,
            explicit => explicit,
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    // ── Writers ───────────────────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Pretty JSON document on stdout. Never suppressed: a caller that
    /// asked for JSON wants the document even with `--quiet`.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> io::Result<()> {
        let rendered = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&rendered)
    }

    pub fn success(&self, msg: &str) -> io::Result<()> {
        self.marked(Marker::Success, msg)
    }

    pub fn warning(&self, msg: &str) -> io::Result<()> {
        self.marked(Marker::Warning, msg)
    }

    pub fn info(&self, msg: &str) -> io::Result<()> {
        self.marked(Marker::Info, msg)
    }

    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.no_color {
            self.print(text)
        } else {
            self.print(&text.cyan().bold().to_string())
        }
    }

    fn marked(&self, marker: Marker, msg: &str) -> io::Result<()> {
        let glyph = marker.glyph();
        if self.no_color {
            return self.print(&format!("{glyph} {msg}"));
        }
        let line = match marker {
            Marker::Success => format!("{} {}", glyph.green().bold(), msg.green()),
            Marker::Warning => format!("{} {}", glyph.yellow().bold(), msg.yellow()),
            Marker::Info => format!("{} {}", glyph.blue().bold(), msg.blue()),
        };
        self.print(&line)
    }

    /// Spinner on stderr while a long operation runs.  Only shown for
    /// interactive human output.
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if self.quiet || self.resolved_format != OutputFormat::Human || !io::stderr().is_terminal() {
            return None;
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
            bar.set_style(style);
        }
        bar.set_message(message.to_owned());
        bar.enable_steady_tick(Duration::from_millis(100));
        Some(bar)
    }

    pub fn is_json(&self) -> bool {
        self.resolved_format == OutputFormat::Json
    }
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Success,
    Warning,
    Info,
}

impl Marker {
    fn glyph(self) -> &'static str {
        match self {
            Self::Success => "\u{2713}",
            Self::Warning => "\u{26a0}",
            Self::Info => "\u{2139}",
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
