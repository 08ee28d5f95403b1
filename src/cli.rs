use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProgressMode {
    /// Enable progress UI when stderr is a TTY.
    Auto,
    /// Always enable progress UI (even when piped).
    Always,
    /// Never show progress UI.
    Never,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Pre-rendered HTML page to attach the behaviours to.
    #[arg(long)]
    pub input: PathBuf,

    /// JSON array of events to replay against the page, in order.
    ///
    /// Entries are tagged by `type`: `click`, `key`, `input`, `color-scheme`, `resize`.
    /// Targets are CSS selectors resolved against the document at replay time.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Output HTML path. Defaults to `<input stem>.out.html` next to the input.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// JSON file overriding element ids, selectors and class names.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON file holding persisted preferences (the `theme` choice). Created on first write.
    ///
    /// Without it, preferences live in memory for the duration of the run.
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Viewport width in CSS pixels; widths up to the configured narrow limit count as mobile.
    #[arg(long, default_value_t = 1024)]
    pub viewport_width: u32,

    /// Report a dark system colour scheme at load time.
    #[arg(long)]
    pub prefers_dark: bool,

    /// Print each applied search pass as a JSON line on stdout.
    #[arg(long)]
    pub report: bool,

    /// Progress display: `auto`, `always`, or `never`.
    #[arg(long, value_enum, default_value = "auto")]
    pub progress: ProgressMode,
}
