mod accordion;
mod cli;
mod config;
mod dom;
mod event;
mod highlight;
mod menu;
mod page;
mod progress;
mod search;
mod storage;
mod theme;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use cli::Args;

pub use accordion::{AccordionController, AccordionPanel};
pub use cli::ProgressMode;
pub use cli::Args as CliArgs;
pub use config::{AccordionPair, GroupConfig, MenuConfig, PageConfig, SearchConfig, ThemeConfig};
pub use event::{Event, EventKind, ScriptedEvent, load_script, parse_script};
pub use menu::{MenuController, MenuState};
pub use page::{Environment, Handler, Page};
pub use search::{GroupReport, SearchEngine, SearchOutcome, SearchReport, normalize_query};
pub use storage::{JsonFileStore, MemoryStore, PreferenceStore};
pub use theme::{Theme, ThemeController};

pub fn run(args: Args) -> anyhow::Result<()> {
    use std::io::IsTerminal as _;

    let progress_enabled = match args.progress {
        ProgressMode::Always => true,
        ProgressMode::Never => false,
        ProgressMode::Auto => std::io::stderr().is_terminal(),
    };

    let html = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read {}", args.input.display()))?;
    let config = match &args.config {
        Some(path) => PageConfig::from_path(path)?,
        None => PageConfig::default(),
    };
    let script = match &args.events {
        Some(path) => event::load_script(path)?,
        None => Vec::new(),
    };

    let env = match &args.state {
        Some(path) => Environment::new(JsonFileStore::open(path)?),
        None => Environment::new(MemoryStore::default()),
    }
    .with_prefers_dark(args.prefers_dark)
    .with_viewport_width(args.viewport_width);

    let progress = progress::Progress::new(progress_enabled, script.len());
    let mut page = Page::parse(&html, &config, env);

    progress.set_stage("replaying events");
    for (idx, scripted) in script.iter().enumerate() {
        let label = scripted.label();
        let event = scripted
            .resolve(&page)
            .with_context(|| format!("event #{} ({label})", idx + 1))?;
        page.dispatch(&event)
            .with_context(|| format!("event #{} ({label})", idx + 1))?;
        progress.event_done(&label);
    }
    progress.finish();

    if args.report {
        for report in page.take_reports() {
            println!(
                "{}",
                serde_json::to_string(&report).context("encode search report")?
            );
        }
    }

    let out_path = args.out.clone().unwrap_or_else(|| default_out_path(&args.input));
    write_page(&out_path, &page)?;
    tracing::info!(
        events = script.len(),
        out = %out_path.display(),
        "page written"
    );
    Ok(())
}

fn default_out_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    input.with_file_name(format!("{stem}.out.html"))
}

fn write_page(out_path: &Path, page: &Page) -> anyhow::Result<()> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
    }
    let html = page.to_html()?;
    std::fs::write(out_path, html).with_context(|| format!("write {}", out_path.display()))?;
    Ok(())
}
