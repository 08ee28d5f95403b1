use std::path::Path;

use anyhow::{Context as _, anyhow};
use kuchiki::NodeRef;
use serde::Deserialize;

use crate::dom;
use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
    Input,
    ColorSchemeChange,
    Resize,
}

/// A host event delivered to [`Page::dispatch`].
#[derive(Debug, Clone)]
pub enum Event {
    Click { target: NodeRef },
    /// `target` falls back to the focused element, then `<body>`.
    KeyDown { key: String, target: Option<NodeRef> },
    Input { target: NodeRef, value: String },
    ColorSchemeChange { prefers_dark: bool },
    Resize { width: u32 },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Click { .. } => EventKind::Click,
            Event::KeyDown { .. } => EventKind::KeyDown,
            Event::Input { .. } => EventKind::Input,
            Event::ColorSchemeChange { .. } => EventKind::ColorSchemeChange,
            Event::Resize { .. } => EventKind::Resize,
        }
    }
}

/// One entry of an event script, with targets written as CSS selectors.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ScriptedEvent {
    Click {
        target: String,
    },
    Key {
        key: String,
        #[serde(default)]
        target: Option<String>,
    },
    Input {
        value: String,
        #[serde(default)]
        target: Option<String>,
    },
    ColorScheme {
        dark: bool,
    },
    Resize {
        width: u32,
    },
}

impl ScriptedEvent {
    pub fn label(&self) -> String {
        match self {
            ScriptedEvent::Click { target } => format!("click {target}"),
            ScriptedEvent::Key { key, .. } => format!("key {key}"),
            ScriptedEvent::Input { value, .. } => format!("input {value:?}"),
            ScriptedEvent::ColorScheme { dark } => {
                format!("color-scheme {}", if *dark { "dark" } else { "light" })
            }
            ScriptedEvent::Resize { width } => format!("resize {width}"),
        }
    }

    /// Resolves selectors against the page's current document.
    pub fn resolve(&self, page: &Page) -> anyhow::Result<Event> {
        let event = match self {
            ScriptedEvent::Click { target } => Event::Click {
                target: resolve_target(page.document(), target)?,
            },
            ScriptedEvent::Key { key, target } => Event::KeyDown {
                key: key.clone(),
                target: target
                    .as_deref()
                    .map(|sel| resolve_target(page.document(), sel))
                    .transpose()?,
            },
            ScriptedEvent::Input { value, target } => {
                let target = match target {
                    Some(sel) => resolve_target(page.document(), sel)?,
                    None => page.search_input().cloned().ok_or_else(|| {
                        anyhow!("input event has no target and the page has no search input")
                    })?,
                };
                Event::Input {
                    target,
                    value: value.clone(),
                }
            }
            ScriptedEvent::ColorScheme { dark } => Event::ColorSchemeChange {
                prefers_dark: *dark,
            },
            ScriptedEvent::Resize { width } => Event::Resize { width: *width },
        };
        Ok(event)
    }
}

fn resolve_target(document: &NodeRef, selector: &str) -> anyhow::Result<NodeRef> {
    dom::select_first(document, selector)
        .ok_or_else(|| anyhow!("no element matches selector {selector:?}"))
}

pub fn parse_script(json: &str) -> anyhow::Result<Vec<ScriptedEvent>> {
    serde_json::from_str(json).context("parse event script")
}

pub fn load_script(path: &Path) -> anyhow::Result<Vec<ScriptedEvent>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_script(&text).with_context(|| format!("load {}", path.display()))
}
