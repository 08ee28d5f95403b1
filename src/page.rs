use std::collections::HashMap;

use kuchiki::NodeRef;

use crate::accordion::AccordionController;
use crate::config::PageConfig;
use crate::dom;
use crate::event::{Event, EventKind};
use crate::menu::MenuController;
use crate::search::{SearchEngine, SearchOutcome, SearchReport};
use crate::storage::PreferenceStore;
use crate::theme::ThemeController;

/// A registered reaction to one kind of event.
pub type Handler = fn(&mut Page, &Event) -> anyhow::Result<()>;

/// Host state the behaviours read and write: preferences, media queries, focus.
pub struct Environment {
    pub store: Box<dyn PreferenceStore>,
    pub prefers_dark: bool,
    pub viewport_width: u32,
    pub focused: Option<NodeRef>,
}

impl Environment {
    pub fn new(store: impl PreferenceStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            prefers_dark: false,
            viewport_width: 1024,
            focused: None,
        }
    }

    pub fn with_prefers_dark(mut self, prefers_dark: bool) -> Self {
        self.prefers_dark = prefers_dark;
        self
    }

    pub fn with_viewport_width(mut self, width: u32) -> Self {
        self.viewport_width = width;
        self
    }
}

/// A loaded document with its behaviours attached.
///
/// Each component is installed only when its markup is present. Events are delivered
/// through [`Page::dispatch`], which runs the handlers registered for the event's kind
/// in registration order.
pub struct Page {
    document: NodeRef,
    env: Environment,
    theme: Option<ThemeController>,
    menu: Option<MenuController>,
    accordions: AccordionController,
    search: Option<SearchEngine>,
    handlers: HashMap<EventKind, Vec<Handler>>,
    reports: Vec<SearchReport>,
}

impl Page {
    pub fn parse(html: &str, config: &PageConfig, env: Environment) -> Self {
        Self::install(dom::parse_document(html), config, env)
    }

    pub fn install(document: NodeRef, config: &PageConfig, env: Environment) -> Self {
        let theme = ThemeController::install(
            &document,
            &config.theme,
            env.store.as_ref(),
            env.prefers_dark,
        );
        let menu = MenuController::install(&document, &config.menu, &config.hidden_class);
        let accordions =
            AccordionController::install(&document, &config.accordions, &config.hidden_class);
        let search = SearchEngine::install(&document, &config.search, &config.hidden_class);

        let mut page = Self {
            document,
            env,
            theme,
            menu,
            accordions,
            search,
            handlers: HashMap::new(),
            reports: Vec::new(),
        };

        if let Some(has_toggle) = page.theme.as_ref().map(ThemeController::has_toggle) {
            if has_toggle {
                page.register(EventKind::Click, on_theme_click);
            }
            page.register(EventKind::ColorSchemeChange, on_color_scheme_change);
        }
        if page.menu.is_some() {
            page.register(EventKind::Click, on_menu_click);
            page.register(EventKind::KeyDown, on_menu_key);
        }
        if !page.accordions.is_empty() {
            page.register(EventKind::Click, on_accordion_click);
            page.register(EventKind::KeyDown, on_accordion_key);
        }
        if page.search.is_some() {
            page.register(EventKind::Input, on_search_input);
        }

        tracing::info!(
            theme = page.theme.is_some(),
            menu = page.menu.is_some(),
            accordions = page.accordions.panels().len(),
            search = page.search.is_some(),
            "page behaviours installed"
        );
        page
    }

    pub fn register(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Delivers one event. Environment updates (focus, viewport, colour scheme) happen
    /// before any handler runs.
    pub fn dispatch(&mut self, event: &Event) -> anyhow::Result<()> {
        match event {
            Event::Click { target } if dom::is_focusable(target) => {
                self.env.focused = Some(target.clone());
            }
            Event::ColorSchemeChange { prefers_dark } => self.env.prefers_dark = *prefers_dark,
            Event::Resize { width } => self.env.viewport_width = *width,
            _ => {}
        }

        let handlers = self.handlers.get(&event.kind()).cloned().unwrap_or_default();
        for handler in handlers {
            handler(self, event)?;
        }
        Ok(())
    }

    /// Runs a search pass directly, as an input event on the search input would.
    pub fn search(&mut self, raw: &str) -> anyhow::Result<SearchOutcome> {
        let Some(search) = self.search.as_mut() else {
            return Ok(SearchOutcome::Unchanged);
        };
        let outcome = search.search(raw, &mut self.accordions)?;
        if let SearchOutcome::Applied(report) = &outcome {
            self.reports.push(report.clone());
        }
        Ok(outcome)
    }

    pub fn document(&self) -> &NodeRef {
        &self.document
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn focused(&self) -> Option<&NodeRef> {
        self.env.focused.as_ref()
    }

    pub fn theme(&self) -> Option<&ThemeController> {
        self.theme.as_ref()
    }

    pub fn menu(&self) -> Option<&MenuController> {
        self.menu.as_ref()
    }

    pub fn accordions(&self) -> &AccordionController {
        &self.accordions
    }

    pub fn search_engine(&self) -> Option<&SearchEngine> {
        self.search.as_ref()
    }

    pub fn search_input(&self) -> Option<&NodeRef> {
        self.search.as_ref().map(SearchEngine::input)
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeRef> {
        dom::element_by_id(&self.document, id)
    }

    /// Search reports collected since the last call.
    pub fn take_reports(&mut self) -> Vec<SearchReport> {
        std::mem::take(&mut self.reports)
    }

    pub fn to_html(&self) -> anyhow::Result<String> {
        dom::serialize(&self.document)
    }

    fn key_target(&self, target: Option<&NodeRef>) -> Option<NodeRef> {
        target
            .cloned()
            .or_else(|| self.env.focused.clone())
            .or_else(|| dom::select_first(&self.document, "body"))
    }
}

fn on_theme_click(page: &mut Page, event: &Event) -> anyhow::Result<()> {
    let Event::Click { target } = event else {
        return Ok(());
    };
    let Some(theme) = page.theme.as_mut() else {
        return Ok(());
    };
    if !theme.is_toggle(target) {
        return Ok(());
    }
    let next = theme.toggle(page.env.store.as_mut())?;
    tracing::debug!(theme = next.as_str(), "theme toggled");
    Ok(())
}

fn on_color_scheme_change(page: &mut Page, event: &Event) -> anyhow::Result<()> {
    let Event::ColorSchemeChange { prefers_dark } = event else {
        return Ok(());
    };
    let Some(theme) = page.theme.as_mut() else {
        return Ok(());
    };
    if let Some(next) = theme.system_changed(*prefers_dark, page.env.store.as_ref()) {
        tracing::debug!(theme = next.as_str(), "theme follows system preference");
    }
    Ok(())
}

fn on_menu_click(page: &mut Page, event: &Event) -> anyhow::Result<()> {
    let Event::Click { target } = event else {
        return Ok(());
    };
    if let Some(menu) = page.menu.as_mut() {
        menu.on_click(target, page.env.viewport_width, &mut page.env.focused);
    }
    Ok(())
}

fn on_menu_key(page: &mut Page, event: &Event) -> anyhow::Result<()> {
    let Event::KeyDown { key, .. } = event else {
        return Ok(());
    };
    if let Some(menu) = page.menu.as_mut() {
        menu.on_key(key, &mut page.env.focused);
    }
    Ok(())
}

fn on_accordion_click(page: &mut Page, event: &Event) -> anyhow::Result<()> {
    if let Event::Click { target } = event {
        page.accordions.on_click(target);
    }
    Ok(())
}

fn on_accordion_key(page: &mut Page, event: &Event) -> anyhow::Result<()> {
    let Event::KeyDown { key, target } = event else {
        return Ok(());
    };
    let Some(target) = page.key_target(target.as_ref()) else {
        return Ok(());
    };
    if let Some(name) = page.accordions.on_key(key, &target) {
        tracing::debug!(name, "accordion collapsed by Escape");
    }
    Ok(())
}

fn on_search_input(page: &mut Page, event: &Event) -> anyhow::Result<()> {
    let Event::Input { target, value } = event else {
        return Ok(());
    };
    if page.search_input() != Some(target) {
        return Ok(());
    }
    // The serialized input keeps the last query that was actually applied.
    if let SearchOutcome::Applied(_) = page.search(value)? {
        dom::set_attr(target, "value", value);
    }
    Ok(())
}
