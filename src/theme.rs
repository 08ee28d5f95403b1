use kuchiki::NodeRef;
use serde::{Deserialize, Serialize};

use crate::config::ThemeConfig;
use crate::dom;
use crate::storage::PreferenceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn from_system(prefers_dark: bool) -> Self {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }

    pub fn flipped(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Applies the theme to the document root and remembers explicit choices.
///
/// Without a persisted choice the theme tracks the system colour scheme; once the user
/// toggles, the choice sticks until the store entry is cleared.
pub struct ThemeController {
    root: NodeRef,
    toggle: Option<NodeRef>,
    current: Theme,
    storage_key: String,
    dark_class: String,
}

impl ThemeController {
    pub fn install(
        document: &NodeRef,
        config: &ThemeConfig,
        store: &dyn PreferenceStore,
        prefers_dark: bool,
    ) -> Option<Self> {
        let root = dom::select_first(document, "html")?;
        let toggle = dom::element_by_id(document, &config.toggle_id);
        if toggle.is_none() {
            tracing::debug!(id = %config.toggle_id, "theme toggle missing; following system only");
        }

        let stored = store.get(&config.storage_key);
        let current = stored
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_else(|| Theme::from_system(prefers_dark));

        let controller = Self {
            root,
            toggle,
            current,
            storage_key: config.storage_key.clone(),
            dark_class: config.dark_class.clone(),
        };
        controller.apply(current);
        tracing::debug!(
            theme = current.as_str(),
            persisted = stored.is_some(),
            "theme installed"
        );
        Some(controller)
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn has_toggle(&self) -> bool {
        self.toggle.is_some()
    }

    pub fn is_toggle(&self, target: &NodeRef) -> bool {
        self.toggle
            .as_ref()
            .is_some_and(|toggle| dom::is_within(target, toggle))
    }

    /// Flips the theme and persists the new value as an explicit choice.
    pub fn toggle(&mut self, store: &mut dyn PreferenceStore) -> anyhow::Result<Theme> {
        let next = self.current.flipped();
        self.current = next;
        self.apply(next);
        store.set(&self.storage_key, next.as_str())?;
        Ok(next)
    }

    /// Follows a system colour-scheme change unless an explicit choice is stored.
    pub fn system_changed(
        &mut self,
        prefers_dark: bool,
        store: &dyn PreferenceStore,
    ) -> Option<Theme> {
        if store.get(&self.storage_key).is_some() {
            return None;
        }
        let next = Theme::from_system(prefers_dark);
        self.current = next;
        self.apply(next);
        Some(next)
    }

    fn apply(&self, theme: Theme) {
        dom::set_class(&self.root, &self.dark_class, theme == Theme::Dark);
        dom::set_attr(&self.root, "data-theme", theme.as_str());

        if let Some(toggle) = &self.toggle {
            let next = theme.flipped().as_str();
            let label = format!("Switch to {next} theme");
            let pressed = if theme == Theme::Dark { "true" } else { "false" };
            dom::set_attr(toggle, "aria-pressed", pressed);
            dom::set_attr(toggle, "aria-label", &label);
            dom::set_attr(toggle, "title", &label);
        }
    }
}
