use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

/// Element ids, selectors and class names the page behaviours bind to.
///
/// Every field has a default matching the stock page markup, so a config file only
/// needs to name what differs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Class that hides an element (menu, accordion panels, filtered items, badges).
    pub hidden_class: String,
    pub theme: ThemeConfig,
    pub menu: MenuConfig,
    pub accordions: Vec<AccordionPair>,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub toggle_id: String,
    pub storage_key: String,
    pub dark_class: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub button_id: String,
    pub menu_id: String,
    pub nav_id: String,
    /// Widest viewport, in CSS pixels, that counts as narrow.
    pub narrow_max_width: u32,
    pub open_label: String,
    pub closed_label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccordionPair {
    pub name: String,
    pub button_id: String,
    pub panel_id: String,
    /// Whether a non-empty search forces this panel open.
    #[serde(default = "default_true")]
    pub searchable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub input_id: String,
    pub groups: Vec<GroupConfig>,
    pub item_selector: String,
    pub title_selector: String,
    pub link_selector: String,
    pub mark_class: String,
    pub badge_class: String,
    pub badge_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    pub container_id: String,
    /// Overrides [`SearchConfig::item_selector`] for this group.
    #[serde(default)]
    pub item_selector: Option<String>,
}

fn default_true() -> bool {
    true
}

const SECTIONS: [&str; 4] = ["word", "excel", "html", "more"];

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            hidden_class: "hidden".to_string(),
            theme: ThemeConfig::default(),
            menu: MenuConfig::default(),
            accordions: SECTIONS
                .iter()
                .map(|name| AccordionPair {
                    name: name.to_string(),
                    button_id: format!("{name}Btn"),
                    panel_id: format!("{name}Panel"),
                    searchable: true,
                })
                .collect(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            toggle_id: "theme-toggle".to_string(),
            storage_key: "theme".to_string(),
            dark_class: "dark".to_string(),
        }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            button_id: "menu-btn".to_string(),
            menu_id: "menu".to_string(),
            nav_id: "primary-navigation".to_string(),
            narrow_max_width: 767,
            open_label: "Close main menu".to_string(),
            closed_label: "Open main menu".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            input_id: "search-input".to_string(),
            groups: SECTIONS
                .iter()
                .map(|name| GroupConfig {
                    name: name.to_string(),
                    container_id: format!("{name}Panel"),
                    item_selector: None,
                })
                .collect(),
            item_selector: "li, .card".to_string(),
            title_selector: "h2, h3, h4, .title".to_string(),
            link_selector: "a[href]".to_string(),
            mark_class: "search-hit".to_string(),
            badge_class: "search-empty".to_string(),
            badge_text: "No matching items.".to_string(),
        }
    }
}

impl PageConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
    }
}
