use kuchiki::NodeRef;

use crate::config::AccordionPair;
use crate::dom;

pub struct AccordionPanel {
    name: String,
    button: NodeRef,
    panel: NodeRef,
    searchable: bool,
    expanded: bool,
}

impl AccordionPanel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    fn set_expanded(&mut self, expanded: bool, hidden_class: &str) {
        self.expanded = expanded;
        dom::set_attr(&self.button, "aria-expanded", if expanded { "true" } else { "false" });
        dom::set_class(&self.panel, hidden_class, !expanded);
    }
}

/// Independent collapsed/expanded state for each configured button/panel pair.
pub struct AccordionController {
    panels: Vec<AccordionPanel>,
    hidden_class: String,
}

impl AccordionController {
    pub fn install(document: &NodeRef, pairs: &[AccordionPair], hidden_class: &str) -> Self {
        let mut panels = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let button = dom::element_by_id(document, &pair.button_id);
            let panel = dom::element_by_id(document, &pair.panel_id);
            let (Some(button), Some(panel)) = (button, panel) else {
                tracing::debug!(name = %pair.name, "accordion markup missing; pair skipped");
                continue;
            };
            let expanded = dom::attr(&button, "aria-expanded").as_deref() == Some("true");
            panels.push(AccordionPanel {
                name: pair.name.clone(),
                button,
                panel,
                searchable: pair.searchable,
                expanded,
            });
        }

        Self {
            panels,
            hidden_class: hidden_class.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn panels(&self) -> &[AccordionPanel] {
        &self.panels
    }

    pub fn is_expanded(&self, name: &str) -> Option<bool> {
        self.panels
            .iter()
            .find(|p| p.name == name)
            .map(AccordionPanel::is_expanded)
    }

    /// Toggles the pair whose button contains `target`.
    pub fn on_click(&mut self, target: &NodeRef) -> Option<(&str, bool)> {
        let hidden_class = &self.hidden_class;
        let panel = self
            .panels
            .iter_mut()
            .find(|p| dom::is_within(target, &p.button))?;
        let expanded = !panel.expanded;
        panel.set_expanded(expanded, hidden_class);
        tracing::debug!(name = %panel.name, expanded, "accordion toggled");
        Some((panel.name.as_str(), expanded))
    }

    /// Collapses the pair whose panel holds the key event's target when `key` is Escape.
    pub fn on_key(&mut self, key: &str, target: &NodeRef) -> Option<&str> {
        if key != "Escape" {
            return None;
        }
        let hidden_class = &self.hidden_class;
        let panel = self
            .panels
            .iter_mut()
            .find(|p| dom::is_within(target, &p.panel))?;
        panel.set_expanded(false, hidden_class);
        Some(panel.name.as_str())
    }

    /// Opens every searchable pair. Returns how many changed state.
    pub fn force_expand(&mut self) -> usize {
        let mut opened = 0;
        for panel in self.panels.iter_mut().filter(|p| p.searchable) {
            if !panel.expanded {
                opened += 1;
            }
            panel.set_expanded(true, &self.hidden_class);
        }
        opened
    }
}
