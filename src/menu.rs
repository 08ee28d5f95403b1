use kuchiki::NodeRef;

use crate::config::MenuConfig;
use crate::dom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Closed,
    Open,
}

/// Why the menu is closing; decides where focus goes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Trigger,
    Escape,
    OutsideClick,
    LinkActivated,
}

pub struct MenuController {
    button: NodeRef,
    menu: NodeRef,
    nav: NodeRef,
    state: MenuState,
    hidden_class: String,
    narrow_max_width: u32,
    open_label: String,
    closed_label: String,
}

impl MenuController {
    pub fn install(document: &NodeRef, config: &MenuConfig, hidden_class: &str) -> Option<Self> {
        let button = dom::element_by_id(document, &config.button_id);
        let menu = dom::element_by_id(document, &config.menu_id);
        let nav = dom::element_by_id(document, &config.nav_id);
        let (Some(button), Some(menu), Some(nav)) = (button, menu, nav) else {
            tracing::debug!(
                button = %config.button_id,
                menu = %config.menu_id,
                nav = %config.nav_id,
                "menu markup incomplete; menu disabled"
            );
            return None;
        };

        Some(Self {
            button,
            menu,
            nav,
            state: MenuState::Closed,
            hidden_class: hidden_class.to_string(),
            narrow_max_width: config.narrow_max_width,
            open_label: config.open_label.clone(),
            closed_label: config.closed_label.clone(),
        })
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Handles a click anywhere in the document.
    pub fn on_click(
        &mut self,
        target: &NodeRef,
        viewport_width: u32,
        focus: &mut Option<NodeRef>,
    ) -> Option<MenuState> {
        if dom::is_within(target, &self.button) {
            match self.state {
                MenuState::Closed => self.open(focus),
                MenuState::Open => self.close(CloseReason::Trigger, focus),
            }
            return Some(self.state);
        }

        if self.state == MenuState::Closed {
            return None;
        }

        if dom::is_within(target, &self.nav)
            && self.is_nav_link(target)
            && viewport_width <= self.narrow_max_width
        {
            self.close(CloseReason::LinkActivated, focus);
            return Some(self.state);
        }

        if !dom::is_within(target, &self.menu) {
            self.close(CloseReason::OutsideClick, focus);
            return Some(self.state);
        }
        None
    }

    pub fn on_key(&mut self, key: &str, focus: &mut Option<NodeRef>) -> Option<MenuState> {
        if key == "Escape" && self.state == MenuState::Open {
            self.close(CloseReason::Escape, focus);
            return Some(self.state);
        }
        None
    }

    fn open(&mut self, focus: &mut Option<NodeRef>) {
        self.state = MenuState::Open;
        dom::set_class(&self.menu, &self.hidden_class, false);
        dom::set_attr(&self.button, "aria-expanded", "true");
        dom::set_attr(&self.button, "aria-label", &self.open_label);
        if let Some(first_link) = dom::select_first(&self.nav, "a") {
            *focus = Some(first_link);
        }
        tracing::debug!("menu opened");
    }

    fn close(&mut self, reason: CloseReason, focus: &mut Option<NodeRef>) {
        self.state = MenuState::Closed;
        dom::set_class(&self.menu, &self.hidden_class, true);
        dom::set_attr(&self.button, "aria-expanded", "false");
        dom::set_attr(&self.button, "aria-label", &self.closed_label);
        if reason != CloseReason::LinkActivated {
            *focus = Some(self.button.clone());
        }
        tracing::debug!(?reason, "menu closed");
    }

    fn is_nav_link(&self, target: &NodeRef) -> bool {
        target
            .inclusive_ancestors()
            .take_while(|node| *node != self.nav)
            .any(|node| dom::is_tag(&node, "a"))
    }
}
