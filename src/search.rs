//! Instant filter over the page's item groups.
//!
//! Each pass normalizes the raw query, clears previous highlights, opens the searchable
//! accordion panels, then shows, hides and highlights items group by group. Items are
//! re-selected on every pass rather than cached.

use kuchiki::NodeRef;
use maud::html;
use serde::Serialize;

use crate::accordion::AccordionController;
use crate::config::SearchConfig;
use crate::dom;
use crate::highlight;

/// Lowercases, trims and collapses internal whitespace runs to a single space.
pub fn normalize_query(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The normalized query matched the previous one; nothing was touched.
    Unchanged,
    Applied(SearchReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub matched: usize,
    pub total: usize,
    pub empty_badge: bool,
}

impl SearchReport {
    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.name == name)
    }
}

struct Group {
    name: String,
    container: NodeRef,
    item_selector: String,
    badge: Option<NodeRef>,
}

pub struct SearchEngine {
    input: NodeRef,
    groups: Vec<Group>,
    last_query: String,
    title_selector: String,
    link_selector: String,
    mark_class: String,
    hidden_class: String,
    badge_class: String,
    badge_text: String,
}

impl SearchEngine {
    pub fn install(document: &NodeRef, config: &SearchConfig, hidden_class: &str) -> Option<Self> {
        let Some(input) = dom::element_by_id(document, &config.input_id) else {
            tracing::debug!(id = %config.input_id, "search input missing; search disabled");
            return None;
        };

        let mut groups = Vec::with_capacity(config.groups.len());
        for group in &config.groups {
            let Some(container) = dom::element_by_id(document, &group.container_id) else {
                tracing::debug!(
                    group = %group.name,
                    container = %group.container_id,
                    "group container missing; group excluded from search"
                );
                continue;
            };
            groups.push(Group {
                name: group.name.clone(),
                container,
                item_selector: group
                    .item_selector
                    .clone()
                    .unwrap_or_else(|| config.item_selector.clone()),
                badge: None,
            });
        }

        tracing::debug!(groups = groups.len(), "search installed");
        Some(Self {
            input,
            groups,
            last_query: String::new(),
            title_selector: config.title_selector.clone(),
            link_selector: config.link_selector.clone(),
            mark_class: config.mark_class.clone(),
            hidden_class: hidden_class.to_string(),
            badge_class: config.badge_class.clone(),
            badge_text: config.badge_text.clone(),
        })
    }

    pub fn input(&self) -> &NodeRef {
        &self.input
    }

    /// Runs one filter pass for `raw`, forcing searchable accordion panels open when the
    /// query is non-empty.
    pub fn search(
        &mut self,
        raw: &str,
        accordions: &mut AccordionController,
    ) -> anyhow::Result<SearchOutcome> {
        let query = normalize_query(raw);
        if query == self.last_query {
            return Ok(SearchOutcome::Unchanged);
        }
        self.last_query = query.clone();

        let mut cleared = 0;
        for group in &self.groups {
            cleared += highlight::clear(&group.container, &self.mark_class);
        }

        if !query.is_empty() {
            let opened = accordions.force_expand();
            if opened > 0 {
                tracing::debug!(opened, "opened accordion panels for search");
            }
        }

        let pattern = if query.is_empty() {
            None
        } else {
            Some(highlight::literal_pattern(&query)?)
        };

        let mut reports = Vec::with_capacity(self.groups.len());
        for idx in 0..self.groups.len() {
            let (name, items) = {
                let group = &self.groups[idx];
                let items = dom::select_all(&group.container, &group.item_selector);
                (group.name.clone(), items)
            };
            let mut matched = 0;
            for item in &items {
                // Filtering uses full lowercasing while highlighting uses the regex crate's
                // simple case folding, so a few multi-char foldings (`İ`) match unmarked.
                let text = normalize_query(&self.searchable_text(item));
                let is_match = query.is_empty() || text.contains(&query);
                dom::set_class(item, &self.hidden_class, !is_match);
                if !is_match {
                    continue;
                }
                matched += 1;
                if let Some(pattern) = &pattern {
                    highlight::apply(item, pattern, &self.mark_class)?;
                }
            }

            let empty_badge = !query.is_empty() && matched == 0;
            self.set_badge(idx, empty_badge)?;
            reports.push(GroupReport {
                name,
                matched,
                total: items.len(),
                empty_badge,
            });
        }

        if query.is_empty() {
            for group in &self.groups {
                for item in dom::select_all(&group.container, &group.item_selector) {
                    dom::set_class(&item, &self.hidden_class, false);
                }
            }
        }

        tracing::debug!(
            query = %query,
            cleared,
            matched = reports.iter().map(|r| r.matched).sum::<usize>(),
            "search applied"
        );
        Ok(SearchOutcome::Applied(SearchReport {
            query,
            groups: reports,
        }))
    }

    /// Title, link text and link target when the item has a title or link; otherwise
    /// the item's whole visible text.
    fn searchable_text(&self, item: &NodeRef) -> String {
        let title = dom::select_first(item, &self.title_selector);
        let link = dom::select_first(item, &self.link_selector);
        if title.is_none() && link.is_none() {
            return dom::visible_text(item);
        }

        let mut parts = Vec::new();
        if let Some(title) = &title {
            parts.push(dom::visible_text(title));
        }
        if let Some(link) = &link {
            parts.push(dom::visible_text(link));
            if let Some(href) = dom::attr(link, "href") {
                parts.push(href);
            }
        }
        parts.join(" ")
    }

    fn set_badge(&mut self, idx: usize, show: bool) -> anyhow::Result<()> {
        let group = &mut self.groups[idx];
        if let Some(badge) = &group.badge {
            dom::set_class(badge, &self.hidden_class, !show);
            return Ok(());
        }
        if !show {
            return Ok(());
        }

        let badge = dom::fragment(
            html! {
                p class=(self.badge_class) role="status" data-group=(group.name) {
                    (self.badge_text)
                }
            },
            "p",
        )?;
        group.container.insert_after(badge.clone());
        group.badge = Some(badge);
        Ok(())
    }
}
