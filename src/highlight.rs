use anyhow::Context as _;
use kuchiki::NodeRef;
use maud::html;
use regex::{Regex, RegexBuilder};

use crate::dom;

/// Case-insensitive pattern that matches `query` literally.
pub fn literal_pattern(query: &str) -> anyhow::Result<Regex> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .with_context(|| format!("build highlight pattern for {query:?}"))
}

/// Wraps every match of `pattern` in text under `item` with `<mark class=...>`.
///
/// Matches never overlap and each text node keeps its surrounding text. Nodes inside
/// `<script>`/`<style>` and nodes without a match are left alone. Returns the number of
/// marks inserted.
pub fn apply(item: &NodeRef, pattern: &Regex, mark_class: &str) -> anyhow::Result<usize> {
    let mut marks = 0;
    for node in dom::visible_text_nodes(item) {
        // Nested items share text with their parent item; never mark inside a mark.
        if node
            .ancestors()
            .any(|a| dom::is_tag(&a, "mark") && dom::has_class(&a, mark_class))
        {
            continue;
        }
        let content = match node.as_text() {
            Some(text) => text.borrow().clone(),
            None => continue,
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for m in pattern.find_iter(&content) {
            if m.start() > last {
                segments.push(NodeRef::new_text(&content[last..m.start()]));
            }
            segments.push(mark_node(m.as_str(), mark_class)?);
            marks += 1;
            last = m.end();
        }
        if segments.is_empty() {
            continue;
        }
        if last < content.len() {
            segments.push(NodeRef::new_text(&content[last..]));
        }

        for segment in segments {
            node.insert_before(segment);
        }
        node.detach();
    }
    Ok(marks)
}

/// Unwraps every `<mark class=...>` under `container` back into plain text and merges
/// the text nodes the marks had split. Returns the number of marks removed.
pub fn clear(container: &NodeRef, mark_class: &str) -> usize {
    let marks: Vec<NodeRef> = container
        .descendants()
        .filter(|node| dom::is_tag(node, "mark") && dom::has_class(node, mark_class))
        .collect();

    let mut parents: Vec<NodeRef> = Vec::new();
    for mark in &marks {
        mark.insert_before(NodeRef::new_text(mark.text_contents()));
        if let Some(parent) = mark.parent() {
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
        mark.detach();
    }

    for parent in &parents {
        dom::merge_adjacent_text(parent);
    }
    marks.len()
}

fn mark_node(text: &str, mark_class: &str) -> anyhow::Result<NodeRef> {
    dom::fragment(html! { mark class=(mark_class) { (text) } }, "mark")
}
