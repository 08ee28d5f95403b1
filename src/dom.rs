use anyhow::{Context as _, anyhow};
use kuchiki::NodeRef;
use kuchiki::iter::NodeIterator as _;
use kuchiki::traits::TendrilSink as _;
use maud::Markup;

pub fn parse_document(html: &str) -> NodeRef {
    kuchiki::parse_html().one(html)
}

pub fn serialize(node: &NodeRef) -> anyhow::Result<String> {
    let mut out = Vec::new();
    node.serialize(&mut out).context("serialize document")?;
    String::from_utf8(out).context("document not utf-8")
}

/// Finds an element by its `id` attribute without going through a CSS selector,
/// so ids with selector metacharacters still resolve.
pub fn element_by_id(root: &NodeRef, id: &str) -> Option<NodeRef> {
    root.inclusive_descendants()
        .elements()
        .find(|el| el.attributes.borrow().get("id") == Some(id))
        .map(|el| el.as_node().clone())
}

pub fn select_first(root: &NodeRef, selector: &str) -> Option<NodeRef> {
    root.select_first(selector)
        .ok()
        .map(|el| el.as_node().clone())
}

pub fn select_all(root: &NodeRef, selector: &str) -> Vec<NodeRef> {
    match root.select(selector) {
        Ok(nodes) => nodes.map(|el| el.as_node().clone()).collect(),
        Err(()) => {
            tracing::warn!(selector, "invalid selector; nothing selected");
            Vec::new()
        }
    }
}

pub fn is_tag(node: &NodeRef, tag: &str) -> bool {
    node.as_element()
        .is_some_and(|el| el.name.local.as_ref().eq_ignore_ascii_case(tag))
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|el| el.attributes.borrow().get(name).map(|v| v.to_string()))
}

/// Sets an attribute, skipping the write when the value is already current.
pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    let Some(el) = node.as_element() else { return };
    if el.attributes.borrow().get(name) == Some(value) {
        return;
    }
    el.attributes.borrow_mut().insert(name, value.to_string());
}

pub fn has_class(node: &NodeRef, class: &str) -> bool {
    attr(node, "class")
        .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
}

/// Adds or removes a single class. Returns whether the class list changed.
pub fn set_class(node: &NodeRef, class: &str, present: bool) -> bool {
    let Some(el) = node.as_element() else {
        return false;
    };
    let current = el
        .attributes
        .borrow()
        .get("class")
        .map(|v| v.to_string())
        .unwrap_or_default();
    let mut classes: Vec<&str> = current.split_ascii_whitespace().collect();
    let had = classes.contains(&class);
    if had == present {
        return false;
    }

    if present {
        classes.push(class);
    } else {
        classes.retain(|c| *c != class);
    }

    let mut attrs = el.attributes.borrow_mut();
    if classes.is_empty() {
        attrs.remove("class");
    } else {
        attrs.insert("class", classes.join(" "));
    }
    true
}

pub fn is_within(node: &NodeRef, container: &NodeRef) -> bool {
    node.inclusive_ancestors().any(|ancestor| ancestor == *container)
}

pub fn is_focusable(node: &NodeRef) -> bool {
    ["a", "button", "input", "select", "textarea"]
        .iter()
        .any(|tag| is_tag(node, tag))
        || attr(node, "tabindex").is_some()
}

/// Text leaves under `root`, in document order, skipping `<script>` and `<style>` content.
pub fn visible_text_nodes(root: &NodeRef) -> Vec<NodeRef> {
    root.inclusive_descendants()
        .filter(|n| n.as_text().is_some())
        .filter(|n| {
            !n.ancestors()
                .any(|a| is_tag(&a, "script") || is_tag(&a, "style"))
        })
        .collect()
}

pub fn visible_text(root: &NodeRef) -> String {
    let mut out = String::new();
    for node in visible_text_nodes(root) {
        if let Some(text) = node.as_text() {
            out.push_str(&text.borrow());
        }
    }
    out
}

/// Merges runs of adjacent text children of `parent` into their first node.
pub fn merge_adjacent_text(parent: &NodeRef) {
    let mut current = parent.first_child();
    while let Some(node) = current {
        if let Some(text) = node.as_text() {
            while let Some(next) = node.next_sibling() {
                let Some(next_text) = next.as_text() else {
                    break;
                };
                let tail = next_text.borrow().clone();
                text.borrow_mut().push_str(&tail);
                next.detach();
            }
        }
        current = node.next_sibling();
    }
}

/// Renders `markup`, parses it and returns the first node matching `selector`, detached
/// and ready to be inserted into another tree.
pub fn fragment(markup: Markup, selector: &str) -> anyhow::Result<NodeRef> {
    let doc = parse_document(&markup.into_string());
    let node = select_first(&doc, selector)
        .ok_or_else(|| anyhow!("rendered fragment has no {selector}"))?;
    node.detach();
    Ok(node)
}
