use kuchiki::NodeRef;
use page_behaviors::{
    Environment, Event, MemoryStore, MenuState, Page, PageConfig, SearchOutcome,
    Theme,
};
use tempfile::tempdir;

const GUIDES: &str = include_str!("fixtures/guides.html");

fn page() -> Page {
    Page::parse(
        GUIDES,
        &PageConfig::default(),
        Environment::new(MemoryStore::default()),
    )
}

fn by_id(page: &Page, id: &str) -> NodeRef {
    page.element_by_id(id)
        .unwrap_or_else(|| panic!("fixture has no #{id}"))
}

fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|el| el.attributes.borrow().get(name).map(|v| v.to_string()))
}

fn has_class(node: &NodeRef, class: &str) -> bool {
    attr(node, "class").is_some_and(|v| v.split_whitespace().any(|c| c == class))
}

fn items(page: &Page, container_id: &str) -> Vec<NodeRef> {
    by_id(page, container_id)
        .select("li, .card")
        .unwrap()
        .map(|el| el.as_node().clone())
        .collect()
}

fn visible_titles(page: &Page, container_id: &str) -> Vec<String> {
    items(page, container_id)
        .iter()
        .filter(|item| !has_class(item, "hidden"))
        .map(|item| match item.select_first("h3") {
            Ok(h) => h.text_contents(),
            Err(()) => item.text_contents(),
        })
        .collect()
}

fn badge(page: &Page, group: &str) -> Option<NodeRef> {
    page.document()
        .select_first(&format!("p.search-empty[data-group={group}]"))
        .ok()
        .map(|el| el.as_node().clone())
}

fn serialize(node: &NodeRef) -> String {
    let mut out = Vec::new();
    node.serialize(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn click(page: &mut Page, id: &str) {
    let target = by_id(page, id);
    page.dispatch(&Event::Click { target }).unwrap();
}

fn type_query(page: &mut Page, value: &str) {
    let target = by_id(page, "search-input");
    page.dispatch(&Event::Input {
        target,
        value: value.to_string(),
    })
    .unwrap();
}

#[test]
fn non_empty_query_filters_by_substring() {
    let mut page = page();
    type_query(&mut page, "word");

    assert_eq!(
        visible_titles(&page, "wordPanel"),
        ["Word styles", "Mail merge in Word"]
    );
    assert!(visible_titles(&page, "excelPanel").is_empty());
    // Script content is not searchable text.
    assert!(visible_titles(&page, "htmlPanel").is_empty());
}

#[test]
fn link_target_is_searchable() {
    let mut page = page();
    type_query(&mut page, "/docs/");
    assert_eq!(visible_titles(&page, "wordPanel"), ["Track changes"]);
}

#[test]
fn empty_badges_follow_match_counts() {
    let mut page = page();
    let SearchOutcome::Applied(report) = page.search("word").unwrap() else {
        panic!("first search must apply");
    };

    let word = report.group("word").unwrap();
    assert_eq!((word.matched, word.total, word.empty_badge), (2, 3, false));
    let excel = report.group("excel").unwrap();
    assert_eq!((excel.matched, excel.total, excel.empty_badge), (0, 2, true));
    assert!(report.group("more").is_none());

    assert!(badge(&page, "word").is_none());
    let excel_badge = badge(&page, "excel").unwrap();
    assert!(!has_class(&excel_badge, "hidden"));
    assert_eq!(
        excel_badge.previous_sibling().and_then(|n| attr(&n, "id")).as_deref(),
        Some("excelPanel")
    );

    page.search("pivot").unwrap();
    assert!(!has_class(&badge(&page, "word").unwrap(), "hidden"));
    let reused = badge(&page, "excel").unwrap();
    assert!(has_class(&reused, "hidden"));
    assert_eq!(reused, excel_badge);
}

#[test]
fn clearing_the_query_shows_everything() {
    let mut page = page();
    type_query(&mut page, "word");
    type_query(&mut page, "   ");

    assert_eq!(visible_titles(&page, "wordPanel").len(), 3);
    assert_eq!(visible_titles(&page, "excelPanel").len(), 2);
    assert_eq!(visible_titles(&page, "htmlPanel").len(), 2);
    assert!(has_class(&badge(&page, "excel").unwrap(), "hidden"));
    assert!(page.document().select_first("mark").is_err());
}

#[test]
fn repeated_query_does_not_touch_the_document() {
    let mut page = page();
    type_query(&mut page, "word");
    let first = page.to_html().unwrap();

    assert_eq!(page.search("  WORD ").unwrap(), SearchOutcome::Unchanged);
    type_query(&mut page, "word");
    assert_eq!(page.to_html().unwrap(), first);
    assert_eq!(page.take_reports().len(), 1);
}

#[test]
fn whitespace_and_case_variants_leave_the_document_alone() {
    let mut page = page();
    type_query(&mut page, "word");
    let first = page.to_html().unwrap();

    type_query(&mut page, "  Word ");
    assert_eq!(page.to_html().unwrap(), first);
    assert_eq!(
        attr(&by_id(&page, "search-input"), "value").as_deref(),
        Some("word")
    );
    assert_eq!(page.take_reports().len(), 1);
}

#[test]
fn highlights_round_trip_to_original_text() {
    let mut page = page();
    let before: Vec<String> = items(&page, "wordPanel").iter().map(serialize).collect();

    type_query(&mut page, "word");
    let marks: Vec<String> = by_id(&page, "wordPanel")
        .select("mark.search-hit")
        .unwrap()
        .map(|m| m.text_contents())
        .collect();
    assert_eq!(marks, ["Word", "word", "Word"]);

    type_query(&mut page, "");
    let after: Vec<String> = items(&page, "wordPanel").iter().map(serialize).collect();
    assert_eq!(after, before);
}

#[test]
fn regex_metacharacters_are_literal() {
    let mut page = page();
    type_query(&mut page, "a+b(c");

    assert_eq!(visible_titles(&page, "excelPanel"), ["Formulas"]);
    assert!(visible_titles(&page, "wordPanel").is_empty());
    let mark = by_id(&page, "excelPanel").select_first("mark").unwrap();
    assert_eq!(mark.text_contents(), "a+b(c");
}

#[test]
fn search_opens_collapsed_panels_and_leaves_them_open() {
    let mut page = page();
    assert_eq!(page.accordions().is_expanded("word"), Some(false));

    type_query(&mut page, "pivot");
    for (name, panel) in [("word", "wordPanel"), ("excel", "excelPanel"), ("html", "htmlPanel")] {
        assert_eq!(page.accordions().is_expanded(name), Some(true));
        assert!(!has_class(&by_id(&page, panel), "hidden"));
    }
    assert_eq!(attr(&by_id(&page, "wordBtn"), "aria-expanded").as_deref(), Some("true"));

    type_query(&mut page, "");
    assert_eq!(page.accordions().is_expanded("word"), Some(true));

    click(&mut page, "wordBtn");
    assert_eq!(page.accordions().is_expanded("word"), Some(false));
    assert!(has_class(&by_id(&page, "wordPanel"), "hidden"));
}

#[test]
fn escape_collapses_the_focused_panel_only() {
    let mut page = page();
    let link = by_id(&page, "wordPanel").select_first("a").unwrap().as_node().clone();
    click(&mut page, "wordBtn");
    click(&mut page, "excelBtn");

    page.dispatch(&Event::Click { target: link.clone() }).unwrap();
    assert_eq!(page.focused(), Some(&link));
    page.dispatch(&Event::KeyDown {
        key: "Escape".to_string(),
        target: None,
    })
    .unwrap();

    assert_eq!(page.accordions().is_expanded("word"), Some(false));
    assert_eq!(page.accordions().is_expanded("excel"), Some(true));
}

#[test]
fn menu_trigger_twice_returns_focus_to_trigger() {
    let mut page = page();
    let button = by_id(&page, "menu-btn");

    click(&mut page, "menu-btn");
    assert_eq!(page.menu().unwrap().state(), MenuState::Open);
    assert_eq!(attr(&button, "aria-expanded").as_deref(), Some("true"));
    let focused = page.focused().cloned().unwrap();
    assert_eq!(attr(&focused, "href").as_deref(), Some("#word"));

    click(&mut page, "menu-btn");
    assert_eq!(page.menu().unwrap().state(), MenuState::Closed);
    assert_eq!(attr(&button, "aria-expanded").as_deref(), Some("false"));
    assert_eq!(attr(&button, "aria-label").as_deref(), Some("Open main menu"));
    assert!(has_class(&by_id(&page, "menu"), "hidden"));
    assert_eq!(page.focused(), Some(&button));
}

#[test]
fn menu_closes_on_outside_click_and_narrow_link() {
    let mut page = page();
    click(&mut page, "menu-btn");
    click(&mut page, "main");
    assert_eq!(page.menu().unwrap().state(), MenuState::Closed);

    page.dispatch(&Event::Resize { width: 480 }).unwrap();
    click(&mut page, "menu-btn");
    let link = by_id(&page, "primary-navigation")
        .select_first("a")
        .unwrap()
        .as_node()
        .clone();
    page.dispatch(&Event::Click { target: link.clone() }).unwrap();

    assert_eq!(page.menu().unwrap().state(), MenuState::Closed);
    assert_eq!(page.focused(), Some(&link));
}

#[test]
fn theme_toggle_persists_and_ignores_system_afterwards() {
    let mut page = page();
    let root = page.document().select_first("html").unwrap().as_node().clone();
    assert_eq!(page.theme().unwrap().current(), Theme::Light);

    page.dispatch(&Event::ColorSchemeChange { prefers_dark: true })
        .unwrap();
    assert_eq!(attr(&root, "data-theme").as_deref(), Some("dark"));
    assert_eq!(page.environment().store.get("theme"), None);

    click(&mut page, "theme-toggle");
    assert_eq!(page.theme().unwrap().current(), Theme::Light);
    assert_eq!(page.environment().store.get("theme").as_deref(), Some("light"));

    page.dispatch(&Event::ColorSchemeChange { prefers_dark: true })
        .unwrap();
    assert_eq!(attr(&root, "data-theme").as_deref(), Some("light"));
    assert!(!has_class(&root, "dark"));
}

#[test]
fn missing_markup_installs_nothing() {
    let mut page = Page::parse(
        "<html><body><p id=\"x\">plain</p></body></html>",
        &PageConfig::default(),
        Environment::new(MemoryStore::default()).with_prefers_dark(true),
    );
    let before = page.to_html().unwrap();

    assert!(page.menu().is_none());
    assert!(page.search_engine().is_none());
    assert!(page.accordions().is_empty());
    assert_eq!(page.search("x").unwrap(), SearchOutcome::Unchanged);

    let target = by_id(&page, "x");
    page.dispatch(&Event::Click { target }).unwrap();
    page.dispatch(&Event::KeyDown {
        key: "Escape".to_string(),
        target: None,
    })
    .unwrap();
    assert_eq!(page.to_html().unwrap(), before);
    // The root element always exists, so the theme still follows the system.
    assert_eq!(page.theme().unwrap().current(), Theme::Dark);
}

#[test]
fn cli_replays_events_and_persists_theme() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("guides.html");
    let events = tmp.path().join("events.json");
    let state = tmp.path().join("prefs.json");
    std::fs::write(&input, GUIDES).unwrap();
    std::fs::write(
        &events,
        r##"[
  {"type": "click", "target": "#theme-toggle"},
  {"type": "input", "value": "Word"},
  {"type": "input", "value": "word "},
  {"type": "click", "target": "#menu-btn"},
  {"type": "key", "key": "Escape"}
]"##,
    )
    .unwrap();

    let args = page_behaviors::CliArgs {
        input: input.clone(),
        events: Some(events),
        out: None,
        config: None,
        state: Some(state.clone()),
        viewport_width: 1024,
        prefers_dark: false,
        report: false,
        progress: page_behaviors::ProgressMode::Never,
    };
    page_behaviors::run(args).unwrap();

    let out = tmp.path().join("guides.out.html");
    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("data-theme=\"dark\""));
    assert!(html.contains("<mark class=\"search-hit\">Word</mark>"));
    assert!(html.contains("No matching items."));
    assert!(std::fs::read_to_string(&state).unwrap().contains("\"dark\""));

    // A second run without events keeps the persisted choice.
    let out_again = tmp.path().join("again").join("page.html");
    let args = page_behaviors::CliArgs {
        input,
        events: None,
        out: Some(out_again.clone()),
        config: None,
        state: Some(state),
        viewport_width: 1024,
        prefers_dark: false,
        report: true,
        progress: page_behaviors::ProgressMode::Never,
    };
    page_behaviors::run(args).unwrap();
    let html = std::fs::read_to_string(&out_again).unwrap();
    assert!(html.contains("data-theme=\"dark\""));
    assert!(!html.contains("<mark"));
}

#[test]
fn cli_reports_unknown_targets() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("guides.html");
    let events = tmp.path().join("events.json");
    std::fs::write(&input, GUIDES).unwrap();
    std::fs::write(&events, r##"[{"type": "click", "target": "#nope"}]"##).unwrap();

    let args = page_behaviors::CliArgs {
        input,
        events: Some(events),
        out: None,
        config: None,
        state: None,
        viewport_width: 1024,
        prefers_dark: false,
        report: false,
        progress: page_behaviors::ProgressMode::Never,
    };
    let err = page_behaviors::run(args).unwrap_err();
    assert!(format!("{err:#}").contains("#nope"));
}
