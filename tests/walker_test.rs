//! Whole-document behavior of the walker on a realistic page.
//!
//! The fixture mixes prose with the regions that must never change: code,
//! form controls, navigation, links, hidden and download chrome.

use bionic::dom::{Dom, NodeId, parse_html, serialize, serialize_document};
use bionic::walker::count_markers;
use bionic::{Classifier, IntensityLevel, MARKER_CLASS, PageContext, Walker, bionic_html, strip_html};
use proptest::prelude::*;

const ARTICLE: &str = include_str!("fixtures/article.html");

fn walker(level: IntensityLevel) -> Walker {
    Walker::new(Classifier::standard().unwrap(), level)
}

fn elements<'a>(dom: &'a Dom, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
    dom.descendants(dom.document())
        .into_iter()
        .filter(move |&id| dom.element_name(id).is_some_and(|n| &**n == tag))
}

fn first(dom: &Dom, tag: &str) -> NodeId {
    elements(dom, tag).next().unwrap()
}

#[test]
fn test_article_prose_is_emphasized() {
    let mut dom = parse_html(ARTICLE);
    let root = dom.document();
    let wrapped = walker(IntensityLevel::Focus).apply(&mut dom, root);
    assert!(wrapped > 0);

    let h1 = first(&dom, "h1");
    assert_eq!(count_markers(&dom, h1), 1);
    assert_eq!(count_markers(&dom, first(&dom, "blockquote")), 1);
    let footer_p = elements(&dom, "p").last().unwrap();
    assert_eq!(count_markers(&dom, footer_p), 1);
    assert_eq!(dom.text_content(footer_p), "Written in 2024.");
}

#[test]
fn test_article_protected_regions_are_byte_identical() {
    let original = parse_html(ARTICLE);
    let mut dom = parse_html(ARTICLE);
    let root = dom.document();
    walker(IntensityLevel::Deep).apply(&mut dom, root);

    for tag in ["head", "nav", "pre", "textarea", "button", "a", "img"] {
        let before: Vec<_> = elements(&original, tag).map(|id| serialize(&original, id)).collect();
        let after: Vec<_> = elements(&dom, tag).map(|id| serialize(&dom, id)).collect();
        assert_eq!(before, after, "<{tag}> changed");
    }

    for id in dom.descendants(dom.document()) {
        let hidden = dom.get_attr(id, "aria-hidden") == Some("true");
        let download = dom.has_class(id, "download-box");
        if hidden || download {
            assert_eq!(count_markers(&dom, id), 0);
        }
    }
}

#[test]
fn test_inline_code_inside_prose_is_skipped() {
    let mut dom = parse_html(ARTICLE);
    let root = dom.document();
    walker(IntensityLevel::Focus).apply(&mut dom, root);

    let p = elements(&dom, "p")
        .find(|&p| dom.text_content(p).starts_with("Inline"))
        .unwrap();
    // the two prose runs; code, link text and the lone "." are not
    assert_eq!(count_markers(&dom, p), 2);
    assert_eq!(dom.text_content(first(&dom, "code")), "fn main() { println!(\"left alone\"); }");
}

#[test]
fn test_apply_twice_changes_nothing() {
    let mut dom = parse_html(ARTICLE);
    let w = walker(IntensityLevel::Glance);
    let root = dom.document();
    w.apply(&mut dom, root);
    let once = serialize_document(&dom);
    assert_eq!(w.apply(&mut dom, root), 0);
    assert_eq!(serialize_document(&dom), once);
}

#[test]
fn test_no_marker_inside_a_marker() {
    let mut dom = parse_html(ARTICLE);
    let w = walker(IntensityLevel::Focus);
    let root = dom.document();
    w.apply(&mut dom, root);
    w.apply(&mut dom, root);
    for id in dom.descendants(root) {
        if dom.is_element(id) && dom.has_class(id, MARKER_CLASS) {
            assert!(
                !dom.ancestors(id).any(|a| dom.is_element(a) && dom.has_class(a, MARKER_CLASS)),
                "nested marker"
            );
        }
    }
}

#[test]
fn test_reversal_restores_document() {
    let original = parse_html(ARTICLE);
    let mut dom = parse_html(ARTICLE);
    let root = dom.document();
    let wrapped = walker(IntensityLevel::Deep).apply(&mut dom, root);

    assert_eq!(bionic::Walker::remove_effects(&mut dom, root), wrapped);
    assert_eq!(count_markers(&dom, root), 0);
    assert_eq!(serialize_document(&dom), serialize_document(&original));
}

#[test]
fn test_string_helpers() {
    let html = bionic_html(ARTICLE, IntensityLevel::Focus, None).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("class=\"bionic-processed\""));

    let stripped = strip_html(&html);
    assert!(!stripped.contains("bionic-"));
    assert_eq!(stripped, serialize_document(&parse_html(ARTICLE)));
}

#[test]
fn test_search_results_page_keeps_results() {
    let html = r#"<div id="search"><div class="g"><h3>Result title</h3><div class="VwiC3b">Snippet words</div></div></div>
                  <div id="rhs"><p>Knowledge panel</p></div>"#;
    let mut dom = parse_html(html);
    let context = PageContext::from_url("https://www.google.com/search?q=bionic").unwrap();
    let w = Walker::new(Classifier::new(context).unwrap(), IntensityLevel::Focus);
    let root = dom.document();
    assert_eq!(w.apply(&mut dom, root), 1);
    assert_eq!(count_markers(&dom, first(&dom, "p")), 1);

    let elsewhere = bionic_html(html, IntensityLevel::Focus, Some("https://duckduckgo.com/?q=x")).unwrap();
    assert_eq!(elsewhere.matches("bionic-processed").count(), 3);
}

fn paragraph() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[A-Za-z]{1,12}",
            "[0-9]{1,4}",
            Just("the".to_string()),
            Just("&amp;".to_string()),
            Just("<em>marked</em>".to_string()),
            Just("<code>x_y</code>".to_string()),
            Just(", ".to_string()),
            Just(". ".to_string()),
        ],
        1..20,
    )
    .prop_map(|parts| format!("<p>{}</p>", parts.join(" ")))
}

proptest! {
    #[test]
    fn prop_text_survives_emphasis(body in paragraph()) {
        let original = parse_html(&body);
        let mut dom = parse_html(&body);
        let root = dom.document();
        walker(IntensityLevel::Focus).apply(&mut dom, root);
        prop_assert_eq!(dom.text_content(dom.body()), original.text_content(original.body()));
    }

    #[test]
    fn prop_strip_undoes_emphasis(body in paragraph()) {
        let once = bionic_html(&body, IntensityLevel::Deep, None).unwrap();
        let twice = bionic_html(&once, IntensityLevel::Deep, None).unwrap();
        prop_assert_eq!(&twice, &once);
        prop_assert_eq!(strip_html(&once), serialize_document(&parse_html(&body)));
    }
}
