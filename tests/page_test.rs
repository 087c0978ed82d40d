//! End-to-end behavior of a hosted page driven by commands, the courier and
//! host events.

use bionic::command::{Delivery, LOAD_SETTLE_MS, RETRY_DELAY_MS};
use bionic::dom::{NodeId, Range, parse_html};
use bionic::selection::{SELECTION_DEBOUNCE_MS, Selection};
use bionic::store::MAX_DOMAIN_PROFILES;
use bionic::walker::count_markers;
use bionic::{
    Command, Courier, DocumentObserver, DomainProfile, EffectState, IntensityLevel, MARKER_CLASS,
    MemoryStore, Page, ProcessingMode, Settings, SettingsStore, TabWatcher,
};

const ARTICLE: &str = include_str!("fixtures/article.html");
const URL: &str = "https://reader.example/posts/quick";

fn page(settings: Settings) -> Page<MemoryStore> {
    Page::new(parse_html(ARTICLE), URL, MemoryStore::new(settings)).unwrap()
}

fn enabled() -> Settings {
    Settings {
        enabled: true,
        ..Settings::default()
    }
}

fn markers(page: &Page<MemoryStore>) -> usize {
    count_markers(page.dom(), page.dom().document())
}

fn first_paragraph_text(page: &Page<MemoryStore>) -> NodeId {
    let dom = page.dom();
    let p = dom.find_by_tag("p").unwrap();
    dom.children(p).next().unwrap()
}

#[test]
fn test_full_to_selection_clears_page_until_a_selection_is_transformed() {
    let mut p = page(enabled());
    p.load().unwrap();
    assert_eq!(p.effect_state(), Some(EffectState::EnabledFull));
    assert!(markers(&p) > 0);

    let t = p.handle(&Command::toggle(false)).unwrap();
    assert_eq!(t.after, EffectState::Disabled);
    assert_eq!(markers(&p), 0);

    let t = p
        .handle(&Command::Toggle {
            enabled: true,
            mode: Some(ProcessingMode::Selection),
            is_whitelisted: None,
            is_blacklisted: None,
        })
        .unwrap();
    assert_eq!(t.after, EffectState::EnabledSelection);
    assert_eq!(t.applied, 0);
    assert_eq!(markers(&p), 0);

    let text = first_paragraph_text(&p);
    let range = Range::over_text(p.dom(), text);
    p.selection_changed(Some(Selection {
        range,
        rect: Default::default(),
    }));
    p.advance(SELECTION_DEBOUNCE_MS);
    assert!(p.toolbar().is_some());
    assert_eq!(p.transform_selection(), 1);
    assert_eq!(markers(&p), 1);

    let saved = p.store().load();
    assert_eq!(saved.mode, ProcessingMode::Selection);
    assert!(saved.domain_settings["reader.example"].enabled);
}

#[test]
fn test_selection_debounce_restarts_on_each_change() {
    let mut p = page(Settings {
        enabled: true,
        mode: ProcessingMode::Selection,
        ..Settings::default()
    });
    p.load().unwrap();
    let text = first_paragraph_text(&p);
    let selection = Selection {
        range: Range::over_text(p.dom(), text),
        rect: Default::default(),
    };

    p.selection_changed(Some(selection));
    p.advance(SELECTION_DEBOUNCE_MS - 1);
    p.selection_changed(Some(selection));
    p.advance(SELECTION_DEBOUNCE_MS - 1);
    assert!(p.toolbar().is_none());
    p.advance(1);
    assert!(p.toolbar().is_some());

    // clicking with the text still selected keeps the toolbar
    p.click(false);
    assert!(p.toolbar().is_some());
    p.selection_changed(None);
    p.click(false);
    assert!(p.toolbar().is_none());
}

#[test]
fn test_courier_retries_until_page_is_ready() {
    let mut p = page(Settings::default());
    let mut courier = Courier::default();

    assert_eq!(courier.send(&mut p, Command::toggle(true)), Delivery::RetryScheduled);
    p.load().unwrap();
    assert_eq!(markers(&p), 0);

    assert!(courier.advance(&mut p, RETRY_DELAY_MS - 1).is_empty());
    assert_eq!(courier.advance(&mut p, 1), [Delivery::Delivered]);
    assert_eq!(p.effect_state(), Some(EffectState::EnabledFull));
    assert!(markers(&p) > 0);
}

#[test]
fn test_courier_drops_after_second_failure() {
    let mut p = page(Settings::default());
    let mut courier = Courier::default();

    courier.send(&mut p, Command::toggle(true));
    assert_eq!(courier.advance(&mut p, RETRY_DELAY_MS), [Delivery::Dropped]);
    assert_eq!(courier.pending(), 0);
    assert!(!p.is_loaded());
}

#[test]
fn test_tab_watcher_enables_after_load() {
    let settings = enabled();
    let mut p = page(Settings::default());
    p.load().unwrap();

    let mut courier = Courier::default();
    let mut tabs = TabWatcher::new();
    assert!(tabs.page_loaded(&settings, &mut courier));
    assert!(!tabs.page_loaded(&settings, &mut courier));

    assert!(courier.advance(&mut p, LOAD_SETTLE_MS - 1).is_empty());
    assert_eq!(courier.advance(&mut p, 1), [Delivery::Delivered]);
    assert_eq!(p.effect_state(), Some(EffectState::EnabledFull));
}

#[test]
fn test_tab_watcher_cannot_enable_blacklisted_host() {
    let mut settings = enabled();
    settings.add_to_blacklist("reader.example");
    let mut p = page(settings.clone());
    p.load().unwrap();
    assert_eq!(p.effect_state(), Some(EffectState::Disabled));

    let mut courier = Courier::default();
    TabWatcher::new().page_loaded(&settings, &mut courier);
    courier.advance(&mut p, LOAD_SETTLE_MS);
    assert_eq!(p.effect_state(), Some(EffectState::Disabled));
    assert_eq!(markers(&p), 0);

    // clearing both flags hands control back to the switch
    p.handle(&Command::Toggle {
        enabled: true,
        mode: None,
        is_whitelisted: Some(false),
        is_blacklisted: Some(false),
    })
    .unwrap();
    assert_eq!(p.effect_state(), Some(EffectState::EnabledFull));
}

#[test]
fn test_whitelisted_host_loads_enabled() {
    let mut settings = Settings::default();
    settings.add_to_whitelist("reader.example");
    let mut p = page(settings);
    p.load().unwrap();
    assert_eq!(p.effect_state(), Some(EffectState::EnabledFull));

    let t = p.handle(&Command::toggle(false)).unwrap();
    assert_eq!(t.after, EffectState::EnabledFull);
}

#[test]
fn test_inserted_content_is_emphasized() {
    let mut p = page(enabled());
    p.load().unwrap();
    let before = markers(&p);

    let main = p.dom().find_by_tag("main").unwrap();
    let dom = p.dom_mut();
    let section = dom.create_html_element("section", &[]);
    let para = dom.create_html_element("p", &[]);
    let text = dom.create_text("Loaded by infinite scroll");
    dom.append(para, text);
    dom.append(section, para);
    dom.append(main, section);

    let ignored = dom.create_html_element("span", &[("class", MARKER_CLASS)]);
    dom.append(main, ignored);
    let detached = dom.create_text("not in the tree");

    p.subtree_inserted(&[section, ignored, detached]);
    // the new paragraph plus the inert span, which is counted but not expanded
    assert_eq!(markers(&p), before + 2);
    assert_eq!(count_markers(p.dom(), ignored), 1);
    assert_eq!(count_markers(p.dom(), section), 1);
}

#[test]
fn test_level_change_rewraps_document() {
    let mut p = page(enabled());
    p.load().unwrap();
    let before = markers(&p);

    let t = p
        .handle(&Command::ChangeBoldLevel {
            level: IntensityLevel::Glance,
        })
        .unwrap();
    assert_eq!(t.removed, before);
    assert_eq!(t.applied, before);
    assert_eq!(markers(&p), before);
    assert_eq!(p.state().unwrap().level, IntensityLevel::Glance);
    assert_eq!(
        p.store().load().domain_settings["reader.example"].bold_level,
        IntensityLevel::Glance
    );
}

#[test]
fn test_profile_store_evicts_least_recent() {
    let mut settings = enabled();
    for i in 0..MAX_DOMAIN_PROFILES as u64 {
        settings.save_profile(
            &format!("site-{i}.test"),
            DomainProfile {
                enabled: false,
                bold_level: IntensityLevel::Focus,
                last_used: i + 1,
            },
        );
    }

    let mut p = page(settings);
    p.load().unwrap();

    let saved = p.store().load();
    assert_eq!(saved.domain_settings.len(), MAX_DOMAIN_PROFILES);
    assert!(saved.domain_settings.contains_key("reader.example"));
    assert!(!saved.domain_settings.contains_key("site-0.test"));
    assert!(saved.domain_settings.contains_key("site-1.test"));
}
