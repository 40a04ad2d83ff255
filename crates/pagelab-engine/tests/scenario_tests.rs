//! End-to-end scenarios over the stock ChargePerks registry
//!
//! Each test wires a scripted page, an in-process flag source, and a
//! recording sink through the real orchestrator.

use pagelab_dom::Document;
use pagelab_engine::{EngineConfig, ExperimentRegistry, Orchestrator, StartOutcome};
use pagelab_flags::{FlagSnapshot, LocalFlagSource};
use pagelab_test_utils::{chargeperks_page, RecordingSink};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn orchestrator_with(
    page: &pagelab_test_utils::ChargeperksPage,
    flags: Arc<LocalFlagSource>,
    sink: Arc<RecordingSink>,
) -> Orchestrator {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Orchestrator::with_sink(
        page.doc.clone(),
        flags,
        sink,
        ExperimentRegistry::chargeperks(),
        EngineConfig::new(),
    )
}

async fn start_expecting_run(orchestrator: &Orchestrator) -> pagelab_engine::RunSummary {
    match orchestrator.start().await.unwrap() {
        StartOutcome::Ran(summary) => summary,
        StartOutcome::Inactive(activation) => panic!("unexpectedly inactive: {activation:?}"),
    }
}

#[tokio::test]
async fn cta_variant_c_rewrites_the_button_and_emits_a_view() {
    let page = chargeperks_page();
    let flags = Arc::new(LocalFlagSource::ready_with(
        FlagSnapshot::new().with("chargeperk-cta-text", "C"),
    ));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator_with(&page, flags, sink.clone());

    let summary = start_expecting_run(&orchestrator).await;

    assert_eq!(summary.applied, 1);
    assert_eq!(page.doc.text(page.cta).unwrap(), "GET STARTED");

    let views = sink.named("cta-button-view");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].payload["test"], "chargeperk-cta-text");
    assert_eq!(views[0].payload["variation"], "C");
    assert_eq!(views[0].payload["originalText"], "ENROLL NOW");
    assert_eq!(views[0].payload["newText"], "GET STARTED");
}

#[tokio::test]
async fn program_destination_b_rewrites_links_and_records_originals() {
    let page = chargeperks_page();
    let flags = Arc::new(LocalFlagSource::ready_with(
        FlagSnapshot::new().with("program-destination", "B"),
    ));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator_with(&page, flags, sink.clone());

    start_expecting_run(&orchestrator).await;

    assert_eq!(
        page.doc.attribute(page.pge_link, "href").unwrap().unwrap(),
        "https://charge.weavegrid.com/pge/"
    );
    assert_eq!(
        page.doc
            .attribute(page.pge_link, "data-original-url")
            .unwrap()
            .unwrap(),
        "https://old.example/"
    );
    // The other program links are rewritten by the same variant.
    assert_eq!(
        page.doc.attribute(page.sce_link, "href").unwrap().unwrap(),
        "https://charge.weavegrid.com/sce/"
    );

    let views = sink.named("program-link-view");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].payload["elements"], 3);
}

#[tokio::test]
async fn cta_click_carries_the_variation_current_at_click_time() {
    let page = chargeperks_page();
    let flags = Arc::new(LocalFlagSource::ready_with(
        FlagSnapshot::new().with("chargeperk-cta-text", "C"),
    ));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator_with(&page, flags.clone(), sink.clone());

    start_expecting_run(&orchestrator).await;
    let tracker = orchestrator.click_tracker();

    // The flag moves after page load; the click must see the new value.
    flags.set("chargeperk-cta-text", "D");

    let emitted = tracker.handle_click(page.cta).await;
    assert_eq!(emitted, 1);

    let clicks = sink.named("cta-button-click");
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].payload["variation"], "D");
    assert_eq!(clicks[0].payload["text"], "GET STARTED");
    assert_eq!(clicks[0].payload["id"], "chargeperk-cta-button");
}

#[tokio::test]
async fn program_link_click_reports_original_and_current_urls() {
    let page = chargeperks_page();
    let flags = Arc::new(LocalFlagSource::ready_with(
        FlagSnapshot::new().with("program-destination", "B"),
    ));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator_with(&page, flags, sink.clone());

    start_expecting_run(&orchestrator).await;
    let tracker = orchestrator.click_tracker();

    let emitted = tracker.handle_click(page.pge_link).await;
    assert_eq!(emitted, 1);

    let clicks = sink.named("program-link-click");
    assert_eq!(clicks[0].payload["originalUrl"], "https://old.example/");
    assert_eq!(
        clicks[0].payload["newUrl"],
        "https://charge.weavegrid.com/pge/"
    );
}

#[tokio::test]
async fn clicks_on_unrelated_elements_emit_nothing() {
    let page = chargeperks_page();
    let flags = Arc::new(LocalFlagSource::ready_with(FlagSnapshot::new()));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator_with(&page, flags, sink.clone());

    start_expecting_run(&orchestrator).await;
    let tracker = orchestrator.click_tracker();

    assert_eq!(tracker.handle_click(page.banner).await, 0);
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn repeated_passes_with_the_same_snapshot_are_a_fixed_point() {
    let page = chargeperks_page();
    let snapshot = FlagSnapshot::new()
        .with("chargeperk-cta-text", "C")
        .with("chargeperk-banner-message", "B")
        .with("section-layout", "B");
    let flags = Arc::new(LocalFlagSource::ready_with(snapshot.clone()));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator_with(&page, flags, sink);

    start_expecting_run(&orchestrator).await;

    let text_after_one = page.doc.text(page.cta).unwrap();
    let banner_after_one = page.doc.text(page.banner).unwrap();
    let order_after_one = page.doc.children(page.sections_container).unwrap();

    // Sections are swapped pairwise relative to the original order.
    assert_eq!(
        order_after_one,
        vec![
            page.sections[1],
            page.sections[0],
            page.sections[3],
            page.sections[2]
        ]
    );

    orchestrator.run_all(&snapshot).await;

    assert_eq!(page.doc.text(page.cta).unwrap(), text_after_one);
    assert_eq!(page.doc.text(page.banner).unwrap(), banner_after_one);
    assert_eq!(
        page.doc.children(page.sections_container).unwrap(),
        order_after_one
    );
}

#[tokio::test]
async fn second_pass_resolves_elements_from_the_cache() {
    let page = chargeperks_page();
    let snapshot = FlagSnapshot::new().with("chargeperk-cta-text", "C");
    let flags = Arc::new(LocalFlagSource::ready_with(snapshot.clone()));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator_with(&page, flags, sink);

    start_expecting_run(&orchestrator).await;
    let lookups_after_first = page.doc.lookup_count();
    assert!(lookups_after_first > 0);

    orchestrator.run_all(&snapshot).await;
    assert_eq!(page.doc.lookup_count(), lookups_after_first);
}

#[tokio::test]
async fn change_notifications_trigger_fresh_passes_in_order() {
    let page = chargeperks_page();
    let flags = Arc::new(LocalFlagSource::ready_with(FlagSnapshot::new()));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = Arc::new(orchestrator_with(&page, flags.clone(), sink));

    let driver = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.run().await })
    };

    // Let the first pass finish, then move a flag.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(page.doc.text(page.cta).unwrap(), "ENROLL NOW");

    flags.set("chargeperk-cta-text", "B");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(page.doc.text(page.cta).unwrap(), "RESERVE SPOT");

    flags.set("chargeperk-cta-text", "D");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(page.doc.text(page.cta).unwrap(), "START EARNING");

    driver.abort();
}

#[tokio::test]
async fn hero_media_boolean_flag_swaps_image_for_video() {
    let page = chargeperks_page();
    let flags = Arc::new(LocalFlagSource::ready_with(
        FlagSnapshot::new().with("chargeperk-hero-media", true),
    ));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator_with(&page, flags, sink);

    start_expecting_run(&orchestrator).await;

    assert!(!page.doc.visible(page.hero_image).unwrap());
    assert!(page.doc.visible(page.hero_video).unwrap());
}

#[tokio::test]
async fn page_version_b_tracks_then_requests_the_redirect() {
    let page = chargeperks_page();
    let flags = Arc::new(LocalFlagSource::ready_with(
        FlagSnapshot::new().with("chargeperk-page-version", "B"),
    ));
    let sink = Arc::new(RecordingSink::new());
    let orchestrator = orchestrator_with(&page, flags, sink.clone());

    start_expecting_run(&orchestrator).await;

    assert_eq!(page.doc.navigations(), vec!["/chargeperks-b"]);
    let events = sink.named("page-version-redirect");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload["fromPath"], "/chargeperks");
    assert_eq!(events[0].payload["toPath"], "/chargeperks-b");
}
