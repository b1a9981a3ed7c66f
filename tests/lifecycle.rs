mod common;

use std::time::Duration;

use adkeeper::{Category, EntryState, EventKind, LoadError, ManagerConfig};
use tokio::time;

use common::{assert_released_once, drain, kinds, manager, manager_with, settle, ScriptedGateway};

#[tokio::test(start_paused = true)]
async fn miss_then_hit_serves_the_cached_handle() {
    let gw = ScriptedGateway::new();
    let m = manager(&gw);

    assert!(m.resource_for("feed", Category::Native).await.is_none());
    settle().await;

    let first = m.resource_for("feed", Category::Native).await.expect("ready");
    let again = m.resource_for("feed", Category::Native).await.expect("ready");
    assert_eq!(first, again);
    assert_eq!(gw.load_count(), 1);
    assert_eq!(m.status_of("feed", Category::Native).await, EntryState::Ready);
}

#[tokio::test(start_paused = true)]
async fn banner_expires_with_its_refresh_interval() {
    let gw = ScriptedGateway::new();
    let m = manager(&gw);

    m.request_load("home", Category::Banner).await;
    settle().await;
    let first = m.resource_for("home", Category::Banner).await.expect("ready");

    time::advance(Duration::from_secs(89)).await;
    assert_eq!(
        m.resource_for("home", Category::Banner).await,
        Some(first.clone())
    );
    assert!(gw.released().is_empty());

    time::advance(Duration::from_secs(1)).await;
    assert!(m.resource_for("home", Category::Banner).await.is_none());
    assert_eq!(gw.released(), vec![first.id()]);

    settle().await;
    let second = m.resource_for("home", Category::Banner).await.expect("reloaded");
    assert_ne!(second.id(), first.id());
    assert_eq!(gw.load_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn native_and_interstitial_never_expire() {
    let gw = ScriptedGateway::new();
    let m = manager(&gw);

    m.request_load("feed", Category::Native).await;
    m.request_load("level_end", Category::Interstitial).await;
    settle().await;

    time::advance(Duration::from_secs(48 * 3600)).await;
    assert!(m.is_available("feed", Category::Native).await);
    assert!(m.is_available("level_end", Category::Interstitial).await);
    assert_eq!(gw.load_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn app_open_expires_after_max_cache_duration() {
    let gw = ScriptedGateway::new();
    let m = manager(&gw);

    m.request_load("splash", Category::AppOpen).await;
    settle().await;

    time::advance(Duration::from_secs(4 * 3600 - 1)).await;
    assert!(m.is_available("splash", Category::AppOpen).await);

    time::advance(Duration::from_secs(1)).await;
    assert!(!m.is_available("splash", Category::AppOpen).await);
    assert_eq!(
        m.show("splash", Category::AppOpen).await.map_err(|e| e.as_label()),
        Err("show_not_available")
    );
}

#[tokio::test(start_paused = true)]
async fn repeated_requests_share_one_load() {
    let gw = ScriptedGateway::new();
    gw.set_load_latency(Duration::from_secs(2));
    let m = manager(&gw);

    for _ in 0..5 {
        m.request_load("shop", Category::Rewarded).await;
        assert!(m.resource_for("shop", Category::Rewarded).await.is_none());
    }
    settle().await;
    assert_eq!(gw.load_count(), 1);
    assert_eq!(m.status_of("shop", Category::Rewarded).await, EntryState::Loading);

    time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(m.status_of("shop", Category::Rewarded).await, EntryState::Ready);

    m.request_load("shop", Category::Rewarded).await;
    settle().await;
    assert_eq!(gw.load_count(), 1, "fresh ready entry is not reloaded");
}

#[tokio::test(start_paused = true)]
async fn bounded_retries_then_explicit_reset() {
    let gw = ScriptedGateway::new();
    gw.fail_next(3, LoadError::NoFill);
    let m = manager(&gw);
    let mut rx = m.subscribe();

    m.request_load("shop", Category::Rewarded).await;
    settle().await;
    let entry = m.entry("shop", Category::Rewarded).await.expect("entry");
    assert_eq!(entry.state(), EntryState::Failed);
    assert_eq!(entry.attempts(), 1);
    assert!(m.has_pending_retry("shop", Category::Rewarded));

    time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(gw.load_count(), 2);

    time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(gw.load_count(), 3);
    let entry = m.entry("shop", Category::Rewarded).await.expect("entry");
    assert_eq!(entry.state(), EntryState::Failed);
    assert_eq!(entry.attempts(), 3);
    assert!(!m.has_pending_retry("shop", Category::Rewarded));

    // Nothing more happens on its own.
    time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(gw.load_count(), 3);

    m.request_load("shop", Category::Rewarded).await;
    settle().await;
    assert_eq!(gw.load_count(), 4);
    let entry = m.entry("shop", Category::Rewarded).await.expect("entry");
    assert_eq!(entry.state(), EntryState::Ready);
    assert_eq!(entry.attempts(), 0);

    let seen = kinds(&drain(&mut rx));
    let count = |k: EventKind| seen.iter().filter(|s| **s == k).count();
    assert_eq!(count(EventKind::LoadFailed), 3);
    assert_eq!(count(EventKind::RetryScheduled), 2);
    assert_eq!(count(EventKind::RetriesExhausted), 1);
    assert_eq!(count(EventKind::RetriesReset), 1);
    assert_eq!(count(EventKind::Loaded), 1);

    let attempts: Vec<u32> = gw.requests().iter().map(|r| r.attempt).collect();
    assert_eq!(attempts, [1, 2, 3, 1]);
}

#[tokio::test(start_paused = true)]
async fn explicit_request_preempts_pending_retry() {
    let gw = ScriptedGateway::new();
    gw.fail_next(1, LoadError::Network { error: "offline".into() });
    let m = manager(&gw);

    m.request_load("feed", Category::Native).await;
    settle().await;
    assert!(m.has_pending_retry("feed", Category::Native));

    m.request_load("feed", Category::Native).await;
    settle().await;
    assert!(!m.has_pending_retry("feed", Category::Native));
    assert_eq!(m.status_of("feed", Category::Native).await, EntryState::Ready);

    time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(gw.load_count(), 2, "cancelled retry never fires");
}

#[tokio::test(start_paused = true)]
async fn dispose_while_loading_discards_late_result() {
    let gw = ScriptedGateway::new();
    gw.set_load_latency(Duration::from_secs(3));
    let m = manager(&gw);
    let mut rx = m.subscribe();

    m.request_load("feed", Category::Native).await;
    settle().await;
    m.dispose("feed", Category::Native).await;
    assert!(m.entry("feed", Category::Native).await.is_none());

    time::advance(Duration::from_secs(3)).await;
    settle().await;

    assert!(m.entry("feed", Category::Native).await.is_none());
    assert_eq!(m.status_of("feed", Category::Native).await, EntryState::Empty);
    assert_eq!(gw.released(), gw.issued());
    assert!(kinds(&drain(&mut rx)).contains(&EventKind::ResultDiscarded));
}

#[tokio::test(start_paused = true)]
async fn dispose_while_loading_discards_late_failure() {
    let gw = ScriptedGateway::new();
    gw.set_load_latency(Duration::from_secs(3));
    gw.fail_next(1, LoadError::NoFill);
    let m = manager(&gw);
    let mut rx = m.subscribe();

    m.request_load("feed", Category::Native).await;
    settle().await;
    m.dispose("feed", Category::Native).await;

    time::advance(Duration::from_secs(3)).await;
    settle().await;

    assert!(m.entry("feed", Category::Native).await.is_none());
    assert!(!m.has_pending_retry("feed", Category::Native));
    let seen = kinds(&drain(&mut rx));
    assert!(seen.contains(&EventKind::ResultDiscarded));
    assert!(!seen.contains(&EventKind::LoadFailed));
    assert!(!seen.contains(&EventKind::RetryScheduled));

    time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(gw.load_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn panicking_load_counts_as_failure() {
    let gw = ScriptedGateway::new();
    gw.panic_next_load();
    let m = manager(&gw);
    let mut rx = m.subscribe();

    m.request_load("feed", Category::Native).await;
    settle().await;
    let entry = m.entry("feed", Category::Native).await.expect("entry");
    assert_eq!(entry.state(), EntryState::Failed);
    assert_eq!(entry.attempts(), 1);
    assert!(m.has_pending_retry("feed", Category::Native));

    let failed = drain(&mut rx)
        .into_iter()
        .find(|e| e.kind == EventKind::LoadFailed)
        .expect("load failed event");
    assert!(failed
        .reason
        .as_deref()
        .is_some_and(|r| r.contains("sdk crashed while loading")));

    time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(gw.load_count(), 2);
    assert_eq!(m.status_of("feed", Category::Native).await, EntryState::Ready);

    // An explicit request also recovers from a crash.
    gw.panic_next_load();
    m.request_load("home", Category::Banner).await;
    settle().await;
    assert_eq!(m.status_of("home", Category::Banner).await, EntryState::Failed);
    m.request_load("home", Category::Banner).await;
    settle().await;
    assert_eq!(m.status_of("home", Category::Banner).await, EntryState::Ready);
    assert_eq!(gw.load_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn reload_after_dispose_ignores_the_superseded_load() {
    let gw = ScriptedGateway::new();
    gw.set_load_latency(Duration::from_secs(3));
    let m = manager(&gw);

    m.request_load("feed", Category::Native).await;
    settle().await;
    time::advance(Duration::from_secs(1)).await;
    m.dispose("feed", Category::Native).await;
    m.request_load("feed", Category::Native).await;
    settle().await;

    // First load lands at t=3 into a newer entry: discarded.
    time::advance(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(m.status_of("feed", Category::Native).await, EntryState::Loading);
    assert_eq!(gw.released().len(), 1);

    time::advance(Duration::from_secs(1)).await;
    settle().await;
    let handle = m.resource_for("feed", Category::Native).await.expect("ready");
    assert!(!gw.released().contains(&handle.id()));
}

#[tokio::test(start_paused = true)]
async fn dispose_is_idempotent_and_cancels_retry() {
    let gw = ScriptedGateway::new();
    gw.fail_next(1, LoadError::NoFill);
    let m = manager(&gw);

    m.request_load("feed", Category::Native).await;
    settle().await;
    assert!(m.has_pending_retry("feed", Category::Native));

    m.dispose("feed", Category::Native).await;
    m.dispose("feed", Category::Native).await;
    m.dispose("never-seen", Category::Native).await;
    assert!(!m.has_pending_retry("feed", Category::Native));

    time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(gw.load_count(), 1);
    assert!(m.entries(Category::Native).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dispose_all_releases_every_handle() {
    let gw = ScriptedGateway::new();
    let m = manager(&gw);

    for p in ["a", "b", "c"] {
        m.request_load(p, Category::Native).await;
        m.request_load(p, Category::Banner).await;
    }
    m.request_load("splash", Category::AppOpen).await;
    settle().await;
    assert_eq!(gw.issued().len(), 7);

    m.dispose_all().await;
    for category in Category::ALL {
        assert!(m.entries(category).await.is_empty());
    }
    let mut released = gw.released();
    released.sort_unstable();
    assert_eq!(released, gw.issued());
    assert_released_once(&released);
}

#[tokio::test(start_paused = true)]
async fn placements_are_independent_per_category() {
    let gw = ScriptedGateway::new();
    let m = manager(&gw);

    m.request_load("shared", Category::Banner).await;
    settle().await;

    assert_eq!(m.status_of("shared", Category::Banner).await, EntryState::Ready);
    assert_eq!(m.status_of("shared", Category::Native).await, EntryState::Empty);
    assert_eq!(m.entries(Category::Banner).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn config_is_applied_to_requests_and_retries() {
    let cfg = ManagerConfig::from_json(
        r#"{ "max_attempts": 1, "retry_delay": 1, "unit_ids": { "rewarded": "unit-rw-7" } }"#,
    )
    .expect("valid config");
    let gw = ScriptedGateway::new();
    gw.fail_next(1, LoadError::NoFill);
    let m = manager_with(&gw, cfg);

    m.request_load("shop", Category::Rewarded).await;
    settle().await;
    assert!(!m.has_pending_retry("shop", Category::Rewarded));
    assert_eq!(m.status_of("shop", Category::Rewarded).await, EntryState::Failed);

    let requests = gw.requests();
    assert_eq!(requests[0].unit_id.as_deref(), Some("unit-rw-7"));
    assert_eq!(&*requests[0].placement, "shop");
    assert_eq!(requests[0].category, Category::Rewarded);
}

#[tokio::test(start_paused = true)]
async fn watch_follows_one_placement() {
    let gw = ScriptedGateway::new();
    let m = manager(&gw);
    let feed = m.placements(Category::Native);
    let mut watch = feed.watch("feed");

    m.request_load("other", Category::Native).await;
    m.request_load("feed", Category::Banner).await;
    assert!(feed.resource_for("feed").await.is_none());

    let started = watch.next().await.expect("event");
    assert_eq!(started.kind, EventKind::LoadStarted);
    let loaded = watch.next().await.expect("event");
    assert_eq!(loaded.kind, EventKind::Loaded);
    assert_eq!(loaded.placement.as_deref(), Some("feed"));
    assert_eq!(watch.placement(), "feed");
}
