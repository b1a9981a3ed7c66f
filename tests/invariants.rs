mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use adkeeper::{AdManager, Category, EntryState, LoadError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time;

use common::{assert_released_once, manager, settle, ScriptedGateway};

const PLACEMENTS: [&str; 3] = ["alpha", "beta", "gamma"];

async fn check_invariants(m: &AdManager, max_attempts: u32) {
    let mut showing = 0;
    for category in Category::ALL {
        let entries = m.entries(category).await;
        let unique: HashSet<&str> = entries.iter().map(|e| &**e.placement()).collect();
        assert_eq!(unique.len(), entries.len(), "duplicate placement in {category}");

        for e in &entries {
            assert_eq!(e.category(), category);
            assert!(e.attempts() <= max_attempts, "attempts {} > cap", e.attempts());
            match e.state() {
                EntryState::Ready => {
                    assert!(e.handle().is_some(), "ready without handle");
                    assert!(e.loaded_at().is_some(), "ready without timestamp");
                }
                EntryState::Showing => {
                    assert!(category.is_full_screen());
                    showing += 1;
                }
                EntryState::Empty | EntryState::Loading | EntryState::Failed => {
                    assert!(e.loaded_at().is_none());
                }
            }
        }
    }
    assert!(showing <= 1, "{showing} full-screen resources showing");
}

#[tokio::test(start_paused = true)]
async fn random_operations_keep_invariants() {
    for seed in [7_u64, 42, 1337] {
        let mut rng = StdRng::seed_from_u64(seed);
        let gw = ScriptedGateway::new();
        gw.set_load_latency(Duration::from_millis(700));
        gw.set_present_latency(Duration::from_secs(3));
        let m = manager(&gw);
        let max_attempts = m.config().max_attempts;
        let mut shows: Vec<JoinHandle<()>> = Vec::new();

        for _ in 0..300 {
            let placement = PLACEMENTS[rng.gen_range(0..PLACEMENTS.len())];
            let category = Category::ALL[rng.gen_range(0..Category::ALL.len())];
            if rng.gen_bool(0.25) {
                gw.fail_next(1, LoadError::NoFill);
            }

            match rng.gen_range(0..10) {
                0..=2 => m.request_load(placement, category).await,
                3 => {
                    let _ = m.resource_for(placement, category).await;
                }
                4 => {
                    let m = Arc::clone(&m);
                    shows.push(tokio::spawn(async move {
                        let _ = m.show(placement, category).await;
                    }));
                }
                5 => m.dispose(placement, category).await,
                6 => {
                    let _ = m.schedule_refresh(placement, category, None).await;
                }
                7 => m.set_visible(placement, category, rng.gen_bool(0.5)).await,
                _ => time::advance(Duration::from_millis(rng.gen_range(0..8_000))).await,
            }
            settle().await;
            check_invariants(&m, max_attempts).await;
            assert_released_once(&gw.released());
        }

        m.shutdown().await;
        time::advance(Duration::from_secs(10)).await;
        settle().await;
        for show in shows {
            show.await.expect("show task");
        }

        let mut released = gw.released();
        released.sort_unstable();
        assert_released_once(&released);
        assert_eq!(released, gw.issued(), "seed {seed}: leaked or foreign handle");
    }
}
