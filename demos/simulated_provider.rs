//! # Example: Simulated Provider
//!
//! Drives a manager against a fake ad network with latency and a 30% no-fill
//! rate. Run with `RUST_LOG=adkeeper=debug` to see every transition.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adkeeper::{
    AdHandle, AdManager, Category, DismissReason, EventKind, LoadError, LoadRequest, LogWriter,
    ManagerConfig, ProviderGateway, Reward, ShowError, Subscribe,
};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

struct SimulatedProvider {
    next_id: AtomicU64,
    rng: Mutex<StdRng>,
}

impl SimulatedProvider {
    fn new(seed: u64) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn roll(&self) -> (Duration, bool) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let latency = Duration::from_millis(rng.gen_range(50..400));
        (latency, rng.gen_bool(0.7))
    }
}

#[async_trait]
impl ProviderGateway for SimulatedProvider {
    async fn load(&self, request: LoadRequest) -> Result<AdHandle, LoadError> {
        let (latency, fill) = self.roll();
        tokio::time::sleep(latency).await;
        if !fill {
            return Err(LoadError::NoFill);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        println!("[network] served #{id} for {}/{}", request.category, request.placement);
        Ok(AdHandle::with_payload(id, format!("creative-{id}")))
    }

    async fn present(&self, handle: &AdHandle) -> Result<DismissReason, ShowError> {
        let creative = handle.payload::<String>().map(String::as_str).unwrap_or("?");
        println!("[network] presenting {creative}");
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(DismissReason::Rewarded(Reward {
            kind: "coins".into(),
            amount: 10,
        }))
    }

    fn release(&self, handle: &AdHandle) {
        println!("[network] released #{}", handle.id());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("adkeeper=info")),
        )
        .init();

    let cfg = ManagerConfig::from_json(r#"{ "retry_delay": 1, "max_attempts": 5 }"#)?;
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let manager = AdManager::builder(Arc::new(SimulatedProvider::new(2024)))
        .with_config(cfg)
        .with_subscribers(subs)
        .build();

    let banners = manager.placements(Category::Banner);
    let _ = banners.resource_for("home_footer").await;
    manager
        .schedule_refresh("home_footer", Category::Banner, None)
        .await?;

    let mut watch = manager.placements(Category::Rewarded).watch("shop");
    manager.request_load("shop", Category::Rewarded).await;
    while !manager.is_available("shop", Category::Rewarded).await {
        match watch.next().await {
            Some(ev) if ev.kind == EventKind::RetriesExhausted => break,
            Some(_) => {}
            None => break,
        }
    }

    match manager.show("shop", Category::Rewarded).await {
        Ok(DismissReason::Rewarded(reward)) => println!("[app] earned {} {}", reward.amount, reward.kind),
        Ok(DismissReason::Closed) => println!("[app] closed without reward"),
        Err(err) => println!("[app] show failed: {}", err.as_message()),
    }

    println!(
        "[app] banner: {}, rewarded: {}",
        banners.status_of("home_footer").await,
        manager.status_of("shop", Category::Rewarded).await
    );

    manager.shutdown().await;
    Ok(())
}
