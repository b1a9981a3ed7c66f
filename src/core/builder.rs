use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::controller::{ControllerParams, LifecycleController, Shared};
use super::manager::AdManager;
use super::stage::Stage;
use crate::{
    core::ManagerConfig,
    events::Bus,
    policies::Category,
    provider::GatewayRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`AdManager`].
pub struct AdManagerBuilder {
    gateway: GatewayRef,
    cfg: ManagerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl AdManagerBuilder {
    /// Creates a builder with default configuration and no subscribers.
    pub fn new(gateway: GatewayRef) -> Self {
        Self {
            gateway,
            cfg: ManagerConfig::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: ManagerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues; a slow subscriber never stalls a controller.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the manager: bus, stage, one controller per category and the
    /// subscriber listener.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(self) -> Arc<AdManager> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();
        let stage = Stage::new();
        let auto_refresh = Arc::new(AtomicBool::new(self.cfg.enable_auto_refresh));

        let shared = Shared {
            gateway: self.gateway,
            bus: bus.clone(),
            stage: Arc::clone(&stage),
            auto_refresh: Arc::clone(&auto_refresh),
            runtime_token: runtime_token.clone(),
        };
        let retry = self.cfg.retry_policy();
        let controllers = Category::ALL.map(|category| {
            LifecycleController::new(
                ControllerParams {
                    policy: self.cfg.policy_for(category),
                    retry,
                    unit_id: self.cfg.unit_id(category),
                },
                shared.clone(),
            )
        });

        let listener = (!self.subscribers.is_empty()).then(|| {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            subscriber_listener(&bus, subs, runtime_token.clone())
        });

        Arc::new(AdManager::new_internal(
            self.cfg,
            bus,
            controllers,
            stage,
            auto_refresh,
            runtime_token,
            listener,
        ))
    }
}

/// Forwards bus events to `subs` until `token` is cancelled, then drains what is
/// left and waits for every subscriber worker.
fn subscriber_listener(bus: &Bus, subs: SubscriberSet, token: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        while let Ok(ev) = rx.try_recv() {
            subs.emit(&ev);
        }
        subs.shutdown().await;
    })
}
