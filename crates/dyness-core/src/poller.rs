// ── Polling coordinator ──
//
// Owns the signed client and the shared snapshot cell. One refresh
// cycle performs four independent fetches, tolerates per-fetch
// failure, and publishes exactly one structurally-complete snapshot.
// Readers subscribe through a watch channel and only ever observe a
// whole snapshot, never a partially-written one.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use serde_json::Map;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dyness_api::DynessClient;

use crate::config::PollerConfig;
use crate::error::CoreError;
use crate::snapshot::{Snapshot, latest_power_record, module_sn_candidate, point_map};

/// The polling coordinator.
///
/// Cheaply cloneable via `Arc`. Construct with [`Poller::new`], then
/// either drive cycles manually with [`refresh`](Self::refresh) or call
/// [`start`](Self::start) for the fixed-interval background task.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    config: PollerConfig,
    client: DynessClient,
    /// Module serial adopted from the first BMS response carrying one.
    /// Write-once: later cycles and concurrent discovery attempts are
    /// no-ops. A configured `sn_module` bypasses this entirely.
    discovered_module: OnceLock<String>,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    last_error: watch::Sender<Option<Arc<CoreError>>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    /// Create a poller; builds the signed client from the config.
    pub fn new(config: PollerConfig) -> Result<Self, CoreError> {
        let client = DynessClient::with_timeout(
            config.credentials.api_id.clone(),
            config.credentials.api_secret.clone(),
            config.region,
            config.timeout,
        )?;
        Ok(Self::with_client(config, client))
    }

    /// Create a poller around a pre-built client.
    ///
    /// Used by tests to point at a mock server; [`Poller::new`] is the
    /// production path.
    pub fn with_client(config: PollerConfig, client: DynessClient) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        let (last_error, _) = watch::channel(None);

        Self {
            inner: Arc::new(PollerInner {
                config,
                client,
                discovered_module: OnceLock::new(),
                snapshot_tx,
                last_error,
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    /// The poller configuration.
    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    /// The effective module serial: configured value first, then the
    /// auto-discovered one, if any.
    pub fn module_sn(&self) -> Option<String> {
        self.inner
            .config
            .sn_module
            .clone()
            .or_else(|| self.inner.discovered_module.get().cloned())
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Verify credentials and connectivity with a single device-detail
    /// call. Unlike [`refresh`](Self::refresh) there is no failure
    /// isolation here: any error surfaces to the caller immediately.
    pub async fn verify(&self) -> Result<Map<String, serde_json::Value>, CoreError> {
        let detail = self.inner.client.storage_detail(&self.inner.config.sn_bms).await?;
        Ok(detail)
    }

    // ── One polling cycle ────────────────────────────────────────────

    /// Run one refresh cycle and publish the result.
    ///
    /// The four fetches are issued concurrently and fail independently;
    /// a failed fetch degrades its section to an empty map. The
    /// returned snapshot always carries all four sections. The
    /// last-error indicator is set only when every fetch of the cycle
    /// failed, and cleared otherwise.
    pub async fn refresh(&self) -> Arc<Snapshot> {
        let config = &self.inner.config;
        let client = &self.inner.client;
        let mut errors: Vec<CoreError> = Vec::new();

        let (device_res, power_res, bms_res, dongle_res) = tokio::join!(
            client.storage_detail(&config.sn_bms),
            client.latest_power(&config.sn_bms),
            client.realtime_points(&config.sn_bms),
            client.realtime_points(&config.sn_dongle),
        );

        let device = match device_res {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "device detail fetch failed");
                errors.push(e.into());
                Map::new()
            }
        };

        let power = match power_res {
            Ok(records) => latest_power_record(&records),
            Err(e) => {
                warn!(error = %e, "power data fetch failed");
                errors.push(e.into());
                Map::new()
            }
        };

        let bms = match bms_res {
            Ok(points) => point_map(points),
            Err(e) => {
                warn!(error = %e, "BMS realtime fetch failed");
                errors.push(e.into());
                Map::new()
            }
        };

        let dongle = match dongle_res {
            Ok(points) => point_map(points),
            Err(e) => {
                warn!(error = %e, "dongle realtime fetch failed");
                errors.push(e.into());
                Map::new()
            }
        };

        // Opportunistic one-time discovery: the coordinator (not the
        // client) decides whether to adopt the candidate, and only the
        // first one ever wins.
        if config.sn_module.is_none() {
            if let Some(candidate) = module_sn_candidate(&bms) {
                if self.inner.discovered_module.set(candidate.clone()).is_ok() {
                    info!(module_sn = %candidate, "auto-discovered module serial");
                }
            }
        }

        let snapshot = Arc::new(Snapshot {
            device,
            power,
            bms,
            dongle,
            fetched_at: Utc::now(),
        });

        // All four failed: this cycle produced nothing usable.
        // send_replace stores the value even with zero receivers, so
        // current()/last_error() work without any live subscriber.
        self.inner.last_error.send_replace(if errors.len() == 4 {
            Some(Arc::new(errors.swap_remove(0)))
        } else {
            None
        });

        // Atomic whole-value replacement; readers see old or new, never a mix.
        self.inner.snapshot_tx.send_replace(Some(Arc::clone(&snapshot)));

        debug!(
            device = snapshot.device.len(),
            power = snapshot.power.len(),
            bms = snapshot.bms.len(),
            dongle = snapshot.dongle.len(),
            "refresh cycle complete"
        );

        snapshot
    }

    // ── Background scheduling ────────────────────────────────────────

    /// Run an initial refresh, then poll on the configured interval in
    /// a background task until [`shutdown`](Self::shutdown).
    ///
    /// A zero interval disables the background task (one-shot mode).
    pub async fn start(&self) -> Result<(), CoreError> {
        self.refresh().await;

        if self.inner.config.refresh_interval.is_zero() {
            return Ok(());
        }

        let mut task = self.inner.task.lock().await;
        if task.is_some() {
            return Ok(()); // already running
        }

        let poller = self.clone();
        let cancel = self.inner.cancel.clone();
        *task = Some(tokio::spawn(refresh_task(poller, cancel)));
        Ok(())
    }

    /// Cancel the background task and wait for it to finish. In-flight
    /// network calls are abandoned; the last published snapshot stays
    /// available to readers.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task.lock().await.take() {
            let _ = handle.await;
        }
        debug!("poller stopped");
    }

    // ── Reader surface ───────────────────────────────────────────────

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// The most recently published snapshot, if any cycle has run.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Subscribe to the cycle-failure indicator.
    pub fn subscribe_errors(&self) -> watch::Receiver<Option<Arc<CoreError>>> {
        self.inner.last_error.subscribe()
    }

    /// The failure of the last cycle, if it failed entirely. Keeps the
    /// error typed so callers can distinguish connection faults from
    /// coded API rejections.
    pub fn last_error(&self) -> Option<Arc<CoreError>> {
        self.inner.last_error.borrow().clone()
    }
}

/// Fixed-interval polling loop. The first tick is consumed immediately
/// (the caller already ran the initial refresh).
async fn refresh_task(poller: Poller, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(poller.inner.config.refresh_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                poller.refresh().await;
            }
        }
    }
}
