// ── Bridge lifecycle ──
//
// Wires the registry, synchronizer, and dispatcher together for one
// device collection and owns the background tasks: a poll timer and a
// command processor fed by an mpsc channel. `stop()` cancels the child
// token and joins both; `start()` afterwards spins up fresh ones.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use domosync_api::VersionInfo;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::discovery;
use crate::dispatch::{CapabilityChange, DispatchReport, Dispatcher};
use crate::error::CoreError;
use crate::model::{DeviceIdx, ManagedDevice, PairedDevice, PairingCandidate};
use crate::platform::LocalPlatform;
use crate::registry::DeviceRegistry;
use crate::remote::RemoteClient;
use crate::sync::{SyncOutcome, SyncReport, Synchronizer};

// ── BridgeState ──────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Stopped,
    Running,
}

struct ChangeEnvelope {
    change: CapabilityChange,
    response_tx: Option<oneshot::Sender<Result<DispatchReport, CoreError>>>,
}

// ── Bridge ───────────────────────────────────────────────────────

/// Keeps one device collection in sync with the server.
///
/// Cheaply cloneable via `Arc<BridgeInner>`.
pub struct Bridge<R, P> {
    inner: Arc<BridgeInner<R, P>>,
}

impl<R, P> Clone for Bridge<R, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct BridgeInner<R, P> {
    config: BridgeConfig,
    remote: Arc<R>,
    registry: Arc<DeviceRegistry>,
    synchronizer: Synchronizer<R, P>,
    dispatcher: Dispatcher<R>,
    state: watch::Sender<BridgeState>,
    last_sync: watch::Sender<Option<Arc<SyncReport>>>,
    command_tx: Mutex<mpsc::Sender<ChangeEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<ChangeEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current run, replaced on restart.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<R: RemoteClient, P: LocalPlatform> Bridge<R, P> {
    /// Create a bridge. Does NOT start polling; call [`start()`](Self::start).
    pub fn new(config: BridgeConfig, remote: R, platform: P) -> Self {
        Self::with_shared(config, Arc::new(remote), Arc::new(platform))
    }

    /// Create a bridge around collaborators the caller keeps a handle to.
    pub fn with_shared(config: BridgeConfig, remote: Arc<R>, platform: Arc<P>) -> Self {
        let registry = Arc::new(DeviceRegistry::new());
        let synchronizer =
            Synchronizer::new(Arc::clone(&remote), platform, Arc::clone(&registry));
        let dispatcher = Dispatcher::new(Arc::clone(&remote), Arc::clone(&registry));
        let (state, _) = watch::channel(BridgeState::Stopped);
        let (last_sync, _) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::channel(config.command_queue.max(1));
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(BridgeInner {
                config,
                remote,
                registry,
                synchronizer,
                dispatcher,
                state,
                last_sync,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.inner.registry
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.inner.remote
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the poll timer and the command processor.
    ///
    /// Calling `start()` on a running bridge does nothing.
    pub async fn start(&self) {
        if self.is_running() {
            debug!("bridge already running");
            return;
        }

        let child = {
            let mut guard = self.inner.cancel_child.lock().await;
            if guard.is_cancelled() {
                *guard = self.inner.cancel.child_token();
            }
            guard.clone()
        };

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let bridge = self.clone();
            handles.push(tokio::spawn(command_processor_task(
                bridge,
                rx,
                child.clone(),
            )));
        }

        let period = self.inner.config.poll_interval;
        if !period.is_zero() {
            let bridge = self.clone();
            handles.push(tokio::spawn(poll_task(bridge, period, child.clone())));
        }

        self.inner.state.send_replace(BridgeState::Running);
        info!(
            devices = self.inner.registry.len(),
            interval_secs = period.as_secs_f64(),
            "bridge started"
        );
    }

    /// Cancel the background tasks and wait for them to finish.
    pub async fn stop(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        // The processor consumed the old receiver; give the next run a
        // fresh channel. Changes still queued are dropped.
        {
            let (tx, rx) = mpsc::channel(self.inner.config.command_queue.max(1));
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.inner.state.send_replace(BridgeState::Stopped);
        info!("bridge stopped");
    }

    pub fn is_running(&self) -> bool {
        *self.inner.state.borrow() == BridgeState::Running
    }

    /// Subscribe to lifecycle state changes.
    pub fn status(&self) -> watch::Receiver<BridgeState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to the report of the most recent poll cycle.
    pub fn last_sync(&self) -> watch::Receiver<Option<Arc<SyncReport>>> {
        self.inner.last_sync.subscribe()
    }

    // ── Device lifecycle ─────────────────────────────────────────

    /// Register a paired device. Returns `true` if it was not known yet.
    pub fn add_device(&self, paired: PairedDevice) -> bool {
        let idx = paired.idx.clone();
        let is_new = self.inner.registry.add(ManagedDevice::new(paired));
        info!(idx = %idx, new = is_new, "device added");
        is_new
    }

    /// Unregister a device. Its freshness marker goes with it.
    pub fn remove_device(&self, idx: &DeviceIdx) -> bool {
        let removed = self.inner.registry.remove(idx).is_some();
        if removed {
            info!(idx = %idx, "device removed");
        }
        removed
    }

    // ── Sync paths ───────────────────────────────────────────────

    /// Run one poll cycle now, sharing single-flight with the timer.
    pub async fn poll_now(&self) -> SyncReport {
        let report = self.inner.synchronizer.poll_once().await;
        if report.outcome != SyncOutcome::SkippedBusy {
            self.inner
                .last_sync
                .send_replace(Some(Arc::new(report.clone())));
        }
        report
    }

    /// Queue a local change for the command processor and return.
    pub async fn notify_capability_change(&self, change: CapabilityChange) -> Result<(), CoreError> {
        self.enqueue(ChangeEnvelope {
            change,
            response_tx: None,
        })
        .await
    }

    /// Queue a local change and wait for its dispatch report.
    pub async fn dispatch_now(&self, change: CapabilityChange) -> Result<DispatchReport, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(ChangeEnvelope {
            change,
            response_tx: Some(tx),
        })
        .await?;
        rx.await.map_err(|_| CoreError::BridgeStopped)?
    }

    async fn enqueue(&self, envelope: ChangeEnvelope) -> Result<(), CoreError> {
        if !self.is_running() {
            return Err(CoreError::BridgeStopped);
        }
        let command_tx = self.inner.command_tx.lock().await.clone();
        command_tx
            .send(envelope)
            .await
            .map_err(|_| CoreError::BridgeStopped)
    }

    // ── Discovery ────────────────────────────────────────────────

    /// Remote devices not yet registered that could be paired.
    pub async fn discover(&self) -> Result<Vec<PairingCandidate>, CoreError> {
        discovery::discover(self.inner.remote.as_ref(), &self.inner.registry).await
    }

    /// Check the configured credentials against the server.
    pub async fn validate(&self) -> Result<VersionInfo, CoreError> {
        discovery::validate_credentials(self.inner.remote.as_ref()).await
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically run a poll cycle. The first cycle runs immediately.
async fn poll_task<R: RemoteClient, P: LocalPlatform>(
    bridge: Bridge<R, P>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    report = bridge.poll_now() => {
                        if let SyncOutcome::FetchFailed(ref error) = report.outcome {
                            debug!(error = %error, "poll cycle aborted, retrying next tick");
                        }
                    }
                }
            }
        }
    }
}

/// Route queued changes to one worker per device. Changes to the same
/// device go out in the order they were queued; a slow device never holds
/// up the others.
async fn command_processor_task<R: RemoteClient, P: LocalPlatform>(
    bridge: Bridge<R, P>,
    mut rx: mpsc::Receiver<ChangeEnvelope>,
    cancel: CancellationToken,
) {
    let mut workers: HashMap<DeviceIdx, mpsc::UnboundedSender<ChangeEnvelope>> = HashMap::new();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let worker = workers.entry(envelope.change.idx.clone()).or_insert_with(|| {
                    let (tx, rx) = mpsc::unbounded_channel();
                    tokio::spawn(device_worker_task(bridge.clone(), rx, cancel.clone()));
                    tx
                });
                // Only fails once the worker saw cancellation; the dropped
                // reply sender reports that to the caller.
                let _ = worker.send(envelope);
            }
        }
    }
}

/// Dispatch the changes of one device, one at a time.
async fn device_worker_task<R: RemoteClient, P: LocalPlatform>(
    bridge: Bridge<R, P>,
    mut rx: mpsc::UnboundedReceiver<ChangeEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = bridge.inner.dispatcher.dispatch(envelope.change).await;
                match envelope.response_tx {
                    Some(tx) => {
                        let _ = tx.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            warn!(error = %e, "capability change dropped");
                        }
                    }
                }
            }
        }
    }
}
