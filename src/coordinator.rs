//! Data update coordinator.
//!
//! Owns the protocol client of one configured grill, drives its start-up and
//! liveness checks, and publishes state snapshots to every entity.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Notify};
use tracing::{debug, error, info, warn};

use crate::ble::scanner::{BleDevice, DeviceLookup};
use crate::client::{
    ClientFactory, DeviceEvent, DeviceEventSender, Endpoint, GrillApi, StateCallback,
};
use crate::config::{CoordinatorConfig, EntryData, DOMAIN, MANUFACTURER};
use crate::data::{get_grill, GrillSpec, GrillState, Snapshot};
use crate::error::{Error, Result, UpdateFailure};
use crate::integration::Host;

/// Callback handle for unregistering callbacks.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    pub(crate) fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

/// Lifecycle state of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoordinatorState {
    /// The protocol client has not completed its start sequence.
    #[default]
    Unstarted,
    /// The start sequence is running.
    Starting,
    /// Started and answering liveness probes.
    Connected,
    /// Started, but the last liveness probe failed.
    Degraded,
    /// Torn down. Terminal.
    Stopped,
}

impl CoordinatorState {
    /// Check whether the protocol client has been started.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Connected | Self::Degraded)
    }
}

impl std::fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unstarted => write!(f, "Unstarted"),
            Self::Starting => write!(f, "Starting"),
            Self::Connected => write!(f, "Connected"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Device registry entry for a grill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// `(domain, device id)` pairs identifying the device.
    pub identifiers: Vec<(String, String)>,
    /// Display name.
    pub name: String,
    /// Model name.
    pub model: String,
    /// Manufacturer.
    pub manufacturer: String,
}

/// Notification sent to coordinator listeners.
#[derive(Debug, Clone)]
pub enum CoordinatorUpdate {
    /// A snapshot was published.
    Snapshot(Snapshot),
    /// A scheduled update failed. The last snapshot is unchanged.
    Failed(UpdateFailure),
}

/// Last published snapshot and update health.
///
/// Shared with push listeners so the client never holds the coordinator.
struct SnapshotStore {
    data: RwLock<Option<Snapshot>>,
    last_update_success: AtomicBool,
    last_update: RwLock<Option<DateTime<Utc>>>,
    update_tx: broadcast::Sender<CoordinatorUpdate>,
}

impl SnapshotStore {
    fn new() -> Self {
        let (update_tx, _) = broadcast::channel(64);

        Self {
            data: RwLock::new(None),
            last_update_success: AtomicBool::new(true),
            last_update: RwLock::new(None),
            update_tx,
        }
    }

    fn current(&self) -> Option<Snapshot> {
        self.data.read().clone()
    }

    fn publish(&self, snapshot: Snapshot) {
        *self.data.write() = Some(snapshot.clone());
        self.mark_success();
        let _ = self.update_tx.send(CoordinatorUpdate::Snapshot(snapshot));
    }

    fn mark_success(&self) {
        *self.last_update.write() = Some(Utc::now());
        if !self.last_update_success.swap(true, Ordering::SeqCst) {
            info!("Fetching {} data recovered", DOMAIN);
        }
    }

    fn mark_failed(&self, failure: &UpdateFailure) {
        if self.last_update_success.swap(false, Ordering::SeqCst) {
            warn!("Error fetching {} data: {}", DOMAIN, failure);
        } else {
            debug!("Update still failing: {}", failure);
        }
        let _ = self
            .update_tx
            .send(CoordinatorUpdate::Failed(failure.clone()));
    }
}

/// Result of the scheduled update policy before publication.
enum Refreshed {
    /// Push data is already published and stays authoritative.
    Cached(Snapshot),
    /// State was fetched on demand.
    Fetched(GrillState),
}

/// Coordinator for one configured grill.
pub struct Coordinator {
    entry: EntryData,
    spec: &'static GrillSpec,
    device_info: DeviceInfo,
    config: CoordinatorConfig,
    factory: Arc<dyn ClientFactory>,
    /// Protocol client; created once and only replaced by teardown.
    api: RwLock<Option<Arc<dyn GrillApi>>>,
    api_started: AtomicBool,
    started: Notify,
    state: RwLock<CoordinatorState>,
    store: Arc<SnapshotStore>,
    /// Serializes client construction and rebinding.
    reset_lock: tokio::sync::Mutex<()>,
    events_tx: DeviceEventSender,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<DeviceEvent>>>,
    callback_counter: AtomicU64,
}

impl Coordinator {
    /// Create a coordinator for a config entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownModel`] if the entry's model has no
    /// capability specification.
    pub fn new(
        entry: EntryData,
        factory: Arc<dyn ClientFactory>,
        config: CoordinatorConfig,
    ) -> Result<Self> {
        let spec = get_grill(&entry.model)?;
        let device_info = DeviceInfo {
            identifiers: vec![(DOMAIN.to_string(), entry.device_id.clone())],
            name: entry.device_id.clone(),
            model: entry.model.clone(),
            manufacturer: MANUFACTURER.to_string(),
        };
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            entry,
            spec,
            device_info,
            config,
            factory,
            api: RwLock::new(None),
            api_started: AtomicBool::new(false),
            started: Notify::new(),
            state: RwLock::new(CoordinatorState::Unstarted),
            store: Arc::new(SnapshotStore::new()),
            reset_lock: tokio::sync::Mutex::new(()),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            callback_counter: AtomicU64::new(0),
        })
    }

    // === Identity ===

    /// Persisted entry data the coordinator was built from.
    pub fn entry(&self) -> &EntryData {
        &self.entry
    }

    /// Capability specification of the grill model.
    pub fn spec(&self) -> &'static GrillSpec {
        self.spec
    }

    /// Device registry entry.
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Timing configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    // === Client ===

    /// The protocol client, if one has been bound.
    pub fn api(&self) -> Option<Arc<dyn GrillApi>> {
        self.api.read().clone()
    }

    /// The protocol client, for issuing commands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if no client has been bound yet.
    pub fn require_api(&self) -> Result<Arc<dyn GrillApi>> {
        self.api().ok_or(Error::NotConnected)
    }

    /// Whether the protocol client has completed its start sequence.
    pub fn api_started(&self) -> bool {
        self.api_started.load(Ordering::SeqCst)
    }

    /// Whether a client exists and reports a live connection.
    pub fn is_connected(&self) -> bool {
        self.api().map(|api| api.is_connected()).unwrap_or(false)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CoordinatorState {
        *self.state.read()
    }

    /// Check whether the coordinator has been torn down.
    pub fn is_stopped(&self) -> bool {
        self.state() == CoordinatorState::Stopped
    }

    /// Bind a WebSocket client for the entry's device id.
    ///
    /// The client is started by the first scheduled update.
    pub fn bind_network_client(&self) -> Result<()> {
        if self.api.read().is_some() {
            return Ok(());
        }

        let api = self.factory.create(
            Endpoint::Wss {
                device_id: self.entry.device_id.clone(),
            },
            &self.entry,
            self.events_tx.clone(),
        )?;
        *self.api.write() = Some(api);
        debug!("Bound WebSocket client for {}", self.entry.device_id);

        Ok(())
    }

    /// Acquire or rebind the BLE client for a discovered peripheral.
    ///
    /// Concurrent calls are serialized. The first call constructs, starts,
    /// and subscribes a client; later calls rebind the existing client only
    /// if it has lost its connection.
    pub async fn reset_device(&self, device: BleDevice) -> Result<()> {
        let _guard = self.reset_lock.lock().await;

        if self.is_stopped() {
            debug!("Ignoring {} after teardown", device.address);
            return Ok(());
        }

        let api = match self.api() {
            Some(api) => api,
            None => {
                debug!("Setting up grill client with device: {}", device.address);
                let api = self.factory.create(
                    Endpoint::Ble(device),
                    &self.entry,
                    self.events_tx.clone(),
                )?;
                *self.api.write() = Some(api.clone());
                return self.start_api(&api).await;
            }
        };

        if self.api_started() && api.is_connected() {
            debug!("Client already connected, ignoring {}", device.address);
            return Ok(());
        }

        debug!("Resetting device: {}", device.address);
        api.reset_device(device).await?;

        if !self.api_started() {
            self.start_api(&api).await?;
        }

        Ok(())
    }

    /// Wait until the protocol client has completed its start sequence.
    pub async fn wait_until_started(&self) {
        loop {
            let notified = self.started.notified();
            if self.api_started() {
                return;
            }
            notified.await;
        }
    }

    async fn start_api(&self, api: &Arc<dyn GrillApi>) -> Result<()> {
        self.set_state(CoordinatorState::Starting);

        let started = match tokio::time::timeout(self.config.setup_timeout, api.start()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout),
        };
        let subscribed = match started {
            Ok(()) => api.subscribe_state(self.push_listener()).await,
            Err(e) => Err(e),
        };

        if let Err(e) = subscribed {
            self.set_state(CoordinatorState::Unstarted);
            return Err(e);
        }

        self.api_started.store(true, Ordering::SeqCst);
        self.set_state(CoordinatorState::Connected);
        self.started.notify_waiters();
        info!("Grill {} started", self.entry.device_id);

        Ok(())
    }

    fn push_listener(&self) -> StateCallback {
        let store = self.store.clone();
        Arc::new(move |state: GrillState| {
            store.publish(Arc::new(state));
        })
    }

    // === Snapshots ===

    /// The most recently published snapshot.
    pub fn data(&self) -> Option<Snapshot> {
        self.store.current()
    }

    /// Whether the last scheduled update succeeded.
    pub fn last_update_success(&self) -> bool {
        self.store.last_update_success.load(Ordering::SeqCst)
    }

    /// When a snapshot was last published or confirmed.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self.store.last_update.read()
    }

    /// Whether entities should present as available.
    pub fn is_available(&self) -> bool {
        self.last_update_success()
            && self.is_connected()
            && self.data().map(|d| !d.is_empty()).unwrap_or(false)
    }

    /// Publish a full replacement snapshot to every listener.
    pub fn set_updated_data(&self, state: GrillState) {
        self.store.publish(Arc::new(state));
    }

    /// Subscribe to published snapshots and update failures.
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorUpdate> {
        self.store.update_tx.subscribe()
    }

    /// Register a callback for published snapshots and update failures.
    pub fn on_update<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&CoordinatorUpdate) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.store.update_tx.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(update) => callback(&update),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Listener lagged by {} updates", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }

    // === Scheduled update ===

    /// Run one scheduled update.
    ///
    /// On success the resulting snapshot is published. On failure listeners
    /// are told and the previous snapshot stays readable.
    pub async fn refresh(&self) -> std::result::Result<Snapshot, UpdateFailure> {
        match self.update_data().await {
            Ok(refreshed) => {
                let snapshot = match refreshed {
                    Refreshed::Cached(cached) => {
                        self.store.mark_success();
                        self.store.current().unwrap_or(cached)
                    }
                    Refreshed::Fetched(state) => {
                        let snapshot = Arc::new(state);
                        self.store.publish(snapshot.clone());
                        snapshot
                    }
                };
                self.set_state(CoordinatorState::Connected);
                Ok(snapshot)
            }
            Err(failure) => {
                if self.state() == CoordinatorState::Connected {
                    self.set_state(CoordinatorState::Degraded);
                }
                self.store.mark_failed(&failure);
                Err(failure)
            }
        }
    }

    async fn update_data(&self) -> std::result::Result<Refreshed, UpdateFailure> {
        if self.is_stopped() {
            return Err(UpdateFailure::Stopped);
        }

        let api = self.api().ok_or(UpdateFailure::DeviceUnavailable)?;

        if !self.api_started() {
            if let Err(e) = self.start_api(&api).await {
                debug!("Start failed: {}", e);
                return Err(UpdateFailure::DeviceUnavailable);
            }
        }

        if !api.is_connected() {
            return Err(UpdateFailure::NotConnected);
        }

        let timeout = self.config.ping_timeout;
        match tokio::time::timeout(timeout, api.ping(timeout)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!("Ping failed: {}", e);
                return Err(UpdateFailure::NotConnected);
            }
            Err(_) => {
                debug!("Ping timed out after {:?}", timeout);
                return Err(UpdateFailure::NotConnected);
            }
        }

        if let Some(snapshot) = self.store.current().filter(|s| !s.is_empty()) {
            return Ok(Refreshed::Cached(snapshot));
        }

        match tokio::time::timeout(timeout, api.get_state()).await {
            Ok(Ok(state)) => Ok(Refreshed::Fetched(state)),
            Ok(Err(Error::Rpc { message })) => Err(UpdateFailure::Protocol(message)),
            Ok(Err(e)) => Err(UpdateFailure::Transport(e.to_string())),
            Err(_) => Err(UpdateFailure::Transport(Error::Timeout.to_string())),
        }
    }

    /// Spawn the periodic scheduled update task.
    ///
    /// The first tick fires one interval from now.
    pub fn spawn_refresh_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();

        tokio::spawn(async move {
            let period = coordinator.config.update_interval;
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if coordinator.is_stopped() {
                    break;
                }
                if let Err(failure) = coordinator.refresh().await {
                    debug!("Scheduled update failed: {}", failure);
                }
            }

            debug!("Refresh loop ended");
        })
    }

    // === Device events ===

    /// Sender for injecting device events.
    pub fn event_sender(&self) -> DeviceEventSender {
        self.events_tx.clone()
    }

    /// Spawn the task that consumes device events.
    ///
    /// Sightings and disconnects are handled one at a time, so a burst of
    /// advertisements results in a single client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the event task was already spawned.
    pub fn spawn_event_loop(
        self: &Arc<Self>,
        lookup: Arc<dyn DeviceLookup>,
        host: Arc<dyn Host>,
    ) -> Result<tokio::task::JoinHandle<()>> {
        let mut rx = self
            .events_rx
            .lock()
            .take()
            .ok_or_else(|| Error::Internal("event loop already running".to_string()))?;
        let coordinator = self.clone();

        Ok(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if coordinator.is_stopped() {
                    break;
                }
                coordinator
                    .handle_event(event, lookup.as_ref(), host.as_ref())
                    .await;
            }
            debug!("Device event loop ended");
        }))
    }

    async fn handle_event(&self, event: DeviceEvent, lookup: &dyn DeviceLookup, host: &dyn Host) {
        match event {
            DeviceEvent::Discovered(device) => {
                debug!("Bluetooth device detected: {:?}", device.name);
                if !self.is_own_device(&device) {
                    debug!(
                        "Ignoring {} ({:?}), expected {}",
                        device.address, device.name, self.entry.device_id
                    );
                    return;
                }
                if let Err(e) = self.reset_device(device).await {
                    warn!("Failed to reset device: {}", e);
                }
            }
            DeviceEvent::Disconnected { address } => {
                info!("Grill {} disconnected", address);
                self.set_updated_data(GrillState::empty());
                if self.state() == CoordinatorState::Connected {
                    self.set_state(CoordinatorState::Degraded);
                }

                if host.is_stopping() {
                    return;
                }
                let Some(device) = lookup.device_from_address(&address) else {
                    debug!("No connectable sighting of {}", address);
                    return;
                };
                if let Err(e) = self.reset_device(device).await {
                    warn!("Reconnect to {} failed: {}", address, e);
                }
            }
        }
    }

    /// Check whether a sighting advertises this entry's device id.
    fn is_own_device(&self, device: &BleDevice) -> bool {
        device.name.as_deref() == Some(self.entry.device_id.as_str())
    }

    // === Teardown ===

    /// Stop the protocol client and release its connection.
    ///
    /// Safe to call repeatedly and when the client never started. Errors
    /// from the client are logged, not returned.
    pub async fn shutdown(&self) {
        if self.is_stopped() && self.api.read().is_none() {
            return;
        }
        self.set_state(CoordinatorState::Stopped);

        let _guard = self.reset_lock.lock().await;
        let api = self.api.write().take();
        self.api_started.store(false, Ordering::SeqCst);

        match api {
            Some(api) => {
                info!("Stopping grill client for {}", self.entry.device_id);
                if let Err(e) = api.stop().await {
                    error!("Error stopping grill client: {}", e);
                }
            }
            None => debug!("No grill client to stop"),
        }
    }

    fn set_state(&self, new_state: CoordinatorState) {
        let old_state = {
            let mut state = self.state.write();
            let old = *state;
            if old == CoordinatorState::Stopped {
                return;
            }
            *state = new_state;
            old
        };

        if old_state != new_state {
            debug!("Coordinator state changed: {} -> {}", old_state, new_state);
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("device_id", &self.entry.device_id)
            .field("model", &self.entry.model)
            .field("protocol", &self.entry.protocol)
            .field("state", &self.state())
            .finish()
    }
}
