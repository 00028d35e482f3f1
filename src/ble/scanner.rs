//! BLE advertisement watching.
//!
//! Watches advertisements for grills, keeps the most recent sighting of each
//! peripheral, and forwards matching sightings to the coordinator.

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::stream::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace};

use crate::client::{DeviceEvent, DeviceEventSender};
use crate::data::get_grills;
use crate::error::{Error, Result};

/// A BLE peripheral seen advertising.
#[derive(Debug, Clone)]
pub struct BleDevice {
    /// Platform address of the peripheral.
    pub address: String,
    /// Advertised local name.
    pub name: Option<String>,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
    peripheral: Option<Peripheral>,
}

impl BleDevice {
    /// Describe a device without a platform handle.
    pub fn new(address: impl Into<String>, name: Option<String>) -> Self {
        Self {
            address: address.into(),
            name,
            rssi: None,
            peripheral: None,
        }
    }

    /// The platform peripheral handle, when the device came from a scan.
    pub fn peripheral(&self) -> Option<&Peripheral> {
        self.peripheral.as_ref()
    }
}

/// Which advertisements the watcher reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatcher {
    /// Only the grill whose local name equals the device id.
    LocalName(String),
    /// Any grill whose name starts with a known control board prefix.
    AnyGrill,
}

impl NameMatcher {
    /// Check whether an advertised local name matches.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::LocalName(expected) => name == expected,
            Self::AnyGrill => is_grill_name(name),
        }
    }
}

/// Check whether a local name looks like `<control board>-<suffix>` for a
/// known board.
pub fn is_grill_name(name: &str) -> bool {
    match name.split_once('-') {
        Some((board, suffix)) => !suffix.is_empty() && !get_grills(board).is_empty(),
        None => false,
    }
}

/// Resolves a peripheral address to its latest sighting.
pub trait DeviceLookup: Send + Sync {
    /// The most recent connectable sighting of `address`, if any.
    fn device_from_address(&self, address: &str) -> Option<BleDevice>;
}

/// A source of grill sightings that a config entry can watch.
#[async_trait]
pub trait DeviceWatcher: DeviceLookup {
    /// Forward matching sightings to a coordinator's event queue.
    fn forward_to(&self, events: DeviceEventSender);

    /// Begin watching.
    async fn start(&self) -> Result<()>;

    /// Stop watching and stop forwarding.
    async fn stop(&self) -> Result<()>;

    /// This watcher as an address lookup.
    fn lookup(self: Arc<Self>) -> Arc<dyn DeviceLookup>;
}

/// BLE advertisement watcher.
pub struct AdvertisementWatcher {
    /// The BLE adapter to scan with.
    adapter: Adapter,
    /// Names to report.
    matcher: NameMatcher,
    /// Whether scanning is currently active.
    is_scanning: Arc<RwLock<bool>>,
    /// Latest sighting per address.
    discovered: Arc<RwLock<HashMap<String, BleDevice>>>,
    /// Channel for sightings.
    event_tx: broadcast::Sender<BleDevice>,
    /// Coordinator queue that matching sightings are forwarded to.
    forward_tx: Arc<RwLock<Option<DeviceEventSender>>>,
    /// Handle to the scanning task.
    scan_handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl AdvertisementWatcher {
    /// Create a watcher on the first Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new(matcher: NameMatcher) -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter, matcher))
    }

    /// Create a watcher on a specific adapter.
    pub fn with_adapter(adapter: Adapter, matcher: NameMatcher) -> Self {
        let (event_tx, _) = broadcast::channel(100);

        Self {
            adapter,
            matcher,
            is_scanning: Arc::new(RwLock::new(false)),
            discovered: Arc::new(RwLock::new(HashMap::new())),
            event_tx,
            forward_tx: Arc::new(RwLock::new(None)),
            scan_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Forward matching sightings to a coordinator's event queue.
    pub fn forward_to(&self, events: DeviceEventSender) {
        *self.forward_tx.write() = Some(events);
    }

    /// Start watching advertisements.
    ///
    /// # Errors
    ///
    /// Returns an error if scanning cannot be started.
    pub async fn start(&self) -> Result<()> {
        if *self.is_scanning.read() {
            debug!("Already scanning, ignoring start request");
            return Ok(());
        }

        info!("Starting BLE scan for {:?}", self.matcher);

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        *self.is_scanning.write() = true;

        let adapter = self.adapter.clone();
        let matcher = self.matcher.clone();
        let is_scanning = self.is_scanning.clone();
        let discovered = self.discovered.clone();
        let event_tx = self.event_tx.clone();
        let forward_tx = self.forward_tx.clone();

        let handle = tokio::spawn(async move {
            let mut events = match adapter.events().await {
                Ok(events) => events,
                Err(e) => {
                    error!("Failed to get adapter events: {}", e);
                    return;
                }
            };

            while *is_scanning.read() {
                tokio::select! {
                    Some(event) = events.next() => {
                        let id = match event {
                            CentralEvent::DeviceDiscovered(id)
                            | CentralEvent::DeviceUpdated(id)
                            | CentralEvent::ManufacturerDataAdvertisement { id, .. }
                            | CentralEvent::ServicesAdvertisement { id, .. } => id,
                            other => {
                                trace!("Ignoring central event: {:?}", other);
                                continue;
                            }
                        };
                        let Some(device) = Self::process_peripheral(&adapter, id, &matcher).await else {
                            continue;
                        };

                        discovered.write().insert(device.address.clone(), device.clone());
                        let _ = event_tx.send(device.clone());
                        if let Some(tx) = forward_tx.read().as_ref() {
                            let _ = tx.send(DeviceEvent::Discovered(device));
                        }
                    }
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {
                        if !*is_scanning.read() {
                            break;
                        }
                    }
                }
            }

            debug!("Scan event loop ended");
        });

        *self.scan_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop watching advertisements.
    pub async fn stop(&self) -> Result<()> {
        if !*self.is_scanning.read() {
            debug!("Not scanning, ignoring stop request");
            return Ok(());
        }

        info!("Stopping BLE scan");

        *self.is_scanning.write() = false;
        *self.forward_tx.write() = None;

        self.adapter.stop_scan().await.map_err(Error::Bluetooth)?;

        let handle = self.scan_handle.write().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        Ok(())
    }

    /// Check if currently scanning.
    pub fn is_scanning(&self) -> bool {
        *self.is_scanning.read()
    }

    /// Latest sighting of every matching peripheral.
    pub fn discovered(&self) -> HashMap<String, BleDevice> {
        self.discovered.read().clone()
    }

    /// Subscribe to matching sightings.
    pub fn subscribe(&self) -> broadcast::Receiver<BleDevice> {
        self.event_tx.subscribe()
    }

    async fn process_peripheral(
        adapter: &Adapter,
        id: PeripheralId,
        matcher: &NameMatcher,
    ) -> Option<BleDevice> {
        let peripheral = match adapter.peripheral(&id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return None;
            }
        };

        let properties = match peripheral.properties().await {
            Ok(Some(p)) => p,
            _ => return None,
        };

        let name = properties.local_name?;
        if !matcher.matches(&name) {
            return None;
        }

        trace!("Grill advertisement: {} ({:?})", name, id);

        Some(BleDevice {
            address: id.to_string(),
            name: Some(name),
            rssi: properties.rssi,
            peripheral: Some(peripheral),
        })
    }
}

impl DeviceLookup for AdvertisementWatcher {
    fn device_from_address(&self, address: &str) -> Option<BleDevice> {
        self.discovered.read().get(address).cloned()
    }
}

#[async_trait]
impl DeviceWatcher for AdvertisementWatcher {
    fn forward_to(&self, events: DeviceEventSender) {
        AdvertisementWatcher::forward_to(self, events)
    }

    async fn start(&self) -> Result<()> {
        AdvertisementWatcher::start(self).await
    }

    async fn stop(&self) -> Result<()> {
        AdvertisementWatcher::stop(self).await
    }

    fn lookup(self: Arc<Self>) -> Arc<dyn DeviceLookup> {
        self
    }
}

impl Drop for AdvertisementWatcher {
    fn drop(&mut self) {
        *self.is_scanning.write() = false;
    }
}
