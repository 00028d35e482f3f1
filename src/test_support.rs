//! Fakes shared by the unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ble::scanner::{BleDevice, DeviceLookup, DeviceWatcher};
use crate::client::{
    ClientFactory, DeviceEvent, DeviceEventSender, Endpoint, GrillApi, StateCallback,
};
use crate::config::{CoordinatorConfig, EntryData, Transport};
use crate::coordinator::Coordinator;
use crate::data::GrillState;
use crate::entities::{Entity, Platform};
use crate::error::{Error, Result};
use crate::integration::Host;

/// Timing short enough for tests.
pub(crate) fn test_config() -> CoordinatorConfig {
    CoordinatorConfig {
        update_interval: Duration::from_millis(50),
        ping_timeout: Duration::from_millis(50),
        setup_timeout: Duration::from_millis(100),
    }
}

pub(crate) fn entry_data(model: &str, protocol: Transport) -> EntryData {
    EntryData {
        device_id: "PBL-0123ABCD".to_string(),
        model: model.to_string(),
        password: None,
        protocol,
    }
}

/// A WebSocket coordinator bound to a fresh fake grill.
pub(crate) fn wss_coordinator(model: &str) -> (Arc<Coordinator>, Arc<FakeGrill>, Arc<FakeFactory>) {
    let grill = Arc::new(FakeGrill::new());
    let factory = Arc::new(FakeFactory::new(grill.clone()));
    let coordinator = Coordinator::new(
        entry_data(model, Transport::Wss),
        factory.clone(),
        test_config(),
    )
    .unwrap();
    coordinator.bind_network_client().unwrap();
    (Arc::new(coordinator), grill, factory)
}

/// A state as a powered-on grill would push it.
pub(crate) fn grill_state(grill_temp: i32) -> GrillState {
    GrillState {
        grill_temp: Some(grill_temp),
        grill_set_temp: Some(225),
        module_is_on: Some(true),
        is_fahrenheit: Some(true),
        ..Default::default()
    }
}

/// Scriptable protocol client.
pub(crate) struct FakeGrill {
    pub connected: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_ping: AtomicBool,
    pub ping_delay: Mutex<Option<Duration>>,
    pub state: Mutex<GrillState>,
    pub rpc_error: Mutex<Option<String>>,
    callback: Mutex<Option<StateCallback>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGrill {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            fail_start: AtomicBool::new(false),
            fail_ping: AtomicBool::new(false),
            ping_delay: Mutex::new(None),
            state: Mutex::new(grill_state(225)),
            rpc_error: Mutex::new(None),
            callback: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Deliver a pushed state to the subscribed listener.
    pub fn push(&self, state: GrillState) {
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback(state);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(name)).count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl GrillApi for FakeGrill {
    async fn start(&self) -> Result<()> {
        self.record("start");
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Error::DeviceUnavailable);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.record("stop");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn ping(&self, _timeout: Duration) -> Result<()> {
        self.record("ping");
        let delay = *self.ping_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    async fn get_state(&self) -> Result<GrillState> {
        self.record("get_state");
        if let Some(message) = self.rpc_error.lock().clone() {
            return Err(Error::Rpc { message });
        }
        Ok(self.state.lock().clone())
    }

    async fn subscribe_state(&self, callback: StateCallback) -> Result<()> {
        self.record("subscribe_state");
        *self.callback.lock() = Some(callback);
        Ok(())
    }

    async fn reset_device(&self, device: BleDevice) -> Result<()> {
        self.record(format!("reset_device {}", device.address));
        Ok(())
    }

    async fn set_grill_temperature(&self, temp: i32) -> Result<()> {
        self.record(format!("set_grill_temperature {}", temp));
        Ok(())
    }

    async fn set_probe_temperature(&self, temp: i32) -> Result<()> {
        self.record(format!("set_probe_temperature {}", temp));
        Ok(())
    }

    async fn set_probe_2_temperature(&self, temp: i32) -> Result<()> {
        self.record(format!("set_probe_2_temperature {}", temp));
        Ok(())
    }

    async fn turn_light_on(&self) -> Result<()> {
        self.record("turn_light_on");
        Ok(())
    }

    async fn turn_light_off(&self) -> Result<()> {
        self.record("turn_light_off");
        Ok(())
    }

    async fn turn_primer_motor_on(&self) -> Result<()> {
        self.record("turn_primer_motor_on");
        Ok(())
    }

    async fn turn_primer_motor_off(&self) -> Result<()> {
        self.record("turn_primer_motor_off");
        Ok(())
    }

    async fn turn_grill_off(&self) -> Result<()> {
        self.record("turn_grill_off");
        Ok(())
    }
}

/// Hands out the same fake grill and counts constructions.
pub(crate) struct FakeFactory {
    grill: Arc<FakeGrill>,
    creates: AtomicUsize,
    endpoints: Mutex<Vec<Endpoint>>,
    events: Mutex<Option<DeviceEventSender>>,
}

impl FakeFactory {
    pub fn new(grill: Arc<FakeGrill>) -> Self {
        Self {
            grill,
            creates: AtomicUsize::new(0),
            endpoints: Mutex::new(Vec::new()),
            events: Mutex::new(None),
        }
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints.lock().clone()
    }

    /// Report a transport disconnect the way a client would.
    pub fn disconnect(&self, address: &str) {
        if let Some(tx) = self.events.lock().as_ref() {
            let _ = tx.send(DeviceEvent::Disconnected {
                address: address.to_string(),
            });
        }
    }
}

impl ClientFactory for FakeFactory {
    fn create(
        &self,
        endpoint: Endpoint,
        _entry: &EntryData,
        events: DeviceEventSender,
    ) -> Result<Arc<dyn GrillApi>> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().push(endpoint);
        *self.events.lock() = Some(events);
        Ok(self.grill.clone())
    }
}

/// Records registered entities.
#[derive(Default)]
pub(crate) struct RecordingHost {
    pub stopping: AtomicBool,
    entities: Mutex<Vec<Entity>>,
}

impl RecordingHost {
    pub fn entities(&self, platform: Platform) -> Vec<Entity> {
        self.entities
            .lock()
            .iter()
            .filter(|e| e.platform() == platform)
            .cloned()
            .collect()
    }

    pub fn unique_ids(&self) -> Vec<String> {
        self.entities
            .lock()
            .iter()
            .map(|e| e.unique_id().to_string())
            .collect()
    }
}

impl Host for RecordingHost {
    fn add_entities(&self, _platform: Platform, entities: Vec<Entity>) {
        self.entities.lock().extend(entities);
    }

    fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }
}

/// In-memory advertisement source.
#[derive(Default)]
pub(crate) struct FakeWatcher {
    /// Sightings announced when watching starts.
    pub sightings: Mutex<Vec<BleDevice>>,
    known: Mutex<HashMap<String, BleDevice>>,
    events: Mutex<Option<DeviceEventSender>>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl FakeWatcher {
    pub fn with_sighting(device: BleDevice) -> Self {
        let watcher = Self::default();
        watcher.sightings.lock().push(device);
        watcher
    }

    /// Remember a sighting without announcing it.
    pub fn remember(&self, device: BleDevice) {
        self.known.lock().insert(device.address.clone(), device);
    }
}

impl DeviceLookup for FakeWatcher {
    fn device_from_address(&self, address: &str) -> Option<BleDevice> {
        self.known.lock().get(address).cloned()
    }
}

#[async_trait]
impl DeviceWatcher for FakeWatcher {
    fn forward_to(&self, events: DeviceEventSender) {
        *self.events.lock() = Some(events);
    }

    async fn start(&self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let sightings = self.sightings.lock().clone();
        for device in sightings {
            self.remember(device.clone());
            if let Some(tx) = self.events.lock().as_ref() {
                let _ = tx.send(DeviceEvent::Discovered(device));
            }
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        *self.events.lock() = None;
        Ok(())
    }

    fn lookup(self: Arc<Self>) -> Arc<dyn DeviceLookup> {
        self
    }
}

/// Poll `condition` until it holds, panicking after about a second.
pub(crate) async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within timeout");
}
