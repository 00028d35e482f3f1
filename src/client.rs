//! Protocol client interface.
//!
//! The grill's wire protocol and transports live outside this crate. The
//! coordinator and entities talk to them only through [`GrillApi`], and
//! obtain instances through a [`ClientFactory`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::ble::scanner::BleDevice;
use crate::config::EntryData;
use crate::data::GrillState;
use crate::error::Result;

/// Listener invoked with a full replacement state on every push delivery.
pub type StateCallback = Arc<dyn Fn(GrillState) + Send + Sync>;

/// Event reported by a transport or the advertisement watcher.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// An advertisement matching the configured grill was seen.
    Discovered(BleDevice),
    /// The transport lost its connection unexpectedly.
    Disconnected {
        /// Address of the peripheral that dropped.
        address: String,
    },
}

/// Sending half of the coordinator's device event queue.
pub type DeviceEventSender = mpsc::UnboundedSender<DeviceEvent>;

/// Where a new client should connect.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// A discovered BLE peripheral.
    Ble(BleDevice),
    /// The vendor WebSocket relay, addressed by device id.
    Wss {
        /// Grill device id.
        device_id: String,
    },
}

/// Operations of the grill protocol client.
///
/// Command methods return once the grill acknowledges them. Their effect is
/// observed later through the state subscription.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GrillApi: Send + Sync {
    /// Begin communication.
    ///
    /// Fails with [`Error::DeviceUnavailable`](crate::Error::DeviceUnavailable)
    /// if the grill cannot be reached.
    async fn start(&self) -> Result<()>;

    /// Release transport resources. Safe to call repeatedly.
    async fn stop(&self) -> Result<()>;

    /// Check whether the transport is connected.
    fn is_connected(&self) -> bool;

    /// Liveness probe. Fails with `NotConnected` on timeout or loss.
    async fn ping(&self, timeout: Duration) -> Result<()>;

    /// Fetch the full grill state.
    async fn get_state(&self) -> Result<GrillState>;

    /// Register a listener for pushed state.
    async fn subscribe_state(&self, callback: StateCallback) -> Result<()>;

    /// Rebind the transport to a rediscovered peripheral.
    async fn reset_device(&self, device: BleDevice) -> Result<()>;

    /// Set the grill target temperature.
    async fn set_grill_temperature(&self, temp: i32) -> Result<()>;

    /// Set the probe 1 target temperature.
    async fn set_probe_temperature(&self, temp: i32) -> Result<()>;

    /// Set the probe 2 target temperature.
    async fn set_probe_2_temperature(&self, temp: i32) -> Result<()>;

    /// Turn the light on.
    async fn turn_light_on(&self) -> Result<()>;

    /// Turn the light off.
    async fn turn_light_off(&self) -> Result<()>;

    /// Run the primer motor.
    async fn turn_primer_motor_on(&self) -> Result<()>;

    /// Stop the primer motor.
    async fn turn_primer_motor_off(&self) -> Result<()>;

    /// Shut the grill down.
    async fn turn_grill_off(&self) -> Result<()>;
}

/// Builds protocol clients for a config entry.
pub trait ClientFactory: Send + Sync {
    /// Construct a client bound to `endpoint`.
    ///
    /// The transport reports unexpected disconnects on `events`.
    fn create(
        &self,
        endpoint: Endpoint,
        entry: &EntryData,
        events: DeviceEventSender,
    ) -> Result<Arc<dyn GrillApi>>;
}
