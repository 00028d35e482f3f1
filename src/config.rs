//! Config entry data and coordinator tuning.

use std::time::Duration;

/// Integration domain.
pub const DOMAIN: &str = "pitboss";

/// Display name and manufacturer.
pub const NAME: &str = "PitBoss";

/// Manufacturer shown in the device registry.
pub const MANUFACTURER: &str = NAME;

/// Grill minimum temperature (°F) used when a model does not declare one.
pub const DEFAULT_MIN_TEMP: u16 = 150;

/// Grill maximum temperature (°F) used when a model does not declare one.
pub const DEFAULT_MAX_TEMP: u16 = 500;

/// Interval between scheduled updates.
pub const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Bound on a single liveness probe.
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on discovering and connecting to the grill during setup.
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport used to reach the grill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Transport {
    /// Bluetooth Low Energy.
    #[default]
    Ble,
    /// Vendor WebSocket relay.
    Wss,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ble => write!(f, "ble"),
            Self::Wss => write!(f, "wss"),
        }
    }
}

/// Persisted data of a config entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntryData {
    /// Grill device id; also its advertised BLE local name.
    pub device_id: String,
    /// Grill model name.
    pub model: String,
    /// Optional device password.
    #[cfg_attr(feature = "serde", serde(default))]
    pub password: Option<String>,
    /// Transport selector.
    #[cfg_attr(feature = "serde", serde(default))]
    pub protocol: Transport,
}

/// A configured grill.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigEntry {
    /// Framework-assigned entry id.
    pub entry_id: String,
    /// Unique id; the lowercase discovered name.
    pub unique_id: String,
    /// Display title.
    pub title: String,
    /// Persisted data.
    pub data: EntryData,
}

/// Timing of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Interval between scheduled updates.
    pub update_interval: Duration,
    /// Bound on each liveness probe.
    pub ping_timeout: Duration,
    /// Bound on the initial connection during setup.
    pub setup_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval: PING_INTERVAL,
            ping_timeout: PING_TIMEOUT,
            setup_timeout: SETUP_TIMEOUT,
        }
    }
}
