//! # pitboss-rust-ha
//!
//! Home automation integration for PitBoss grills and smokers.
//!
//! The crate bridges a grill's protocol client, which may push state at any
//! time, to a polling host framework. One [`Coordinator`] per configured grill
//! owns the connection lifecycle and publishes immutable state snapshots;
//! entity adapters are read-only views over the latest snapshot.
//!
//! ## Features
//!
//! - **Push and poll**: pushed state is published immediately, and the
//!   scheduled update only fetches when nothing has been pushed yet
//! - **Liveness checks**: every scheduled update pings the grill with a
//!   bounded timeout
//! - **Rediscovery**: BLE grills that drop off are rebound to their next
//!   advertisement without building a second client
//! - **Capability-gated entities**: lights, secondary probes, and the primer
//!   only appear on models that have them
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pitboss_rust_ha::config_flow::{ConfigFlow, UserInput};
//! use pitboss_rust_ha::{AdvertisementWatcher, NameMatcher, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let watcher = AdvertisementWatcher::new(NameMatcher::AnyGrill).await?;
//!     let mut sightings = watcher.subscribe();
//!     watcher.start().await?;
//!
//!     let device = sightings.recv().await.map_err(|e| {
//!         pitboss_rust_ha::Error::Internal(e.to_string())
//!     })?;
//!
//!     let mut flow = ConfigFlow::new(Vec::<String>::new());
//!     flow.step_bluetooth(&device);
//!     let result = flow.step_user(Some(UserInput {
//!         model: "PB2180LK".to_string(),
//!         ..Default::default()
//!     }));
//!     println!("{:?}", result);
//!
//!     watcher.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! The protocol client itself is provided by the caller through
//! [`ClientFactory`].
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for persisted and state types

// Public modules
pub mod ble;
pub mod client;
pub mod config;
pub mod config_flow;
pub mod coordinator;
pub mod data;
pub mod entities;
pub mod error;
pub mod integration;
pub mod utils;

// Re-exports for convenience
pub use ble::{AdvertisementWatcher, BleDevice, DeviceLookup, DeviceWatcher, NameMatcher};
pub use client::{ClientFactory, DeviceEvent, Endpoint, GrillApi, StateCallback};
pub use config::{ConfigEntry, CoordinatorConfig, EntryData, Transport};
pub use coordinator::{CallbackHandle, Coordinator, CoordinatorState, CoordinatorUpdate, DeviceInfo};
pub use data::{get_grill, get_grills, Command, GrillSpec, GrillState, Snapshot};
pub use entities::{Entity, Platform, PLATFORMS};
pub use error::{Error, Result, UpdateFailure};
pub use integration::{reload_entry, setup_entry, Host, LoadedEntry, SetupContext};
pub use utils::{celsius_to_fahrenheit, fahrenheit_to_celsius, TemperatureUnit};

#[cfg(test)]
pub(crate) mod test_support;
