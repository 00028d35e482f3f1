//! Shared entity behavior.

use std::sync::Arc;

use crate::coordinator::{Coordinator, DeviceInfo};
use crate::data::{Command, GrillSpec, Snapshot};
use crate::error::{Error, Result};
use crate::utils::TemperatureUnit;

/// Registry category of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    /// Diagnostic information about the device.
    Diagnostic,
    /// Device configuration.
    Config,
}

/// State and identity common to every grill entity.
///
/// Entities only read the coordinator's snapshot; they never keep a copy of
/// their own.
#[derive(Debug, Clone)]
pub struct BaseEntity {
    coordinator: Arc<Coordinator>,
    entry_unique_id: String,
    unique_id: String,
    name: String,
}

impl BaseEntity {
    /// Create an entity whose unique id is `<key>_<entry unique id>`.
    pub fn new(
        coordinator: Arc<Coordinator>,
        entry_unique_id: &str,
        key: &str,
        name: impl Into<String>,
    ) -> Self {
        Self {
            coordinator,
            entry_unique_id: entry_unique_id.to_string(),
            unique_id: format!("{}_{}", key, entry_unique_id),
            name: name.into(),
        }
    }

    /// The coordinator feeding this entity.
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Unique id of the config entry this entity belongs to.
    pub fn entry_unique_id(&self) -> &str {
        &self.entry_unique_id
    }

    /// Registry unique id.
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Entity name, shown after the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device the entity is attached to.
    pub fn device_info(&self) -> &DeviceInfo {
        self.coordinator.device_info()
    }

    /// Capability specification of the grill.
    pub fn spec(&self) -> &'static GrillSpec {
        self.coordinator.spec()
    }

    /// The current snapshot, or `None` when nothing is known.
    pub fn data(&self) -> Option<Snapshot> {
        self.coordinator.data().filter(|d| !d.is_empty())
    }

    /// Unit of the temperatures in the current snapshot.
    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.data()
            .map(|d| d.temperature_unit())
            .unwrap_or_default()
    }

    /// Available when the last update succeeded, the client is connected,
    /// and a snapshot is known.
    pub fn available(&self) -> bool {
        self.coordinator.is_available()
    }

    /// Available, and the grill module is not reported off.
    pub(crate) fn available_while_module_on(&self) -> bool {
        match self.data() {
            Some(data) => data.module_is_on.unwrap_or(true) && self.available(),
            None => self.available(),
        }
    }

    /// Fail unless the grill's control board accepts `command`.
    pub(crate) fn ensure_supported(&self, command: Command) -> Result<()> {
        if self.spec().supports(command) {
            Ok(())
        } else {
            Err(Error::NotSupported {
                operation: command.to_string(),
            })
        }
    }
}

/// Reject a setpoint outside `[min, max]`.
pub(crate) fn ensure_in_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}
