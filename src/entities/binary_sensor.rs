//! Binary sensors for grill faults and the auger.

use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::data::GrillState;
use crate::entities::base::{BaseEntity, EntityCategory};

/// Binary sensor device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinarySensorDeviceClass {
    /// On means a problem was detected.
    Problem,
    /// On means the device is running.
    Running,
}

/// Static description of a binary sensor.
pub struct BinarySensorDescription {
    /// Snapshot key; also the unique id prefix.
    pub key: &'static str,
    /// Entity name.
    pub name: &'static str,
    /// Device class.
    pub device_class: BinarySensorDeviceClass,
    /// Registry category.
    pub entity_category: Option<EntityCategory>,
    /// Icon override.
    pub icon: Option<&'static str>,
    /// Reads the value from a snapshot.
    pub value_fn: fn(&GrillState) -> Option<bool>,
}

impl std::fmt::Debug for BinarySensorDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinarySensorDescription")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("device_class", &self.device_class)
            .finish_non_exhaustive()
    }
}

const fn problem(
    key: &'static str,
    name: &'static str,
    value_fn: fn(&GrillState) -> Option<bool>,
) -> BinarySensorDescription {
    BinarySensorDescription {
        key,
        name,
        device_class: BinarySensorDeviceClass::Problem,
        entity_category: Some(EntityCategory::Diagnostic),
        icon: None,
        value_fn,
    }
}

/// All binary sensors, registered for every model.
pub static ENTITY_DESCRIPTIONS: &[BinarySensorDescription] = &[
    problem("err1", "Probe 1 error", |s| s.err1),
    problem("err2", "Probe 2 error", |s| s.err2),
    problem("err3", "Probe 3 error", |s| s.err3),
    problem("erL", "Startup error", |s| s.er_l),
    problem("highTempErr", "High temperature error", |s| s.high_temp_err),
    problem("fanErr", "Fan error", |s| s.fan_err),
    problem("hotErr", "Igniter error", |s| s.hot_err),
    problem("motorErr", "Auger error", |s| s.motor_err),
    problem("noPellets", "No pellets", |s| s.no_pellets),
    BinarySensorDescription {
        key: "motorState",
        name: "Auger",
        device_class: BinarySensorDeviceClass::Running,
        entity_category: None,
        icon: Some("mdi:filter-cog"),
        value_fn: |s| s.motor_state,
    },
];

/// A grill binary sensor.
#[derive(Debug, Clone)]
pub struct BinarySensor {
    base: BaseEntity,
    description: &'static BinarySensorDescription,
}

impl BinarySensor {
    /// Create a binary sensor from its description.
    pub fn new(
        coordinator: Arc<Coordinator>,
        entry_unique_id: &str,
        description: &'static BinarySensorDescription,
    ) -> Self {
        Self {
            base: BaseEntity::new(coordinator, entry_unique_id, description.key, description.name),
            description,
        }
    }

    /// Shared entity state.
    pub fn base(&self) -> &BaseEntity {
        &self.base
    }

    /// The sensor's description.
    pub fn description(&self) -> &'static BinarySensorDescription {
        self.description
    }

    /// Whether the sensor is on; `None` when unknown.
    pub fn is_on(&self) -> Option<bool> {
        self.base.data().and_then(|d| (self.description.value_fn)(&d))
    }

    pub fn available(&self) -> bool {
        self.base.available()
    }
}

/// Build the binary sensor platform's entities.
pub fn setup_platform(coordinator: &Arc<Coordinator>, entry_unique_id: &str) -> Vec<BinarySensor> {
    ENTITY_DESCRIPTIONS
        .iter()
        .map(|description| BinarySensor::new(coordinator.clone(), entry_unique_id, description))
        .collect()
}
