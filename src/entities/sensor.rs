//! Probe temperature and recipe sensors.

use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::data::GrillState;
use crate::entities::base::BaseEntity;

/// Sensor device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorDeviceClass {
    /// A temperature.
    Temperature,
    /// A duration.
    Duration,
}

/// Sensor state class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorStateClass {
    /// A point-in-time measurement.
    Measurement,
}

/// What a sensor's value measures, which decides its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// A meat probe, numbered from 1.
    Probe(u8),
    /// The active recipe step.
    RecipeStep,
    /// Seconds left in the recipe step.
    RecipeTime,
}

/// Static description of a sensor.
pub struct SensorDescription {
    /// Snapshot key.
    pub key: &'static str,
    /// Entity name.
    pub name: &'static str,
    /// What is measured.
    pub kind: SensorKind,
    /// Device class.
    pub device_class: Option<SensorDeviceClass>,
    /// State class.
    pub state_class: Option<SensorStateClass>,
    /// Icon override.
    pub icon: Option<&'static str>,
    /// Reads the value from a snapshot.
    pub value_fn: fn(&GrillState) -> Option<i64>,
}

impl std::fmt::Debug for SensorDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorDescription")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

const fn probe(
    key: &'static str,
    name: &'static str,
    probe_number: u8,
    value_fn: fn(&GrillState) -> Option<i64>,
) -> SensorDescription {
    SensorDescription {
        key,
        name,
        kind: SensorKind::Probe(probe_number),
        device_class: Some(SensorDeviceClass::Temperature),
        state_class: Some(SensorStateClass::Measurement),
        icon: Some("mdi:thermometer"),
        value_fn,
    }
}

/// Meat probe sensors, registered for every model.
pub static PROBE_DESCRIPTIONS: &[SensorDescription] = &[
    probe("p1Temp", "Probe 1", 1, |s| s.probe_temp(1).map(i64::from)),
    probe("p2Temp", "Probe 2", 2, |s| s.probe_temp(2).map(i64::from)),
    probe("p3Temp", "Probe 3", 3, |s| s.probe_temp(3).map(i64::from)),
    probe("p4Temp", "Probe 4", 4, |s| s.probe_temp(4).map(i64::from)),
];

/// Recipe sensors, registered when the model reports recipe progress.
pub static RECIPE_DESCRIPTIONS: &[SensorDescription] = &[
    SensorDescription {
        key: "recipeStep",
        name: "Recipe step",
        kind: SensorKind::RecipeStep,
        device_class: None,
        state_class: None,
        icon: Some("mdi:chef-hat"),
        value_fn: |s| s.recipe_step.map(i64::from),
    },
    SensorDescription {
        key: "recipeTime",
        name: "Recipe step time remaining",
        kind: SensorKind::RecipeTime,
        device_class: Some(SensorDeviceClass::Duration),
        state_class: Some(SensorStateClass::Measurement),
        icon: Some("mdi:timer-outline"),
        value_fn: |s| s.recipe_time.map(i64::from),
    },
];

/// A grill sensor.
#[derive(Debug, Clone)]
pub struct GrillSensor {
    base: BaseEntity,
    description: &'static SensorDescription,
}

impl GrillSensor {
    /// Create a sensor from its description.
    ///
    /// Probe sensors use `probe<N>_<entry>` as their unique id.
    pub fn new(
        coordinator: Arc<Coordinator>,
        entry_unique_id: &str,
        description: &'static SensorDescription,
    ) -> Self {
        let key = match description.kind {
            SensorKind::Probe(n) => format!("probe{}", n),
            _ => description.key.to_string(),
        };

        Self {
            base: BaseEntity::new(coordinator, entry_unique_id, &key, description.name),
            description,
        }
    }

    pub fn base(&self) -> &BaseEntity {
        &self.base
    }

    pub fn description(&self) -> &'static SensorDescription {
        self.description
    }

    /// Whether the entity starts enabled in the registry.
    ///
    /// Probes beyond the model's port count start disabled.
    pub fn entity_registry_enabled_default(&self) -> bool {
        match self.description.kind {
            SensorKind::Probe(n) => n <= self.base.spec().meat_probes,
            _ => true,
        }
    }

    /// Unit of the sensor's value.
    pub fn native_unit_of_measurement(&self) -> Option<&'static str> {
        match self.description.kind {
            SensorKind::Probe(_) => Some(self.base.temperature_unit().symbol()),
            SensorKind::RecipeTime => Some("s"),
            SensorKind::RecipeStep => None,
        }
    }

    /// The sensor's value; `None` when unknown.
    pub fn native_value(&self) -> Option<i64> {
        self.base.data().and_then(|d| (self.description.value_fn)(&d))
    }

    pub fn available(&self) -> bool {
        self.base.available()
    }
}

/// Build the sensor platform's entities.
pub fn setup_platform(coordinator: &Arc<Coordinator>, entry_unique_id: &str) -> Vec<GrillSensor> {
    let recipe: &'static [SensorDescription] = if coordinator.spec().has_recipe_telemetry {
        RECIPE_DESCRIPTIONS
    } else {
        &[]
    };

    PROBE_DESCRIPTIONS
        .iter()
        .chain(recipe.iter())
        .map(|description| GrillSensor::new(coordinator.clone(), entry_unique_id, description))
        .collect()
}
