//! Probe target temperatures.

use std::sync::Arc;

use crate::config::{DEFAULT_MAX_TEMP, DEFAULT_MIN_TEMP};
use crate::coordinator::Coordinator;
use crate::data::{Command, GrillState};
use crate::entities::base::{ensure_in_range, BaseEntity};
use crate::error::Result;
use crate::utils::{convert_temperature, TemperatureUnit};

/// Which probe target a number entity drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeTarget {
    /// Probe 1.
    Primary,
    /// Probe 2. Only on boards with `set-probe-2-temperature`.
    Secondary,
}

/// Static description of a probe target number.
pub struct NumberDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub target: ProbeTarget,
    pub value_fn: fn(&GrillState) -> Option<i32>,
}

impl std::fmt::Debug for NumberDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumberDescription")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

pub static PROBE_1_DESCRIPTION: NumberDescription = NumberDescription {
    key: "p1Target",
    name: "Probe 1 Target",
    icon: "mdi:thermometer",
    target: ProbeTarget::Primary,
    value_fn: |s| s.p1_target,
};

pub static PROBE_2_DESCRIPTION: NumberDescription = NumberDescription {
    key: "p2Target",
    name: "Probe 2 Target",
    icon: "mdi:thermometer",
    target: ProbeTarget::Secondary,
    value_fn: |s| s.p2_target,
};

/// Target temperature of a meat probe.
#[derive(Debug, Clone)]
pub struct TargetProbeTemperature {
    base: BaseEntity,
    description: &'static NumberDescription,
}

impl TargetProbeTemperature {
    pub fn new(
        coordinator: Arc<Coordinator>,
        entry_unique_id: &str,
        description: &'static NumberDescription,
    ) -> Self {
        Self {
            base: BaseEntity::new(coordinator, entry_unique_id, description.key, description.name),
            description,
        }
    }

    pub fn base(&self) -> &BaseEntity {
        &self.base
    }

    pub fn description(&self) -> &'static NumberDescription {
        self.description
    }

    /// Unit of the value, following the grill's display unit.
    pub fn native_unit_of_measurement(&self) -> TemperatureUnit {
        self.base.temperature_unit()
    }

    pub fn native_value(&self) -> Option<i32> {
        self.base.data().and_then(|d| (self.description.value_fn)(&d))
    }

    /// 5 degrees in Fahrenheit, 1 in Celsius.
    pub fn native_step(&self) -> f64 {
        match self.native_unit_of_measurement() {
            TemperatureUnit::Fahrenheit => 5.0,
            TemperatureUnit::Celsius => 1.0,
        }
    }

    /// Lower bound, converted from the model's Fahrenheit bound.
    pub fn native_min_value(&self) -> f64 {
        let min_temp = self.base.spec().min_temp.unwrap_or(DEFAULT_MIN_TEMP);
        self.from_fahrenheit(min_temp)
    }

    /// Upper bound, converted from the model's Fahrenheit bound.
    pub fn native_max_value(&self) -> f64 {
        let max_temp = self.base.spec().max_temp.unwrap_or(DEFAULT_MAX_TEMP);
        self.from_fahrenheit(max_temp)
    }

    fn from_fahrenheit(&self, value: u16) -> f64 {
        convert_temperature(
            f64::from(value),
            TemperatureUnit::Fahrenheit,
            self.native_unit_of_measurement(),
        )
    }

    /// Probe targets are meaningless while the module is off.
    pub fn available(&self) -> bool {
        self.base.available_while_module_on()
    }

    /// Send a new target to the grill. Fractions are truncated.
    pub async fn set_native_value(&self, value: f64) -> Result<()> {
        ensure_in_range(
            self.description.key,
            value,
            self.native_min_value(),
            self.native_max_value(),
        )?;
        let api = self.base.coordinator().require_api()?;
        let temp = value as i32;
        match self.description.target {
            ProbeTarget::Primary => api.set_probe_temperature(temp).await,
            ProbeTarget::Secondary => {
                self.base.ensure_supported(Command::SetProbe2Temperature)?;
                api.set_probe_2_temperature(temp).await
            }
        }
    }
}

/// Build the number platform's entities.
pub fn setup_platform(
    coordinator: &Arc<Coordinator>,
    entry_unique_id: &str,
) -> Vec<TargetProbeTemperature> {
    let mut entities = vec![TargetProbeTemperature::new(
        coordinator.clone(),
        entry_unique_id,
        &PROBE_1_DESCRIPTION,
    )];
    if coordinator.spec().supports(Command::SetProbe2Temperature) {
        entities.push(TargetProbeTemperature::new(
            coordinator.clone(),
            entry_unique_id,
            &PROBE_2_DESCRIPTION,
        ));
    }
    entities
}
