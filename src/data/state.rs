//! Grill state snapshots.
//!
//! A [`GrillState`] is the full key/value state last reported by a grill.
//! Every field is optional: a missing field means the grill has not reported
//! it, which is distinct from a reported `false` or `0`.

use std::sync::Arc;

use crate::utils::TemperatureUnit;

/// A published, immutable grill state.
///
/// Snapshots are replaced wholesale; holders of an older `Arc` keep seeing
/// the state they were handed.
pub type Snapshot = Arc<GrillState>;

/// Full state reported by a grill.
///
/// Field names follow the keys used on the wire (`grillTemp`, `p1Temp`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct GrillState {
    /// Current grill (chamber) temperature.
    pub grill_temp: Option<i32>,
    /// Grill target temperature.
    pub grill_set_temp: Option<i32>,
    /// Meat probe 1 temperature.
    pub p1_temp: Option<i32>,
    /// Meat probe 2 temperature.
    pub p2_temp: Option<i32>,
    /// Meat probe 3 temperature.
    pub p3_temp: Option<i32>,
    /// Meat probe 4 temperature.
    pub p4_temp: Option<i32>,
    /// Meat probe 1 target temperature.
    pub p1_target: Option<i32>,
    /// Meat probe 2 target temperature.
    pub p2_target: Option<i32>,
    /// Whether the control module is powered on.
    pub module_is_on: Option<bool>,
    /// Whether temperatures are reported in Fahrenheit.
    pub is_fahrenheit: Option<bool>,
    /// Igniter is hot.
    pub hot_state: Option<bool>,
    /// Draft fan is running.
    pub fan_state: Option<bool>,
    /// Auger motor is running.
    pub motor_state: Option<bool>,
    /// Cabinet light is on.
    pub light_state: Option<bool>,
    /// Primer motor is running.
    pub prime_state: Option<bool>,
    /// Probe 1 error.
    pub err1: Option<bool>,
    /// Probe 2 error.
    pub err2: Option<bool>,
    /// Probe 3 error.
    pub err3: Option<bool>,
    /// Startup error.
    #[cfg_attr(feature = "serde", serde(rename = "erL"))]
    pub er_l: Option<bool>,
    /// Over-temperature error.
    pub high_temp_err: Option<bool>,
    /// Fan error.
    pub fan_err: Option<bool>,
    /// Igniter error.
    pub hot_err: Option<bool>,
    /// Auger error.
    pub motor_err: Option<bool>,
    /// Hopper is out of pellets.
    pub no_pellets: Option<bool>,
    /// Active recipe step.
    pub recipe_step: Option<u32>,
    /// Time remaining in the active recipe step, in seconds.
    pub recipe_time: Option<u32>,
}

impl GrillState {
    /// A state carrying no fields. Published when the connection drops.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether no field has been reported.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Unit the grill is reporting temperatures in.
    ///
    /// An empty state reads as Fahrenheit; otherwise anything short of an
    /// explicit `isFahrenheit = true` reads as Celsius.
    pub fn temperature_unit(&self) -> TemperatureUnit {
        if self.is_empty() || self.is_fahrenheit == Some(true) {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::Celsius
        }
    }

    /// Temperature of a meat probe, numbered from 1.
    pub fn probe_temp(&self, probe_number: u8) -> Option<i32> {
        match probe_number {
            1 => self.p1_temp,
            2 => self.p2_temp,
            3 => self.p3_temp,
            4 => self.p4_temp,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(GrillState::empty().is_empty());

        let state = GrillState {
            module_is_on: Some(false),
            ..Default::default()
        };
        assert!(!state.is_empty());
    }

    #[test]
    fn test_temperature_unit() {
        assert_eq!(
            GrillState::empty().temperature_unit(),
            TemperatureUnit::Fahrenheit
        );

        let mut state = GrillState {
            grill_temp: Some(225),
            ..Default::default()
        };
        assert_eq!(state.temperature_unit(), TemperatureUnit::Celsius);

        state.is_fahrenheit = Some(true);
        assert_eq!(state.temperature_unit(), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_probe_temp() {
        let state = GrillState {
            p1_temp: Some(150),
            p4_temp: Some(98),
            ..Default::default()
        };
        assert_eq!(state.probe_temp(1), Some(150));
        assert_eq!(state.probe_temp(2), None);
        assert_eq!(state.probe_temp(4), Some(98));
        assert_eq!(state.probe_temp(9), None);
    }
}
