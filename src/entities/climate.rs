//! Climate entity for the grill chamber.

use std::sync::Arc;
use tracing::debug;

use crate::config::{DEFAULT_MAX_TEMP, DEFAULT_MIN_TEMP};
use crate::coordinator::Coordinator;
use crate::entities::base::{ensure_in_range, BaseEntity};
use crate::error::Result;
use crate::utils::{convert_temperature, TemperatureUnit};

/// Operating mode of a climate entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HvacMode {
    /// Heating.
    Heat,
}

/// What the grill is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HvacAction {
    /// Igniter is hot.
    Heating,
    /// Only the fan is running.
    Fan,
    /// Neither.
    Idle,
}

/// Chamber temperature control.
#[derive(Debug, Clone)]
pub struct GrillClimate {
    base: BaseEntity,
    min_temp: f64,
    max_temp: f64,
}

impl GrillClimate {
    /// Temperature step offered to users.
    pub const TARGET_TEMPERATURE_STEP: f64 = 5.0;

    /// Create the climate entity. Bounds come from the model's spec, which
    /// declares them in Fahrenheit.
    pub fn new(coordinator: Arc<Coordinator>, entry_unique_id: &str) -> Self {
        let spec = coordinator.spec();
        let min_temp = f64::from(spec.min_temp.unwrap_or(DEFAULT_MIN_TEMP));
        let max_temp = f64::from(spec.max_temp.unwrap_or(DEFAULT_MAX_TEMP));

        Self {
            base: BaseEntity::new(
                coordinator,
                entry_unique_id,
                "grill_temperature",
                "Grill temperature",
            ),
            min_temp,
            max_temp,
        }
    }

    pub fn base(&self) -> &BaseEntity {
        &self.base
    }

    /// Lowest settable target, in [`Self::temperature_unit`].
    pub fn min_temp(&self) -> f64 {
        self.to_display_unit(self.min_temp)
    }

    /// Highest settable target, in [`Self::temperature_unit`].
    pub fn max_temp(&self) -> f64 {
        self.to_display_unit(self.max_temp)
    }

    fn to_display_unit(&self, fahrenheit: f64) -> f64 {
        convert_temperature(
            fahrenheit,
            TemperatureUnit::Fahrenheit,
            self.temperature_unit(),
        )
    }

    pub fn hvac_mode(&self) -> HvacMode {
        HvacMode::Heat
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        &[HvacMode::Heat]
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.base.temperature_unit()
    }

    /// Current chamber temperature.
    pub fn current_temperature(&self) -> Option<f64> {
        self.base.data()?.grill_temp.map(f64::from)
    }

    /// Target chamber temperature.
    pub fn target_temperature(&self) -> Option<f64> {
        self.base.data()?.grill_set_temp.map(f64::from)
    }

    /// Heating if the igniter is hot, fan if only the fan runs, else idle.
    pub fn hvac_action(&self) -> Option<HvacAction> {
        let data = self.base.data()?;
        if data.hot_state.unwrap_or(false) {
            Some(HvacAction::Heating)
        } else if data.fan_state.unwrap_or(false) {
            Some(HvacAction::Fan)
        } else {
            Some(HvacAction::Idle)
        }
    }

    /// Set the target temperature. `None` is ignored.
    ///
    /// The new target shows up on the next pushed snapshot.
    pub async fn set_temperature(&self, temperature: Option<f64>) -> Result<()> {
        let Some(temperature) = temperature else {
            return Ok(());
        };
        ensure_in_range("temperature", temperature, self.min_temp(), self.max_temp())?;
        let api = self.base.coordinator().require_api()?;
        debug!("Setting grill temperature to {}", temperature);
        api.set_grill_temperature(temperature.round() as i32).await
    }

    pub fn available(&self) -> bool {
        self.base.available()
    }
}

/// Build the climate platform's entities.
pub fn setup_platform(coordinator: &Arc<Coordinator>, entry_unique_id: &str) -> Vec<GrillClimate> {
    vec![GrillClimate::new(coordinator.clone(), entry_unique_id)]
}
