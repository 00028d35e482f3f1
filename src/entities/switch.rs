//! Module power and primer switches.

use std::sync::Arc;
use tracing::warn;

use crate::config::DEFAULT_MIN_TEMP;
use crate::coordinator::Coordinator;
use crate::data::Command;
use crate::entities::base::BaseEntity;
use crate::error::Result;

/// Which switch an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchKind {
    /// Control module power. Can only be switched off remotely.
    Power,
    /// Pellet primer motor.
    Primer,
}

impl SwitchKind {
    /// Snapshot key of the switch state.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Power => "moduleIsOn",
            Self::Primer => "primeState",
        }
    }

    /// Entity name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Power => "Module power",
            Self::Primer => "Prime",
        }
    }
}

/// A grill switch.
#[derive(Debug, Clone)]
pub struct GrillSwitch {
    base: BaseEntity,
    kind: SwitchKind,
}

impl GrillSwitch {
    pub fn new(coordinator: Arc<Coordinator>, entry_unique_id: &str, kind: SwitchKind) -> Self {
        Self {
            base: BaseEntity::new(coordinator, entry_unique_id, kind.key(), kind.name()),
            kind,
        }
    }

    pub fn base(&self) -> &BaseEntity {
        &self.base
    }

    pub fn kind(&self) -> SwitchKind {
        self.kind
    }

    /// Whether the switch is on. A known snapshot without the key reads as off.
    pub fn is_on(&self) -> Option<bool> {
        let data = self.base.data()?;
        let value = match self.kind {
            SwitchKind::Power => data.module_is_on,
            SwitchKind::Primer => data.prime_state,
        };
        Some(value.unwrap_or(false))
    }

    /// Unavailable while the module reports itself off.
    pub fn available(&self) -> bool {
        self.base.available_while_module_on()
    }

    /// Turn the switch on.
    ///
    /// The grill cannot be powered on remotely; for [`SwitchKind::Power`]
    /// this only logs a warning.
    pub async fn turn_on(&self) -> Result<()> {
        match self.kind {
            SwitchKind::Power => {
                warn!("For safety reasons, the grill cannot be turned on remotely.");
                Ok(())
            }
            SwitchKind::Primer => {
                self.base.ensure_supported(Command::TurnPrimerMotorOn)?;
                self.base
                    .coordinator()
                    .require_api()?
                    .turn_primer_motor_on()
                    .await
            }
        }
    }

    /// Turn the switch off.
    ///
    /// Powering off also drops the grill target to the model's minimum.
    pub async fn turn_off(&self) -> Result<()> {
        let api = self.base.coordinator().require_api()?;
        match self.kind {
            SwitchKind::Power => {
                api.turn_grill_off().await?;
                let min_temp = self.base.spec().min_temp.unwrap_or(DEFAULT_MIN_TEMP);
                api.set_grill_temperature(i32::from(min_temp)).await
            }
            SwitchKind::Primer => {
                self.base.ensure_supported(Command::TurnPrimerMotorOff)?;
                api.turn_primer_motor_off().await
            }
        }
    }
}

/// Build the switch platform's entities.
pub fn setup_platform(coordinator: &Arc<Coordinator>, entry_unique_id: &str) -> Vec<GrillSwitch> {
    let mut entities = vec![GrillSwitch::new(
        coordinator.clone(),
        entry_unique_id,
        SwitchKind::Power,
    )];
    if coordinator.spec().supports(Command::TurnPrimerMotorOn) {
        entities.push(GrillSwitch::new(
            coordinator.clone(),
            entry_unique_id,
            SwitchKind::Primer,
        ));
    }
    entities
}
