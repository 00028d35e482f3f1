//! Cabinet light.

use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::data::Command;
use crate::entities::base::BaseEntity;
use crate::error::Result;

/// The grill's cabinet light.
#[derive(Debug, Clone)]
pub struct GrillLight {
    base: BaseEntity,
}

impl GrillLight {
    pub fn new(coordinator: Arc<Coordinator>, entry_unique_id: &str) -> Self {
        Self {
            base: BaseEntity::new(coordinator, entry_unique_id, "light", "Light"),
        }
    }

    pub fn base(&self) -> &BaseEntity {
        &self.base
    }

    /// Whether the light is on; `None` when unknown.
    pub fn is_on(&self) -> Option<bool> {
        self.base.data()?.light_state
    }

    pub fn available(&self) -> bool {
        self.base.available()
    }

    pub async fn turn_on(&self) -> Result<()> {
        self.base.ensure_supported(Command::TurnLightOn)?;
        self.base.coordinator().require_api()?.turn_light_on().await
    }

    pub async fn turn_off(&self) -> Result<()> {
        self.base.ensure_supported(Command::TurnLightOff)?;
        self.base.coordinator().require_api()?.turn_light_off().await
    }
}

/// Build the light platform's entities. Models without a light get none.
pub fn setup_platform(coordinator: &Arc<Coordinator>, entry_unique_id: &str) -> Vec<GrillLight> {
    if coordinator.spec().has_lights {
        vec![GrillLight::new(coordinator.clone(), entry_unique_id)]
    } else {
        Vec::new()
    }
}
