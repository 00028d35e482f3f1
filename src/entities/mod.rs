//! Entity adapters.
//!
//! Each platform maps coordinator snapshots onto typed read-only views and
//! forwards user commands to the protocol client. Entities are created once
//! per config entry, filtered by the grill's capability specification.

pub mod base;
pub mod binary_sensor;
pub mod climate;
pub mod light;
pub mod number;
pub mod sensor;
pub mod switch;

use std::sync::Arc;

use crate::coordinator::Coordinator;

pub use base::{BaseEntity, EntityCategory};
pub use binary_sensor::BinarySensor;
pub use climate::GrillClimate;
pub use light::GrillLight;
pub use number::TargetProbeTemperature;
pub use sensor::GrillSensor;
pub use switch::{GrillSwitch, SwitchKind};

/// Host framework platform an entity registers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    BinarySensor,
    Climate,
    Light,
    Number,
    Sensor,
    Switch,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BinarySensor => write!(f, "binary_sensor"),
            Self::Climate => write!(f, "climate"),
            Self::Light => write!(f, "light"),
            Self::Number => write!(f, "number"),
            Self::Sensor => write!(f, "sensor"),
            Self::Switch => write!(f, "switch"),
        }
    }
}

/// Platforms set up for every config entry, in order.
pub const PLATFORMS: [Platform; 6] = [
    Platform::BinarySensor,
    Platform::Climate,
    Platform::Light,
    Platform::Number,
    Platform::Sensor,
    Platform::Switch,
];

/// Any grill entity.
#[derive(Debug, Clone)]
pub enum Entity {
    BinarySensor(BinarySensor),
    Climate(GrillClimate),
    Light(GrillLight),
    Number(TargetProbeTemperature),
    Sensor(GrillSensor),
    Switch(GrillSwitch),
}

impl Entity {
    /// The platform this entity belongs to.
    pub fn platform(&self) -> Platform {
        match self {
            Self::BinarySensor(_) => Platform::BinarySensor,
            Self::Climate(_) => Platform::Climate,
            Self::Light(_) => Platform::Light,
            Self::Number(_) => Platform::Number,
            Self::Sensor(_) => Platform::Sensor,
            Self::Switch(_) => Platform::Switch,
        }
    }

    pub fn base(&self) -> &BaseEntity {
        match self {
            Self::BinarySensor(e) => e.base(),
            Self::Climate(e) => e.base(),
            Self::Light(e) => e.base(),
            Self::Number(e) => e.base(),
            Self::Sensor(e) => e.base(),
            Self::Switch(e) => e.base(),
        }
    }

    pub fn unique_id(&self) -> &str {
        self.base().unique_id()
    }

    pub fn name(&self) -> &str {
        self.base().name()
    }

    /// Availability, including per-platform rules.
    pub fn available(&self) -> bool {
        match self {
            Self::BinarySensor(e) => e.available(),
            Self::Climate(e) => e.available(),
            Self::Light(e) => e.available(),
            Self::Number(e) => e.available(),
            Self::Sensor(e) => e.available(),
            Self::Switch(e) => e.available(),
        }
    }
}

/// Build the entities of one platform for a config entry.
pub fn build_entities(
    coordinator: &Arc<Coordinator>,
    entry_unique_id: &str,
    platform: Platform,
) -> Vec<Entity> {
    match platform {
        Platform::BinarySensor => binary_sensor::setup_platform(coordinator, entry_unique_id)
            .into_iter()
            .map(Entity::BinarySensor)
            .collect(),
        Platform::Climate => climate::setup_platform(coordinator, entry_unique_id)
            .into_iter()
            .map(Entity::Climate)
            .collect(),
        Platform::Light => light::setup_platform(coordinator, entry_unique_id)
            .into_iter()
            .map(Entity::Light)
            .collect(),
        Platform::Number => number::setup_platform(coordinator, entry_unique_id)
            .into_iter()
            .map(Entity::Number)
            .collect(),
        Platform::Sensor => sensor::setup_platform(coordinator, entry_unique_id)
            .into_iter()
            .map(Entity::Sensor)
            .collect(),
        Platform::Switch => switch::setup_platform(coordinator, entry_unique_id)
            .into_iter()
            .map(Entity::Switch)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Transport;
    use crate::data::GrillState;
    use crate::test_support::{
        entry_data, grill_state, test_config, wss_coordinator, FakeFactory, FakeGrill,
    };
    use crate::utils::TemperatureUnit;
    use crate::Error;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    const ENTRY: &str = "pbl-0123abcd";

    fn climate(coordinator: &Arc<Coordinator>) -> GrillClimate {
        match build_entities(coordinator, ENTRY, Platform::Climate).pop() {
            Some(Entity::Climate(climate)) => climate,
            other => panic!("Expected climate entity, got {:?}", other),
        }
    }

    fn numbers(coordinator: &Arc<Coordinator>) -> Vec<TargetProbeTemperature> {
        number::setup_platform(coordinator, ENTRY)
    }

    fn switch(coordinator: &Arc<Coordinator>, kind: SwitchKind) -> GrillSwitch {
        switch::setup_platform(coordinator, ENTRY)
            .into_iter()
            .find(|s| s.kind() == kind)
            .unwrap()
    }

    #[test]
    fn test_climate_bounds_small_grill() {
        let (coordinator, _, _) = wss_coordinator("PBV4PS2");
        let climate = climate(&coordinator);
        assert_eq!(climate.min_temp(), 130.0);
        assert_eq!(climate.max_temp(), 420.0);
    }

    #[test]
    fn test_climate_bounds_and_light_large_grill() {
        let (coordinator, _, _) = wss_coordinator("PB2180LK");
        let climate = climate(&coordinator);
        assert_eq!(climate.min_temp(), 180.0);
        assert_eq!(climate.max_temp(), 500.0);
        assert_eq!(build_entities(&coordinator, ENTRY, Platform::Light).len(), 1);
    }

    #[test]
    fn test_no_light_without_support() {
        let (coordinator, _, _) = wss_coordinator("PBV4PS2");
        assert!(build_entities(&coordinator, ENTRY, Platform::Light).is_empty());
    }

    #[test]
    fn test_climate_default_bounds() {
        let (coordinator, _, _) = wss_coordinator("PB850PS2");
        let climate = climate(&coordinator);
        assert_eq!(climate.min_temp(), 150.0);
        assert_eq!(climate.max_temp(), 500.0);
    }

    #[test]
    fn test_single_probe_target_without_secondary_command() {
        let (coordinator, _, _) = wss_coordinator("PBV4PS2");
        let numbers = numbers(&coordinator);
        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers[0].description().key, "p1Target");

        let (coordinator, _, _) = wss_coordinator("PB2180LK");
        assert_eq!(self::numbers(&coordinator).len(), 2);
    }

    #[test]
    fn test_primer_switch_gated_on_board() {
        let (coordinator, _, _) = wss_coordinator("PBV4PS2");
        let kinds: Vec<_> = switch::setup_platform(&coordinator, ENTRY)
            .iter()
            .map(|s| s.kind())
            .collect();
        assert_eq!(kinds, vec![SwitchKind::Power]);

        let (coordinator, _, _) = wss_coordinator("PB2180LK");
        let kinds: Vec<_> = switch::setup_platform(&coordinator, ENTRY)
            .iter()
            .map(|s| s.kind())
            .collect();
        assert_eq!(kinds, vec![SwitchKind::Power, SwitchKind::Primer]);
    }

    #[test]
    fn test_recipe_sensors_gated_on_telemetry() {
        let (coordinator, _, _) = wss_coordinator("PB850PS2");
        assert_eq!(build_entities(&coordinator, ENTRY, Platform::Sensor).len(), 6);

        let (coordinator, _, _) = wss_coordinator("PBV4PS2");
        assert_eq!(build_entities(&coordinator, ENTRY, Platform::Sensor).len(), 4);
    }

    #[test]
    fn test_unique_ids() {
        let (coordinator, _, _) = wss_coordinator("PB2180LK");
        let ids: Vec<String> = PLATFORMS
            .iter()
            .flat_map(|p| build_entities(&coordinator, ENTRY, *p))
            .map(|e| e.unique_id().to_string())
            .collect();

        for expected in [
            "err1_pbl-0123abcd",
            "motorState_pbl-0123abcd",
            "grill_temperature_pbl-0123abcd",
            "light_pbl-0123abcd",
            "p1Target_pbl-0123abcd",
            "p2Target_pbl-0123abcd",
            "probe1_pbl-0123abcd",
            "probe4_pbl-0123abcd",
            "moduleIsOn_pbl-0123abcd",
            "primeState_pbl-0123abcd",
        ] {
            assert!(ids.iter().any(|id| id == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_probe_sensors_enabled_by_port_count() {
        let (coordinator, _, _) = wss_coordinator("PBV4PS2");
        let enabled: Vec<bool> = sensor::setup_platform(&coordinator, ENTRY)
            .iter()
            .map(|s| s.entity_registry_enabled_default())
            .collect();
        assert_eq!(enabled, vec![true, true, false, false]);
    }

    #[test]
    fn test_everything_unknown_without_snapshot() {
        let (coordinator, _, _) = wss_coordinator("PB2180LK");

        for platform in PLATFORMS {
            for entity in build_entities(&coordinator, ENTRY, platform) {
                assert!(!entity.available(), "{} available", entity.unique_id());
            }
        }
        assert_eq!(climate(&coordinator).current_temperature(), None);
        assert_eq!(climate(&coordinator).hvac_action(), None);
        assert_eq!(switch(&coordinator, SwitchKind::Power).is_on(), None);
        assert_eq!(
            climate(&coordinator).temperature_unit(),
            TemperatureUnit::Fahrenheit
        );
    }

    #[test]
    fn test_values_follow_snapshot() {
        let (coordinator, _, _) = wss_coordinator("PB2180LK");
        coordinator.set_updated_data(GrillState {
            p1_temp: Some(160),
            p1_target: Some(195),
            hot_state: Some(true),
            motor_state: Some(true),
            light_state: Some(false),
            ..grill_state(240)
        });

        let climate = climate(&coordinator);
        assert!(climate.available());
        assert_eq!(climate.current_temperature(), Some(240.0));
        assert_eq!(climate.target_temperature(), Some(225.0));
        assert_eq!(climate.hvac_action(), Some(climate::HvacAction::Heating));

        let sensors = sensor::setup_platform(&coordinator, ENTRY);
        assert_eq!(sensors[0].native_value(), Some(160));
        assert_eq!(sensors[0].native_unit_of_measurement(), Some("°F"));
        assert_eq!(sensors[1].native_value(), None);

        let binary = binary_sensor::setup_platform(&coordinator, ENTRY);
        let auger = binary
            .iter()
            .find(|b| b.description().key == "motorState")
            .unwrap();
        assert_eq!(auger.is_on(), Some(true));
        assert_eq!(binary[0].is_on(), None);

        let light = light::setup_platform(&coordinator, ENTRY).pop().unwrap();
        assert_eq!(light.is_on(), Some(false));

        assert_eq!(numbers(&coordinator)[0].native_value(), Some(195));
        assert_eq!(switch(&coordinator, SwitchKind::Power).is_on(), Some(true));
        assert_eq!(switch(&coordinator, SwitchKind::Primer).is_on(), Some(false));
    }

    #[test]
    fn test_fan_and_idle_actions() {
        let (coordinator, _, _) = wss_coordinator("PBV4PS2");
        coordinator.set_updated_data(GrillState {
            fan_state: Some(true),
            ..grill_state(200)
        });
        assert_eq!(
            climate(&coordinator).hvac_action(),
            Some(climate::HvacAction::Fan)
        );

        coordinator.set_updated_data(grill_state(200));
        assert_eq!(
            climate(&coordinator).hvac_action(),
            Some(climate::HvacAction::Idle)
        );
    }

    #[test]
    fn test_probe_target_units() {
        let (coordinator, _, _) = wss_coordinator("PB2180LK");
        let number = numbers(&coordinator).remove(0);
        assert_eq!(number.native_unit_of_measurement(), TemperatureUnit::Fahrenheit);

        coordinator.set_updated_data(grill_state(200));
        assert_eq!(number.native_step(), 5.0);
        assert_eq!(number.native_min_value(), 180.0);
        assert_eq!(number.native_max_value(), 500.0);

        coordinator.set_updated_data(GrillState {
            is_fahrenheit: Some(false),
            ..grill_state(90)
        });
        assert_eq!(number.native_unit_of_measurement(), TemperatureUnit::Celsius);
        assert_eq!(number.native_step(), 1.0);
        assert!((number.native_min_value() - 82.222).abs() < 0.01);
        assert!((number.native_max_value() - 260.0).abs() < 0.01);
    }

    #[test]
    fn test_missing_unit_flag_reads_celsius() {
        let (coordinator, _, _) = wss_coordinator("PB2180LK");
        coordinator.set_updated_data(GrillState {
            p1_temp: Some(60),
            ..Default::default()
        });
        let sensors = sensor::setup_platform(&coordinator, ENTRY);
        assert_eq!(sensors[0].native_unit_of_measurement(), Some("°C"));
    }

    #[test]
    fn test_module_off_gates_switches_and_targets() {
        let (coordinator, _, _) = wss_coordinator("PB2180LK");
        coordinator.set_updated_data(GrillState {
            module_is_on: Some(false),
            ..grill_state(80)
        });

        assert!(!switch(&coordinator, SwitchKind::Power).available());
        assert!(!numbers(&coordinator)[0].available());
        assert!(climate(&coordinator).available());

        coordinator.set_updated_data(grill_state(80));
        assert!(switch(&coordinator, SwitchKind::Power).available());
        assert!(numbers(&coordinator)[0].available());
    }

    #[test]
    fn test_unavailable_when_disconnected() {
        let (coordinator, grill, _) = wss_coordinator("PB2180LK");
        coordinator.set_updated_data(grill_state(200));
        assert!(climate(&coordinator).available());

        grill.connected.store(false, Ordering::SeqCst);
        assert!(!climate(&coordinator).available());
        assert_eq!(climate(&coordinator).current_temperature(), Some(200.0));
    }

    #[tokio::test]
    async fn test_power_switch_commands() {
        let (coordinator, grill, _) = wss_coordinator("PB2180LK");
        let power = switch(&coordinator, SwitchKind::Power);

        power.turn_on().await.unwrap();
        assert!(grill.calls().is_empty());

        power.turn_off().await.unwrap();
        assert_eq!(
            grill.calls(),
            vec!["turn_grill_off", "set_grill_temperature 180"]
        );
    }

    #[tokio::test]
    async fn test_power_off_uses_default_minimum() {
        let (coordinator, grill, _) = wss_coordinator("PB850PS2");
        switch(&coordinator, SwitchKind::Power)
            .turn_off()
            .await
            .unwrap();
        assert_eq!(grill.count("set_grill_temperature 150"), 1);
    }

    #[tokio::test]
    async fn test_primer_and_light_commands() {
        let (coordinator, grill, _) = wss_coordinator("PB2180LK");
        let primer = switch(&coordinator, SwitchKind::Primer);
        let light = light::setup_platform(&coordinator, ENTRY).pop().unwrap();

        primer.turn_on().await.unwrap();
        primer.turn_off().await.unwrap();
        light.turn_on().await.unwrap();
        light.turn_off().await.unwrap();

        assert_eq!(
            grill.calls(),
            vec![
                "turn_primer_motor_on",
                "turn_primer_motor_off",
                "turn_light_on",
                "turn_light_off"
            ]
        );
    }

    #[tokio::test]
    async fn test_setpoint_commands() {
        let (coordinator, grill, _) = wss_coordinator("PB2180LK");
        let numbers = numbers(&coordinator);
        let climate = climate(&coordinator);

        numbers[0].set_native_value(185.7).await.unwrap();
        numbers[1].set_native_value(200.0).await.unwrap();
        climate.set_temperature(Some(227.6)).await.unwrap();
        climate.set_temperature(None).await.unwrap();

        assert_eq!(
            grill.calls(),
            vec![
                "set_probe_temperature 185",
                "set_probe_2_temperature 200",
                "set_grill_temperature 228"
            ]
        );
    }

    #[tokio::test]
    async fn test_out_of_range_setpoints_rejected() {
        let (coordinator, grill, _) = wss_coordinator("PBV4PS2");

        let result = climate(&coordinator).set_temperature(Some(600.0)).await;
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));

        let result = numbers(&coordinator)[0].set_native_value(100.0).await;
        match result {
            Err(Error::InvalidParameter { name, value }) => {
                assert_eq!(name, "p1Target");
                assert_eq!(value, "100");
            }
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
        assert!(grill.calls().is_empty());
    }

    #[tokio::test]
    async fn test_climate_setpoint_in_celsius() {
        let (coordinator, grill, _) = wss_coordinator("PBV4PS2");
        coordinator.set_updated_data(GrillState {
            is_fahrenheit: Some(false),
            ..grill_state(90)
        });
        let climate = climate(&coordinator);
        assert_eq!(climate.temperature_unit(), TemperatureUnit::Celsius);
        assert!((climate.min_temp() - 54.444).abs() < 0.01);
        assert!((climate.max_temp() - 215.556).abs() < 0.01);

        climate.set_temperature(Some(100.0)).await.unwrap();

        let result = climate.set_temperature(Some(400.0)).await;
        match result {
            Err(Error::InvalidParameter { name, value }) => {
                assert_eq!(name, "temperature");
                assert_eq!(value, "400");
            }
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
        assert_eq!(grill.calls(), vec!["set_grill_temperature 100"]);
    }

    #[tokio::test]
    async fn test_unsupported_commands_rejected() {
        let (coordinator, grill, _) = wss_coordinator("PBV4PS2");

        let probe_2 = TargetProbeTemperature::new(
            coordinator.clone(),
            ENTRY,
            &number::PROBE_2_DESCRIPTION,
        );
        let result = probe_2.set_native_value(200.0).await;
        match result {
            Err(Error::NotSupported { operation }) => {
                assert_eq!(operation, "set-probe-2-temperature")
            }
            other => panic!("Expected NotSupported, got {:?}", other),
        }

        let light = GrillLight::new(coordinator.clone(), ENTRY);
        assert!(matches!(
            light.turn_on().await,
            Err(Error::NotSupported { .. })
        ));
        assert!(grill.calls().is_empty());
    }

    #[tokio::test]
    async fn test_commands_need_a_client() {
        let grill = Arc::new(FakeGrill::new());
        let coordinator = Arc::new(
            Coordinator::new(
                entry_data("PB2180LK", Transport::Ble),
                Arc::new(FakeFactory::new(grill)),
                test_config(),
            )
            .unwrap(),
        );

        let light = light::setup_platform(&coordinator, ENTRY).pop().unwrap();
        assert!(matches!(light.turn_on().await, Err(Error::NotConnected)));
    }
}
