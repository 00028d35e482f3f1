//! Grill capability specifications.
//!
//! Each supported model maps to a static [`GrillSpec`] describing its
//! temperature range, probe count, and the commands its control board
//! accepts. Specs are looked up once by model name and never change.

use crate::error::{Error, Result};

/// A command a control board may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Set the grill target temperature.
    SetGrillTemperature,
    /// Set the probe 1 target temperature.
    SetProbeTemperature,
    /// Set the probe 2 target temperature.
    SetProbe2Temperature,
    /// Turn the cabinet light on.
    TurnLightOn,
    /// Turn the cabinet light off.
    TurnLightOff,
    /// Run the primer motor.
    TurnPrimerMotorOn,
    /// Stop the primer motor.
    TurnPrimerMotorOff,
    /// Shut the grill down.
    TurnGrillOff,
}

impl Command {
    /// The command name as used by the control board.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetGrillTemperature => "set-temperature",
            Self::SetProbeTemperature => "set-probe-temperature",
            Self::SetProbe2Temperature => "set-probe-2-temperature",
            Self::TurnLightOn => "turn-light-on",
            Self::TurnLightOff => "turn-light-off",
            Self::TurnPrimerMotorOn => "turn-primer-motor-on",
            Self::TurnPrimerMotorOff => "turn-primer-motor-off",
            Self::TurnGrillOff => "turn-off",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grill control board and the commands it accepts.
#[derive(Debug, PartialEq, Eq)]
pub struct ControlBoard {
    /// Board name. Grills advertise as `<board>-<suffix>`.
    pub name: &'static str,
    /// Supported commands.
    pub commands: &'static [Command],
}

impl ControlBoard {
    /// Check whether the board accepts a command.
    pub fn supports(&self, command: Command) -> bool {
        self.commands.contains(&command)
    }
}

/// Static capability specification of a grill model.
#[derive(Debug, PartialEq, Eq)]
pub struct GrillSpec {
    /// Model name.
    pub name: &'static str,
    /// Control board fitted to the model.
    pub control_board: &'static ControlBoard,
    /// Lowest settable grill temperature, in Fahrenheit.
    pub min_temp: Option<u16>,
    /// Highest settable grill temperature, in Fahrenheit.
    pub max_temp: Option<u16>,
    /// Number of meat probe ports.
    pub meat_probes: u8,
    /// Whether the model has a controllable light.
    pub has_lights: bool,
    /// Whether the model reports recipe step progress.
    pub has_recipe_telemetry: bool,
}

impl GrillSpec {
    /// Check whether the model's control board accepts a command.
    pub fn supports(&self, command: Command) -> bool {
        self.control_board.supports(command)
    }
}

static PBV: ControlBoard = ControlBoard {
    name: "PBV",
    commands: &[
        Command::SetGrillTemperature,
        Command::SetProbeTemperature,
        Command::TurnGrillOff,
    ],
};

static PBL: ControlBoard = ControlBoard {
    name: "PBL",
    commands: &[
        Command::SetGrillTemperature,
        Command::SetProbeTemperature,
        Command::SetProbe2Temperature,
        Command::TurnLightOn,
        Command::TurnLightOff,
        Command::TurnPrimerMotorOn,
        Command::TurnPrimerMotorOff,
        Command::TurnGrillOff,
    ],
};

static PBM: ControlBoard = ControlBoard {
    name: "PBM",
    commands: &[
        Command::SetGrillTemperature,
        Command::SetProbeTemperature,
        Command::SetProbe2Temperature,
        Command::TurnPrimerMotorOn,
        Command::TurnPrimerMotorOff,
        Command::TurnGrillOff,
    ],
};

static GRILLS: &[GrillSpec] = &[
    GrillSpec {
        name: "PBV4PS2",
        control_board: &PBV,
        min_temp: Some(130),
        max_temp: Some(420),
        meat_probes: 2,
        has_lights: false,
        has_recipe_telemetry: false,
    },
    GrillSpec {
        name: "PBV3PS1",
        control_board: &PBV,
        min_temp: Some(150),
        max_temp: Some(420),
        meat_probes: 1,
        has_lights: false,
        has_recipe_telemetry: false,
    },
    GrillSpec {
        name: "PB2180LK",
        control_board: &PBL,
        min_temp: Some(180),
        max_temp: Some(500),
        meat_probes: 4,
        has_lights: true,
        has_recipe_telemetry: false,
    },
    GrillSpec {
        name: "PB1600PS3",
        control_board: &PBL,
        min_temp: Some(180),
        max_temp: Some(500),
        meat_probes: 2,
        has_lights: false,
        has_recipe_telemetry: false,
    },
    GrillSpec {
        name: "PB850PS2",
        control_board: &PBM,
        min_temp: None,
        max_temp: None,
        meat_probes: 2,
        has_lights: false,
        has_recipe_telemetry: true,
    },
];

/// Look up the capability specification for a model.
///
/// # Errors
///
/// Returns [`Error::UnknownModel`] if the model is not in the table.
pub fn get_grill(model: &str) -> Result<&'static GrillSpec> {
    GRILLS
        .iter()
        .find(|g| g.name == model)
        .ok_or_else(|| Error::UnknownModel {
            model: model.to_string(),
        })
}

/// List the models fitted with the named control board.
pub fn get_grills(control_board: &str) -> Vec<&'static GrillSpec> {
    GRILLS
        .iter()
        .filter(|g| g.control_board.name == control_board)
        .collect()
}
