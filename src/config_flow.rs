//! Discovery-driven config flow.
//!
//! A grill advertising `<control board>-<suffix>` starts a flow. The user
//! then picks the model from those the control board is used in.

use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use crate::ble::scanner::BleDevice;
use crate::config::{ConfigEntry, EntryData, Transport};
use crate::data::get_grills;

/// Step shown to pick the model.
pub const STEP_USER: &str = "user";

/// No grill name was discovered.
pub const ERROR_NOT_FOUND: &str = "not_found";

/// The chosen model is not used with the discovered control board.
pub const ERROR_INVALID_MODEL: &str = "invalid_model";

/// The discovered grill already has an entry.
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

/// Values submitted on the user step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserInput {
    pub model: String,
    pub password: Option<String>,
    pub protocol: Transport,
}

/// Outcome of a flow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowResult {
    /// Show a form.
    Form {
        step_id: &'static str,
        /// Models offered for selection.
        models: Vec<&'static str>,
        /// Discovered grill name, for the form description.
        name: Option<String>,
        /// Field (or `"base"`) to error key.
        errors: BTreeMap<&'static str, &'static str>,
    },
    /// Create the entry.
    CreateEntry {
        title: String,
        unique_id: String,
        data: EntryData,
    },
    /// Stop the flow.
    Abort { reason: &'static str },
}

impl FlowResult {
    /// Turn a created entry into a [`ConfigEntry`] with the given id.
    pub fn into_config_entry(self, entry_id: impl Into<String>) -> Option<ConfigEntry> {
        match self {
            Self::CreateEntry {
                title,
                unique_id,
                data,
            } => Some(ConfigEntry {
                entry_id: entry_id.into(),
                unique_id,
                title,
                data,
            }),
            _ => None,
        }
    }
}

/// One run of the config flow.
#[derive(Debug, Clone, Default)]
pub struct ConfigFlow {
    configured: HashSet<String>,
    discovered_name: Option<String>,
}

impl ConfigFlow {
    /// Start a flow, given the unique ids of entries that already exist.
    pub fn new<I, S>(configured_unique_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            configured: configured_unique_ids.into_iter().map(Into::into).collect(),
            discovered_name: None,
        }
    }

    /// The name of the discovered grill, if any.
    pub fn discovered_name(&self) -> Option<&str> {
        self.discovered_name.as_deref()
    }

    /// Handle a Bluetooth discovery.
    pub fn step_bluetooth(&mut self, device: &BleDevice) -> FlowResult {
        info!(
            "Found PitBoss smoker: {} @ {}",
            device.name.as_deref().unwrap_or("<unnamed>"),
            device.address
        );
        self.discovered_name = device.name.clone();

        if let Some(unique_id) = self.unique_id() {
            if self.configured.contains(&unique_id) {
                debug!("{} is already configured", unique_id);
                return FlowResult::Abort {
                    reason: ABORT_ALREADY_CONFIGURED,
                };
            }
        }

        self.step_user(None)
    }

    /// Show the model picker, or create the entry from submitted input.
    pub fn step_user(&mut self, input: Option<UserInput>) -> FlowResult {
        let mut errors = BTreeMap::new();
        let models = self.models();

        match (&self.discovered_name, input) {
            (None, _) => {
                errors.insert("base", ERROR_NOT_FOUND);
            }
            (Some(name), Some(input)) => {
                if models.contains(&input.model.as_str()) {
                    return FlowResult::CreateEntry {
                        title: name.clone(),
                        unique_id: name.to_lowercase(),
                        data: EntryData {
                            device_id: name.clone(),
                            model: input.model,
                            password: input.password,
                            protocol: input.protocol,
                        },
                    };
                }
                errors.insert("model", ERROR_INVALID_MODEL);
            }
            (Some(_), None) => {}
        }

        FlowResult::Form {
            step_id: STEP_USER,
            models,
            name: self.discovered_name.clone(),
            errors,
        }
    }

    fn unique_id(&self) -> Option<String> {
        self.discovered_name.as_ref().map(|name| name.to_lowercase())
    }

    fn models(&self) -> Vec<&'static str> {
        let name = self.discovered_name.as_deref().unwrap_or_default();
        let control_board = name.split('-').next().unwrap_or_default();
        get_grills(control_board).into_iter().map(|g| g.name).collect()
    }
}
