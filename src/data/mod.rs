//! Data structures for grill data.
//!
//! This module contains the state snapshot reported by a grill and the
//! static capability specifications of the supported models.

pub mod grills;
pub mod state;

pub use grills::{get_grill, get_grills, Command, ControlBoard, GrillSpec};
pub use state::{GrillState, Snapshot};
