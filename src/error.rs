//! Error types for the pitboss-rust-ha crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// The grill could not be reached when starting communication.
    #[error("Grill unavailable")]
    DeviceUnavailable,

    /// Operation requires a connection but the grill is not connected.
    #[error("Grill not connected")]
    NotConnected,

    /// A request to the grill did not complete in time.
    #[error("Request timed out")]
    Timeout,

    /// The grill answered a request with an error.
    #[error("RPC error: {message}")]
    Rpc {
        /// The error message reported by the grill.
        message: String,
    },

    /// No capability specification exists for the model.
    #[error("Unknown grill model: {model}")]
    UnknownModel {
        /// The model name that was looked up.
        model: String,
    },

    /// Config entry setup could not complete yet and should be retried later.
    #[error("Setup not ready: {reason}")]
    NotReady {
        /// Why setup did not complete.
        reason: String,
    },

    /// A scheduled update failed.
    #[error("Update failed: {0}")]
    UpdateFailed(#[from] UpdateFailure),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// The requested operation is not supported by this grill.
    #[error("Operation not supported: {operation}")]
    NotSupported {
        /// Description of the unsupported operation.
        operation: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Reason a scheduled update failed.
///
/// Every transport or protocol failure observed while refreshing is folded
/// into one of these before it reaches an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateFailure {
    /// The protocol client could not be started.
    #[error("Device unavailable")]
    DeviceUnavailable,

    /// The client is not connected or the liveness probe failed.
    #[error("Device not connected")]
    NotConnected,

    /// Fetching state failed at the transport level.
    #[error("{0}")]
    Transport(String),

    /// The grill rejected the state request.
    #[error("{0}")]
    Protocol(String),

    /// The coordinator has been torn down.
    #[error("Coordinator stopped")]
    Stopped,
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
