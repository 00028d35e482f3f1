//! BLE discovery module.
//!
//! Grills are found by their advertised local name. The GATT transport
//! itself belongs to the protocol client.

pub mod scanner;

pub use scanner::{
    is_grill_name, AdvertisementWatcher, BleDevice, DeviceLookup, DeviceWatcher, NameMatcher,
};
