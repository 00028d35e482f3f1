//! Config entry lifecycle.
//!
//! [`setup_entry`] turns a persisted [`ConfigEntry`] into a running
//! coordinator with its entities registered on the host. The returned
//! [`LoadedEntry`] owns every background task and releases them on unload.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ble::scanner::{BleDevice, DeviceLookup, DeviceWatcher};
use crate::client::ClientFactory;
use crate::config::{ConfigEntry, CoordinatorConfig, Transport};
use crate::coordinator::Coordinator;
use crate::entities::{build_entities, Entity, Platform, PLATFORMS};
use crate::error::{Error, Result};

/// The host automation framework, as seen by an entry.
pub trait Host: Send + Sync {
    /// Register entities on a platform.
    fn add_entities(&self, platform: Platform, entities: Vec<Entity>);

    /// Check whether the host process is shutting down.
    fn is_stopping(&self) -> bool;
}

/// Collaborators needed to set up an entry.
#[derive(Clone)]
pub struct SetupContext {
    /// Builds protocol clients.
    pub factory: Arc<dyn ClientFactory>,
    /// The host framework.
    pub host: Arc<dyn Host>,
    /// Coordinator timing.
    pub config: CoordinatorConfig,
    /// Advertisement source for BLE entries. Unused by WebSocket entries.
    pub watcher: Option<Arc<dyn DeviceWatcher>>,
}

impl std::fmt::Debug for SetupContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupContext")
            .field("config", &self.config)
            .field("has_watcher", &self.watcher.is_some())
            .finish()
    }
}

/// Lookup for entries without an advertisement source.
struct NoSightings;

impl DeviceLookup for NoSightings {
    fn device_from_address(&self, _address: &str) -> Option<BleDevice> {
        None
    }
}

/// A set-up config entry.
pub struct LoadedEntry {
    entry: ConfigEntry,
    coordinator: Arc<Coordinator>,
    watcher: Option<Arc<dyn DeviceWatcher>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    unloaded: AtomicBool,
}

impl LoadedEntry {
    /// The entry this was set up from.
    pub fn entry(&self) -> &ConfigEntry {
        &self.entry
    }

    /// The entry's coordinator.
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Check whether the entry has been unloaded.
    pub fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::SeqCst)
    }

    /// Stop every task and tear the coordinator down.
    ///
    /// Safe to call more than once. Errors are logged, never returned.
    pub async fn unload(&self) {
        if self.unloaded.swap(true, Ordering::SeqCst) {
            debug!("Entry {} already unloaded", self.entry.entry_id);
            return;
        }

        info!("Unloading entry {}", self.entry.entry_id);

        if let Some(watcher) = &self.watcher {
            if let Err(e) = watcher.stop().await {
                warn!("Error stopping advertisement watcher: {}", e);
            }
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            task.abort();
        }

        self.coordinator.shutdown().await;
    }
}

impl std::fmt::Debug for LoadedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedEntry")
            .field("entry_id", &self.entry.entry_id)
            .field("coordinator", &self.coordinator)
            .field("unloaded", &self.is_unloaded())
            .finish()
    }
}

/// Set up a config entry.
///
/// Binds the transport, waits for the first successful update, registers
/// entities on every platform, then starts the periodic update task.
///
/// # Errors
///
/// Returns [`Error::NotReady`] if the grill cannot be reached within the
/// setup timeout or the first update fails. Everything acquired so far is
/// released before returning.
pub async fn setup_entry(entry: ConfigEntry, ctx: &SetupContext) -> Result<LoadedEntry> {
    let coordinator = Arc::new(Coordinator::new(
        entry.data.clone(),
        ctx.factory.clone(),
        ctx.config,
    )?);

    let lookup: Arc<dyn DeviceLookup> = match &ctx.watcher {
        Some(watcher) => watcher.clone().lookup(),
        None => Arc::new(NoSightings),
    };
    let event_loop = coordinator.spawn_event_loop(lookup, ctx.host.clone())?;

    let mut loaded = LoadedEntry {
        entry,
        coordinator,
        watcher: None,
        tasks: Mutex::new(vec![event_loop]),
        unloaded: AtomicBool::new(false),
    };

    if let Err(e) = connect(&mut loaded, ctx).await {
        warn!(
            "Setup of {} failed, releasing resources: {}",
            loaded.entry.data.device_id, e
        );
        loaded.unload().await;
        return Err(match e {
            Error::NotReady { .. } => e,
            other => Error::NotReady {
                reason: other.to_string(),
            },
        });
    }

    let entry_unique_id = loaded.entry.unique_id.clone();
    for platform in PLATFORMS {
        let entities = build_entities(&loaded.coordinator, &entry_unique_id, platform);
        debug!("Registering {} {} entities", entities.len(), platform);
        ctx.host.add_entities(platform, entities);
    }

    let refresh_loop = loaded.coordinator.spawn_refresh_loop();
    loaded.tasks.lock().push(refresh_loop);

    info!(
        "Set up {} ({}) over {}",
        loaded.entry.title, loaded.entry.data.model, loaded.entry.data.protocol
    );

    Ok(loaded)
}

async fn connect(loaded: &mut LoadedEntry, ctx: &SetupContext) -> Result<()> {
    let coordinator = loaded.coordinator.clone();

    match coordinator.entry().protocol {
        Transport::Wss => coordinator.bind_network_client()?,
        Transport::Ble => {
            let watcher = ctx.watcher.clone().ok_or(Error::BluetoothUnavailable)?;
            watcher.forward_to(coordinator.event_sender());
            loaded.watcher = Some(watcher.clone());
            watcher.start().await?;

            let timeout = coordinator.config().setup_timeout;
            if tokio::time::timeout(timeout, coordinator.wait_until_started())
                .await
                .is_err()
            {
                return Err(Error::NotReady {
                    reason: format!(
                        "{} not found within {:?}",
                        coordinator.entry().device_id,
                        timeout
                    ),
                });
            }
        }
    }

    coordinator
        .refresh()
        .await
        .map_err(|failure| Error::NotReady {
            reason: failure.to_string(),
        })?;

    Ok(())
}

/// Unload an entry and set it up again from the same config.
pub async fn reload_entry(loaded: LoadedEntry, ctx: &SetupContext) -> Result<LoadedEntry> {
    loaded.unload().await;
    setup_entry(loaded.entry, ctx).await
}
