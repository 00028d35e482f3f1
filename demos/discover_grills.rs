//! Grill discovery example
//!
//! Watches BLE advertisements for PitBoss grills and lists the models each
//! one could be, the way the config flow offers them.
//!
//! Run with: cargo run --example discover_grills
//!
//! To scan for longer:
//!   cargo run --example discover_grills -- --seconds 30

use pitboss_rust_ha::config_flow::{ConfigFlow, FlowResult};
use pitboss_rust_ha::{AdvertisementWatcher, NameMatcher, Result};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("warn,pitboss_rust_ha=debug")
        .init();

    println!("PitBoss Grill Discovery");
    println!("=======================\n");

    let args: Vec<String> = std::env::args().collect();
    let seconds = args
        .iter()
        .position(|arg| arg == "--seconds")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let watcher = AdvertisementWatcher::new(NameMatcher::AnyGrill).await?;
    watcher.start().await?;

    println!("Scanning for {} seconds...\n", seconds);
    tokio::time::sleep(Duration::from_secs(seconds)).await;

    watcher.stop().await?;

    let discovered = watcher.discovered();
    if discovered.is_empty() {
        println!("No grills found.");
        return Ok(());
    }

    for device in discovered.values() {
        let name = device.name.as_deref().unwrap_or("<unnamed>");
        println!("{} ({}), RSSI {:?}", name, device.address, device.rssi);

        let mut flow = ConfigFlow::new(Vec::<String>::new());
        match flow.step_bluetooth(device) {
            FlowResult::Form { models, .. } if !models.is_empty() => {
                for model in models {
                    println!("  - {}", model);
                }
            }
            _ => println!("  (no known models)"),
        }
    }

    Ok(())
}
