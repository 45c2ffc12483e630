//! Renderer discovery that outputs JSON for scripting
//!
//! Usage: cargo run -p dlna-discovery --example discover_json [seconds]

use std::time::Duration;

use dlna_discovery::{discover_renderers, DeviceSummary, DiscoveryConfig};

fn main() {
    let seconds = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    let config = DiscoveryConfig::new().with_scan_window(Duration::from_secs(seconds));

    let devices = match discover_renderers(config) {
        Ok(devices) => devices,
        Err(e) => {
            eprintln!("Discovery failed: {}", e);
            std::process::exit(1);
        }
    };

    let summaries: Vec<DeviceSummary> = devices.iter().map(|d| d.summary()).collect();
    println!("{}", serde_json::to_string_pretty(&summaries).unwrap());
}
