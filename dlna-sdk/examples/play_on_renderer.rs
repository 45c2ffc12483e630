//! Find a renderer and play a URL on it
//!
//! Usage: cargo run -p dlna-sdk --example play_on_renderer <media-url> [title] [name-filter]
//!
//! Set DLNA_LOG_MODE=development to see what the engine is doing.

use std::time::Duration;

use dlna_sdk::{logging, RegistryEvent, RendererSystem, SdkError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging_from_env()?;

    let mut args = std::env::args().skip(1);
    let Some(media_url) = args.next() else {
        eprintln!("usage: play_on_renderer <media-url> [title] [name-filter]");
        std::process::exit(2);
    };
    let title = args.next().unwrap_or_else(|| "Untitled".to_string());
    let filter = args.next().map(|f| f.to_lowercase());

    let system = RendererSystem::new()?;
    let events = system.events();

    let status = system.start_discovery();
    println!("{}", status.message);
    if !status.success {
        std::process::exit(1);
    }

    // Drain events until the scan goes quiet
    for event in events.timeout_iter(Duration::from_secs(6)) {
        if let RegistryEvent::DeviceDiscovered { device } = &event {
            println!("found {} ({})", device.name, device.ip);
        }
    }
    system.stop_discovery();

    let devices = system.discovered_devices();
    println!("{}", serde_json::to_string_pretty(&devices)?);

    let target = devices
        .into_iter()
        .filter(|d| d.supports_playback)
        .find(|d| match &filter {
            Some(f) => d.name.to_lowercase().contains(f),
            None => true,
        })
        .ok_or_else(|| SdkError::DeviceNotFound(filter.unwrap_or_else(|| "any renderer".to_string())))?;

    let connected = system.connect(&target.id)?;
    println!("connected to {}", connected.friendly_name);

    let status = system.play_media(&target.id, &media_url, &title)?;
    println!("{}", status.message);

    let volume = system.get_volume(&target.id)?;
    println!("volume {}{}", volume.volume, if volume.muted { " (muted)" } else { "" });

    Ok(())
}
