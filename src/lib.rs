pub mod constants;
pub mod engine;
pub mod error;
pub mod models;
pub mod platform;
pub mod report;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod tracker;
pub mod week;

use crate::error::InitError;
use crate::platform::NativeProbe;
use crate::store::DurationStore;
use crate::tracker::{Tracker, TrackerConfig, TrackerService};
use chrono::Local;
use directories::ProjectDirs;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

fn data_dir(config: &TrackerConfig) -> Result<PathBuf, InitError> {
    let dir = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => ProjectDirs::from("com", "apptally", "AppTally")
            .ok_or(InitError::NoProjectDirs)?
            .data_dir()
            .to_path_buf(),
    };
    std::fs::create_dir_all(&dir).map_err(InitError::DataDirCreation)?;
    Ok(dir)
}

/// Tracks focus until Ctrl+C or SIGTERM, then writes a final snapshot.
pub fn run() -> Result<(), InitError> {
    let config = TrackerConfig::from_env();
    let dir = data_dir(&config)?;
    info!("Storing weekly totals in {}", dir.display());

    let tracker = Tracker::open(DurationStore::new(dir), Local::now());
    let service = Arc::new(TrackerService::new(tracker, config));
    if let Err(e) = service.save_now() {
        warn!("Data directory is not writable yet, totals stay in memory: {e}");
    }

    // Installed before the thread starts so every exit goes through the flush.
    let signal_service = Arc::clone(&service);
    ctrlc::set_handler(move || {
        if signal_service.is_running() {
            info!("Shutdown signal received, stopping tracker");
            signal_service.stop();
        }
    })?;

    let handle = service.start(NativeProbe::new());
    handle.join().map_err(|_| InitError::TrackerPanicked)?;
    info!("Tracker stopped");
    Ok(())
}
