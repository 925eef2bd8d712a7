// Schedule persistence - Save and load containers as JSON files

use super::{MusicContainer, ScheduleError};
use std::fs;
use std::path::Path;

/// Write the container snapshot to `path`, creating parent directories
pub fn save_schedule<P: AsRef<Path>>(
    path: P,
    container: &MusicContainer,
) -> Result<(), ScheduleError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = container.to_json_string()?;
    fs::write(path, json)?;
    log::info!(
        "Saved schedule {} ({} slots) to {}",
        container.name(),
        container.len(),
        path.display()
    );
    Ok(())
}

/// Read a container snapshot from `path`
///
/// `total_steps` bounds the rebuilt schedule, exactly as for a live container.
pub fn load_schedule<P: AsRef<Path>>(
    path: P,
    total_steps: u64,
) -> Result<MusicContainer, ScheduleError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let container = MusicContainer::from_json_str(&json, total_steps)?;
    log::info!(
        "Loaded schedule {} ({} slots) from {}",
        container.name(),
        container.len(),
        path.display()
    );
    Ok(container)
}
