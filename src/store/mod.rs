//! One JSON file per week key holding `label -> {duration, last_timestamp}`.

mod format;

use crate::constants::STORE_FILE_PREFIX;
use crate::engine::Records;
use crate::error::StoreError;
use crate::week::WeekKey;
use chrono::{DateTime, Local};
use format::StoredEntry;
use indexmap::IndexMap;
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Load/save boundary for weekly totals. Holds nothing but its directory.
#[derive(Debug, Clone)]
pub struct DurationStore {
    dir: PathBuf,
}

impl DurationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, week: WeekKey) -> PathBuf {
        self.dir.join(file_name(week))
    }

    /// Loads the totals stored for `week`, or an empty map if there is no file.
    /// Entries without a timestamp are stamped with `now`.
    pub fn load(&self, week: WeekKey, now: DateTime<Local>) -> Result<Records, StoreError> {
        let path = self.path_for(week);
        if !path.exists() {
            return Ok(Records::new());
        }

        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let entries: IndexMap<String, StoredEntry> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;

        let records: Records = entries
            .into_iter()
            .map(|(label, entry)| {
                let record = entry.into_record(&label, now);
                (label, record)
            })
            .collect();
        info!("Loaded {} records for week {week} from {}", records.len(), path.display());
        Ok(records)
    }

    /// Replaces the stored totals for `week` with `records`.
    ///
    /// The bytes go to a uniquely named file beside the target which is then
    /// renamed over it, so a crash mid-write leaves the previous snapshot
    /// intact and concurrent writers never share a temporary file.
    pub fn save(&self, week: WeekKey, records: &Records) -> Result<(), StoreError> {
        let path = self.path_for(week);
        let bytes = encode(records)?;

        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let write_err = |source: std::io::Error| StoreError::Write {
            path: path.clone(),
            source,
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}", file_name(week)))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Moves an unreadable store aside so a fresh one can take its place.
    pub fn quarantine(&self, week: WeekKey, now: DateTime<Local>) -> Result<PathBuf, StoreError> {
        let path = self.path_for(week);
        let target = self
            .dir
            .join(format!("{}.corrupt-{}", file_name(week), now.timestamp()));
        fs::rename(&path, &target).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        warn!("Moved unreadable store {} to {}", path.display(), target.display());
        Ok(target)
    }
}

fn file_name(week: WeekKey) -> String {
    format!("{STORE_FILE_PREFIX}{}.json", week.number())
}

fn encode(records: &Records) -> Result<Vec<u8>, StoreError> {
    let entries: IndexMap<&str, StoredEntry> = records
        .iter()
        .map(|(label, record)| (label.as_str(), StoredEntry::from_record(record)))
        .collect();

    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    entries.serialize(&mut ser)?;
    Ok(bytes)
}
