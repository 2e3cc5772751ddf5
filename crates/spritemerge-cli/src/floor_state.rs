//! Persisted cell floor for the accumulate policy.
//!
//! Each output directory keeps the largest cell size produced so far in a
//! small JSON file. Accumulating merges into that directory start from it and
//! write the raised floor back after a successful run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spritemerge_spec::CellFloor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the floor state inside an output directory.
pub const FLOOR_STATE_FILE: &str = ".spritemerge-floor.json";

/// On-disk floor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FloorState {
    /// Largest cell size produced in this directory.
    pub floor: CellFloor,
}

impl FloorState {
    pub fn new(floor: CellFloor) -> Self {
        Self { floor }
    }

    /// Serialize for storage.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).context("Failed to serialize floor state")
    }
}

/// Path of the floor state for `dir`.
pub fn floor_state_path(dir: &Path) -> PathBuf {
    dir.join(FLOOR_STATE_FILE)
}

/// Read the stored floor for `dir`. Returns `None` before the first run.
pub fn load_floor(dir: &Path) -> Result<Option<CellFloor>> {
    let path = floor_state_path(dir);
    let json = match fs::read(&path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read floor state: {}", path.display()))
        }
    };
    let state: FloorState = serde_json::from_slice(&json)
        .with_context(|| format!("Failed to parse floor state: {}", path.display()))?;
    Ok(Some(state.floor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_state_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(load_floor(tmp.path()).unwrap(), None);
        assert_eq!(load_floor(&tmp.path().join("not-created")).unwrap(), None);
    }

    #[test]
    fn stored_state_is_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let bytes = FloorState::new(CellFloor::new(12, 7)).to_json_pretty().unwrap();
        fs::write(floor_state_path(tmp.path()), bytes).unwrap();

        assert_eq!(load_floor(tmp.path()).unwrap(), Some(CellFloor::new(12, 7)));
    }

    #[test]
    fn corrupt_state_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(floor_state_path(tmp.path()), "{ \"floor\": 3 }").unwrap();

        let err = load_floor(tmp.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(FLOOR_STATE_FILE));
    }
}
