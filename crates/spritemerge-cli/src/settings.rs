//! Merge settings: config file loading, command-line overrides and the
//! default output location.

use anyhow::{Context, Result};
use spritemerge_spec::{Alignment, Axis, CompressionPreset, FloorPolicy, MergeConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name used under the user's data directory.
pub const TOOL_DIR: &str = "spritemerge";

/// Default output directory: `<data-dir>/spritemerge/png/merge`.
pub fn default_output_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(TOOL_DIR).join("png").join("merge"))
}

/// Load a merge config from a JSON file.
pub fn load_config(path: &Path) -> Result<MergeConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    MergeConfig::from_json(&json)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Values given on the command line. `None` keeps the config file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub axis: Option<Axis>,
    pub alignment: Option<Alignment>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub floor_policy: Option<FloorPolicy>,
    pub out_dir: Option<String>,
    pub metadata: bool,
    pub compression: Option<CompressionPreset>,
}

impl Overrides {
    /// Apply these overrides on top of `config`.
    pub fn apply(&self, config: &mut MergeConfig) {
        if let Some(axis) = self.axis {
            config.atlas.axis = axis;
        }
        if let Some(alignment) = self.alignment {
            config.atlas.alignment = alignment;
        }
        if let Some(width) = self.min_width {
            config.atlas.floor.width = width;
        }
        if let Some(height) = self.min_height {
            config.atlas.floor.height = height;
        }
        if let Some(policy) = self.floor_policy {
            config.atlas.floor_policy = policy;
        }
        if let Some(ref dir) = self.out_dir {
            config.output.directory = Some(dir.clone());
        }
        if self.metadata {
            config.output.metadata = true;
        }
        if let Some(compression) = self.compression {
            config.output.compression = compression;
        }
    }
}

/// Build the effective config from an optional file plus overrides.
pub fn resolve_config(config_path: Option<&str>, overrides: &Overrides) -> Result<MergeConfig> {
    let mut config = match config_path {
        Some(path) => load_config(Path::new(path))?,
        None => MergeConfig::default(),
    };
    overrides.apply(&mut config);
    Ok(config)
}

/// Directory the atlas will be written to.
pub fn resolve_output_dir(config: &MergeConfig) -> Result<PathBuf> {
    match config.output.directory {
        Some(ref dir) => Ok(PathBuf::from(dir)),
        None => default_output_dir()
            .context("Failed to determine the user data directory; pass --out-dir"),
    }
}
