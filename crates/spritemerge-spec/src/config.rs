//! Merge configuration types.
//!
//! A [`MergeConfig`] is the JSON document a caller hands to the merge
//! pipeline. It has two halves: [`AtlasConfig`] drives the compositing
//! algorithm and [`OutputSettings`] describes where and how the result is
//! persisted. Every field has a default so an empty object `{}` is valid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Direction in which cells are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Cells run left to right.
    #[default]
    Horizontal,
    /// Cells run top to bottom.
    Vertical,
}

impl Axis {
    /// Returns the lowercase name used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Horizontal => "horizontal",
            Axis::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "h" => Ok(Axis::Horizontal),
            "vertical" | "v" => Ok(Axis::Vertical),
            other => Err(ConfigError::UnknownAxis(other.to_string())),
        }
    }
}

/// Vertical placement of an image inside its cell.
///
/// Only the vertical offset is selectable. The horizontal offset is always
/// centered, whichever [`Axis`] the atlas uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "AlignmentRepr")]
pub enum Alignment {
    /// `y = (cell_height - h) / 2`
    #[default]
    Center,
    /// `y = 0`
    Start,
    /// `y = cell_height - h`
    End,
}

impl Alignment {
    /// Numeric code of this alignment (`center`=0, `start`=1, `end`=2).
    pub fn index(&self) -> u8 {
        match self {
            Alignment::Center => 0,
            Alignment::Start => 1,
            Alignment::End => 2,
        }
    }

    /// Looks up an alignment by numeric code.
    pub fn from_index(index: u8) -> Result<Self, ConfigError> {
        match index {
            0 => Ok(Alignment::Center),
            1 => Ok(Alignment::Start),
            2 => Ok(Alignment::End),
            other => Err(ConfigError::UnknownAlignment(other.to_string())),
        }
    }

    /// Returns the lowercase name used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Center => "center",
            Alignment::Start => "start",
            Alignment::End => "end",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Ok(index) = s.parse::<u8>() {
            return Alignment::from_index(index);
        }
        match s.as_str() {
            "center" | "centre" | "middle" => Ok(Alignment::Center),
            "start" | "top" => Ok(Alignment::Start),
            "end" | "bottom" => Ok(Alignment::End),
            other => Err(ConfigError::UnknownAlignment(other.to_string())),
        }
    }
}

/// Wire form accepted for [`Alignment`]: a name or a numeric code.
#[derive(Deserialize)]
#[serde(untagged)]
enum AlignmentRepr {
    Index(u8),
    Name(String),
}

impl TryFrom<AlignmentRepr> for Alignment {
    type Error = ConfigError;

    fn try_from(repr: AlignmentRepr) -> Result<Self, Self::Error> {
        match repr {
            AlignmentRepr::Index(index) => Alignment::from_index(index),
            AlignmentRepr::Name(name) => name.parse(),
        }
    }
}

/// Caller-supplied minimum cell size.
///
/// The effective cell size is `max(floor, observed maximum)` per dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellFloor {
    /// Minimum cell width in pixels.
    #[serde(default)]
    pub width: u32,
    /// Minimum cell height in pixels.
    #[serde(default)]
    pub height: u32,
}

impl CellFloor {
    /// Creates a floor from a width and height.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if neither dimension is constrained.
    pub fn is_zero(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// What happens to the floor after a successful composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorPolicy {
    /// The floor is configuration only and never changes between runs.
    #[default]
    PerCall,
    /// The floor is raised to each run's computed cell size, so repeated
    /// runs on one composer never shrink their cells.
    Accumulate,
}

impl FloorPolicy {
    /// Returns the snake_case name used in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            FloorPolicy::PerCall => "per_call",
            FloorPolicy::Accumulate => "accumulate",
        }
    }
}

impl FromStr for FloorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_call" => Ok(FloorPolicy::PerCall),
            "accumulate" => Ok(FloorPolicy::Accumulate),
            other => Err(ConfigError::UnknownFloorPolicy(other.to_string())),
        }
    }
}

/// Parameters of one composition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtlasConfig {
    /// Merge direction.
    #[serde(default)]
    pub axis: Axis,
    /// Vertical placement inside each cell.
    #[serde(default)]
    pub alignment: Alignment,
    /// Minimum cell size.
    #[serde(default)]
    pub floor: CellFloor,
    /// Whether the floor carries over between runs.
    #[serde(default)]
    pub floor_policy: FloorPolicy,
}

impl AtlasConfig {
    /// Horizontal, centered, no floor.
    pub fn horizontal() -> Self {
        Self::default()
    }

    /// Vertical, centered, no floor.
    pub fn vertical() -> Self {
        Self {
            axis: Axis::Vertical,
            ..Self::default()
        }
    }

    /// Returns a copy with the given alignment.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Returns a copy with the given floor.
    pub fn with_floor(mut self, width: u32, height: u32) -> Self {
        self.floor = CellFloor::new(width, height);
        self
    }

    /// Returns a copy with the given floor policy.
    pub fn with_floor_policy(mut self, policy: FloorPolicy) -> Self {
        self.floor_policy = policy;
        self
    }
}

/// PNG compression preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionPreset {
    /// Faster encode, larger files.
    Fast,
    /// Balanced default.
    #[default]
    Default,
    /// Smallest files.
    Best,
}

impl FromStr for CompressionPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(CompressionPreset::Fast),
            "default" => Ok(CompressionPreset::Default),
            "best" => Ok(CompressionPreset::Best),
            other => Err(ConfigError::UnknownCompression(other.to_string())),
        }
    }
}

/// Where and how the atlas is written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSettings {
    /// Destination directory. `None` means the tool's data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Also write an [`AtlasMetadata`](crate::metadata::AtlasMetadata) JSON sidecar.
    #[serde(default)]
    pub metadata: bool,
    /// PNG compression preset.
    #[serde(default)]
    pub compression: CompressionPreset,
}

/// Top-level merge configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    /// Compositing parameters.
    #[serde(default)]
    pub atlas: AtlasConfig,
    /// Persistence parameters.
    #[serde(default)]
    pub output: OutputSettings,
}

impl MergeConfig {
    /// Parses a config document from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes this config as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
