//! Atlas metadata sidecar types.
//!
//! The metadata document records where each source image ended up in the
//! atlas, in pixel coordinates with the origin at the top-left corner.

use serde::{Deserialize, Serialize};

use crate::config::{Alignment, Axis};

/// Placement of one source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPlacement {
    /// Position in the input sequence.
    pub index: usize,
    /// Source name (file stem or caller-supplied).
    pub name: String,
    /// Left edge of the cell in the atlas.
    pub cell_x: u32,
    /// Top edge of the cell in the atlas.
    pub cell_y: u32,
    /// Left edge of the image in the atlas.
    pub x: u32,
    /// Top edge of the image in the atlas.
    pub y: u32,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

/// Metadata output for a merged atlas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasMetadata {
    /// Atlas width in pixels.
    pub atlas_width: u32,
    /// Atlas height in pixels.
    pub atlas_height: u32,
    /// Uniform cell width in pixels.
    pub cell_width: u32,
    /// Uniform cell height in pixels.
    pub cell_height: u32,
    /// Merge direction.
    pub axis: Axis,
    /// Vertical alignment used inside cells.
    pub alignment: Alignment,
    /// One entry per source image, in input order.
    pub cells: Vec<CellPlacement>,
}

impl AtlasMetadata {
    /// Finds a placement by source name.
    pub fn find(&self, name: &str) -> Option<&CellPlacement> {
        self.cells.iter().find(|c| c.name == name)
    }
}
