//! Uniform-cell strip compositing.
//!
//! Every source image is padded (never scaled) into a transparent cell of the
//! same size, and the cells are laid end to end along one axis:
//!
//! 1. Sizing: one pass over image dimensions finds the largest width and
//!    height, seeded with the configured floor.
//! 2. Normalization: each image is copied into its own cell. The horizontal
//!    offset is always centered; the vertical offset follows [`Alignment`].
//! 3. Concatenation: cell `i` lands at `(cell_w * i, 0)` for a horizontal
//!    strip or `(0, cell_h * i)` for a vertical one.
//!
//! Placement order is input order. No blending happens at any step.

use spritemerge_spec::{
    Alignment, AtlasConfig, AtlasMetadata, Axis, CellFloor, CellPlacement, FloorPolicy,
};
use thiserror::Error;

use crate::raster::{RasterError, RasterImage};

/// Errors that can occur during composition.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Nothing to merge.
    #[error("no source images to merge")]
    EmptyInput,

    /// Atlas dimensions overflow.
    #[error("{count} cells of {cell_width}x{cell_height} do not fit in a single image")]
    AtlasTooLarge {
        cell_width: u32,
        cell_height: u32,
        count: usize,
    },

    /// Raster copy error.
    #[error("raster error: {0}")]
    Raster(#[from] RasterError),
}

/// A named source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Display name, carried into metadata.
    pub name: String,
    /// Decoded pixels.
    pub image: RasterImage,
}

impl SourceImage {
    /// Pair a name with an image.
    pub fn new(name: impl Into<String>, image: RasterImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

/// Uniform cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl From<CellSize> for CellFloor {
    fn from(cell: CellSize) -> Self {
        CellFloor::new(cell.width, cell.height)
    }
}

/// Result of one composition run.
#[derive(Debug, Clone)]
pub struct Composition {
    /// The finished atlas.
    pub atlas: RasterImage,
    /// Cell size used for every source.
    pub cell: CellSize,
    /// Merge direction.
    pub axis: Axis,
    /// Vertical alignment used inside cells.
    pub alignment: Alignment,
    /// One entry per source, in input order.
    pub placements: Vec<CellPlacement>,
}

impl Composition {
    /// Build the sidecar metadata document.
    pub fn metadata(&self) -> AtlasMetadata {
        AtlasMetadata {
            atlas_width: self.atlas.width(),
            atlas_height: self.atlas.height(),
            cell_width: self.cell.width,
            cell_height: self.cell.height,
            axis: self.axis,
            alignment: self.alignment,
            cells: self.placements.clone(),
        }
    }
}

/// Compute the uniform cell size for a set of images.
///
/// Returns `None` when there are no images. Only dimensions are read.
pub fn measure_cells<'a, I>(images: I, floor: CellFloor) -> Option<CellSize>
where
    I: IntoIterator<Item = &'a RasterImage>,
{
    let mut seen = false;
    let mut cell = CellSize {
        width: floor.width,
        height: floor.height,
    };
    for image in images {
        seen = true;
        cell.width = cell.width.max(image.width());
        cell.height = cell.height.max(image.height());
    }
    seen.then_some(cell)
}

/// Offset of a `width` x `height` image inside a cell.
///
/// `x` is always centered. `y` follows `alignment`. Integer division
/// truncates, so odd padding puts the extra pixel after the image.
pub fn cell_offset(cell: CellSize, width: u32, height: u32, alignment: Alignment) -> (u32, u32) {
    let x = cell.width.saturating_sub(width) / 2;
    let spare = cell.height.saturating_sub(height);
    let y = match alignment {
        Alignment::Center => spare / 2,
        Alignment::Start => 0,
        Alignment::End => spare,
    };
    (x, y)
}

/// Top-left corner of cell `index` in the atlas.
pub fn cell_origin(cell: CellSize, index: usize, axis: Axis) -> (u32, u32) {
    match axis {
        Axis::Horizontal => (cell.width * index as u32, 0),
        Axis::Vertical => (0, cell.height * index as u32),
    }
}

/// Atlas dimensions for `count` cells, checked against overflow.
pub fn atlas_dimensions(cell: CellSize, count: usize, axis: Axis) -> Result<(u32, u32), ComposeError> {
    let too_large = || ComposeError::AtlasTooLarge {
        cell_width: cell.width,
        cell_height: cell.height,
        count,
    };
    let n = u32::try_from(count).map_err(|_| too_large())?;
    let dims = match axis {
        Axis::Horizontal => (cell.width.checked_mul(n).ok_or_else(too_large)?, cell.height),
        Axis::Vertical => (cell.width, cell.height.checked_mul(n).ok_or_else(too_large)?),
    };
    RasterImage::byte_len(dims.0, dims.1).ok_or_else(too_large)?;
    Ok(dims)
}

/// Copy an image into a fresh transparent cell.
pub fn normalize_into_cell(
    image: &RasterImage,
    cell: CellSize,
    alignment: Alignment,
) -> Result<RasterImage, ComposeError> {
    let (x, y) = cell_offset(cell, image.width(), image.height(), alignment);
    let mut canvas = RasterImage::transparent(cell.width, cell.height)?;
    canvas.blit(image, x, y)?;
    Ok(canvas)
}

/// Lay cells end to end along `axis`.
pub fn concatenate_cells(
    cells: &[RasterImage],
    cell: CellSize,
    axis: Axis,
) -> Result<RasterImage, ComposeError> {
    if cells.is_empty() {
        return Err(ComposeError::EmptyInput);
    }
    let (width, height) = atlas_dimensions(cell, cells.len(), axis)?;
    let mut atlas = RasterImage::transparent(width, height)?;
    for (index, canvas) in cells.iter().enumerate() {
        let (x, y) = cell_origin(cell, index, axis);
        atlas.blit(canvas, x, y)?;
    }
    Ok(atlas)
}

/// Merge named sources into one atlas.
///
/// Fails with [`ComposeError::EmptyInput`] before allocating anything when
/// `sources` is empty.
#[tracing::instrument(skip(sources, config), fields(count = sources.len(), axis = %config.axis, alignment = %config.alignment))]
pub fn compose(sources: &[SourceImage], config: &AtlasConfig) -> Result<Composition, ComposeError> {
    let cell = measure_cells(sources.iter().map(|s| &s.image), config.floor)
        .ok_or(ComposeError::EmptyInput)?;
    let (atlas_width, atlas_height) = atlas_dimensions(cell, sources.len(), config.axis)?;
    tracing::debug!(
        cell_width = cell.width,
        cell_height = cell.height,
        atlas_width,
        atlas_height,
        "sized cells"
    );

    let mut cells = Vec::with_capacity(sources.len());
    let mut placements = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        let (width, height) = source.image.dimensions();
        let (dx, dy) = cell_offset(cell, width, height, config.alignment);
        let (cell_x, cell_y) = cell_origin(cell, index, config.axis);
        tracing::trace!(index, name = %source.name, width, height, dx, dy, "placing source");

        cells.push(normalize_into_cell(&source.image, cell, config.alignment)?);
        placements.push(CellPlacement {
            index,
            name: source.name.clone(),
            cell_x,
            cell_y,
            x: cell_x + dx,
            y: cell_y + dy,
            width,
            height,
        });
    }

    let atlas = concatenate_cells(&cells, cell, config.axis)?;

    Ok(Composition {
        atlas,
        cell,
        axis: config.axis,
        alignment: config.alignment,
        placements,
    })
}

/// Merge unnamed images; names in the result are their indices.
pub fn compose_images(images: &[RasterImage], config: &AtlasConfig) -> Result<RasterImage, ComposeError> {
    let sources: Vec<SourceImage> = images
        .iter()
        .enumerate()
        .map(|(i, image)| SourceImage::new(i.to_string(), image.clone()))
        .collect();
    Ok(compose(&sources, config)?.atlas)
}

/// Composer that owns its configuration between runs.
///
/// Under [`FloorPolicy::PerCall`] the floor never changes. Under
/// [`FloorPolicy::Accumulate`] each successful run raises the floor to the
/// computed cell size, so later runs never get smaller cells.
#[derive(Debug, Clone, Default)]
pub struct AtlasComposer {
    config: AtlasConfig,
}

impl AtlasComposer {
    pub fn new(config: AtlasConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Current floor, including anything accumulated.
    pub fn floor(&self) -> CellFloor {
        self.config.floor
    }

    /// Raise the floor to at least `floor` in each dimension.
    ///
    /// Used to seed an accumulating composer with a floor from earlier runs.
    pub fn raise_floor(&mut self, floor: CellFloor) {
        let current = &mut self.config.floor;
        current.width = current.width.max(floor.width);
        current.height = current.height.max(floor.height);
    }

    /// Drop back to a zero floor.
    pub fn reset_floor(&mut self) {
        self.config.floor = CellFloor::default();
    }

    /// Run one composition with the current configuration.
    pub fn compose(&mut self, sources: &[SourceImage]) -> Result<Composition, ComposeError> {
        let composition = compose(sources, &self.config)?;
        if self.config.floor_policy == FloorPolicy::Accumulate {
            self.config.floor = composition.cell.into();
            tracing::debug!(
                floor_width = self.config.floor.width,
                floor_height = self.config.floor.height,
                "raised accumulated floor"
            );
        }
        Ok(composition)
    }
}
