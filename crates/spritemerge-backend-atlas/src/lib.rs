//! spritemerge Atlas Backend
//!
//! This crate merges an ordered set of images into a single strip atlas.
//! Every image is padded into a cell of uniform size (the largest width and
//! height in the set, or a configured floor) and the cells are laid end to
//! end horizontally or vertically. Images are never scaled or blended.
//!
//! # Example
//!
//! ```
//! use spritemerge_backend_atlas::{compose, RasterImage, SourceImage};
//! use spritemerge_spec::AtlasConfig;
//!
//! let sources = vec![
//!     SourceImage::new("red", RasterImage::filled(4, 4, [255, 0, 0, 255]).unwrap()),
//!     SourceImage::new("blue", RasterImage::filled(2, 6, [0, 0, 255, 255]).unwrap()),
//! ];
//!
//! let composition = compose(&sources, &AtlasConfig::horizontal()).unwrap();
//! assert_eq!(composition.atlas.dimensions(), (8, 6));
//! ```
//!
//! # Output
//!
//! [`writer::write_atlas`] stores the atlas through an [`OutputWriter`] as
//! `<unix-millis>.png`. PNG encoding uses fixed settings, so identical atlases
//! produce identical bytes and BLAKE3 hashes.

pub mod compose;
pub mod png;
pub mod raster;
pub mod writer;

// Re-export main types for convenience
pub use compose::{
    compose, compose_images, AtlasComposer, CellSize, ComposeError, Composition, SourceImage,
};
pub use png::{PngConfig, PngError};
pub use raster::{RasterError, RasterImage, Rgba8, TRANSPARENT};
pub use writer::{
    write_atlas, write_metadata, LocalDiskWriter, MemoryWriter, OutputWriter, WriteError,
    WrittenFile,
};
