//! 8-bit RGBA raster buffer.

use thiserror::Error;

/// One straight-alpha RGBA pixel.
pub type Rgba8 = [u8; 4];

/// Fully transparent pixel (all channels zero).
pub const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

/// Bytes per pixel.
pub const CHANNELS: usize = 4;

/// Errors from raster construction and copying.
#[derive(Debug, Error)]
pub enum RasterError {
    /// Pixel buffer length does not match the declared size.
    #[error("buffer holds {actual} bytes, expected {expected} for a {width}x{height} RGBA image")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Dimensions overflow the address space.
    #[error("a {width}x{height} RGBA image is too large to allocate")]
    TooLarge { width: u32, height: u32 },

    /// Source rectangle does not fit in the destination.
    #[error("cannot place {src_width}x{src_height} at ({x}, {y}) inside {dst_width}x{dst_height}")]
    OutOfBounds {
        src_width: u32,
        src_height: u32,
        x: u32,
        y: u32,
        dst_width: u32,
        dst_height: u32,
    },
}

/// A 2D grid of RGBA pixels, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// Byte length of a `width` x `height` RGBA buffer, or `None` on overflow.
    pub fn byte_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(CHANNELS)
    }

    /// Create a new buffer filled with one color.
    pub fn filled(width: u32, height: u32, fill: Rgba8) -> Result<Self, RasterError> {
        let len = Self::byte_len(width, height).ok_or(RasterError::TooLarge { width, height })?;
        let data = if fill == TRANSPARENT {
            vec![0u8; len]
        } else {
            fill.iter().copied().cycle().take(len).collect()
        };
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a new fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> Result<Self, RasterError> {
        Self::filled(width, height, TRANSPARENT)
    }

    /// Wrap existing RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RasterError> {
        let expected =
            Self::byte_len(width, height).ok_or(RasterError::TooLarge { width, height })?;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True if the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume into raw RGBA8 bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Get a pixel at the given coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Rgba8 {
        let i = self.offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Set a pixel at the given coordinates.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Rgba8) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&color);
    }

    /// Bytes of one row.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = self.offset(0, y);
        &self.data[start..start + self.width as usize * CHANNELS]
    }

    /// Copy all of `src` into this image with its top-left corner at `(x, y)`.
    ///
    /// Pixels are replaced, not blended.
    pub fn blit(&mut self, src: &RasterImage, x: u32, y: u32) -> Result<(), RasterError> {
        let fits_x = x.checked_add(src.width).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(src.height).is_some_and(|b| b <= self.height);
        if !fits_x || !fits_y {
            return Err(RasterError::OutOfBounds {
                src_width: src.width,
                src_height: src.height,
                x,
                y,
                dst_width: self.width,
                dst_height: self.height,
            });
        }
        if src.is_empty() {
            return Ok(());
        }

        let span = src.width as usize * CHANNELS;
        for row in 0..src.height {
            let dst = self.offset(x, y + row);
            self.data[dst..dst + span].copy_from_slice(src.row(row));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_is_all_zero() {
        let img = RasterImage::transparent(3, 2).unwrap();
        assert_eq!(img.as_bytes().len(), 24);
        assert!(img.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn filled_repeats_color() {
        let img = RasterImage::filled(2, 2, [1, 2, 3, 4]).unwrap();
        assert_eq!(img.as_bytes(), &[1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn from_rgba8_checks_length() {
        let err = RasterImage::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            RasterError::BufferSize {
                expected: 16,
                actual: 15,
                ..
            }
        ));
    }

    #[test]
    fn zero_sized_images_are_allowed() {
        let img = RasterImage::from_rgba8(0, 5, Vec::new()).unwrap();
        assert!(img.is_empty());
        assert_eq!(img.dimensions(), (0, 5));
    }

    #[test]
    fn get_and_set() {
        let mut img = RasterImage::transparent(4, 3).unwrap();
        img.set(3, 2, [9, 8, 7, 6]);
        assert_eq!(img.get(3, 2), [9, 8, 7, 6]);
        assert_eq!(img.get(2, 2), TRANSPARENT);
    }

    #[test]
    fn blit_copies_without_blending() {
        let mut dst = RasterImage::filled(4, 4, [255, 255, 255, 255]).unwrap();
        let src = RasterImage::filled(2, 2, [10, 20, 30, 0]).unwrap();
        dst.blit(&src, 1, 2).unwrap();

        assert_eq!(dst.get(1, 2), [10, 20, 30, 0]);
        assert_eq!(dst.get(2, 3), [10, 20, 30, 0]);
        assert_eq!(dst.get(0, 2), [255, 255, 255, 255]);
        assert_eq!(dst.get(1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn blit_rejects_overhang() {
        let mut dst = RasterImage::transparent(4, 4).unwrap();
        let src = RasterImage::transparent(3, 3).unwrap();
        let err = dst.blit(&src, 2, 0).unwrap_err();
        assert!(matches!(err, RasterError::OutOfBounds { x: 2, y: 0, .. }));
    }

    #[test]
    fn blit_empty_source_is_noop() {
        let mut dst = RasterImage::filled(2, 2, [1, 1, 1, 1]).unwrap();
        let before = dst.clone();
        dst.blit(&RasterImage::transparent(0, 0).unwrap(), 2, 2).unwrap();
        assert_eq!(dst, before);
    }
}
