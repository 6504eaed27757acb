//! RGBA rasters and their indexed form

use crate::error::RasterError;
use crate::palette::{ColorIndex, Rgba};

/// Anything that can be sampled pixel by pixel
///
/// Implemented by [`Raster`] and by adapters around decoded image files.
/// Callers guarantee `x < width()` and `y < height()`.
pub trait ImageSource: Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel(&self, x: u32, y: u32) -> Rgba;
}

/// Owned row-major RGBA raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Raster {
    /// Raster filled with one color
    #[must_use]
    pub fn filled(width: u32, height: u32, fill: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; cell_count(width, height)],
        }
    }

    /// Wrap an existing pixel buffer
    ///
    /// # Errors
    /// `RasterError::BufferSize` when `pixels.len() != width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba>) -> Result<Self, RasterError> {
        if pixels.len() != cell_count(width, height) {
            return Err(RasterError::BufferSize {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from packed `RGBARGBA...` bytes
    ///
    /// # Errors
    /// `RasterError::BufferSize` when the byte count is not `4 * width * height`.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, RasterError> {
        if bytes.len() % 4 != 0 {
            return Err(RasterError::BufferSize {
                width,
                height,
                actual: bytes.len() / 4,
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|px| Rgba::new(px[0], px[1], px[2], px[3]))
            .collect();
        Self::from_pixels(width, height, pixels)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.offset(x, y)).copied()
    }

    /// Overwrite one pixel; out-of-range writes are ignored and reported as `false`
    pub fn set(&mut self, x: u32, y: u32, color: Rgba) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let offset = self.offset(x, y);
        self.pixels[offset] = color;
        true
    }

    /// Copy out the `width` x `height` region starting at (`left`, `top`)
    ///
    /// Cells outside this raster read as [`Rgba::CLEAR`].
    #[must_use]
    pub fn crop(&self, left: u32, top: u32, width: u32, height: u32) -> Raster {
        let mut pixels = Vec::with_capacity(cell_count(width, height));
        for y in 0..height {
            for x in 0..width {
                let px = left
                    .checked_add(x)
                    .zip(top.checked_add(y))
                    .and_then(|(sx, sy)| self.get(sx, sy))
                    .unwrap_or(Rgba::CLEAR);
                pixels.push(px);
            }
        }
        Raster {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl ImageSource for Raster {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels[self.offset(x, y)]
    }
}

/// Raster reduced to one [`ColorIndex`] per cell, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    width: u32,
    height: u32,
    cells: Vec<ColorIndex>,
}

impl IndexedImage {
    /// # Errors
    /// `RasterError::BufferSize` when `cells.len() != width * height`.
    pub fn new(width: u32, height: u32, cells: Vec<ColorIndex>) -> Result<Self, RasterError> {
        if cells.len() != cell_count(width, height) {
            return Err(RasterError::BufferSize {
                width,
                height,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    // Callers produce exactly `width * height` cells.
    pub(crate) fn from_rows(width: u32, height: u32, cells: Vec<ColorIndex>) -> Self {
        debug_assert_eq!(cells.len(), cell_count(width, height));
        Self {
            width,
            height,
            cells,
        }
    }

    /// Build from raw index bytes (`0..16` or `254`)
    ///
    /// # Errors
    /// `RasterError::InvalidIndex` for any other byte, `RasterError::BufferSize`
    /// when the length does not match.
    pub fn from_raw(width: u32, height: u32, raw: &[u8]) -> Result<Self, RasterError> {
        let cells = raw
            .iter()
            .map(|&v| ColorIndex::from_u8(v).ok_or(RasterError::InvalidIndex(v)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(width, height, cells)
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ColorIndex> {
        self.cells.get(index).copied()
    }

    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[ColorIndex] {
        &self.cells
    }

    /// Number of cells that are not transparent
    #[must_use]
    pub fn opaque_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_transparent()).count()
    }

    /// Split a linear index into `(x, y)`
    #[inline]
    #[must_use]
    pub fn position(&self, index: usize) -> (u32, u32) {
        let width = self.width.max(1) as usize;
        ((index % width) as u32, (index / width) as u32)
    }

    #[inline]
    #[must_use]
    pub fn same_extent(&self, other: &IndexedImage) -> bool {
        self.width == other.width && self.height == other.height
    }
}

#[inline]
fn cell_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}
