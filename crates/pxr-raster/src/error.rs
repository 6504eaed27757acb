//! Raster error types

/// Errors raised while building or comparing rasters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterError {
    /// Pixel or cell buffer does not match the declared extent
    #[error("buffer holds {actual} cells, expected {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        actual: usize,
    },

    /// Two images that must align do not
    #[error("dimension mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },

    /// Raw value is neither a palette entry nor the transparent sentinel
    #[error("invalid color index {0}")]
    InvalidIndex(u8),

    /// Bounding box violates the surface limits
    #[error("Invalid boundings.")]
    InvalidBounds {
        left: u32,
        top: u32,
        right: i64,
        bottom: i64,
    },
}
