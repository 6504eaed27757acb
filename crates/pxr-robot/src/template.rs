//! Template sources: decoded image files and a built-in test pattern

use image::{ImageReader, RgbaImage};
use pxr_raster::{ColorIndex, ImageSource, Raster, RasterError, Rgba};
use std::path::Path;

/// Template loading errors
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// File could not be opened
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not a decodable image
    #[error("failed to decode template: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid template buffer: {0}")]
    Raster(#[from] RasterError),

    /// Pattern extent is too small to place
    #[error("pattern must be at least 2x2, got {width}x{height}")]
    TooSmall { width: u32, height: u32 },
}

/// Decoded RGBA image used directly as an [`ImageSource`]
#[derive(Debug, Clone)]
pub struct DecodedTemplate {
    image: RgbaImage,
}

impl DecodedTemplate {
    /// Decode a PNG (or any format the `image` build supports)
    ///
    /// # Errors
    /// `TemplateError::Open` or `TemplateError::Decode`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .map_err(|source| TemplateError::Open {
                path: path.display().to_string(),
                source,
            })?
            .with_guessed_format()
            .map_err(|source| TemplateError::Open {
                path: path.display().to_string(),
                source,
            })?
            .decode()?
            .into_rgba8();

        tracing::info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "decoded template"
        );
        Ok(Self { image })
    }

    #[must_use]
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Copy into an owned [`Raster`]
    ///
    /// # Errors
    /// `TemplateError::Raster` if the decoded buffer is inconsistent.
    pub fn to_raster(&self) -> Result<Raster, TemplateError> {
        let raster = Raster::from_rgba_bytes(self.width(), self.height(), self.image.as_raw())?;
        Ok(raster)
    }
}

impl ImageSource for DecodedTemplate {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn pixel(&self, x: u32, y: u32) -> Rgba {
        Rgba::from(self.image.get_pixel(x, y).0)
    }
}

/// Diagonal palette stripes with transparent corners
///
/// # Errors
/// `TemplateError::TooSmall` below 2x2.
pub fn pattern(width: u32, height: u32) -> Result<Raster, TemplateError> {
    if width < 2 || height < 2 {
        return Err(TemplateError::TooSmall { width, height });
    }

    let mut raster = Raster::filled(width, height, Rgba::CLEAR);
    let corner = (width.min(height) / 4).max(1);

    for y in 0..height {
        for x in 0..width {
            let in_corner =
                (x < corner || x >= width - corner) && (y < corner || y >= height - corner);
            if in_corner {
                continue;
            }
            let stripe = ((x + y) / 2 % 16) as u8;
            if let Some(rgb) = ColorIndex::palette(stripe).and_then(ColorIndex::color) {
                raster.set(x, y, rgb.with_alpha(255));
            }
        }
    }
    Ok(raster)
}
