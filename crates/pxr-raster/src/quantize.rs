//! Nearest-palette-color quantization with a process-lifetime memo table
//!
//! The palette never changes, so a resolved `(r, g, b)` stays valid forever and
//! the cache is never evicted. At most 256³ entries can exist.

use crate::image::{ImageSource, IndexedImage};
use crate::palette::{ColorIndex, Rgb, Rgba, PALETTE};
use dashmap::DashMap;
use rayon::prelude::*;

/// Alpha below which a template pixel counts as transparent
pub const ALPHA_THRESHOLD: u8 = 128;

/// Memoized palette classifier
///
/// Lookups take `&self`; wrap in an `Arc` to share one cache between the
/// template and snapshot passes.
#[derive(Debug, Default)]
pub struct Quantizer {
    cache: DashMap<Rgb, ColorIndex>,
}

impl Quantizer {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one sample to its palette index
    ///
    /// With `transparency_aware`, samples whose alpha is below
    /// [`ALPHA_THRESHOLD`] become [`ColorIndex::TRANSPARENT`] without touching
    /// the cache.
    pub fn classify(&self, sample: Rgba, transparency_aware: bool) -> ColorIndex {
        if transparency_aware && sample.a < ALPHA_THRESHOLD {
            return ColorIndex::TRANSPARENT;
        }

        let rgb = sample.rgb();
        if let Some(hit) = self.cache.get(&rgb) {
            return *hit;
        }

        let index = nearest_palette_index(rgb);
        self.cache.insert(rgb, index);
        index
    }

    /// Classify every pixel of `source`, row-major
    ///
    /// Rows are classified in parallel; the result is identical to a
    /// sequential pass because classification is pure.
    pub fn index_image<S>(&self, source: &S, transparency_aware: bool) -> IndexedImage
    where
        S: ImageSource + ?Sized,
    {
        let (width, height) = (source.width(), source.height());

        let rows: Vec<Vec<ColorIndex>> = (0..height)
            .into_par_iter()
            .map(|y| {
                (0..width)
                    .map(|x| self.classify(source.pixel(x, y), transparency_aware))
                    .collect()
            })
            .collect();

        let cells = rows.into_iter().flatten().collect();
        IndexedImage::from_rows(width, height, cells)
    }

    /// Number of distinct colors resolved so far
    #[inline]
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Cached index for `rgb`, without computing it
    #[inline]
    #[must_use]
    pub fn cached(&self, rgb: Rgb) -> Option<ColorIndex> {
        self.cache.get(&rgb).map(|hit| *hit)
    }
}

/// Palette entry closest to `rgb` by squared Euclidean distance
///
/// Ties go to the lowest palette index.
#[must_use]
pub fn nearest_palette_index(rgb: Rgb) -> ColorIndex {
    let position = PALETTE
        .iter()
        .enumerate()
        .min_by_key(|(_, entry)| rgb.distance_sq(**entry))
        .map_or(0, |(position, _)| position);
    ColorIndex::from_palette_position(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Raster;
    use crate::palette::PALETTE_SIZE;

    #[test]
    fn exact_palette_colors_map_to_themselves() {
        let quantizer = Quantizer::new();
        for (position, entry) in PALETTE.iter().enumerate() {
            let index = quantizer.classify(entry.with_alpha(255), false);
            assert_eq!(usize::from(index.as_u8()), position);
        }
        assert_eq!(quantizer.cached_len(), PALETTE_SIZE);
    }

    #[test]
    fn transparency_short_circuits_the_cache() {
        let quantizer = Quantizer::new();
        let ghost = Rgba::new(12, 34, 56, 127);
        assert_eq!(quantizer.classify(ghost, true), ColorIndex::TRANSPARENT);
        assert_eq!(quantizer.cached_len(), 0);

        // Same color without transparency awareness resolves normally
        let index = quantizer.classify(ghost, false);
        assert!(!index.is_transparent());
        assert_eq!(quantizer.cached(ghost.rgb()), Some(index));
    }

    #[test]
    fn alpha_at_threshold_is_opaque() {
        let quantizer = Quantizer::new();
        let index = quantizer.classify(Rgba::new(255, 255, 255, ALPHA_THRESHOLD), true);
        assert_eq!(index.as_u8(), 0);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        // Equidistant from entries 11 and 12, and closer to those than to any other
        let probe = Rgb::new(0, 171, 210);
        assert_eq!(probe.distance_sq(PALETTE[11]), probe.distance_sq(PALETTE[12]));
        assert_eq!(nearest_palette_index(probe).as_u8(), 11);

        let quantizer = Quantizer::new();
        assert_eq!(quantizer.classify(probe.with_alpha(255), true).as_u8(), 11);
    }

    #[test]
    fn index_image_is_row_major() {
        let mut raster = Raster::filled(3, 2, PALETTE[0].with_alpha(255));
        raster.set(2, 0, PALETTE[5].with_alpha(255));
        raster.set(0, 1, Rgba::CLEAR);

        let quantizer = Quantizer::new();
        let indexed = quantizer.index_image(&raster, true);
        let raw: Vec<u8> = indexed.cells().iter().map(|c| c.as_u8()).collect();
        assert_eq!(raw, vec![0, 0, 5, 254, 0, 0]);
    }
}
