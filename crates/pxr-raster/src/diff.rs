//! Template/snapshot comparison

use crate::error::RasterError;
use crate::image::IndexedImage;

/// Per-cell record of template/snapshot disagreement
///
/// Aligned to the template it was computed from. Rebuilt every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchSet {
    flags: Vec<bool>,
    count: usize,
}

impl MismatchSet {
    /// Number of cells that still need painting
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    #[must_use]
    pub fn is_mismatch(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// Linear indices of mismatched cells, ascending
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &flag)| flag.then_some(i))
    }
}

/// Compare `snapshot` against `template`
///
/// A cell mismatches when the indices differ and the template cell is not
/// transparent.
///
/// # Errors
/// `RasterError::DimensionMismatch` when the images differ in extent.
pub fn diff(template: &IndexedImage, snapshot: &IndexedImage) -> Result<MismatchSet, RasterError> {
    if !template.same_extent(snapshot) {
        return Err(RasterError::DimensionMismatch {
            left_width: template.width(),
            left_height: template.height(),
            right_width: snapshot.width(),
            right_height: snapshot.height(),
        });
    }

    let flags: Vec<bool> = template
        .cells()
        .iter()
        .zip(snapshot.cells())
        .map(|(want, have)| !want.is_transparent() && want != have)
        .collect();
    let count = flags.iter().filter(|&&flag| flag).count();

    Ok(MismatchSet { flags, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn transparent_template_cells_always_match() {
        let template = IndexedImage::from_raw(2, 2, &[0, 1, 2, 254]).unwrap();
        let snapshot = IndexedImage::from_raw(2, 2, &[0, 9, 2, 5]).unwrap();

        let mismatch = diff(&template, &snapshot).unwrap();
        assert_eq!(mismatch.flags(), &[false, true, false, false]);
        assert_eq!(mismatch.count(), 1);
        assert_eq!(mismatch.positions().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn rejects_misaligned_images() {
        let template = IndexedImage::from_raw(2, 2, &[0; 4]).unwrap();
        let snapshot = IndexedImage::from_raw(4, 1, &[0; 4]).unwrap();
        assert!(matches!(
            diff(&template, &snapshot),
            Err(RasterError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn all_transparent_template_is_complete() {
        let template = IndexedImage::from_raw(3, 1, &[254, 254, 254]).unwrap();
        let snapshot = IndexedImage::from_raw(3, 1, &[1, 2, 3]).unwrap();
        assert!(diff(&template, &snapshot).unwrap().is_empty());
    }
}
