//! Placement of the template on the shared surface

use crate::error::RasterError;
use serde::{Deserialize, Serialize};

/// Edge length of the square drawing surface
pub const SURFACE_SIZE: u32 = 2000;

/// Operator-supplied top-left corner of the template on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Origin {
    pub left: u32,
    pub top: u32,
}

impl Origin {
    #[inline]
    #[must_use]
    pub const fn new(left: u32, top: u32) -> Self {
        Self { left, top }
    }
}

/// Region of the surface covered by the template
///
/// Inclusive edges: `right = left + width - 1`, `bottom = top + height - 1`.
/// Always satisfies `0 <= left < right < 2000` and `0 <= top < bottom < 2000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    origin: Origin,
    width: u32,
    height: u32,
}

impl BoundingBox {
    /// Place a `width` x `height` template at `origin`
    ///
    /// # Errors
    /// `RasterError::InvalidBounds` when the box is degenerate or leaves the surface.
    pub fn new(origin: Origin, width: u32, height: u32) -> Result<Self, RasterError> {
        let right = i64::from(origin.left) + i64::from(width) - 1;
        let bottom = i64::from(origin.top) + i64::from(height) - 1;
        let limit = i64::from(SURFACE_SIZE);

        let valid = i64::from(origin.left) < right
            && i64::from(origin.top) < bottom
            && right < limit
            && bottom < limit;

        if !valid {
            return Err(RasterError::InvalidBounds {
                left: origin.left,
                top: origin.top,
                right,
                bottom,
            });
        }

        Ok(Self {
            origin,
            width,
            height,
        })
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    #[inline]
    #[must_use]
    pub fn left(&self) -> u32 {
        self.origin.left
    }

    #[inline]
    #[must_use]
    pub fn top(&self) -> u32 {
        self.origin.top
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> u32 {
        self.origin.left + self.width - 1
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.origin.top + self.height - 1
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_inclusive_edges() {
        let bounds = BoundingBox::new(Origin::new(10, 20), 5, 3).unwrap();
        assert_eq!(bounds.right(), 14);
        assert_eq!(bounds.bottom(), 22);
    }

    #[test]
    fn rejects_boxes_leaving_the_surface() {
        assert!(BoundingBox::new(Origin::new(1998, 0), 2, 2).is_ok());
        assert!(BoundingBox::new(Origin::new(1999, 0), 2, 2).is_err());
        assert!(BoundingBox::new(Origin::new(0, 1999), 2, 2).is_err());
    }

    #[test]
    fn rejects_degenerate_boxes() {
        // left < right requires at least two columns
        assert!(BoundingBox::new(Origin::new(0, 0), 1, 5).is_err());
        assert!(BoundingBox::new(Origin::new(0, 0), 5, 1).is_err());
        assert!(BoundingBox::new(Origin::new(0, 0), 0, 0).is_err());
    }

    #[test]
    fn error_message_matches_operator_text() {
        let err = BoundingBox::new(Origin::new(0, 0), 1, 1).unwrap_err();
        assert_eq!(err.to_string(), "Invalid boundings.");
    }
}
