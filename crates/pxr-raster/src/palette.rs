//! Fixed drawing palette and color primitives

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of colors the drawing service accepts
pub const PALETTE_SIZE: usize = 16;

/// The service palette, in protocol index order
pub const PALETTE: [Rgb; PALETTE_SIZE] = [
    Rgb::new(255, 255, 255),
    Rgb::new(228, 228, 228),
    Rgb::new(136, 136, 136),
    Rgb::new(34, 34, 34),
    Rgb::new(255, 167, 209),
    Rgb::new(229, 0, 0),
    Rgb::new(229, 149, 0),
    Rgb::new(160, 106, 66),
    Rgb::new(229, 217, 0),
    Rgb::new(148, 224, 68),
    Rgb::new(2, 190, 1),
    Rgb::new(0, 211, 221),
    Rgb::new(0, 131, 199),
    Rgb::new(0, 0, 234),
    Rgb::new(207, 110, 228),
    Rgb::new(130, 0, 128),
];

/// Opaque 8-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB space
    #[inline]
    #[must_use]
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db).unsigned_abs()
    }

    #[inline]
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Rgba {
        Rgba::new(self.r, self.g, self.b, a)
    }
}

/// 8-bit color with alpha, as sampled from a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black
    pub const CLEAR: Rgba = Rgba::new(0, 0, 0, 0);

    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    #[must_use]
    pub const fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(value: [u8; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

/// One cell of an indexed image
///
/// Either a palette entry (`0..16`) or [`ColorIndex::TRANSPARENT`], which marks
/// template cells the robot must leave alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColorIndex(u8);

impl ColorIndex {
    /// Template cell that never needs painting
    pub const TRANSPARENT: ColorIndex = ColorIndex(254);

    /// Palette entry at `index`, if it exists
    #[inline]
    #[must_use]
    pub fn palette(index: u8) -> Option<Self> {
        (usize::from(index) < PALETTE_SIZE).then_some(Self(index))
    }

    /// Accepts palette entries and the transparent sentinel
    #[inline]
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        if value == Self::TRANSPARENT.0 {
            Some(Self::TRANSPARENT)
        } else {
            Self::palette(value)
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.0 == Self::TRANSPARENT.0
    }

    /// Palette color for this index; `None` for the transparent sentinel
    #[inline]
    #[must_use]
    pub fn color(self) -> Option<Rgb> {
        PALETTE.get(usize::from(self.0)).copied()
    }

    // Only the quantizer builds indices from positions it got out of PALETTE.
    pub(crate) const fn from_palette_position(position: usize) -> Self {
        Self(position as u8)
    }
}

impl fmt::Display for ColorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_transparent() {
            f.write_str("transparent")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
