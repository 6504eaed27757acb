//! Random candidate selection among mismatched cells

use crate::bounds::BoundingBox;
use crate::diff::MismatchSet;
use crate::image::IndexedImage;
use crate::palette::ColorIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Source of uniform integers
///
/// Injected so picks and cooldown jitter are reproducible under test.
pub trait RandomSource: Send {
    /// Uniform integer in `0..bound`; `bound` is never zero
    fn below(&mut self, bound: usize) -> usize;
}

/// [`RandomSource`] backed by a seeded [`StdRng`]
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from operating-system entropy
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }
}

/// The single cell the robot is trying to paint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWrite {
    /// Column within the template
    pub source_x: u32,
    /// Row within the template
    pub source_y: u32,
    /// Column on the shared surface
    pub target_x: u32,
    /// Row on the shared surface
    pub target_y: u32,
    pub color: ColorIndex,
}

/// Choose one mismatched cell uniformly at random
///
/// Returns `None` when nothing mismatches, or when `mismatch` was not computed
/// for an image of `template`'s size.
pub fn pick(
    template: &IndexedImage,
    mismatch: &MismatchSet,
    bounds: &BoundingBox,
    random: &mut dyn RandomSource,
) -> Option<PendingWrite> {
    if mismatch.is_empty() || mismatch.flags().len() != template.len() {
        return None;
    }

    let candidates: Vec<usize> = mismatch.positions().collect();
    let chosen = candidates[random.below(candidates.len()) % candidates.len()];
    let color = template.get(chosen)?;
    let (dx, dy) = template.position(chosen);

    tracing::trace!(chosen, candidates = candidates.len(), "picked mismatched cell");

    Some(PendingWrite {
        source_x: dx,
        source_y: dy,
        target_x: bounds.left() + dx,
        target_y: bounds.top() + dy,
        color,
    })
}
