use std::collections::HashSet;

use image::GrayImage;

use crate::raster::CoverageMask;
use crate::tool::SelectionModifier;

// ============================================================================
// VALIDITY MASK
// ============================================================================

/// Per-layer validity buffer marking which raster pixels correspond to real
/// data (as opposed to padding or background). A covered pixel only enters
/// the selection when its validity value is non-zero.
#[derive(Clone, Debug)]
pub struct ValidityMask {
    image: GrayImage,
}

impl ValidityMask {
    /// Every pixel is valid data.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::from_pixel(width, height, image::Luma([255])),
        }
    }

    pub fn from_image(image: GrayImage) -> Self {
        Self { image }
    }

    /// Build from a row-major byte buffer. Returns `None` when the buffer
    /// length does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        GrayImage::from_raw(width, height, data).map(|image| Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// All indices marking real data, row-major.
    pub fn valid_indices(&self) -> Vec<u32> {
        self.as_raw()
            .iter()
            .enumerate()
            .filter(|(_, valid)| **valid != 0)
            .map(|(index, _)| index as u32)
            .collect()
    }
}

// ============================================================================
// COMBINER
// ============================================================================

/// Linear pixel indices (`y * width + x`) covered by the current gesture,
/// gated by validity. Row-major scan, so the output is duplicate-free and
/// deterministic.
pub fn covered_indices(mask: &CoverageMask, validity: &ValidityMask) -> Vec<u32> {
    debug_assert_eq!(mask.width(), validity.width());
    debug_assert_eq!(mask.height(), validity.height());

    mask.as_raw()
        .iter()
        .zip(validity.as_raw())
        .enumerate()
        .filter(|(_, (covered, valid))| **covered != 0 && **valid != 0)
        .map(|(index, _)| index as u32)
        .collect()
}

/// Pure set algebra between the existing selection and the covered pixels.
pub fn combine(
    existing: &HashSet<u32>,
    covered: &[u32],
    modifier: SelectionModifier,
) -> HashSet<u32> {
    match modifier {
        SelectionModifier::Replace => covered.iter().copied().collect(),
        SelectionModifier::Add => {
            let mut merged = existing.clone();
            merged.extend(covered.iter().copied());
            merged
        }
        SelectionModifier::Subtract => {
            let mut merged = existing.clone();
            for index in covered {
                merged.remove(index);
            }
            merged
        }
    }
}

// ============================================================================
// SELECTION INDEX SET
// ============================================================================

/// The dataset-owned set of selected pixel indices.
///
/// The set is only ever replaced wholesale via [`publish`], so a reader
/// never observes a partially updated selection. Every publish bumps the
/// generation counter, including a `Replace` that publishes an empty set;
/// "select none" is a real notification, distinguishable from "no change".
///
/// [`publish`]: LayerSelection::publish
#[derive(Clone, Debug, Default)]
pub struct LayerSelection {
    indices: HashSet<u32>,
    generation: u64,
}

impl LayerSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indices(&self) -> &HashSet<u32> {
        &self.indices
    }

    pub fn contains(&self, index: u32) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Monotonic change counter; collaborators watch this to learn that a
    /// new selection was published.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Atomically replace the selection and notify watchers.
    pub fn publish(&mut self, indices: HashSet<u32>) {
        self.indices = indices;
        self.generation += 1;
    }

    /// Pixel-space bounding rectangle of the selection, for overlay bounds
    /// and zoom-to-selection. `image_width` decodes the linear indices.
    pub fn bounds(&self, image_width: u32) -> Option<SelectionBounds> {
        if image_width == 0 || self.indices.is_empty() {
            return None;
        }

        let mut min = (u32::MAX, u32::MAX);
        let mut max = (0, 0);

        for index in &self.indices {
            let (x, y) = (index % image_width, index / image_width);

            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }

        Some(SelectionBounds {
            x: min.0,
            y: min.1,
            width: max.0 - min.0 + 1,
            height: max.1 - min.1 + 1,
        })
    }
}

/// Axis-aligned bounding rectangle of a selection, in image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
