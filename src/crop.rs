//! Square crop selection around a detected face and the coordinate mapping
//! from the source photograph into the fixed-size portrait.
//!
//! The crop is always centered on the center of the landmark bounding box.
//! When the face sits close to an image edge the crop shrinks around that
//! center instead of moving toward the interior, so the requested face scale
//! may not be reached.

use log::warn;

use crate::error::{Error, Result};
use crate::types::{BoundingBox, Point};

/// Axis-aligned square crop in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropBox {
    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn is_square(&self) -> bool {
        self.x2 - self.x1 == self.y2 - self.y1
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x2 <= width && self.y2 <= height
    }
}

/// Result of crop selection, kept around for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPlan {
    pub crop: CropBox,
    /// Bounding box of all landmarks.
    pub face: BoundingBox,
    /// Side length the target scale asked for, before clamping.
    pub requested_size: f64,
}

impl CropPlan {
    /// Whether the image bounds forced a smaller crop than requested.
    pub fn was_clamped(&self) -> bool {
        (self.crop.size() as f64) < self.requested_size.trunc()
    }
}

/// Choose a square crop centered on the face so that the longer face
/// dimension fills `target_face_scale` of the side, shrinking it as needed to
/// stay inside a `width` x `height` image.
pub fn square_crop(
    landmarks: &[Point],
    width: u32,
    height: u32,
    target_face_scale: f64,
) -> Result<CropPlan> {
    let face = BoundingBox::enclosing(landmarks).ok_or(Error::NoLandmarks)?;
    let center = face.center();
    let face_max_dim = face.width.max(face.height);
    let requested_size = face_max_dim / target_face_scale;

    let (w, h) = (width as f64, height as f64);
    let max_safe = (2.0 * center.x.min(w - center.x)).min(2.0 * center.y.min(h - center.y));
    let size = requested_size.min(max_safe).trunc();

    // NaN fails this comparison too
    if !(size > 0.0) {
        return Err(Error::DegenerateCrop { size });
    }

    let x1 = (center.x - size / 2.0).trunc();
    let y1 = (center.y - size / 2.0).trunc();
    let side = size as u32;
    let crop = CropBox {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x1 as u32 + side,
        y2: y1 as u32 + side,
    };

    let plan = CropPlan {
        crop,
        face,
        requested_size,
    };
    if plan.was_clamped() {
        warn!(
            "face near image edge: crop shrunk from {:.0}px to {}px, face scale {:.2} not reached",
            requested_size, side, target_face_scale
        );
    }
    Ok(plan)
}

/// Affine map `p' = (p - offset) * scale`, shared by every landmark of a
/// normalization run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMap {
    pub offset: Point,
    pub scale: f64,
}

impl CoordinateMap {
    pub const fn identity() -> Self {
        Self {
            offset: Point::zero(),
            scale: 1.0,
        }
    }

    /// Map from source-image space into a `final_size` square portrait cut
    /// from `crop`.
    pub fn for_crop(crop: &CropBox, final_size: u32) -> Result<Self> {
        let side = crop.size();
        if side == 0 {
            return Err(Error::ZeroWidthCrop);
        }
        Ok(Self {
            offset: Point::new(crop.x1 as f64, crop.y1 as f64),
            scale: final_size as f64 / side as f64,
        })
    }

    /// Out-of-range results are returned as-is; nothing is clamped.
    pub fn apply(&self, p: Point) -> Point {
        (p - self.offset) * self.scale
    }
}
