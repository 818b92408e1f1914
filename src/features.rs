use image::GrayImage;

use crate::types::{BoundingBox, Point};

/// 2D similarity transform `p' = [[a, -b], [b, a]] * p + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityTransform {
    pub a: f64,
    pub b: f64,
    pub tx: f64,
    pub ty: f64,
}

impl SimilarityTransform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Least-squares rotation + uniform scale + translation taking `from`
    /// onto `to`. Falls back to identity for degenerate input.
    pub fn between(from: &[Point], to: &[Point]) -> Self {
        debug_assert_eq!(from.len(), to.len());
        let (Some(mean_from), Some(mean_to)) = (Point::mean(from), Point::mean(to)) else {
            return Self::identity();
        };

        let mut variance = 0.0;
        let mut dot = 0.0;
        let mut cross = 0.0;
        for (f, t) in from.iter().zip(to) {
            let f = *f - mean_from;
            let t = *t - mean_to;
            variance += f.x * f.x + f.y * f.y;
            dot += f.x * t.x + f.y * t.y;
            cross += f.x * t.y - f.y * t.x;
        }
        if variance <= f64::EPSILON {
            return Self::identity();
        }

        let a = dot / variance;
        let b = cross / variance;
        Self {
            a,
            b,
            tx: mean_to.x - (a * mean_from.x - b * mean_from.y),
            ty: mean_to.y - (b * mean_from.x + a * mean_from.y),
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        let r = self.apply_linear(p);
        Point::new(r.x + self.tx, r.y + self.ty)
    }

    /// Rotation and scale only.
    pub fn apply_linear(&self, p: Point) -> Point {
        Point::new(self.a * p.x - self.b * p.y, self.b * p.x + self.a * p.y)
    }
}

/// Intensity of the pixel nearest to `p`; 0 outside the image.
#[inline]
pub fn intensity(image: &GrayImage, p: Point) -> f32 {
    let (x, y) = (p.x.round(), p.y.round());
    if x < 0.0 || y < 0.0 {
        return 0.0;
    }
    image
        .get_pixel_checked(x as u32, y as u32)
        .map_or(0.0, |px| px.0[0] as f32)
}

/// Sample the intensities a cascade stage splits on.
///
/// Each feature pixel sits at `anchor + offset` in normalized face space,
/// with the offset rotated and scaled by `tform` so it follows the current
/// shape estimate, then mapped into the image through `face`.
pub fn sample_features(
    image: &GrayImage,
    face: &BoundingBox,
    shape: &[Point],
    tform: &SimilarityTransform,
    anchors: &[u32],
    offsets: &[Point],
    out: &mut Vec<f32>,
) {
    out.clear();
    out.extend(anchors.iter().zip(offsets).map(|(&anchor, &offset)| {
        let normalized = tform.apply_linear(offset) + shape[anchor as usize];
        intensity(image, face.denormalize_point(normalized))
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_between_identical_shapes_is_identity() {
        let shape = [
            Point::new(0.2, 0.3),
            Point::new(0.8, 0.3),
            Point::new(0.5, 0.7),
        ];
        let t = SimilarityTransform::between(&shape, &shape);
        assert!((t.a - 1.0).abs() < 1e-12);
        assert!(t.b.abs() < 1e-12);
        assert!(t.tx.abs() < 1e-12 && t.ty.abs() < 1e-12);
    }

    #[test]
    fn transform_recovers_rotation_scale_and_shift() {
        let angle: f64 = 0.3;
        let scale = 1.7;
        let truth = SimilarityTransform {
            a: scale * angle.cos(),
            b: scale * angle.sin(),
            tx: 4.0,
            ty: -2.5,
        };
        let from = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.3, 0.9),
            Point::new(-0.4, 0.2),
        ];
        let to: Vec<Point> = from.iter().map(|p| truth.apply(*p)).collect();

        let t = SimilarityTransform::between(&from, &to);
        assert!((t.a - truth.a).abs() < 1e-9);
        assert!((t.b - truth.b).abs() < 1e-9);
        assert!((t.tx - truth.tx).abs() < 1e-9);
        assert!((t.ty - truth.ty).abs() < 1e-9);
    }

    #[test]
    fn degenerate_shape_gives_identity() {
        let collapsed = [Point::new(1.0, 1.0); 3];
        let other = [Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(0.0, 2.0)];
        assert_eq!(
            SimilarityTransform::between(&collapsed, &other),
            SimilarityTransform::identity()
        );
    }

    #[test]
    fn intensity_uses_nearest_pixel() {
        let img = GrayImage::from_fn(3, 3, |x, y| image::Luma([(10 * x + 100 * y) as u8]));

        assert_eq!(intensity(&img, Point::new(1.0, 1.0)), 110.0);
        assert_eq!(intensity(&img, Point::new(1.4, 0.6)), 110.0);
        assert_eq!(intensity(&img, Point::new(-0.6, 1.0)), 0.0);
        assert_eq!(intensity(&img, Point::new(2.6, 0.0)), 0.0);
    }

    #[test]
    fn feature_sampling_follows_anchor_and_offset() {
        // gradient along x: pixel value = 25 * x
        let img = GrayImage::from_fn(10, 10, |x, _| image::Luma([(x * 25) as u8]));
        let face = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let shape = [Point::new(0.2, 0.5), Point::new(0.7, 0.5)];
        let anchors = [0, 1, 0];
        let offsets = [Point::zero(), Point::zero(), Point::new(0.1, 0.0)];

        let mut out = Vec::new();
        sample_features(
            &img,
            &face,
            &shape,
            &SimilarityTransform::identity(),
            &anchors,
            &offsets,
            &mut out,
        );
        assert_eq!(out, vec![50.0, 175.0, 75.0]);
    }
}
