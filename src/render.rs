//! Raster rendering of a [`Plot`] with `imageproc`.

use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{
    draw_cross_mut, draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut,
    draw_text_mut,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::plot::Plot;
use crate::types::Point;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    /// Output pixels per layout unit.
    pub scale: f64,
    pub background: [u8; 3],
    pub marker_color: [u8; 3],
    pub contour_color: [u8; 3],
    pub label_color: [u8; 3],
    pub marker_radius: i32,
    pub font_size: f32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: [255, 255, 255],
            marker_color: [220, 30, 30],
            contour_color: [0, 160, 200],
            label_color: [20, 20, 20],
            marker_radius: 2,
            font_size: 18.0,
        }
    }
}

/// Largest canvas side, in pixels, the renderer will allocate.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

impl PlotStyle {
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "plot scale must be positive, got {}",
                self.scale
            )));
        }
        if self.marker_radius < 0 || self.marker_radius > 64 {
            return Err(Error::InvalidArgument(format!(
                "marker radius must be in 0..=64, got {}",
                self.marker_radius
            )));
        }
        Ok(())
    }

    /// Output size for `plot`. Fails for non-finite sizes or sides over
    /// [`MAX_CANVAS_SIDE`].
    pub fn canvas_size(&self, plot: &Plot) -> Result<(u32, u32)> {
        self.validate()?;
        let (w, h) = (plot.width * self.scale, plot.height * self.scale);
        let limit = MAX_CANVAS_SIDE as f64;
        if !(w.is_finite() && h.is_finite()) || w.round() > limit || h.round() > limit {
            return Err(Error::InvalidArgument(format!(
                "plot canvas {w:.0}x{h:.0} exceeds {MAX_CANVAS_SIDE}x{MAX_CANVAS_SIDE} pixels"
            )));
        }
        Ok((w.round().max(1.0) as u32, h.round().max(1.0) as u32))
    }

    fn to_canvas(&self, p: Point) -> Point {
        p * self.scale
    }
}

/// Canvas rectangle grown by `margin` on every side.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    fn new(width: u32, height: u32, margin: f64) -> Self {
        Self {
            min: -margin,
            max_x: width as f64 + margin,
            max_y: height as f64 + margin,
        }
    }

    fn contains(&self, p: Point) -> bool {
        p.x >= self.min && p.x <= self.max_x && p.y >= self.min && p.y <= self.max_y
    }

    /// Liang-Barsky clip of segment `a`-`b`; `None` when it misses.
    fn clip(&self, a: Point, b: Point) -> Option<(Point, Point)> {
        let d = b - a;
        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        let edges = [
            (-d.x, a.x - self.min),
            (d.x, self.max_x - a.x),
            (-d.y, a.y - self.min),
            (d.y, self.max_y - a.y),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
        Some((a + d * t0, a + d * t1))
    }
}

fn pixel(p: Point) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

fn float_pixel(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

/// Load a TrueType/OpenType font for text labels.
pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontVec> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::InputMissing {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| Error::InvalidArgument(format!("{}: {e}", path.display())))
}

/// Draw `plot` onto a fresh canvas, optionally over `background` (stretched
/// to the canvas). Labels are drawn as ringed dots, with text when a font is
/// given. Points far outside the canvas are kept in the plot but not drawn.
pub fn render(
    plot: &Plot,
    style: &PlotStyle,
    background: Option<&DynamicImage>,
    font: Option<&FontVec>,
) -> Result<RgbImage> {
    let (width, height) = style.canvas_size(plot)?;
    let mut canvas = match background {
        Some(img) => img.resize_exact(width, height, FilterType::Triangle).to_rgb8(),
        None => RgbImage::from_pixel(width, height, Rgb(style.background)),
    };

    let ring = style.marker_radius.max(1) * 3;
    let bounds = Bounds::new(width, height, (ring + 1) as f64);

    let contour = Rgb(style.contour_color);
    for line in &plot.polylines {
        for pair in line.points.windows(2) {
            let a = style.to_canvas(pair[0]);
            let b = style.to_canvas(pair[1]);
            if let Some((a, b)) = bounds.clip(a, b) {
                draw_line_segment_mut(&mut canvas, float_pixel(a), float_pixel(b), contour);
            }
        }
    }

    let marker = Rgb(style.marker_color);
    for p in &plot.markers {
        let at = style.to_canvas(*p);
        if bounds.contains(at) {
            draw_filled_circle_mut(&mut canvas, pixel(at), style.marker_radius, marker);
        }
    }

    let label = Rgb(style.label_color);
    for l in &plot.labels {
        let at = style.to_canvas(l.at);
        if !bounds.contains(at) {
            continue;
        }
        let (x, y) = pixel(at);
        draw_hollow_circle_mut(&mut canvas, (x, y), ring, label);
        draw_cross_mut(&mut canvas, label, x, y);
        if let Some(font) = font {
            draw_text_mut(
                &mut canvas,
                label,
                x + ring + 2,
                y - ring,
                PxScale::from(style.font_size),
                font,
                l.text,
            );
        }
    }

    Ok(canvas)
}

/// Human-readable list of labels, one per line.
pub fn legend(plot: &Plot) -> String {
    let mut s = String::new();
    for l in &plot.labels {
        s.push_str(&format!("  {:<14} ({:>7.1}, {:>7.1})\n", l.text, l.at.x, l.at.y));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contours::{Closure, Contour, LabelKind};
    use crate::layout::Layout;

    fn sample_plot() -> Plot {
        let layout = Layout::from_points(
            64.0,
            32.0,
            &[
                Point::new(8.0, 8.0),
                Point::new(56.0, 8.0),
                Point::new(32.0, 24.0),
            ],
        );
        let contours = [Contour::new(
            "tri",
            &[0, 1, 2],
            Closure::Closed,
            LabelKind::Centroid { name: "tri" },
        )];
        Plot::build(&layout, &contours)
    }

    #[test]
    fn canvas_follows_scale() {
        let plot = sample_plot();
        let style = PlotStyle {
            scale: 2.0,
            ..PlotStyle::default()
        };
        let img = render(&plot, &style, None, None).unwrap();
        assert_eq!(img.dimensions(), (128, 64));
    }

    #[test]
    fn markers_and_contours_drawn() {
        let plot = sample_plot();
        let style = PlotStyle::default();
        let img = render(&plot, &style, None, None).unwrap();

        assert_eq!(*img.get_pixel(8, 8), Rgb(style.marker_color));
        assert_eq!(*img.get_pixel(32, 8), Rgb(style.contour_color));
        assert_eq!(*img.get_pixel(0, 31), Rgb(style.background));
    }

    #[test]
    fn background_is_stretched_to_canvas() {
        let plot = sample_plot();
        let bg = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(16, 8, image::Luma([90])));
        let img = render(&plot, &PlotStyle::default(), Some(&bg), None).unwrap();

        assert_eq!(img.dimensions(), (64, 32));
        assert_eq!(*img.get_pixel(63, 31), Rgb([90, 90, 90]));
    }

    #[test]
    fn legend_lists_labels() {
        let text = legend(&sample_plot());
        assert!(text.contains("tri"));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn missing_font_reported() {
        let err = load_font("/nonexistent/font.ttf").unwrap_err();
        assert!(matches!(err, Error::InputMissing { .. }));
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let huge = Plot::build(&Layout::from_points(1e12, 1e12, &[]), &[]);
        let err = render(&huge, &PlotStyle::default(), None, None).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let plot = sample_plot();
        let scaled = PlotStyle {
            scale: 1e6,
            ..PlotStyle::default()
        };
        assert!(render(&plot, &scaled, None, None).is_err());

        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let style = PlotStyle {
                scale,
                ..PlotStyle::default()
            };
            assert!(style.validate().is_err(), "scale {scale}");
            assert!(render(&plot, &style, None, None).is_err(), "scale {scale}");
        }
    }

    #[test]
    fn far_away_points_are_not_drawn() {
        let layout = Layout::from_points(
            64.0,
            32.0,
            &[
                Point::new(8.0, 8.0),
                Point::new(3e9, 16.0),
                Point::new(-3e9, -3e9),
            ],
        );
        let contours = [Contour::new(
            "spike",
            &[0, 1, 2],
            Closure::Closed,
            LabelKind::Centroid { name: "spike" },
        )];
        let plot = Plot::build(&layout, &contours);
        assert_eq!(plot.markers.len(), 3);

        let style = PlotStyle::default();
        let img = render(&plot, &style, None, None).unwrap();
        assert_eq!(img.dimensions(), (64, 32));
        assert_eq!(*img.get_pixel(8, 8), Rgb(style.marker_color));
        // the segment toward x = 3e9 is clipped, not dropped
        assert_eq!(*img.get_pixel(40, 8), Rgb(style.contour_color));
    }

    #[test]
    fn clip_keeps_inside_part_of_segment() {
        let bounds = Bounds::new(100, 50, 0.0);
        let (a, b) = bounds
            .clip(Point::new(-50.0, 25.0), Point::new(150.0, 25.0))
            .unwrap();
        assert!((a.x - 0.0).abs() < 1e-9 && (b.x - 100.0).abs() < 1e-9);

        assert!(bounds
            .clip(Point::new(-10.0, -10.0), Point::new(-5.0, 60.0))
            .is_none());
        let inside = (Point::new(10.0, 10.0), Point::new(20.0, 30.0));
        assert_eq!(bounds.clip(inside.0, inside.1), Some(inside));
    }
}
