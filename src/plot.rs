//! Turns a layout plus a contour table into drawing primitives.
//!
//! The plot lives in layout (image) coordinates: the origin is the top-left
//! corner and `y` grows downward. Surfaces that default to an upward `y`
//! axis must flip it when drawing.

use log::warn;

use crate::contours::{Closure, Contour, LabelKind};
use crate::layout::Layout;
use crate::types::Point;

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub name: &'static str,
    /// Vertices in drawing order; closed contours repeat the first vertex at
    /// the end.
    pub points: Vec<Point>,
    pub closure: Closure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: &'static str,
    pub at: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    pub width: f64,
    pub height: f64,
    /// Every landmark, unlabeled.
    pub markers: Vec<Point>,
    pub polylines: Vec<Polyline>,
    pub labels: Vec<Label>,
    /// Number of contour or label indices skipped as out of range.
    pub skipped: usize,
}

impl Plot {
    /// Lay out `layout` with the given contour table. Indices the layout does
    /// not have are skipped with a warning.
    pub fn build(layout: &Layout, contours: &[Contour]) -> Self {
        let mut plot = Plot {
            width: layout.canvas_width,
            height: layout.canvas_height,
            markers: layout.points(),
            polylines: Vec::with_capacity(contours.len()),
            labels: Vec::new(),
            skipped: 0,
        };

        for contour in contours {
            let mut members = Vec::with_capacity(contour.indices.len() + 1);
            for &index in contour.indices {
                match layout.point(index) {
                    Some(p) => members.push(p),
                    None => {
                        warn!(
                            "contour {}: landmark {} out of range (layout has {})",
                            contour.name, index, layout.num_landmarks
                        );
                        plot.skipped += 1;
                    }
                }
            }

            match contour.label {
                LabelKind::None => {}
                LabelKind::Centroid { name } => {
                    if let Some(at) = Point::mean(&members) {
                        plot.labels.push(Label { text: name, at });
                    }
                }
                LabelKind::Landmark { name, index } => match layout.point(index) {
                    Some(at) => plot.labels.push(Label { text: name, at }),
                    None => {
                        warn!(
                            "label {}: landmark {} out of range (layout has {})",
                            name, index, layout.num_landmarks
                        );
                        plot.skipped += 1;
                    }
                },
            }

            if members.is_empty() {
                continue;
            }
            if contour.closure == Closure::Closed {
                members.push(members[0]);
            }
            plot.polylines.push(Polyline {
                name: contour.name,
                points: members,
                closure: contour.closure,
            });
        }

        plot
    }

    /// Index of the marker nearest to `p` within `radius`.
    pub fn nearest_marker(&self, p: Point, radius: f64) -> Option<usize> {
        self.markers
            .iter()
            .enumerate()
            .map(|(i, m)| (i, m.distance(&p)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Layout {
        Layout::from_points(
            100.0,
            100.0,
            &[
                Point::new(10.0, 10.0),
                Point::new(40.0, 10.0),
                Point::new(10.0, 70.0),
            ],
        )
    }

    #[test]
    fn closed_contour_repeats_first_point_and_labels_centroid() {
        let contours = [Contour::new(
            "test",
            &[0, 1, 2],
            Closure::Closed,
            LabelKind::Centroid {
                name: "test_center",
            },
        )];
        let plot = Plot::build(&triangle(), &contours);

        assert_eq!(plot.markers.len(), 3);
        assert_eq!(plot.polylines.len(), 1);
        let line = &plot.polylines[0];
        assert_eq!(line.points.len(), 4);
        assert_eq!(line.points[3], line.points[0]);

        assert_eq!(plot.labels.len(), 1);
        assert_eq!(plot.labels[0].text, "test_center");
        assert!((plot.labels[0].at.x - 20.0).abs() < 1e-9);
        assert!((plot.labels[0].at.y - 30.0).abs() < 1e-9);
        assert_eq!(plot.skipped, 0);
    }

    #[test]
    fn open_contour_is_left_open() {
        let contours = [Contour::new("brow", &[0, 1, 2], Closure::Open, LabelKind::None)];
        let plot = Plot::build(&triangle(), &contours);

        assert_eq!(plot.polylines[0].points.len(), 3);
        assert!(plot.labels.is_empty());
    }

    #[test]
    fn point_label_uses_raw_landmark() {
        let contours = [Contour::new(
            "bridge",
            &[0, 2],
            Closure::Open,
            LabelKind::Landmark {
                name: "nose_tip",
                index: 1,
            },
        )];
        let plot = Plot::build(&triangle(), &contours);

        assert_eq!(
            plot.labels,
            vec![Label {
                text: "nose_tip",
                at: Point::new(40.0, 10.0)
            }]
        );
    }

    #[test]
    fn out_of_range_indices_are_skipped() {
        let contours = [
            Contour::new(
                "partial",
                &[0, 7, 1],
                Closure::Closed,
                LabelKind::Centroid { name: "partial" },
            ),
            Contour::new(
                "absent",
                &[9, 10],
                Closure::Open,
                LabelKind::Centroid { name: "absent" },
            ),
            Contour::new(
                "bad_label",
                &[2],
                Closure::Open,
                LabelKind::Landmark {
                    name: "chin",
                    index: 42,
                },
            ),
        ];
        let plot = Plot::build(&triangle(), &contours);

        assert_eq!(plot.skipped, 4);
        assert_eq!(plot.polylines.len(), 2);
        assert_eq!(plot.polylines[0].points.len(), 3);
        assert_eq!(plot.labels.len(), 1);
        assert!((plot.labels[0].at.x - 25.0).abs() < 1e-9);
    }

    #[test]
    fn nearest_marker_respects_radius() {
        let plot = Plot::build(&triangle(), &[]);
        assert_eq!(plot.nearest_marker(Point::new(38.0, 12.0), 5.0), Some(1));
        assert_eq!(plot.nearest_marker(Point::new(70.0, 70.0), 5.0), None);
    }
}
