//! Hand-curated facial-feature contours for the supported landmark schemes.
//!
//! Each contour names an ordered run of landmark indices, whether the
//! polyline closes back on its first point, and what label (if any) the plot
//! shows for it. Left/right are image sides as seen by the viewer, so
//! `left_eye` is the subject's right eye.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    None,
    /// Label at the mean of the contour's member coordinates.
    Centroid { name: &'static str },
    /// Label at one landmark's raw coordinate.
    Landmark { name: &'static str, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contour {
    pub name: &'static str,
    pub indices: &'static [usize],
    pub closure: Closure,
    pub label: LabelKind,
}

impl Contour {
    pub const fn new(
        name: &'static str,
        indices: &'static [usize],
        closure: Closure,
        label: LabelKind,
    ) -> Self {
        Self {
            name,
            indices,
            closure,
            label,
        }
    }
}

/// Landmark numbering scheme a layout was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Dense face mesh with iris points (478 landmarks).
    Mesh478,
    /// iBUG 300-W annotation used by dlib's 68-point predictor.
    Ibug68,
}

impl Scheme {
    pub const ALL: [Scheme; 2] = [Scheme::Mesh478, Scheme::Ibug68];

    /// Scheme matching a layout's landmark count, if any.
    pub fn detect(num_landmarks: usize) -> Option<Scheme> {
        Self::ALL
            .into_iter()
            .find(|s| s.landmark_count() == num_landmarks)
    }

    pub fn landmark_count(&self) -> usize {
        match self {
            Scheme::Mesh478 => 478,
            Scheme::Ibug68 => 68,
        }
    }

    pub fn contours(&self) -> &'static [Contour] {
        match self {
            Scheme::Mesh478 => MESH_478,
            Scheme::Ibug68 => IBUG_68,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Mesh478 => f.write_str("mesh478"),
            Scheme::Ibug68 => f.write_str("ibug68"),
        }
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mesh478" | "mesh" | "478" => Ok(Scheme::Mesh478),
            "ibug68" | "dlib68" | "68" => Ok(Scheme::Ibug68),
            other => Err(format!(
                "unknown landmark scheme '{other}' (expected mesh478 or ibug68)"
            )),
        }
    }
}

use Closure::{Closed, Open};

const MESH_478: &[Contour] = &[
    Contour::new(
        "left_eye",
        &[
            33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
        ],
        Closed,
        LabelKind::Centroid {
            name: "left_eye_center",
        },
    ),
    Contour::new(
        "right_eye",
        &[
            263, 249, 390, 373, 374, 380, 381, 382, 362, 398, 384, 385, 386, 387, 388, 466,
        ],
        Closed,
        LabelKind::Centroid {
            name: "right_eye_center",
        },
    ),
    Contour::new(
        "left_eyebrow",
        &[70, 63, 105, 66, 107, 55, 65, 52, 53, 46],
        Open,
        LabelKind::None,
    ),
    Contour::new(
        "right_eyebrow",
        &[300, 293, 334, 296, 336, 285, 295, 282, 283, 276],
        Open,
        LabelKind::None,
    ),
    Contour::new(
        "mouth",
        &[
            61, 185, 40, 39, 37, 0, 267, 269, 270, 409, 291, 375, 321, 405, 314, 17, 84, 181, 91,
            146,
        ],
        Closed,
        LabelKind::Centroid {
            name: "mouth_center",
        },
    ),
    Contour::new(
        "nose_bridge",
        &[168, 6, 197, 195, 5],
        Open,
        LabelKind::Landmark {
            name: "nose_tip",
            index: 4,
        },
    ),
    Contour::new(
        "face_silhouette",
        &[
            10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400,
            377, 152, 148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67,
            109,
        ],
        Closed,
        LabelKind::Landmark {
            name: "chin",
            index: 152,
        },
    ),
    Contour::new("left_iris", &[469, 470, 471, 472], Closed, LabelKind::None),
    Contour::new("right_iris", &[474, 475, 476, 477], Closed, LabelKind::None),
    Contour::new("nose_base", &[98, 97, 2, 326, 327], Open, LabelKind::None),
    Contour::new(
        "inner_lips",
        &[
            78, 191, 80, 81, 82, 13, 312, 311, 310, 415, 308, 324, 318, 402, 317, 14, 87, 178, 88,
            95,
        ],
        Closed,
        LabelKind::None,
    ),
];

const IBUG_68: &[Contour] = &[
    Contour::new(
        "left_eye",
        &[36, 37, 38, 39, 40, 41],
        Closed,
        LabelKind::Centroid {
            name: "left_eye_center",
        },
    ),
    Contour::new(
        "right_eye",
        &[42, 43, 44, 45, 46, 47],
        Closed,
        LabelKind::Centroid {
            name: "right_eye_center",
        },
    ),
    Contour::new("left_eyebrow", &[17, 18, 19, 20, 21], Open, LabelKind::None),
    Contour::new("right_eyebrow", &[22, 23, 24, 25, 26], Open, LabelKind::None),
    Contour::new(
        "mouth",
        &[48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59],
        Closed,
        LabelKind::Centroid {
            name: "mouth_center",
        },
    ),
    Contour::new(
        "nose_bridge",
        &[27, 28, 29, 30],
        Open,
        LabelKind::Landmark {
            name: "nose_tip",
            index: 30,
        },
    ),
    Contour::new(
        "jaw",
        &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16],
        Open,
        LabelKind::Landmark {
            name: "chin",
            index: 8,
        },
    ),
    Contour::new("nose_base", &[31, 32, 33, 34, 35], Open, LabelKind::None),
    Contour::new(
        "inner_lips",
        &[60, 61, 62, 63, 64, 65, 66, 67],
        Closed,
        LabelKind::None,
    ),
];
