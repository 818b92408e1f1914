//! # face-layout
//!
//! Normalizes portrait photographs around a detected face and plots the
//! resulting facial-landmark layouts.
//!
//! - **Portrait normalization**: landmarks from a [`LandmarkDetector`] pick a
//!   square crop centered on the face ([`crop::square_crop`]); the crop is
//!   resized to a fixed size, converted to single-channel intensity, and the
//!   landmarks are re-expressed in portrait pixels ([`Layout`]).
//! - **Layout visualization**: a layout plus a per-scheme contour table
//!   ([`Scheme`]) becomes a [`Plot`] of markers, feature polylines and labels,
//!   rendered to a raster image ([`render::render`]) or shown interactively.
//!
//! Landmarks come from either an ERT shape predictor running on `rustface`
//! face boxes ([`ShapePredictorDetector`], dlib `.dat` models) or from a face
//! mesh exported next to the photograph ([`MeshFileDetector`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use face_layout::{crop::square_crop, crop::CoordinateMap, Layout, Point};
//!
//! let landmarks = [Point::new(800.0, 600.0), Point::new(1200.0, 900.0)];
//! let plan = square_crop(&landmarks, 2000, 1500, 0.70).unwrap();
//! assert_eq!(plan.crop.size(), 571);
//!
//! let map = CoordinateMap::for_crop(&plan.crop, 1024).unwrap();
//! let layout = Layout::remapped(1024.0, 1024.0, &landmarks, &map);
//! assert_eq!(layout.num_landmarks, 2);
//! ```

pub mod config;
pub mod contours;
pub mod crop;
pub mod detector;
pub mod dlib;
pub mod error;
pub mod features;
pub mod layout;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod plot;
pub mod render;
pub mod storage;
pub mod tree;
pub mod types;

pub use config::{AppConfig, Backend, DetectorConfig, NormalizeConfig, ResizeFilter};
pub use contours::{Closure, Contour, LabelKind, Scheme};
pub use crop::{CoordinateMap, CropBox, CropPlan};
pub use detector::{LandmarkDetector, MeshFileDetector, ShapePredictorDetector};
pub use error::{Error, Result, Stage};
pub use layout::Layout;
pub use model::{CascadeStage, ShapePredictor};
pub use normalize::{Outputs, Portrait};
pub use plot::Plot;
pub use render::PlotStyle;
pub use storage::{PhotoId, StorageConfig};
pub use types::{BoundingBox, Landmark, Point};

// Re-export image types for convenience
pub use image::{GrayImage, RgbImage};
