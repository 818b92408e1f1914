//! Landmark detector backends.
//!
//! Detectors report at most one face as landmarks normalized to fractions
//! of the image width and height.

use std::fs;
use std::path::{Path, PathBuf};

use image::{imageops, RgbImage};
use log::debug;
use rustface::{Detector, ImageData};
use serde::Deserialize;

use crate::config::{Backend, DetectorConfig};
use crate::error::{Error, Result};
use crate::model::ShapePredictor;
use crate::storage::{PhotoId, StorageConfig};
use crate::types::{BoundingBox, Point};

pub trait LandmarkDetector {
    fn name(&self) -> &str;

    /// Landmarks of the most prominent face, or `None` when there is no
    /// face.
    fn detect(&mut self, image: &RgbImage) -> Result<Option<Vec<Point>>>;
}

/// Build the detector `config` selects for photograph `id`.
pub fn from_config(
    config: &DetectorConfig,
    storage: &StorageConfig,
    id: PhotoId,
) -> Result<Box<dyn LandmarkDetector>> {
    match config.backend {
        Backend::ShapePredictor => Ok(Box::new(ShapePredictorDetector::new(config)?)),
        Backend::MeshFile => Ok(Box::new(MeshFileDetector::new(storage.sidecar_path(id)))),
    }
}

/// SeetaFace face detection (via `rustface`) followed by an ERT shape
/// predictor inside the largest face box.
pub struct ShapePredictorDetector {
    faces: Box<dyn Detector>,
    predictor: ShapePredictor,
}

impl ShapePredictorDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let face_model = &config.face_model;
        if !face_model.exists() {
            return Err(Error::InputMissing {
                path: face_model.clone(),
            });
        }
        let face_model_str = face_model.to_str().ok_or_else(|| {
            Error::InvalidArgument(format!("non UTF-8 model path {}", face_model.display()))
        })?;
        let mut faces = rustface::create_detector(face_model_str).map_err(|e| {
            Error::InvalidModel(format!(
                "failed to load face detector {}: {}",
                face_model.display(),
                e
            ))
        })?;
        faces.set_min_face_size(config.min_face_size);
        faces.set_score_thresh(2.0);
        faces.set_pyramid_scale_factor(0.8);
        faces.set_slide_window_step(4, 4);

        let predictor = ShapePredictor::open(&config.landmark_model)?;
        debug!(
            "shape predictor {}: {} landmarks",
            config.landmark_model.display(),
            predictor.num_landmarks()
        );
        Ok(Self::from_parts(faces, predictor))
    }

    pub fn from_parts(faces: Box<dyn Detector>, predictor: ShapePredictor) -> Self {
        Self { faces, predictor }
    }
}

impl LandmarkDetector for ShapePredictorDetector {
    fn name(&self) -> &str {
        "shape-predictor"
    }

    fn detect(&mut self, image: &RgbImage) -> Result<Option<Vec<Point>>> {
        let (width, height) = image.dimensions();
        let gray = imageops::grayscale(image);
        let image_data = ImageData::new(gray.as_raw(), width, height);

        let faces = self.faces.detect(&image_data);
        debug!("{} face(s) detected", faces.len());
        let Some(face) = faces
            .iter()
            .max_by_key(|f| f.bbox().width() as u64 * f.bbox().height() as u64)
        else {
            return Ok(None);
        };

        let bbox = face.bbox();
        let face_box = BoundingBox::new(
            bbox.x() as f64,
            bbox.y() as f64,
            bbox.width() as f64,
            bbox.height() as f64,
        );
        let landmarks = self
            .predictor
            .predict(&gray, &face_box)
            .into_iter()
            .map(|p| Point::new(p.x / width as f64, p.y / height as f64))
            .collect();
        Ok(Some(landmarks))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MeshPoint {
    Object { x: f64, y: f64 },
    Coords(Vec<f64>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MeshFile {
    Bare(Vec<MeshPoint>),
    Wrapped { landmarks: Vec<MeshPoint> },
}

/// Reads landmarks an external face-mesh run exported next to the
/// photograph. Accepts `[[x, y(, z)], ...]`, `[{"x", "y"}, ...]` or either
/// wrapped as `{"landmarks": [...]}`; an empty list means no face.
pub struct MeshFileDetector {
    path: PathBuf,
}

impl MeshFileDetector {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn invalid(&self, reason: String) -> Error {
        Error::Detector {
            path: self.path.clone(),
            reason,
        }
    }
}

impl LandmarkDetector for MeshFileDetector {
    fn name(&self) -> &str {
        "mesh-file"
    }

    fn detect(&mut self, _image: &RgbImage) -> Result<Option<Vec<Point>>> {
        if !self.path.exists() {
            return Err(Error::InputMissing {
                path: self.path.clone(),
            });
        }
        let text = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let file: MeshFile = serde_json::from_str(&text).map_err(|source| Error::Json {
            path: self.path.clone(),
            source,
        })?;
        let raw = match file {
            MeshFile::Bare(points) | MeshFile::Wrapped { landmarks: points } => points,
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let mut points = Vec::with_capacity(raw.len());
        for (i, p) in raw.into_iter().enumerate() {
            let point = match p {
                MeshPoint::Object { x, y } => Point::new(x, y),
                MeshPoint::Coords(c) if c.len() >= 2 => Point::new(c[0], c[1]),
                MeshPoint::Coords(c) => {
                    return Err(self.invalid(format!(
                        "landmark {i} has {} coordinates, need at least 2",
                        c.len()
                    )))
                }
            };
            points.push(point);
        }
        debug!("{} landmarks from {}", points.len(), self.path.display());
        Ok(Some(points))
    }
}
