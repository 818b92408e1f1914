//! Runtime configuration. Every field has a default; a JSON file given with
//! `--config` may override any subset, and command-line flags override that.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::render::PlotStyle;
use crate::storage::StorageConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "triangle" | "area" => Ok(ResizeFilter::Triangle),
            "catmull-rom" => Ok(ResizeFilter::CatmullRom),
            "gaussian" => Ok(ResizeFilter::Gaussian),
            "lanczos3" => Ok(ResizeFilter::Lanczos3),
            other => Err(format!("unknown resize filter '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Fraction of the crop side the face's larger dimension should fill.
    pub target_face_scale: f64,
    /// Side length of the square output portrait.
    pub final_size: u32,
    pub resize_filter: ResizeFilter,
    pub jpeg_quality: u8,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target_face_scale: 0.70,
            final_size: 1024,
            resize_filter: ResizeFilter::Triangle,
            jpeg_quality: 95,
        }
    }
}

impl NormalizeConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.target_face_scale.is_finite() || self.target_face_scale <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "target_face_scale must be a positive number, got {}",
                self.target_face_scale
            )));
        }
        if self.final_size == 0 {
            return Err(Error::InvalidArgument("final_size must be positive".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidArgument(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// SeetaFace detection plus an ERT shape predictor.
    ShapePredictor,
    /// Landmarks exported next to the photograph by an external mesh run.
    MeshFile,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "shape-predictor" | "dlib" => Ok(Backend::ShapePredictor),
            "mesh-file" | "mesh" => Ok(Backend::MeshFile),
            other => Err(format!(
                "unknown detector backend '{other}' (expected shape-predictor or mesh-file)"
            )),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::ShapePredictor => f.write_str("shape-predictor"),
            Backend::MeshFile => f.write_str("mesh-file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub backend: Backend,
    pub face_model: PathBuf,
    pub landmark_model: PathBuf,
    pub min_face_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: Backend::ShapePredictor,
            face_model: PathBuf::from("seeta_fd_frontal_v1.0.bin"),
            landmark_model: PathBuf::from("shape_predictor_68_face_landmarks.dat.bz2"),
            min_face_size: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub normalize: NormalizeConfig,
    pub storage: StorageConfig,
    pub detector: DetectorConfig,
    pub plot: PlotStyle,
}

impl AppConfig {
    /// Defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Err(Error::InputMissing {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
