use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Detection,
    Geometry,
    Io,
    Argument,
    Model,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Detection => "detection",
            Stage::Geometry => "geometry",
            Stage::Io => "io",
            Stage::Argument => "argument",
            Stage::Model => "model",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("input file not found: {}", path.display())]
    InputMissing { path: PathBuf },

    #[error("cannot decode image {}: {source}", path.display())]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("no face found in {}", path.display())]
    NoFace { path: PathBuf },

    #[error("detector failed on {}: {reason}", path.display())]
    Detector { path: PathBuf, reason: String },

    #[error("no landmarks to compute a crop from")]
    NoLandmarks,

    #[error("degenerate crop: computed side length {size} is not positive")]
    DegenerateCrop { size: f64 },

    #[error("zero-width crop: cannot compute a scale factor")]
    ZeroWidthCrop,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode image {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid layout {}: {reason}", path.display())]
    InvalidLayout { path: PathBuf, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("model deserialization error: {0}")]
    Deserialization(#[from] bincode::Error),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("model I/O error: {0}")]
    ModelIo(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Error::InputMissing { .. } => Stage::Input,
            Error::UnreadableImage { .. } | Error::NoFace { .. } | Error::Detector { .. } => {
                Stage::Detection
            }
            Error::NoLandmarks | Error::DegenerateCrop { .. } | Error::ZeroWidthCrop => {
                Stage::Geometry
            }
            Error::Io { .. }
            | Error::Encode { .. }
            | Error::Json { .. }
            | Error::InvalidLayout { .. } => Stage::Io,
            Error::InvalidArgument(_) => Stage::Argument,
            Error::Deserialization(_) | Error::InvalidModel(_) | Error::ModelIo(_) => Stage::Model,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
