//! Where each photograph's inputs and outputs live on disk.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Numeric photograph identifier. Only plain decimal digits are accepted, so
/// signs and negative numbers are rejected before any work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(pub u32);

impl FromStr for PhotoId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("'{s}' is not a non-negative integer id"));
        }
        s.parse::<u32>()
            .map(PhotoId)
            .map_err(|e| format!("id '{s}' out of range: {e}"))
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub originals_dir: PathBuf,
    pub portraits_dir: PathBuf,
    pub layouts_dir: PathBuf,
    /// Extensions tried, in order, for `original-<id>.<ext>`.
    pub photo_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            originals_dir: PathBuf::from("originals"),
            portraits_dir: PathBuf::from("portraits"),
            layouts_dir: PathBuf::from("data"),
            photo_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
        }
    }
}

impl StorageConfig {
    pub fn photo_candidates(&self, id: PhotoId) -> Vec<PathBuf> {
        self.photo_extensions
            .iter()
            .map(|ext| self.originals_dir.join(format!("original-{id}.{ext}")))
            .collect()
    }

    /// First existing source photograph for `id`.
    pub fn photo_path(&self, id: PhotoId) -> Result<PathBuf> {
        let candidates = self.photo_candidates(id);
        if let Some(found) = candidates.iter().find(|p| p.is_file()) {
            return Ok(found.clone());
        }
        let path = candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| self.originals_dir.join(format!("original-{id}")));
        Err(Error::InputMissing { path })
    }

    /// Landmarks exported by an external face-mesh run for `id`.
    pub fn sidecar_path(&self, id: PhotoId) -> PathBuf {
        self.originals_dir
            .join(format!("original-{id}.landmarks.json"))
    }

    pub fn portrait_path(&self, id: PhotoId) -> PathBuf {
        self.portraits_dir.join(format!("portrait-{id}.jpg"))
    }

    pub fn layout_path(&self, id: PhotoId) -> PathBuf {
        self.layouts_dir.join(format!("layout-{id}.json"))
    }

    pub fn plot_path(&self, id: PhotoId) -> PathBuf {
        self.layouts_dir.join(format!("plot-{id}.png"))
    }
}
