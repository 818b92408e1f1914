//! The landmark layout file shared by the normalizer and the visualizer.
//!
//! ```json
//! {
//!   "canvasWidth": 1024.0,
//!   "canvasHeight": 1024.0,
//!   "num_landmarks": 478,
//!   "all_points": [{ "id": 0, "x": 512.3, "y": 640.1 }, ...]
//! }
//! ```

use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::crop::CoordinateMap;
use crate::error::{Error, Result};
use crate::types::{Landmark, Point};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(rename = "canvasWidth")]
    pub canvas_width: f64,
    #[serde(rename = "canvasHeight")]
    pub canvas_height: f64,
    pub num_landmarks: usize,
    pub all_points: Vec<Landmark>,
}

impl Layout {
    /// Build a layout from positions in canvas space; ids follow input order.
    pub fn from_points(canvas_width: f64, canvas_height: f64, points: &[Point]) -> Self {
        let all_points: Vec<Landmark> = points
            .iter()
            .enumerate()
            .map(|(id, p)| Landmark::new(id, p.x, p.y))
            .collect();
        Self {
            canvas_width,
            canvas_height,
            num_landmarks: all_points.len(),
            all_points,
        }
    }

    /// Re-express every landmark through `map`, keeping ids. Nothing is
    /// clamped or dropped.
    pub fn remapped(
        canvas_width: f64,
        canvas_height: f64,
        source: &[Point],
        map: &CoordinateMap,
    ) -> Self {
        let mapped: Vec<Point> = source.iter().map(|p| map.apply(*p)).collect();
        Self::from_points(canvas_width, canvas_height, &mapped)
    }

    pub fn points(&self) -> Vec<Point> {
        self.all_points.iter().map(Landmark::position).collect()
    }

    /// Position of landmark `index`, if the layout has that many points.
    pub fn point(&self, index: usize) -> Option<Point> {
        self.all_points.get(index).map(Landmark::position)
    }

    /// Ids of landmarks lying outside the canvas. These are kept as-is; the
    /// list is informational.
    pub fn out_of_canvas(&self) -> Vec<usize> {
        self.all_points
            .iter()
            .filter(|l| {
                l.x < 0.0 || l.y < 0.0 || l.x > self.canvas_width || l.y > self.canvas_height
            })
            .map(|l| l.id)
            .collect()
    }

    /// Check the cardinality invariant and canvas sanity.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.num_landmarks != self.all_points.len() {
            return Err(format!(
                "num_landmarks is {} but all_points has {} entries",
                self.num_landmarks,
                self.all_points.len()
            ));
        }
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(format!(
                "canvas must be positive, got {}x{}",
                self.canvas_width, self.canvas_height
            ));
        }
        Ok(())
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::InputMissing {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let layout: Layout = serde_json::from_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        layout.validate().map_err(|reason| Error::InvalidLayout {
            path: path.to_path_buf(),
            reason,
        })?;

        let outside = layout.out_of_canvas();
        if !outside.is_empty() {
            warn!(
                "{}: {} landmark(s) lie outside the {}x{} canvas",
                path.display(),
                outside.len(),
                layout.canvas_width,
                layout.canvas_height
            );
        }
        debug!(
            "read layout {} with {} landmarks",
            path.display(),
            layout.num_landmarks
        );
        Ok(layout)
    }

    /// Write as pretty JSON, creating the parent directory if needed.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|e| Error::io(path, e))
    }
}
