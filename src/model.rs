use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::{sample_features, SimilarityTransform};
use crate::tree::RegressionTree;
use crate::types::{BoundingBox, Point};

/// One cascade level: the feature pixels it samples and the forest that
/// regresses a shape update from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStage {
    /// Landmark each feature pixel is anchored to.
    pub anchors: Vec<u32>,
    /// Offset of each feature pixel from its anchor, in mean-shape space.
    pub offsets: Vec<Point>,
    pub forest: Vec<RegressionTree>,
}

/// Ensemble-of-regression-trees landmark predictor.
///
/// Starts from the mean shape inside the face box and refines it once per
/// cascade stage. Shapes are kept in normalized face coordinates until the
/// final mapping back into the image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapePredictor {
    mean_shape: Vec<Point>,
    stages: Vec<CascadeStage>,
}

impl ShapePredictor {
    /// Assemble a predictor, checking that every index the stages use is in
    /// range.
    pub fn new(mean_shape: Vec<Point>, stages: Vec<CascadeStage>) -> Result<Self> {
        if mean_shape.is_empty() {
            return Err(Error::InvalidModel("mean shape has no landmarks".into()));
        }
        let n = mean_shape.len();
        for (i, stage) in stages.iter().enumerate() {
            if stage.anchors.len() != stage.offsets.len() {
                return Err(Error::InvalidModel(format!(
                    "stage {i}: {} anchors but {} offsets",
                    stage.anchors.len(),
                    stage.offsets.len()
                )));
            }
            if let Some(&a) = stage.anchors.iter().find(|&&a| a as usize >= n) {
                return Err(Error::InvalidModel(format!(
                    "stage {i}: anchor landmark {a} out of range ({n} landmarks)"
                )));
            }
            let num_features = stage.anchors.len();
            for tree in &stage.forest {
                if tree.num_landmarks() != n {
                    return Err(Error::InvalidModel(format!(
                        "stage {i}: tree predicts {} landmarks, mean shape has {n}",
                        tree.num_landmarks()
                    )));
                }
                let bad = tree.splits().iter().find(|s| {
                    s.idx1 as usize >= num_features || s.idx2 as usize >= num_features
                });
                if let Some(split) = bad {
                    return Err(Error::InvalidModel(format!(
                        "stage {i}: split on features {}/{} but only {num_features} sampled",
                        split.idx1, split.idx2
                    )));
                }
            }
        }
        Ok(Self { mean_shape, stages })
    }

    /// Open either a dlib `.dat`/`.dat.bz2` model or a converted `.bin`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::InputMissing {
                path: path.to_path_buf(),
            });
        }
        if path.extension().is_some_and(|ext| ext == "bin") {
            Self::load(path)
        } else {
            crate::dlib::load_dlib_model(path)
        }
    }

    /// Load a model previously written by [`ShapePredictor::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let model: Self = bincode::deserialize(&bytes)?;
        Self::new(model.mean_shape, model.stages)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let bytes = bincode::serialize(self)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    pub fn num_landmarks(&self) -> usize {
        self.mean_shape.len()
    }

    pub fn num_cascade_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn num_trees(&self) -> usize {
        self.stages.iter().map(|s| s.forest.len()).sum()
    }

    pub fn mean_shape(&self) -> &[Point] {
        &self.mean_shape
    }

    /// Predict landmark positions, in image pixels, for the face in `face`.
    pub fn predict(&self, image: &GrayImage, face: &BoundingBox) -> Vec<Point> {
        let mut shape = self.mean_shape.clone();
        let mut features = Vec::new();

        for stage in &self.stages {
            let tform = SimilarityTransform::between(&self.mean_shape, &shape);
            sample_features(
                image,
                face,
                &shape,
                &tform,
                &stage.anchors,
                &stage.offsets,
                &mut features,
            );
            for tree in &stage.forest {
                let delta = tree.leaf(&features);
                for (p, d) in shape.iter_mut().zip(delta.chunks_exact(2)) {
                    p.x += d[0] as f64;
                    p.y += d[1] as f64;
                }
            }
        }

        shape
            .into_iter()
            .map(|p| face.denormalize_point(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SplitTest;

    fn mean() -> Vec<Point> {
        vec![Point::new(0.3, 0.4), Point::new(0.7, 0.4)]
    }

    /// One stage comparing a pixel left of landmark 0 with one right of
    /// landmark 1. Dark-left images push both landmarks up.
    fn single_stage_model() -> ShapePredictor {
        let tree = RegressionTree::new(
            vec![SplitTest {
                idx1: 1,
                idx2: 0,
                threshold: 100.0,
            }],
            vec![0.0, -0.1, 0.0, -0.1, 0.0, 0.0, 0.0, 0.0],
            2,
        )
        .unwrap();
        let stage = CascadeStage {
            anchors: vec![0, 1],
            offsets: vec![Point::new(-0.2, 0.0), Point::new(0.2, 0.0)],
            forest: vec![tree],
        };
        ShapePredictor::new(mean(), vec![stage]).unwrap()
    }

    #[test]
    fn empty_cascade_returns_mean_shape_in_face_box() {
        let model = ShapePredictor::new(mean(), vec![]).unwrap();
        let img = GrayImage::new(200, 200);
        let face = BoundingBox::new(50.0, 20.0, 100.0, 100.0);

        let shape = model.predict(&img, &face);
        let expected = [Point::new(80.0, 60.0), Point::new(120.0, 60.0)];
        for (got, want) in shape.iter().zip(expected) {
            assert!(got.distance(&want) < 1e-9, "{got:?} != {want:?}");
        }
    }

    #[test]
    fn stage_update_depends_on_pixels() {
        let model = single_stage_model();
        let face = BoundingBox::new(0.0, 0.0, 100.0, 100.0);

        // right half bright: f1 - f0 = 255 > 100, left branch
        let split = GrayImage::from_fn(100, 100, |x, _| image::Luma([if x < 50 { 0 } else { 255 }]));
        let shape = model.predict(&split, &face);
        assert!((shape[0].y - 30.0).abs() < 1e-4);
        assert!((shape[1].y - 30.0).abs() < 1e-4);

        // uniform image: no difference, right branch leaves the mean shape
        let flat = GrayImage::from_pixel(100, 100, image::Luma([128]));
        let shape = model.predict(&flat, &face);
        assert!((shape[0].y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let stage = CascadeStage {
            anchors: vec![5],
            offsets: vec![Point::zero()],
            forest: vec![],
        };
        assert!(matches!(
            ShapePredictor::new(mean(), vec![stage]),
            Err(Error::InvalidModel(_))
        ));

        let tree = RegressionTree::new(
            vec![SplitTest {
                idx1: 0,
                idx2: 3,
                threshold: 0.0,
            }],
            vec![0.0; 8],
            2,
        )
        .unwrap();
        let stage = CascadeStage {
            anchors: vec![0],
            offsets: vec![Point::zero()],
            forest: vec![tree],
        };
        assert!(ShapePredictor::new(mean(), vec![stage]).is_err());
        assert!(ShapePredictor::new(vec![], vec![]).is_err());
    }

    #[test]
    fn save_and_load_preserve_predictions() {
        let model = single_stage_model();
        let dir = std::env::temp_dir().join(format!("face-layout-model-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.bin");

        model.save(&path).unwrap();
        let loaded = ShapePredictor::open(&path).unwrap();
        assert_eq!(loaded.num_landmarks(), 2);
        assert_eq!(loaded.num_cascade_stages(), 1);
        assert_eq!(loaded.num_trees(), 1);

        let img = GrayImage::from_fn(100, 100, |x, _| image::Luma([(x * 2) as u8]));
        let face = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(model.predict(&img, &face), loaded.predict(&img, &face));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn open_missing_model() {
        let err = ShapePredictor::open("/nonexistent/sp.dat").unwrap_err();
        assert!(matches!(err, Error::InputMissing { .. }));
    }
}
