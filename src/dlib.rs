//! Loader for dlib's `shape_predictor` serialization, raw (`.dat`) or
//! bzip2-compressed (`.dat.bz2`).
//!
//! Pre-trained models are published in the dlib-models repository, e.g.
//! `shape_predictor_68_face_landmarks.dat.bz2` (iBUG 68-point scheme).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use log::debug;

use crate::error::{Error, Result};
use crate::model::{CascadeStage, ShapePredictor};
use crate::tree::{RegressionTree, SplitTest};
use crate::types::Point;

/// dlib's variable-length integers: a control byte (`0x80` = negative, low
/// nibble = byte count) followed by little-endian magnitude bytes. Floats are
/// a `(mantissa, exponent)` pair of such integers.
struct DlibReader<R: Read> {
    reader: R,
}

impl<R: Read> DlibReader<R> {
    fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_int(&mut self) -> Result<i64> {
        let control = self.read_byte()?;
        let negative = control & 0x80 != 0;
        let num_bytes = (control & 0x0F) as usize;
        if num_bytes > 8 {
            return Err(Error::InvalidModel(format!(
                "integer of {num_bytes} bytes does not fit 64 bits"
            )));
        }

        let mut magnitude: u64 = 0;
        for i in 0..num_bytes {
            magnitude |= (self.read_byte()? as u64) << (8 * i);
        }
        let value = magnitude as i64;
        Ok(if negative { -value } else { value })
    }

    fn read_len(&mut self) -> Result<usize> {
        let value = self.read_int()?;
        usize::try_from(value)
            .map_err(|_| Error::InvalidModel(format!("expected a length, got {value}")))
    }

    fn read_float(&mut self) -> Result<f32> {
        let mantissa = self.read_int()?;
        let exponent = self.read_int()?;
        if mantissa == 0 {
            return Ok(0.0);
        }
        Ok((mantissa as f64 * 2f64.powi(exponent as i32)) as f32)
    }

    /// Column vector stored as `(-rows, -cols, data...)`.
    fn read_column(&mut self, expected_rows: Option<usize>) -> Result<Vec<f32>> {
        let rows = self.read_int()?.unsigned_abs() as usize;
        let cols = self.read_int()?.unsigned_abs() as usize;
        if cols != 1 || expected_rows.is_some_and(|n| n != rows) {
            return Err(Error::InvalidModel(format!(
                "unexpected {rows}x{cols} matrix{}",
                expected_rows.map_or(String::new(), |n| format!(", wanted {n}x1"))
            )));
        }
        (0..rows).map(|_| self.read_float()).collect()
    }
}

/// Load a dlib shape predictor, decompressing `.bz2` files on the fly.
pub fn load_dlib_model<P: AsRef<Path>>(path: P) -> Result<ShapePredictor> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let model = if path.extension().is_some_and(|ext| ext == "bz2") {
        load_dlib_model_from_reader(BzDecoder::new(reader))?
    } else {
        load_dlib_model_from_reader(reader)?
    };
    debug!(
        "loaded {}: {} landmarks, {} stages, {} trees",
        path.display(),
        model.num_landmarks(),
        model.num_cascade_stages(),
        model.num_trees()
    );
    Ok(model)
}

pub fn load_dlib_model_from_reader<R: Read>(reader: R) -> Result<ShapePredictor> {
    parse_shape_predictor(&mut DlibReader::new(reader))
}

fn parse_shape_predictor<R: Read>(r: &mut DlibReader<R>) -> Result<ShapePredictor> {
    let version = r.read_int()?;
    if version != 1 {
        return Err(Error::InvalidModel(format!(
            "unsupported shape_predictor version {version}"
        )));
    }

    let initial = r.read_column(None)?;
    if initial.is_empty() || initial.len() % 2 != 0 {
        return Err(Error::InvalidModel(format!(
            "initial shape has {} values",
            initial.len()
        )));
    }
    let mean_shape: Vec<Point> = initial
        .chunks_exact(2)
        .map(|c| Point::new(c[0] as f64, c[1] as f64))
        .collect();
    let num_landmarks = mean_shape.len();

    let num_stages = r.read_len()?;
    let mut forests = Vec::with_capacity(num_stages);
    for _ in 0..num_stages {
        let num_trees = r.read_len()?;
        let forest = (0..num_trees)
            .map(|_| parse_tree(r, num_landmarks))
            .collect::<Result<Vec<_>>>()?;
        forests.push(forest);
    }

    let anchors = read_nested(r, |r| Ok(r.read_len()? as u32))?;
    let offsets = read_nested(r, |r| {
        let dx = r.read_float()?;
        let dy = r.read_float()?;
        Ok(Point::new(dx as f64, dy as f64))
    })?;
    if anchors.len() != num_stages || offsets.len() != num_stages {
        return Err(Error::InvalidModel(format!(
            "{num_stages} stages but {} anchor sets and {} offset sets",
            anchors.len(),
            offsets.len()
        )));
    }

    let stages = forests
        .into_iter()
        .zip(anchors)
        .zip(offsets)
        .map(|((forest, anchors), offsets)| CascadeStage {
            anchors,
            offsets,
            forest,
        })
        .collect();

    ShapePredictor::new(mean_shape, stages)
}

fn parse_tree<R: Read>(r: &mut DlibReader<R>, num_landmarks: usize) -> Result<RegressionTree> {
    let num_splits = r.read_len()?;
    let mut splits = Vec::with_capacity(num_splits);
    for _ in 0..num_splits {
        let idx1 = r.read_len()? as u32;
        let idx2 = r.read_len()? as u32;
        let threshold = r.read_float()?;
        splits.push(SplitTest {
            idx1,
            idx2,
            threshold,
        });
    }

    let num_leaves = r.read_len()?;
    if num_leaves != num_splits + 1 {
        return Err(Error::InvalidModel(format!(
            "tree with {num_splits} splits declares {num_leaves} leaves"
        )));
    }
    let mut leaves = Vec::with_capacity(num_leaves * num_landmarks * 2);
    for _ in 0..num_leaves {
        leaves.extend(r.read_column(Some(num_landmarks * 2))?);
    }

    RegressionTree::new(splits, leaves, num_landmarks)
}

/// `vector<vector<T>>`: outer length, then each inner length and elements.
fn read_nested<R: Read, T>(
    r: &mut DlibReader<R>,
    mut item: impl FnMut(&mut DlibReader<R>) -> Result<T>,
) -> Result<Vec<Vec<T>>> {
    let outer = r.read_len()?;
    let mut out = Vec::with_capacity(outer);
    for _ in 0..outer {
        let inner = r.read_len()?;
        let mut v = Vec::with_capacity(inner);
        for _ in 0..inner {
            v.push(item(r)?);
        }
        out.push(v);
    }
    Ok(out)
}
