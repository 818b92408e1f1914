//! Portrait normalization: photograph + landmarks in, square single-channel
//! portrait + layout out.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, GrayImage};
use log::{debug, info};

use crate::config::NormalizeConfig;
use crate::crop::{square_crop, CoordinateMap, CropPlan};
use crate::detector::LandmarkDetector;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::storage::{PhotoId, StorageConfig};
use crate::types::Point;

#[derive(Debug, Clone)]
pub struct Portrait {
    pub image: GrayImage,
    pub layout: Layout,
    pub plan: CropPlan,
    pub map: CoordinateMap,
}

/// Where a normalization run wrote its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub portrait: PathBuf,
    pub layout: PathBuf,
}

pub fn open_image(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(Error::InputMissing {
            path: path.to_path_buf(),
        });
    }
    image::open(path).map_err(|source| Error::UnreadableImage {
        path: path.to_path_buf(),
        source,
    })
}

/// Crop, resize and re-map for landmarks given as fractions of the image
/// size.
pub fn normalize_image(
    image: &DynamicImage,
    normalized: &[Point],
    config: &NormalizeConfig,
) -> Result<Portrait> {
    let (width, height) = image.dimensions();
    let pixels: Vec<Point> = normalized
        .iter()
        .map(|p| Point::new(p.x * width as f64, p.y * height as f64))
        .collect();

    let plan = square_crop(&pixels, width, height, config.target_face_scale)?;
    let crop = plan.crop;
    debug!(
        "crop ({}, {})-({}, {}) from {}x{}",
        crop.x1, crop.y1, crop.x2, crop.y2, width, height
    );
    let map = CoordinateMap::for_crop(&crop, config.final_size)?;

    let image = image
        .crop_imm(crop.x1, crop.y1, crop.size(), crop.size())
        .resize_exact(
            config.final_size,
            config.final_size,
            config.resize_filter.filter_type(),
        )
        .to_luma8();

    let side = config.final_size as f64;
    let layout = Layout::remapped(side, side, &pixels, &map);

    Ok(Portrait {
        image,
        layout,
        plan,
        map,
    })
}

/// Open `path`, run `detector` on it and normalize the result.
pub fn normalize_photo(
    path: &Path,
    detector: &mut dyn LandmarkDetector,
    config: &NormalizeConfig,
) -> Result<Portrait> {
    let image = open_image(path)?;
    debug!(
        "running {} detector on {} ({}x{})",
        detector.name(),
        path.display(),
        image.width(),
        image.height()
    );
    let landmarks = detector
        .detect(&image.to_rgb8())?
        .ok_or_else(|| Error::NoFace {
            path: path.to_path_buf(),
        })?;
    debug!("{} landmarks detected", landmarks.len());
    normalize_image(&image, &landmarks, config)
}

pub fn write_portrait_jpeg(image: &GrayImage, path: &Path, quality: u8) -> Result<()> {
    create_parent(path)?;
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(image)
        .map_err(|source| Error::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|e| Error::io(path, e))
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => fs::create_dir_all(dir).map_err(|e| Error::io(dir, e)),
        None => Ok(()),
    }
}

/// Full run for one photograph id: locate the photograph, normalize it and
/// write the portrait and then the layout. A failure while writing the
/// layout leaves the portrait on disk.
pub fn run(
    id: PhotoId,
    storage: &StorageConfig,
    detector: &mut dyn LandmarkDetector,
    config: &NormalizeConfig,
) -> Result<(Portrait, Outputs)> {
    config.validate()?;
    let source = storage.photo_path(id)?;
    let portrait = normalize_photo(&source, detector, config)?;

    let outputs = Outputs {
        portrait: storage.portrait_path(id),
        layout: storage.layout_path(id),
    };
    write_portrait_jpeg(&portrait.image, &outputs.portrait, config.jpeg_quality)?;
    info!("wrote portrait {}", outputs.portrait.display());
    portrait.layout.write(&outputs.layout)?;
    info!(
        "wrote layout {} ({} landmarks)",
        outputs.layout.display(),
        portrait.layout.num_landmarks
    );
    Ok((portrait, outputs))
}
