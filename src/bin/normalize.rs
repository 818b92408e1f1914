//! Crop a photograph to a normalized square portrait and write its landmark
//! layout.
//!
//! Usage:
//!   normalize-portrait 42                          # originals/original-42.jpg
//!   normalize-portrait 42 --backend mesh-file      # use exported mesh landmarks
//!   normalize-portrait 42 --json                   # also print the layout

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use face_layout::{detector, logging, normalize, AppConfig, Backend, PhotoId, ResizeFilter};
use log::error;

#[derive(Parser, Debug)]
#[command(name = "normalize-portrait")]
#[command(author, version, about = "Crop a photograph to a normalized portrait and landmark layout", long_about = None)]
struct Args {
    /// Numeric photograph identifier
    #[arg(allow_hyphen_values = true)]
    id: PhotoId,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding original-<id>.jpg
    #[arg(long)]
    originals_dir: Option<PathBuf>,

    /// Directory for portrait-<id>.jpg
    #[arg(long)]
    portraits_dir: Option<PathBuf>,

    /// Directory for layout-<id>.json
    #[arg(long)]
    layouts_dir: Option<PathBuf>,

    /// Fraction of the crop the face's larger dimension should fill
    #[arg(long)]
    target_face_scale: Option<f64>,

    /// Side length of the output portrait
    #[arg(long)]
    final_size: Option<u32>,

    /// Resize filter (nearest, triangle, catmull-rom, gaussian, lanczos3)
    #[arg(long)]
    resize_filter: Option<ResizeFilter>,

    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Landmark source (shape-predictor, mesh-file)
    #[arg(long)]
    backend: Option<Backend>,

    /// Face detector model path
    #[arg(long)]
    face_model: Option<PathBuf>,

    /// Landmark model path (.dat, .dat.bz2 or converted .bin)
    #[arg(long)]
    landmark_model: Option<PathBuf>,

    /// Minimum face size for detection
    #[arg(long)]
    min_face_size: Option<u32>,

    /// Print the layout JSON to stdout
    #[arg(long)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        let storage = &mut config.storage;
        if let Some(dir) = &self.originals_dir {
            storage.originals_dir = dir.clone();
        }
        if let Some(dir) = &self.portraits_dir {
            storage.portraits_dir = dir.clone();
        }
        if let Some(dir) = &self.layouts_dir {
            storage.layouts_dir = dir.clone();
        }

        let normalize = &mut config.normalize;
        if let Some(scale) = self.target_face_scale {
            normalize.target_face_scale = scale;
        }
        if let Some(size) = self.final_size {
            normalize.final_size = size;
        }
        if let Some(filter) = self.resize_filter {
            normalize.resize_filter = filter;
        }
        if let Some(quality) = self.jpeg_quality {
            normalize.jpeg_quality = quality;
        }

        let detector = &mut config.detector;
        if let Some(backend) = self.backend {
            detector.backend = backend;
        }
        if let Some(path) = &self.face_model {
            detector.face_model = path.clone();
        }
        if let Some(path) = &self.landmark_model {
            detector.landmark_model = path.clone();
        }
        if let Some(size) = self.min_face_size {
            detector.min_face_size = size;
        }
    }
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(e) = run(&args) {
        error!("{} stage failed: {}", e.stage(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> face_layout::Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    let mut detector = detector::from_config(&config.detector, &config.storage, args.id)?;
    let (portrait, outputs) =
        normalize::run(args.id, &config.storage, detector.as_mut(), &config.normalize)?;

    if args.json {
        let json = serde_json::to_string_pretty(&portrait.layout).map_err(|source| {
            face_layout::Error::Json {
                path: outputs.layout.clone(),
                source,
            }
        })?;
        println!("{json}");
    } else {
        let crop = portrait.plan.crop;
        println!("Portrait: {}", outputs.portrait.display());
        println!("Layout:   {}", outputs.layout.display());
        println!(
            "Crop:     ({}, {})-({}, {}), {} landmarks",
            crop.x1, crop.y1, crop.x2, crop.y2, portrait.layout.num_landmarks
        );
    }
    Ok(())
}
