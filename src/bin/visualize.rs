//! Plot a landmark layout with its facial-feature contours.
//!
//! Usage:
//!   visualize-layout 42                       # data/plot-42.png
//!   visualize-layout 42 --overlay --scale 0.5 # over the portrait, half size
//!   visualize-layout 42 --font DejaVuSans.ttf # with text labels

use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use face_layout::{
    logging, normalize::open_image, plot::Plot, render, AppConfig, Error, Layout, PhotoId, Scheme,
};
use log::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "visualize-layout")]
#[command(author, version, about = "Plot a facial landmark layout", long_about = None)]
struct Args {
    /// Numeric photograph identifier
    #[arg(allow_hyphen_values = true)]
    id: PhotoId,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding layout-<id>.json
    #[arg(long)]
    layouts_dir: Option<PathBuf>,

    /// Directory holding portrait-<id>.jpg (for --overlay)
    #[arg(long)]
    portraits_dir: Option<PathBuf>,

    /// Landmark scheme (mesh478, ibug68); detected from the point count by default
    #[arg(long)]
    scheme: Option<Scheme>,

    /// Output file (default: plot-<id>.png beside the layout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Draw over the portrait instead of a blank canvas
    #[arg(long)]
    overlay: bool,

    /// TrueType font for text labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Output pixels per layout unit
    #[arg(long)]
    scale: Option<f64>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
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
    if let Some(dir) = &args.layouts_dir {
        config.storage.layouts_dir = dir.clone();
    }
    if let Some(dir) = &args.portraits_dir {
        config.storage.portraits_dir = dir.clone();
    }
    if let Some(scale) = args.scale {
        config.plot.scale = scale;
    }
    config.plot.validate()?;

    let layout = Layout::read(config.storage.layout_path(args.id))?;
    let scheme = args.scheme.or_else(|| Scheme::detect(layout.num_landmarks));
    let contours = match scheme {
        Some(scheme) => {
            info!("using {scheme} contours");
            scheme.contours()
        }
        None => {
            warn!(
                "no contour table for {} landmarks; drawing markers only",
                layout.num_landmarks
            );
            &[]
        }
    };
    let plot = Plot::build(&layout, contours);

    let background = if args.overlay {
        Some(open_image(&config.storage.portrait_path(args.id))?)
    } else {
        None
    };
    let font = args.font.as_ref().map(render::load_font).transpose()?;
    let image = render::render(&plot, &config.plot, background.as_ref(), font.as_ref())?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.storage.plot_path(args.id));
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    image.save(&output).map_err(|source| Error::Encode {
        path: output.clone(),
        source,
    })?;

    println!(
        "Facial geometry: layout-{}.json (canvas {:.0}x{:.0}, {} points)",
        args.id, layout.canvas_width, layout.canvas_height, layout.num_landmarks
    );
    print!("{}", render::legend(&plot));
    if plot.skipped > 0 {
        println!("Skipped {} out-of-range contour indices", plot.skipped);
    }
    println!("Plot: {}", output.display());
    Ok(())
}
