//! Inspect a dlib shape predictor and optionally convert it to the compact
//! bincode format `ShapePredictor::load` reads.
//!
//! Usage:
//!   convert-model shape_predictor_68_face_landmarks.dat.bz2
//!   convert-model shape_predictor_68_face_landmarks.dat.bz2 -o sp68.bin

use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgAction, Parser};
use face_layout::{logging, Scheme, ShapePredictor};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(name = "convert-model")]
#[command(author, version, about = "Inspect and convert shape predictor models", long_about = None)]
struct Args {
    /// Model file (.dat, .dat.bz2 or .bin)
    model: PathBuf,

    /// Write the model in bincode format
    #[arg(short, long)]
    output: Option<PathBuf>,

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
    let start = Instant::now();
    let model = ShapePredictor::open(&args.model)?;
    info!("loaded {} in {:.2?}", args.model.display(), start.elapsed());

    println!("Model:     {}", args.model.display());
    println!("Landmarks: {}", model.num_landmarks());
    println!("Stages:    {}", model.num_cascade_stages());
    println!("Trees:     {}", model.num_trees());
    match Scheme::detect(model.num_landmarks()) {
        Some(scheme) => println!("Scheme:    {scheme}"),
        None => println!("Scheme:    none (markers only when plotted)"),
    }

    if let Some(output) = &args.output {
        model.save(output)?;
        println!("Wrote:     {}", output.display());
    }
    Ok(())
}
