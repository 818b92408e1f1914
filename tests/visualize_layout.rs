//! Layout files through the plot and raster renderer.

use std::fs;

use face_layout::{plot::Plot, render, Layout, PlotStyle, Point, Scheme};

fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("face-layout-vis-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// 68 points on a rough oval, enough to exercise every iBUG contour.
fn ibug_layout() -> Layout {
    let points: Vec<Point> = (0..68)
        .map(|i| {
            let t = i as f64 / 68.0 * std::f64::consts::TAU;
            Point::new(200.0 + 120.0 * t.cos(), 220.0 + 150.0 * t.sin())
        })
        .collect();
    Layout::from_points(400.0, 440.0, &points)
}

#[test]
fn layout_file_round_trips_exactly() {
    let dir = scratch_dir("roundtrip");
    let path = dir.join("layout-1.json");
    let layout = Layout::from_points(
        1024.0,
        1024.0,
        &[Point::new(0.1 + 0.2, 1.0 / 3.0), Point::new(-2.5e-7, 1023.999999999)],
    );

    layout.write(&path).unwrap();
    assert_eq!(Layout::read(&path).unwrap(), layout);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn ibug_layout_renders_every_contour() {
    let layout = ibug_layout();
    let scheme = Scheme::detect(layout.num_landmarks).unwrap();
    assert_eq!(scheme, Scheme::Ibug68);

    let plot = Plot::build(&layout, scheme.contours());
    assert_eq!(plot.markers.len(), 68);
    assert_eq!(plot.polylines.len(), scheme.contours().len());
    assert_eq!(plot.skipped, 0);
    // eyes and mouth by centroid, nose tip and chin by landmark
    assert_eq!(plot.labels.len(), 5);
    assert!(plot.labels.iter().any(|l| l.text == "chin" && l.at == layout.point(8).unwrap()));

    let dir = scratch_dir("png");
    let path = dir.join("plot-1.png");
    let image = render::render(&plot, &PlotStyle::default(), None, None).unwrap();
    image.save(&path).unwrap();
    let reread = image::open(&path).unwrap();
    assert_eq!((reread.width(), reread.height()), (400, 440));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn mesh_table_on_short_layout_skips_without_failing() {
    let layout = ibug_layout();
    let plot = Plot::build(&layout, Scheme::Mesh478.contours());

    assert!(plot.skipped > 0);
    assert_eq!(plot.markers.len(), 68);
    let image = render::render(&plot, &PlotStyle::default(), None, None).unwrap();
    assert_eq!(image.dimensions(), (400, 440));
}
