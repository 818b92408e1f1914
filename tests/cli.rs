//! Exit codes and diagnostics of the command-line tools.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use image::{DynamicImage, Rgb, RgbImage};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("face-layout-cli-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("originals")).unwrap();
    dir
}

fn normalize(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("normalize-portrait").unwrap();
    cmd.env_remove("RUST_LOG")
        .current_dir(root)
        .args(["--backend", "mesh-file"])
        .arg("--originals-dir")
        .arg(root.join("originals"))
        .arg("--portraits-dir")
        .arg(root.join("portraits"))
        .arg("--layouts-dir")
        .arg(root.join("data"));
    cmd
}

fn write_photo(root: &Path, id: u32) {
    let img = RgbImage::from_fn(400, 300, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 60]));
    DynamicImage::ImageRgb8(img)
        .save(root.join(format!("originals/original-{id}.png")))
        .unwrap();
}

fn write_sidecar(root: &Path, id: u32, json: &str) {
    fs::write(
        root.join(format!("originals/original-{id}.landmarks.json")),
        json,
    )
    .unwrap();
}

fn stderr(cmd: &mut Command) -> (Option<i32>, String) {
    let out = cmd.output().unwrap();
    (
        out.status.code(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
    )
}

#[test]
fn help_runs() {
    Command::cargo_bin("normalize-portrait")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
    Command::cargo_bin("visualize-layout")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn negative_id_rejected_before_any_work() {
    let root = scratch("negative");
    write_photo(&root, 3);
    write_sidecar(&root, 3, "[[0.4, 0.4], [0.6, 0.6]]");

    let (code, err) = stderr(normalize(&root).arg("-3"));
    assert_eq!(code, Some(2));
    assert!(err.contains("not a non-negative integer"), "{err}");
    assert!(!root.join("portraits").exists());
    assert!(!root.join("data").exists());

    let (code, _) = stderr(normalize(&root).arg("3x"));
    assert_eq!(code, Some(2));

    fs::remove_dir_all(&root).ok();
}

#[test]
fn missing_photo_names_input_stage() {
    let root = scratch("missing");

    let (code, err) = stderr(normalize(&root).arg("9"));
    assert_eq!(code, Some(1));
    assert!(err.contains("input stage failed"), "{err}");
    assert!(err.contains("original-9.jpg"), "{err}");

    fs::remove_dir_all(&root).ok();
}

#[test]
fn no_face_names_detection_stage() {
    let root = scratch("noface");
    write_photo(&root, 4);
    write_sidecar(&root, 4, "[]");

    let (code, err) = stderr(normalize(&root).arg("4"));
    assert_eq!(code, Some(1));
    assert!(err.contains("detection stage failed"), "{err}");
    assert!(!root.join("portraits/portrait-4.jpg").exists());

    fs::remove_dir_all(&root).ok();
}

#[test]
fn bad_setting_names_argument_stage() {
    let root = scratch("badsetting");
    write_photo(&root, 6);
    write_sidecar(&root, 6, "[[0.4, 0.4], [0.6, 0.6]]");

    let (code, err) = stderr(normalize(&root).args(["6", "--final-size", "0"]));
    assert_eq!(code, Some(1));
    assert!(err.contains("argument stage failed"), "{err}");

    fs::remove_dir_all(&root).ok();
}

#[test]
fn normalize_then_visualize() {
    let root = scratch("ok");
    write_photo(&root, 5);
    write_sidecar(&root, 5, "[[0.4, 0.4], [0.6, 0.6], [0.5, 0.5]]");

    normalize(&root)
        .args(["5", "--final-size", "128"])
        .assert()
        .success();
    assert!(root.join("portraits/portrait-5.jpg").is_file());
    assert!(root.join("data/layout-5.json").is_file());

    Command::cargo_bin("visualize-layout")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("5")
        .arg("--layouts-dir")
        .arg(root.join("data"))
        .assert()
        .success();
    let plot = image::open(root.join("data/plot-5.png")).unwrap();
    assert_eq!((plot.width(), plot.height()), (128, 128));

    fs::remove_dir_all(&root).ok();
}

#[test]
fn oversized_layout_fails_cleanly() {
    let root = scratch("huge");
    fs::create_dir_all(root.join("data")).unwrap();
    fs::write(
        root.join("data/layout-2.json"),
        r#"{"canvasWidth": 1e12, "canvasHeight": 1e12, "num_landmarks": 1,
            "all_points": [{"id": 0, "x": 3e9, "y": 50.0}]}"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("visualize-layout").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("2")
        .arg("--layouts-dir")
        .arg(root.join("data"));
    let (code, err) = stderr(&mut cmd);
    assert_eq!(code, Some(1));
    assert!(err.contains("argument stage failed"), "{err}");
    assert!(!root.join("data/plot-2.png").exists());

    fs::remove_dir_all(&root).ok();
}
