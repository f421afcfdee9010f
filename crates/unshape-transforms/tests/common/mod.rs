//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;

use image::{GrayImage, Luma};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use unshape_history::Sample;

pub const KEYS: [&str; 2] = ["image", "label"];

/// Routes `tracing` output to the test harness; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write_png(path: &Path, width: u32, height: u32, f: impl Fn(u32, u32) -> u8) {
    GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)]))
        .save(path)
        .expect("write test image");
}

/// Writes an image and a label to a temp dir and returns a sample pointing at them.
///
/// The directory is removed when the returned `TempDir` drops.
pub fn image_label_sample() -> (TempDir, Sample) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let image = dir.path().join("image.png");
    let label = dir.path().join("label.png");

    write_png(&image, 11, 10, |x, y| ((x * 17 + y * 5) % 256) as u8);
    write_png(&label, 11, 10, |x, y| if x > 4 && y > 3 { 255 } else { 0 });

    let sample = Sample::new()
        .with("image", image.to_string_lossy().into_owned())
        .with("label", label.to_string_lossy().into_owned());
    (dir, sample)
}
