use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use image::ImageFormat;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use spillguard_rs::{Config, Detector, RasterImage};

fn main() -> Result<()> {
    let config = Config::new();

    ensure!(config.model_path.exists(), "Model path does not exist");
    ensure!(config.input_dir.exists(), "Input directory does not exist");

    let detector = Detector::with_onnx_model(&config)?;

    let image_paths = WalkDir::new(&config.input_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| ImageFormat::from_path(e.path()).is_ok())
        .map(|e| e.into_path())
        .collect::<Vec<_>>();

    let progress_bar = ProgressBar::new(image_paths.len() as u64);
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec} {eta})",
        )?
        .progress_chars("#>-"),
    );

    image_paths
        .par_iter()
        .progress_with(progress_bar.clone())
        .try_for_each(|path| -> Result<()> {
            let image = image::open(path)
                .with_context(|| format!("Failed to open image: {}", path.display()))?;
            let raster = RasterImage::from_dynamic(&image)?;
            let detection = detector.detect(&raster)?;

            let output_path = construct_output_path(path, &config)?;
            detection
                .overlay
                .save(&output_path)
                .with_context(|| format!("Failed to save overlay: {}", output_path.display()))?;

            let report_path = output_path.with_extension("json");
            let report = serde_json::to_string_pretty(&detection.report())?;
            fs::write(&report_path, report)
                .with_context(|| format!("Failed to write report: {}", report_path.display()))
        })?;

    progress_bar.finish();

    Ok(())
}

fn relocate<P: AsRef<Path>>(path: P, prefix: P, new_prefix: P) -> PathBuf {
    new_prefix
        .as_ref()
        .join(path.as_ref().strip_prefix(prefix).unwrap())
        .to_path_buf()
}

fn construct_output_path(path: &Path, config: &Config) -> Result<PathBuf> {
    let output_path = relocate(path, config.input_dir.as_path(), config.output_dir.as_path());

    fs::create_dir_all(output_path.parent().unwrap())?;
    Ok(output_path.with_extension(&config.format))
}
