use clap::Parser;
use image::ImageFormat;
use std::path::PathBuf;

use crate::normalize::DEFAULT_CANVAS_SIZE;
use crate::postprocess::DEFAULT_THRESHOLD;

#[derive(Parser, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    pub input_dir: PathBuf,

    #[arg(default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(short, long)]
    pub model_path: PathBuf,

    /// Probability cutoff above which a pixel is classified as oil
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD, value_parser = check_threshold)]
    pub threshold: f32,

    /// Canvas resolution, used when the model reports dynamic spatial dims
    #[arg(long, default_value_t = DEFAULT_CANVAS_SIZE)]
    pub canvas_size: u32,

    #[arg(short, long, default_value = "png", value_parser = check_format)]
    pub format: String,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }
}

fn check_threshold(s: &str) -> Result<f32, String> {
    let threshold: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=1.0).contains(&threshold) {
        return Err("threshold must be within [0, 1]".to_string());
    }
    Ok(threshold)
}

fn check_format(s: &str) -> Result<String, String> {
    let supported: Vec<_> = ImageFormat::all()
        .filter(|f| f.writing_enabled())
        .flat_map(|f| f.extensions_str())
        .map(|s| format!("`{}`", s))
        .collect();
    let supported_message = format!("Supported formats: {}", supported.join(", "));

    let format = ImageFormat::from_extension(s)
        .ok_or(format!("{} is not supported. {}", s, supported_message))?;
    if !format.writing_enabled() {
        return Err(format!("{} is not supported. {}", s, supported_message));
    }

    Ok(s.to_string())
}
