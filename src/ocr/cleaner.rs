use anyhow::{Context, Result};
use image::{imageops, GrayImage, ImageReader};
use std::fs;
use std::path::{Path, PathBuf};

use super::ImageCleaner;

/// Grayscale, binarize and optionally crop page scans before OCR.
#[derive(Debug, Clone)]
pub struct ThresholdCleaner {
    out_dir: PathBuf,
    /// Pixels brighter than this become `max_value`, the rest black.
    pub threshold: u8,
    pub max_value: u8,
    /// Fraction cut from every edge, in `[0, 0.5)`.
    pub crop_fraction: f32,
}

impl ThresholdCleaner {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            threshold: 160,
            max_value: 230,
            crop_fraction: 0.0,
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_crop(mut self, crop_fraction: f32) -> Self {
        self.crop_fraction = crop_fraction.clamp(0.0, 0.49);
        self
    }

    pub fn binarize(&self, gray: &mut GrayImage) {
        for pixel in gray.pixels_mut() {
            pixel.0[0] = if pixel.0[0] > self.threshold {
                self.max_value
            } else {
                0
            };
        }
    }

    pub fn crop(&self, gray: &GrayImage) -> GrayImage {
        if self.crop_fraction <= 0.0 {
            return gray.clone();
        }
        let (width, height) = gray.dimensions();
        let left = (width as f32 * self.crop_fraction) as u32;
        let top = (height as f32 * self.crop_fraction) as u32;
        imageops::crop_imm(gray, left, top, width - 2 * left, height - 2 * top).to_image()
    }
}

impl ImageCleaner for ThresholdCleaner {
    fn clean(&self, image_path: &Path) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;

        let mut gray = ImageReader::open(image_path)
            .with_context(|| format!("failed to open {}", image_path.display()))?
            .decode()
            .with_context(|| format!("failed to decode {}", image_path.display()))?
            .to_luma8();
        self.binarize(&mut gray);
        let cleaned = self.crop(&gray);

        let file_name = image_path
            .file_name()
            .with_context(|| format!("no file name in {}", image_path.display()))?
            .to_string_lossy();
        let out_path = self.out_dir.join(format!("improved_{file_name}"));
        cleaned
            .save(&out_path)
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        Ok(out_path)
    }
}
