use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

use super::OcrEngine;

/// Runs the `tesseract` binary and reads the text from stdout.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    lang: String,
    psm: u8,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self {
            lang: "nld".to_string(),
            psm: 4,
        }
    }
}

impl TesseractEngine {
    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }

    pub fn args(&self, image_path: &Path) -> Vec<String> {
        vec![
            image_path.display().to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.lang.clone(),
            "--psm".to_string(),
            self.psm.to_string(),
        ]
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image_path: &Path) -> Result<String> {
        let output = Command::new("tesseract")
            .args(self.args(image_path))
            .output()
            .with_context(|| "failed to invoke tesseract; is it installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract failed on {}: {stderr}", image_path.display());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
