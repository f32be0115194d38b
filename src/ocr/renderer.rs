use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::Rasterizer;

pub const DEFAULT_DPI: u32 = 200;

/// Renders single PDF pages to PNG with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    out_dir: PathBuf,
    dpi: u32,
}

impl PageRenderer {
    pub fn new(out_dir: PathBuf, dpi: u32) -> Self {
        Self { out_dir, dpi }
    }

    pub fn image_path(&self, page_number: u32) -> PathBuf {
        self.out_dir.join(format!("page_{page_number:03}.png"))
    }
}

impl Rasterizer for PageRenderer {
    fn render_page(&self, pdf_path: &Path, page_number: u32) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;

        let image_path = self.image_path(page_number);
        // -singlefile writes `<prefix>.png` without a page suffix
        let prefix = image_path.with_extension("");

        let status = Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(pdf_path)
            .arg(&prefix)
            .status()
            .with_context(|| "failed to invoke pdftoppm; is poppler-utils installed?")?;

        if !status.success() {
            anyhow::bail!("pdftoppm failed on page {page_number} with status: {status}");
        }

        if !image_path.exists() {
            anyhow::bail!(
                "expected rendered image not found: {}",
                image_path.display()
            );
        }

        Ok(image_path)
    }
}
