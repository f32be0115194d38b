pub mod cleaner;
pub mod pdf_reader;
pub mod renderer;
pub mod tesseract;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::model::{OcrDocument, Page};

pub trait Rasterizer {
    /// Renders one 1-based page and returns the image path.
    fn render_page(&self, pdf_path: &Path, page_number: u32) -> Result<PathBuf>;
}

pub trait ImageCleaner {
    fn clean(&self, image_path: &Path) -> Result<PathBuf>;
}

pub trait OcrEngine {
    fn recognize(&self, image_path: &Path) -> Result<String>;
}

/// Scans a PDF page by page into an [`OcrDocument`].
pub struct OcrRunner<'a> {
    rasterizer: &'a dyn Rasterizer,
    cleaner: Option<&'a dyn ImageCleaner>,
    engine: &'a dyn OcrEngine,
}

impl<'a> OcrRunner<'a> {
    pub fn new(rasterizer: &'a dyn Rasterizer, engine: &'a dyn OcrEngine) -> Self {
        Self {
            rasterizer,
            cleaner: None,
            engine,
        }
    }

    pub fn with_cleaner(mut self, cleaner: &'a dyn ImageCleaner) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    pub fn run(&self, pdf_path: &Path, page_count: usize, year: Option<i32>) -> Result<OcrDocument> {
        let mut content = Vec::with_capacity(page_count);
        for page in 1..=page_count as u32 {
            content.push(self.scan_page(pdf_path, page)?);
        }
        info!(pages = content.len(), pdf = %pdf_path.display(), "OCR finished");
        Ok(OcrDocument { year, content })
    }

    fn scan_page(&self, pdf_path: &Path, page: u32) -> Result<Page> {
        let rendered = self.rasterizer.render_page(pdf_path, page)?;
        let image = match self.cleaner {
            Some(cleaner) => cleaner.clean(&rendered)?,
            None => rendered,
        };
        let text = self
            .engine
            .recognize(&image)
            .with_context(|| format!("OCR failed on page {page}"))?;
        Ok(Page { page, text })
    }
}

pub fn write_document(document: &OcrDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(document)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
