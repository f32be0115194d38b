use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Scanned address book in PDF form. Only the page count is read here; pages
/// are rasterized separately.
#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("PDF not found: {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> Result<usize> {
        let output = Command::new("pdfinfo")
            .arg(&self.path)
            .output()
            .with_context(|| format!("failed to invoke pdfinfo on {}", self.path.display()))?;

        if !output.status.success() {
            anyhow::bail!("pdfinfo failed with status: {}", output.status);
        }

        parse_page_count(&String::from_utf8_lossy(&output.stdout))
            .with_context(|| format!("unreadable pdfinfo output for {}", self.path.display()))
    }
}

pub fn parse_page_count(pdfinfo: &str) -> Result<usize> {
    let line = pdfinfo
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .context("no 'Pages:' line")?;
    line.trim()
        .parse()
        .with_context(|| format!("bad page count: {}", line.trim()))
}
