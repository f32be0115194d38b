use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::model::{Extraction, Register};
use crate::export::Exporter;

pub const REGISTER_FILE: &str = "register.json";

#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
    per_page: bool,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            per_page: false,
        }
    }

    /// Also write `pages/page_NNN.json` with `{page, register}` per page.
    pub fn with_per_page(mut self, per_page: bool) -> Self {
        self.per_page = per_page;
        self
    }
}

impl Exporter for JsonExporter {
    fn export(&self, extraction: &Extraction) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        write_register(&extraction.register(), &self.out_dir.join(REGISTER_FILE))?;

        if self.per_page {
            let pages_dir = self.out_dir.join("pages");
            fs::create_dir_all(&pages_dir)?;
            for page in &extraction.pages {
                let path = pages_dir.join(format!("page_{:03}.json", page.page));
                let data = serde_json::to_string_pretty(page)?;
                fs::write(&path, data)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
        }
        Ok(())
    }
}

pub fn read_register(path: &Path) -> Result<Register> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read register {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not a register", path.display()))
}

pub fn write_register(register: &Register, path: &Path) -> Result<()> {
    let data = serde_json::to_string_pretty(register)?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
