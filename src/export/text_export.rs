use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{Extraction, PersonRecord};
use crate::export::Exporter;

pub const REGISTER_TEXT_FILE: &str = "register.txt";

/// Human-readable register: one `name | jobTitle | address` row per person,
/// grouped under page headings.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn format_record(record: &PersonRecord) -> String {
        format!(
            "{} | {} | {}",
            record.name, record.job_title, record.address
        )
    }

    pub fn render(extraction: &Extraction) -> String {
        let mut text = format!("=== Register {} ===\n\n", extraction.year);
        for page in &extraction.pages {
            if page.register.is_empty() {
                continue;
            }
            text.push_str(&format!("=== Page {} ===\n", page.page));
            for record in &page.register {
                text.push_str(&Self::format_record(record));
                text.push('\n');
            }
            text.push('\n');
        }
        text
    }
}

impl Exporter for TextExporter {
    fn export(&self, extraction: &Extraction) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        fs::write(
            self.out_dir.join(REGISTER_TEXT_FILE),
            Self::render(extraction),
        )?;
        Ok(())
    }
}
