pub mod core;
pub mod correct;
pub mod export;
pub mod extract;
pub mod llm;
pub mod ocr;
pub mod pipeline;
pub mod text;

pub use core::config::{Era, ExtractConfig};
pub use core::model::{Extraction, OcrDocument, PersonRecord, Register};
