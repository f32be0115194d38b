use serde::{Deserialize, Deserializer, Serialize};

pub const SCHEMA_CONTEXT: &str = "https://schema.org";
pub const PERSON_TYPE: &str = "Person";

/// Job title written when a line carries no usable job.
pub const NO_JOB: &str = "None";

/// Document produced by the OCR track: one entry per scanned page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrDocument {
    #[serde(default, deserialize_with = "year_from_number_or_text")]
    pub year: Option<i32>,
    pub content: Vec<Page>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub text: String,
}

/// One reconstructed register entry, possibly spanning several OCR lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub text: String,
    pub source_page: u32,
    /// Section header (a job title) when the page is segmented by markers.
    pub header: Option<String>,
}

impl LogicalLine {
    pub fn new(text: impl Into<String>, source_page: u32) -> Self {
        Self {
            text: text.into(),
            source_page,
            header: None,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameCapture {
    pub name_tokens: Vec<String>,
    pub remainder_tokens: Vec<String>,
}

impl NameCapture {
    pub fn has_boundary(&self) -> bool {
        !self.name_tokens.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonRecord {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@type", default = "default_type")]
    pub kind: String,
    pub name: String,
    pub address: String,
    #[serde(rename = "jobTitle")]
    pub job_title: String,
}

fn default_context() -> String {
    SCHEMA_CONTEXT.to_string()
}

fn default_type() -> String {
    PERSON_TYPE.to_string()
}

impl PersonRecord {
    pub fn new(
        name: impl Into<String>,
        job_title: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            context: default_context(),
            kind: default_type(),
            name: name.into(),
            address: address.into(),
            job_title: job_title.into(),
        }
    }

    pub fn has_house_number(&self) -> bool {
        self.address.chars().any(|c| c.is_ascii_digit())
    }
}

/// Why a logical line produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    NoBoundary,
    ShortName,
    NoHouseNumber,
    EmptyName,
    UnusableReply,
    OutOfBounds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Records(Vec<PersonRecord>),
    Rejected(Rejection),
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ExtractStats {
    pub lines: usize,
    pub records: usize,
    pub no_boundary: usize,
    pub short_name: usize,
    pub no_house_number: usize,
    pub empty_name: usize,
    pub unusable_reply: usize,
    pub out_of_bounds: usize,
    /// Emitted records whose address carries no digit.
    pub flagged_without_number: usize,
}

impl ExtractStats {
    pub fn record_outcome(&mut self, outcome: &LineOutcome) {
        self.lines += 1;
        match outcome {
            LineOutcome::Records(records) => {
                self.records += records.len();
                self.flagged_without_number +=
                    records.iter().filter(|r| !r.has_house_number()).count();
            }
            LineOutcome::Rejected(reason) => match reason {
                Rejection::NoBoundary => self.no_boundary += 1,
                Rejection::ShortName => self.short_name += 1,
                Rejection::NoHouseNumber => self.no_house_number += 1,
                Rejection::EmptyName => self.empty_name += 1,
                Rejection::UnusableReply => self.unusable_reply += 1,
                Rejection::OutOfBounds => self.out_of_bounds += 1,
            },
        }
    }

    pub fn rejected(&self) -> usize {
        self.no_boundary
            + self.short_name
            + self.no_house_number
            + self.empty_name
            + self.unusable_reply
            + self.out_of_bounds
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRegister {
    pub page: u32,
    pub register: Vec<PersonRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Register {
    pub year: i32,
    pub register: Vec<PersonRecord>,
}

/// Result of one pipeline run, owned by the caller.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub year: i32,
    pub pages: Vec<PageRegister>,
    pub stats: ExtractStats,
}

impl Extraction {
    pub fn register(&self) -> Register {
        Register {
            year: self.year,
            register: self
                .pages
                .iter()
                .flat_map(|page| page.register.iter().cloned())
                .collect(),
        }
    }
}

// The OCR track has written the year both as a number and as a string.
fn year_from_number_or_text<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawYear {
        Number(i32),
        Text(String),
    }

    match Option::<RawYear>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawYear::Number(year)) => Ok(Some(year)),
        Some(RawYear::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid year: {text}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn person_serializes_with_linked_data_keys() {
        let person = PersonRecord::new("A. Jansen", "Boekbinder", "Hoofdstraat 12");
        let value = serde_json::to_value(&person).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "@context": "https://schema.org",
                "@type": "Person",
                "name": "A. Jansen",
                "address": "Hoofdstraat 12",
                "jobTitle": "Boekbinder"
            })
        );
    }

    #[test]
    fn reads_year_as_text_or_number() {
        let doc: OcrDocument =
            serde_json::from_str(r#"{"year": "1854", "content": []}"#).unwrap();
        assert_eq!(doc.year, Some(1854));

        let doc: OcrDocument = serde_json::from_str(r#"{"year": 1911, "content": []}"#).unwrap();
        assert_eq!(doc.year, Some(1911));

        let doc: OcrDocument = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert_eq!(doc.year, None);
    }

    #[test]
    fn stats_count_outcomes() {
        let mut stats = ExtractStats::default();
        stats.record_outcome(&LineOutcome::Records(vec![PersonRecord::new(
            "A. Jansen",
            NO_JOB,
            "Hoofdstraat",
        )]));
        stats.record_outcome(&LineOutcome::Rejected(Rejection::NoHouseNumber));

        assert_eq!(stats.lines, 2);
        assert_eq!(stats.records, 1);
        assert_eq!(stats.no_house_number, 1);
        assert_eq!(stats.flagged_without_number, 1);
        assert_eq!(stats.rejected(), 1);
    }
}
