use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::model::{PersonRecord, Register};
use crate::text::has_digit;

pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// Fuzzy matcher against a reference list of street names.
#[derive(Debug, Clone)]
pub struct StreetMatcher {
    streets: Vec<String>,
    folded: Vec<String>,
    threshold: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionReport {
    pub checked: usize,
    pub corrected: usize,
}

impl StreetMatcher {
    pub fn new(streets: Vec<String>, threshold: f64) -> Self {
        let streets: Vec<String> = streets
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let folded = streets.iter().map(|s| s.to_lowercase()).collect();
        Self {
            streets,
            folded,
            threshold,
        }
    }

    /// Reads one street per line.
    pub fn load(path: &Path, threshold: f64) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read street list {}", path.display()))?;
        let matcher = Self::new(raw.lines().map(str::to_string).collect(), threshold);
        if matcher.streets.is_empty() {
            anyhow::bail!("Street list {} is empty", path.display());
        }
        Ok(matcher)
    }

    pub fn len(&self) -> usize {
        self.streets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streets.is_empty()
    }

    /// Best scoring street (0-100) for a candidate, regardless of threshold.
    pub fn best_match(&self, candidate: &str) -> Option<(&str, f64)> {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return None;
        }
        self.folded
            .iter()
            .enumerate()
            .map(|(idx, street)| (idx, strsim::normalized_levenshtein(&candidate, street) * 100.0))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, score)| (self.streets[idx].as_str(), score))
    }

    /// Replaces the street part of an address when a known street scores
    /// above the threshold. House-number tokens are kept in place after it.
    pub fn correct_address(&self, address: &str) -> Option<String> {
        let address = address.replace("0.", "O.");
        let (numbers, street): (Vec<&str>, Vec<&str>) =
            address.split_whitespace().partition(|token| has_digit(token));
        let candidate = street.join(" ");

        let (matched, score) = self.best_match(&candidate)?;
        if score <= self.threshold {
            debug!(%candidate, best = matched, score, "street not corrected");
            return None;
        }

        let corrected = std::iter::once(matched)
            .chain(numbers)
            .collect::<Vec<_>>()
            .join(" ");
        (corrected != address).then_some(corrected)
    }

    pub fn correct_register(&self, register: &Register) -> (Register, CorrectionReport) {
        let mut report = CorrectionReport::default();
        let records = register
            .register
            .iter()
            .map(|person| {
                report.checked += 1;
                match self.correct_address(&person.address) {
                    Some(address) => {
                        report.corrected += 1;
                        PersonRecord {
                            address,
                            ..person.clone()
                        }
                    }
                    None => person.clone(),
                }
            })
            .collect();

        (
            Register {
                year: register.year,
                register: records,
            },
            report,
        )
    }
}
