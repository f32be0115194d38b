use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const BASE_PREPOSITIONS: &[&str] = &["van", "de", "der", "den", "ter", "ten", "vander"];
pub const ABBREVIATED_PREPOSITIONS: &[&str] = &["v.", "v", "d.", "d"];

/// Characters kept by the normalizer beyond letters, digits, whitespace,
/// comma, period and apostrophe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AllowList {
    pub hyphen: bool,
    pub parentheses: bool,
    pub fold_diacritics: bool,
}

impl Default for AllowList {
    fn default() -> Self {
        Self {
            hyphen: false,
            parentheses: false,
            fold_diacritics: true,
        }
    }
}

impl AllowList {
    pub fn permits(&self, c: char) -> bool {
        c.is_ascii_alphanumeric()
            || c.is_whitespace()
            || matches!(c, ',' | '.' | '\'')
            || (self.hyphen && c == '-')
            || (self.parentheses && matches!(c, '(' | ')'))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeaderRule {
    /// Whole line uppercase and longer than three characters.
    AllUppercase,
    /// First four and last three characters uppercase, no digits.
    UppercaseEnds,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentStrategy {
    Marker { rule: HeaderRule },
    Parenthesis,
    Lines,
    HouseNumber { min_chars: usize, max_chars: usize },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PagePrep {
    pub join_hyphenated: bool,
    pub braces_as_parentheses: bool,
    pub strip_phone_numbers: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct JunkFilter {
    pub min_letters: usize,
}

impl JunkFilter {
    /// Keeps lines that could hold an entry: a parenthesis or a digit, and
    /// enough letters to carry a name.
    pub fn keeps(&self, line: &str) -> bool {
        let letters = line.chars().filter(|c| c.is_alphabetic()).count();
        let bearing = line.contains(['(', ')']) || line.chars().any(|c| c.is_ascii_digit());
        bearing && letters >= self.min_letters
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JobShape {
    /// A job needs strictly more characters than this.
    pub min_chars: usize,
    /// A job needs strictly fewer words than this.
    pub max_words: usize,
}

impl Default for JobShape {
    fn default() -> Self {
        Self {
            min_chars: 3,
            max_words: 4,
        }
    }
}

impl JobShape {
    pub fn accepts(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        candidate.chars().count() > self.min_chars
            && candidate.split_whitespace().count() < self.max_words
            && !candidate.chars().any(|c| c.is_ascii_digit())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Y1854,
    Y1865,
    Y1880,
    Y1911,
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = match self {
            Era::Y1854 => 1854,
            Era::Y1865 => 1865,
            Era::Y1880 => 1880,
            Era::Y1911 => 1911,
        };
        write!(f, "{year}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractConfig {
    pub allow: AllowList,
    pub page_prep: PagePrep,
    pub segmentation: SegmentStrategy,
    pub junk: JunkFilter,
    pub initial_pattern: String,
    /// Only the first N tokens are scanned for initials when set.
    pub initial_scan_window: Option<usize>,
    pub paren_initials_fallback: bool,
    pub prepositions: Vec<String>,
    pub reclaim_prepositions: bool,
    pub job: JobShape,
    pub min_address_letters: usize,
    pub min_fragment_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            allow: AllowList::default(),
            page_prep: PagePrep::default(),
            segmentation: SegmentStrategy::Lines,
            junk: JunkFilter::default(),
            initial_pattern: r"^[A-Z][.,]$".to_string(),
            initial_scan_window: None,
            paren_initials_fallback: true,
            prepositions: all_prepositions(),
            reclaim_prepositions: true,
            job: JobShape::default(),
            min_address_letters: 5,
            min_fragment_chars: 5,
        }
    }
}

impl ExtractConfig {
    pub fn for_era(era: Era) -> Self {
        match era {
            Era::Y1854 => Self {
                segmentation: SegmentStrategy::Marker {
                    rule: HeaderRule::AllUppercase,
                },
                initial_pattern: r"^[A-Za-z][.,]$".to_string(),
                prepositions: base_prepositions(),
                paren_initials_fallback: false,
                ..Self::default()
            },
            Era::Y1865 => Self {
                segmentation: SegmentStrategy::Marker {
                    rule: HeaderRule::UppercaseEnds,
                },
                prepositions: base_prepositions(),
                reclaim_prepositions: false,
                paren_initials_fallback: false,
                ..Self::default()
            },
            Era::Y1880 => Self {
                segmentation: SegmentStrategy::Lines,
                initial_scan_window: Some(4),
                ..Self::default()
            },
            Era::Y1911 => Self {
                allow: AllowList {
                    hyphen: true,
                    parentheses: true,
                    fold_diacritics: true,
                },
                page_prep: PagePrep {
                    join_hyphenated: true,
                    braces_as_parentheses: true,
                    strip_phone_numbers: true,
                },
                segmentation: SegmentStrategy::Parenthesis,
                junk: JunkFilter { min_letters: 4 },
                ..Self::default()
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Regex::new(&self.initial_pattern)
            .with_context(|| format!("invalid initial pattern: {}", self.initial_pattern))?;
        if self.job.max_words == 0 {
            anyhow::bail!("job.max_words must be > 0");
        }
        if self.initial_scan_window == Some(0) {
            anyhow::bail!("initial_scan_window must be > 0 when set");
        }
        if let SegmentStrategy::HouseNumber {
            min_chars,
            max_chars,
        } = self.segmentation
        {
            if min_chars >= max_chars {
                anyhow::bail!("house number segment bounds are empty: {min_chars}..{max_chars}");
            }
        }
        Ok(())
    }
}

fn base_prepositions() -> Vec<String> {
    BASE_PREPOSITIONS.iter().map(|p| p.to_string()).collect()
}

fn all_prepositions() -> Vec<String> {
    BASE_PREPOSITIONS
        .iter()
        .chain(ABBREVIATED_PREPOSITIONS)
        .map(|p| p.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_presets_validate() {
        for era in [Era::Y1854, Era::Y1865, Era::Y1880, Era::Y1911] {
            ExtractConfig::for_era(era).validate().unwrap();
        }
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ExtractConfig = serde_json::from_str(
            r#"{"segmentation": {"kind": "marker", "rule": "uppercase_ends"}, "job": {"max_words": 3}}"#,
        )
        .unwrap();
        assert_eq!(
            config.segmentation,
            SegmentStrategy::Marker {
                rule: HeaderRule::UppercaseEnds
            }
        );
        assert_eq!(config.job.max_words, 3);
        assert_eq!(config.job.min_chars, 3);
        assert_eq!(config.initial_pattern, r"^[A-Z][.,]$");
    }

    #[test]
    fn rejects_bad_initial_pattern() {
        let config = ExtractConfig {
            initial_pattern: "([A-Z]".to_string(),
            ..ExtractConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn junk_filter_needs_parenthesis_or_digit() {
        let junk = JunkFilter { min_letters: 4 };
        assert!(junk.keeps("Jansen (A.) bakker"));
        assert!(junk.keeps("Hoofdstraat 12"));
        assert!(!junk.keeps("ADRESBOEK VAN GRONINGEN"));
        assert!(!junk.keeps("(1)"));
    }

    #[test]
    fn job_shape_limits() {
        let shape = JobShape::default();
        assert!(shape.accepts("boekbinder"));
        assert!(!shape.accepts("wed"));
        assert!(!shape.accepts("hoek van de markt"));
        assert!(!shape.accepts("Kerkstraat 3"));
    }

    #[test]
    fn presets_differ_where_editions_differ() {
        let old = ExtractConfig::for_era(Era::Y1854);
        assert_eq!(old.prepositions.len(), BASE_PREPOSITIONS.len());
        assert!(!old.allow.parentheses);

        let new = ExtractConfig::for_era(Era::Y1911);
        assert!(new.allow.parentheses && new.allow.hyphen);
        assert_eq!(new.segmentation, SegmentStrategy::Parenthesis);
        assert_eq!(Era::Y1911.to_string(), "1911");
    }
}
