use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::config::{ExtractConfig, HeaderRule, SegmentStrategy};
use crate::core::model::{LogicalLine, Page};
use crate::text::normalize::Normalizer;
use crate::text::{has_parenthesis, is_uppercase_text};

lazy_static! {
    static ref INITIAL_IN_TEXT: Regex = Regex::new(r"\b[A-Z]\.").unwrap();
    static ref PHONE_NUMBER: Regex =
        Regex::new(r"\b(?:[Tt]elefoon|[Tt]elef|[Tt]el)\.\s*\d+\b").unwrap();
    static ref HOUSE_NUMBER: Regex =
        Regex::new(r"\d{1,3}(?:[.,]\d{1,3})?[A-Za-z]?[.,;!?\n]").unwrap();
}

/// Groups raw page text into logical register entries.
#[derive(Debug)]
pub struct Segmenter<'a> {
    config: &'a ExtractConfig,
    normalizer: Normalizer,
}

impl<'a> Segmenter<'a> {
    pub fn new(config: &'a ExtractConfig) -> Self {
        Self {
            config,
            normalizer: Normalizer::new(config.allow),
        }
    }

    /// Page-level cleanup applied before any grouping.
    pub fn prepare_page(&self, text: &str) -> String {
        let prep = self.config.page_prep;
        let mut text = Cow::Borrowed(text);
        if prep.join_hyphenated {
            text = Cow::Owned(text.replace("-\r\n", "").replace("-\n", ""));
        }
        if prep.braces_as_parentheses {
            text = Cow::Owned(text.replace('{', "(").replace('}', ")"));
        }
        let stripped = self.normalizer.strip(&text);
        if prep.strip_phone_numbers {
            strip_phone_numbers(&stripped).into_owned()
        } else {
            stripped
        }
    }

    pub fn segment(&self, pages: &[Page]) -> Vec<LogicalLine> {
        match self.config.segmentation {
            SegmentStrategy::Marker { rule } => self.by_marker(pages, rule),
            SegmentStrategy::Parenthesis => pages
                .iter()
                .flat_map(|page| self.by_parenthesis(page))
                .collect(),
            SegmentStrategy::Lines => pages.iter().flat_map(|page| self.by_line(page)).collect(),
            SegmentStrategy::HouseNumber {
                min_chars,
                max_chars,
            } => pages
                .iter()
                .flat_map(|page| self.by_house_number(page, min_chars, max_chars))
                .collect(),
        }
    }

    // The current header survives page breaks: a section often continues on
    // the next page without repeating its title.
    fn by_marker(&self, pages: &[Page], rule: HeaderRule) -> Vec<LogicalLine> {
        let mut lines = Vec::new();
        let mut header: Option<String> = None;

        for page in pages {
            let text = self.prepare_page(&page.text);
            for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                if is_header(line, rule) {
                    header = Some(line.to_string());
                    continue;
                }
                if let Some(current) = &header {
                    lines.push(LogicalLine::new(line, page.page).with_header(current.as_str()));
                }
            }
        }

        lines
    }

    fn by_parenthesis(&self, page: &Page) -> Vec<LogicalLine> {
        let text = self.prepare_page(&page.text);
        let kept = text
            .lines()
            .map(str::trim)
            .filter(|line| self.config.junk.keeps(line));

        group_by_parenthesis(kept)
            .into_iter()
            .map(|entry| LogicalLine::new(entry, page.page))
            .collect()
    }

    fn by_line(&self, page: &Page) -> Vec<LogicalLine> {
        let text = self.prepare_page(&page.text);
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| LogicalLine::new(line, page.page))
            .collect()
    }

    fn by_house_number(&self, page: &Page, min_chars: usize, max_chars: usize) -> Vec<LogicalLine> {
        let text = self.prepare_page(&page.text);
        split_after_house_numbers(&text)
            .into_iter()
            .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|segment| has_parenthesis(segment))
            .filter(|segment| {
                let len = segment.chars().count();
                len > min_chars && len < max_chars
            })
            .map(|segment| LogicalLine::new(segment, page.page))
            .collect()
    }
}

pub fn is_header(line: &str, rule: HeaderRule) -> bool {
    match rule {
        HeaderRule::AllUppercase => is_uppercase_text(line) && line.chars().count() > 3,
        HeaderRule::UppercaseEnds => {
            let compact: Vec<char> = line.chars().filter(|c| *c != ' ').collect();
            if compact.len() <= 3 || compact.iter().any(|c| c.is_ascii_digit()) {
                return false;
            }
            let head: String = compact.iter().take(4).collect();
            let tail: String = compact[compact.len() - 3..].iter().collect();
            is_uppercase_text(&head) && is_uppercase_text(&tail)
        }
    }
}

/// Joins continuation lines onto the entry opened by the last line that has
/// both a parenthesis and an initial.
pub fn group_by_parenthesis<'s>(lines: impl IntoIterator<Item = &'s str>) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current: Option<String> = None;

    for line in lines {
        let paren = has_parenthesis(line);
        let initial = has_initial(line);

        if paren && initial {
            if let Some(done) = current.take() {
                entries.push(done);
            }
            current = Some(line.to_string());
        } else if let Some(open) = current.as_mut() {
            open.push(' ');
            open.push_str(line);
        } else if paren {
            entries.push(line.to_string());
        }
    }

    if let Some(done) = current {
        entries.push(done);
    }
    entries
}

/// Splits text right after every house number, keeping the number with the
/// segment it closes.
pub fn split_after_house_numbers(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for found in HOUSE_NUMBER.find_iter(text) {
        let preceded_by_digit = text[..found.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit());
        if preceded_by_digit {
            continue;
        }
        segments.push(&text[last_end..found.end()]);
        last_end = found.end();
    }

    if last_end < text.len() {
        segments.push(&text[last_end..]);
    }
    segments
}

pub fn strip_phone_numbers(text: &str) -> Cow<'_, str> {
    PHONE_NUMBER.replace_all(text, "")
}

pub fn has_initial(text: &str) -> bool {
    INITIAL_IN_TEXT.is_match(text)
}
