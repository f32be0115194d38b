use tracing::debug;

use crate::core::config::{ExtractConfig, JobShape};
use crate::core::model::{NameCapture, PersonRecord, Rejection, NO_JOB};
use crate::text::{has_digit, letter_count};

/// Builds a record from a located name and the rest of the line, repairing
/// the usual OCR misplacements between job and address on the way.
#[derive(Debug, Clone)]
pub struct Assembler {
    job: JobShape,
    min_address_letters: usize,
    min_fragment_chars: usize,
}

/// Intermediate job/address split before the corrections run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub job: Option<String>,
    pub fragments: Vec<String>,
}

impl Assembler {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            job: config.job,
            min_address_letters: config.min_address_letters,
            min_fragment_chars: config.min_fragment_chars,
        }
    }

    pub fn assemble(
        &self,
        capture: &NameCapture,
        name: String,
        header: Option<&str>,
    ) -> Result<PersonRecord, Rejection> {
        if !capture.has_boundary() {
            return Err(Rejection::NoBoundary);
        }
        if capture.name_tokens.len() < 2 {
            return Err(Rejection::ShortName);
        }
        if !capture.remainder_tokens.iter().any(|t| has_digit(t)) {
            return Err(Rejection::NoHouseNumber);
        }
        if name.trim().is_empty() {
            return Err(Rejection::EmptyName);
        }

        let (job, fragments) = self.split_fields(&capture.remainder_tokens, header);
        let mut draft = Draft {
            name,
            job,
            fragments,
        };
        draft.fold_name_continuation();
        draft.promote_job_to_address();
        draft.keep_numbered_fragments(self.min_fragment_chars);
        draft.swap_misplaced_address(self.min_address_letters);

        let record = draft.finish();
        if !record.has_house_number() {
            debug!(name = %record.name, address = %record.address, "record without house number");
        }
        Ok(record)
    }

    /// Under a section header the header is the job and everything after the
    /// name is address. Otherwise the first comma field is the job; a line
    /// without commas gets a job only from its leading lowercase words.
    pub fn split_fields(
        &self,
        remainder: &[String],
        header: Option<&str>,
    ) -> (Option<String>, Vec<String>) {
        let rest = remainder.join(" ");
        if let Some(header) = header {
            return (Some(header.to_string()), comma_fields(&rest));
        }

        let mut fields = comma_fields(&rest);
        if fields.len() >= 2 {
            let job = fields.remove(0);
            return (Some(job), fields);
        }

        let words: Vec<&str> = rest.split_whitespace().filter(|w| *w != ",").collect();
        let lead = words
            .iter()
            .take_while(|w| !has_digit(w) && w.chars().next().is_some_and(char::is_lowercase))
            .count();
        let job = words[..lead].join(" ");
        let address = words[lead..].join(" ");

        if lead > 0 && self.job.accepts(&job) {
            (Some(job), non_empty(address))
        } else {
            (None, non_empty(words.join(" ")))
        }
    }
}

impl Draft {
    fn address(&self) -> String {
        self.fragments.join(", ")
    }

    /// A bracket in the job means the name ran on past the split.
    pub fn fold_name_continuation(&mut self) {
        if !self.job.as_deref().is_some_and(|job| job.contains([')', '}'])) {
            return;
        }
        if let Some(job) = self.job.take() {
            self.name = format!("{} {}", self.name, job.trim());
        }
    }

    /// The address went missing but the job carries a number.
    pub fn promote_job_to_address(&mut self) {
        if !self.fragments.is_empty() || !self.job.as_deref().is_some_and(has_digit) {
            return;
        }
        self.fragments = self.job.take().into_iter().collect();
    }

    /// Of several address fragments keep those with a number, or else the
    /// longest one if it is long enough.
    pub fn keep_numbered_fragments(&mut self, min_fragment_chars: usize) {
        if self.fragments.len() <= 1 {
            return;
        }
        let numbered: Vec<String> = self
            .fragments
            .iter()
            .filter(|f| has_digit(f))
            .cloned()
            .collect();
        if !numbered.is_empty() {
            self.fragments = numbered;
            return;
        }
        let longest = self
            .fragments
            .iter()
            .max_by_key(|f| f.chars().count())
            .filter(|f| f.chars().count() > min_fragment_chars)
            .cloned();
        self.fragments = longest.into_iter().collect();
    }

    /// Job holds a number while the address is nearly empty: swap them.
    pub fn swap_misplaced_address(&mut self, min_address_letters: usize) {
        let job_has_digit = self.job.as_deref().is_some_and(has_digit);
        if job_has_digit && letter_count(&self.address()) < min_address_letters {
            let old_address = self.address();
            self.fragments = self.job.take().into_iter().collect();
            self.job = Some(old_address).filter(|a| !a.trim().is_empty());
        }
    }

    pub fn finish(self) -> PersonRecord {
        let address = tidy_tail(&self.address()).to_string();
        let job = self
            .job
            .as_deref()
            .map(normalize_job)
            .filter(|j| !j.is_empty())
            .unwrap_or_else(|| NO_JOB.to_string());
        PersonRecord::new(self.name.trim(), job, address)
    }
}

/// First letter upper, rest lower, no trailing punctuation.
pub fn normalize_job(job: &str) -> String {
    let job = tidy_tail(job);
    let mut chars = job.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn tidy_tail(text: &str) -> &str {
    text.trim().trim_end_matches(['.', ',']).trim_end()
}

fn comma_fields(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(text: String) -> Vec<String> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![text]
    }
}
