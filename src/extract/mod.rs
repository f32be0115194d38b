pub mod assemble;
pub mod locate;
pub mod name;

use anyhow::Result;

use crate::core::config::ExtractConfig;
use crate::core::model::{LineOutcome, LogicalLine, PersonRecord, Rejection};

pub use assemble::Assembler;
pub use locate::Locator;
pub use name::NameFormatter;

/// Turns one logical line into zero or more person records.
///
/// Implementations must be shareable across worker threads; the pipeline
/// calls `extract_line` concurrently on different lines.
pub trait RecordExtractor: Sync {
    fn extract_line(&self, line: &LogicalLine) -> Result<LineOutcome>;
}

/// Rule-based extraction: locate the name, reclaim prepositions, format the
/// name, then split and correct job and address.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    locator: Locator,
    formatter: NameFormatter,
    assembler: Assembler,
    reclaim: Option<Vec<String>>,
}

impl HeuristicExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            locator: Locator::new(config)?,
            formatter: NameFormatter::new(config)?,
            assembler: Assembler::new(config),
            reclaim: config
                .reclaim_prepositions
                .then(|| config.prepositions.clone()),
        })
    }

    pub fn parse(&self, line: &LogicalLine) -> Result<PersonRecord, Rejection> {
        let mut capture = self.locator.locate(&line.text);
        if let Some(prepositions) = &self.reclaim {
            if capture.has_boundary() {
                capture = locate::reclaim_prepositions(capture, prepositions);
            }
        }
        let name = self.formatter.format(&capture.name_tokens);
        self.assembler
            .assemble(&capture, name, line.header.as_deref())
    }
}

impl RecordExtractor for HeuristicExtractor {
    fn extract_line(&self, line: &LogicalLine) -> Result<LineOutcome> {
        Ok(match self.parse(line) {
            Ok(record) => LineOutcome::Records(vec![record]),
            Err(reason) => LineOutcome::Rejected(reason),
        })
    }
}
