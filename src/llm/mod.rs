pub mod client;
pub mod prompt;
pub mod reply;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::model::{LineOutcome, LogicalLine, Rejection};
use crate::extract::RecordExtractor;

pub use client::{LlmSettings, OpenAiChatClient};

/// A chat model that answers one system + user message pair.
pub trait ChatClient: Sync {
    fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Extraction backend that asks a language model for the fields.
pub struct LlmExtractor<C> {
    client: C,
    system: String,
}

impl<C: ChatClient> LlmExtractor<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            system: prompt::system_message(),
        }
    }
}

impl<C: ChatClient> RecordExtractor for LlmExtractor<C> {
    fn extract_line(&self, line: &LogicalLine) -> Result<LineOutcome> {
        let Some(prepared) = prompt::prepare_line(&line.text) else {
            debug!(page = line.source_page, "line out of bounds for the model");
            return Ok(LineOutcome::Rejected(Rejection::OutOfBounds));
        };

        let reply = self
            .client
            .complete(&self.system, &prompt::user_message(&prepared))
            .with_context(|| format!("Model request failed for: {prepared}"))?;

        let records = reply::parse_reply(&reply);
        if records.is_empty() {
            debug!(page = line.source_page, %reply, "unusable model reply");
            return Ok(LineOutcome::Rejected(Rejection::UnusableReply));
        }
        Ok(LineOutcome::Records(records))
    }
}
