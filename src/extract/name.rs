use anyhow::{Context, Result};
use regex::Regex;

use crate::core::config::ExtractConfig;
use crate::text::letters_only;

/// Reorders captured name tokens into `initials prepositions surname`.
#[derive(Debug, Clone)]
pub struct NameFormatter {
    initial: Regex,
    prepositions: Vec<String>,
}

impl NameFormatter {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let initial = Regex::new(&config.initial_pattern)
            .with_context(|| format!("invalid initial pattern: {}", config.initial_pattern))?;
        Ok(Self {
            initial,
            prepositions: config.prepositions.iter().map(|p| p.to_lowercase()).collect(),
        })
    }

    pub fn format(&self, tokens: &[String]) -> String {
        let mut initials = Vec::new();
        let mut prepositions = Vec::new();
        let mut surname = Vec::new();

        for token in tokens {
            let bare: String = token.chars().filter(|c| !matches!(c, '(' | ')')).collect();
            let bare = bare.trim();
            let initial_shaped = self.initial.is_match(bare);
            let capital = bare.chars().next().is_some_and(char::is_uppercase);

            // A capital `D.` is an initial even though `d.` is a preposition.
            if initial_shaped && capital {
                initials.push(as_initial(bare));
            } else if self.is_preposition(bare) {
                prepositions.push(bare.trim_end_matches(',').to_string());
            } else if initial_shaped {
                initials.push(as_initial(bare));
            } else {
                let letters = letters_only(bare);
                if !letters.is_empty() {
                    surname.push(letters);
                }
            }
        }

        initials
            .into_iter()
            .chain(prepositions)
            .chain(surname)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_preposition(&self, token: &str) -> bool {
        let token = token.trim_end_matches(',').to_lowercase();
        self.prepositions.iter().any(|p| *p == token)
    }
}

fn as_initial(token: &str) -> String {
    let letter = token.trim_end_matches([',', '.']);
    format!("{letter}.")
}
