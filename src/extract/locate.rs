use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

use crate::core::config::ExtractConfig;
use crate::core::model::NameCapture;
use crate::text::normalize::Normalizer;

lazy_static! {
    // `Surname (I. I. [prefix])` on a normalized line, where the period after
    // an initial may be missing and a space may precede the closing bracket.
    static ref PARENTHESIZED_INITIALS: Regex = Regex::new(
        r"^[^A-Za-z]*(?P<surname>[A-Za-z][^()]*?)\s*\(\s*(?P<initials>(?:[A-Z][.,]?\s*)+(?:[a-z]{1,6}\.?\s*)*)\)"
    )
    .unwrap();
}

/// Finds where the name ends in a register line.
#[derive(Debug, Clone)]
pub struct Locator {
    normalizer: Normalizer,
    initial: Regex,
    scan_window: Option<usize>,
    parenthesized_fallback: bool,
}

impl Locator {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let initial = Regex::new(&config.initial_pattern)
            .with_context(|| format!("invalid initial pattern: {}", config.initial_pattern))?;
        Ok(Self {
            normalizer: Normalizer::new(config.allow),
            initial,
            scan_window: config.initial_scan_window,
            parenthesized_fallback: config.paren_initials_fallback,
        })
    }

    pub fn is_initial(&self, token: &str) -> bool {
        self.initial.is_match(without_parentheses(token).as_str())
    }

    pub fn locate(&self, line: &str) -> NameCapture {
        let normalized = self.normalizer.normalize(line);
        let tokens = tokenize(&normalized);

        let window = self.scan_window.unwrap_or(tokens.len()).min(tokens.len());
        let positions: Vec<usize> = tokens[..window]
            .iter()
            .enumerate()
            .filter(|(_, token)| self.is_initial(token))
            .map(|(idx, _)| idx)
            .collect();

        if let Some(idx) = final_initial(&tokens, &positions) {
            let idx = close_bracket(&tokens, idx);
            let (name, remainder) = tokens.split_at(idx + 1);
            return NameCapture {
                name_tokens: name.iter().filter(|t| is_wordlike(t)).cloned().collect(),
                remainder_tokens: remainder.to_vec(),
            };
        }

        if self.parenthesized_fallback {
            if let Some(capture) = split_on_parenthesized_initials(&normalized) {
                return capture;
            }
        }

        NameCapture {
            name_tokens: Vec::new(),
            remainder_tokens: tokens,
        }
    }
}

/// The last initial closes the name, unless it reads as `n.`/`o.`, which on
/// these pages is usually a clipped word; then the one before it wins.
fn final_initial(tokens: &[String], positions: &[usize]) -> Option<usize> {
    let (&last, earlier) = positions.split_last()?;
    let ambiguous = without_parentheses(&tokens[last])
        .chars()
        .next()
        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'n' | 'o'));
    match earlier.last() {
        Some(&previous) if ambiguous => Some(previous),
        _ => Some(last),
    }
}

/// Extends the split through the token that closes a bracket left open by
/// the name, as in `Vries (J. de), smid`. The search stops at the first field
/// boundary.
fn close_bracket(tokens: &[String], idx: usize) -> usize {
    let open: usize = tokens[..=idx].iter().map(|t| t.matches('(').count()).sum();
    let closed: usize = tokens[..=idx].iter().map(|t| t.matches(')').count()).sum();
    if open <= closed {
        return idx;
    }
    for (offset, token) in tokens[idx + 1..].iter().enumerate() {
        if token.contains(')') {
            return idx + 1 + offset;
        }
        if token.ends_with(',') {
            break;
        }
    }
    idx
}

fn split_on_parenthesized_initials(normalized: &str) -> Option<NameCapture> {
    let caps = PARENTHESIZED_INITIALS.captures(normalized)?;
    let whole = caps.get(0)?;

    let mut name_tokens: Vec<String> = caps["surname"]
        .split_whitespace()
        .filter(|t| is_wordlike(t))
        .map(str::to_string)
        .collect();
    name_tokens.extend(caps["initials"].split_whitespace().map(dot_bare_initial));

    Some(NameCapture {
        name_tokens,
        remainder_tokens: tokenize(&normalized[whole.end()..]),
    })
}

fn dot_bare_initial(token: &str) -> String {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => format!("{c}."),
        _ => token.to_string(),
    }
}

/// Splits a normalized line into tokens. Tokens without any letter or digit
/// are dropped, except that a stray comma is kept as its own `","` token so
/// the field structure of the line survives, and a stray `)` that closes an
/// open bracket is moved onto the previous token.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut depth = 0usize;
    for raw in text.split_whitespace() {
        if is_wordlike(raw) {
            depth += raw.matches('(').count();
            depth = depth.saturating_sub(raw.matches(')').count());
            tokens.push(raw.to_string());
            continue;
        }
        if depth > 0 && raw.contains(')') {
            if let Some(previous) = tokens.last_mut().filter(|t| t.as_str() != ",") {
                previous.push(')');
                depth -= 1;
            }
        }
        if raw.contains(',') {
            tokens.push(",".to_string());
        }
    }
    tokens
}

/// Moves preposition tokens found in the first field after the split onto
/// the name. Matching is exact, so a capitalised `Van` in a street name stays
/// where it is, and later fields such as `hoek van de Markt 12` are left alone.
pub fn reclaim_prepositions(capture: NameCapture, prepositions: &[String]) -> NameCapture {
    let mut first_field = 0;
    for token in &capture.remainder_tokens {
        if token == "," {
            break;
        }
        first_field += 1;
        if token.ends_with(',') {
            break;
        }
    }

    let mut name_tokens = capture.name_tokens;
    let mut remainder_tokens = Vec::with_capacity(capture.remainder_tokens.len());
    for (idx, token) in capture.remainder_tokens.into_iter().enumerate() {
        let bare = without_parentheses(token.trim_end_matches(','));
        if idx < first_field && prepositions.iter().any(|p| *p == bare) {
            name_tokens.push(bare);
        } else {
            remainder_tokens.push(token);
        }
    }

    NameCapture {
        name_tokens,
        remainder_tokens,
    }
}

fn is_wordlike(token: &str) -> bool {
    token.chars().any(char::is_alphanumeric)
}

fn without_parentheses(token: &str) -> String {
    token.chars().filter(|c| !matches!(c, '(' | ')')).collect()
}
