pub mod normalize;
pub mod segment;

pub use normalize::Normalizer;
pub use segment::Segmenter;

pub fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

pub fn has_parenthesis(text: &str) -> bool {
    text.contains(['(', ')'])
}

pub fn letters_only(text: &str) -> String {
    text.chars().filter(|c| c.is_alphabetic()).collect()
}

pub fn letter_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphabetic()).count()
}

/// True when the text has at least one cased character and none of them is
/// lowercase. Punctuation, digits and spaces are ignored.
pub fn is_uppercase_text(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}
