use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PARENTHESIZED: Regex = Regex::new(r"\(([^()]*)\)").unwrap();
    static ref MISREAD_INITIAL: Regex = Regex::new(r"\b[134]\b").unwrap();
}

/// Lines outside this character range (exclusive) are not sent.
pub const MIN_LINE_CHARS: usize = 15;
pub const MAX_LINE_CHARS: usize = 150;

const REPLY_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "name": { "type": "string", "description": "Name of the person or company in the register." },
    "address": { "type": "string", "description": "Street and house number of the entry." },
    "jobTitle": { "type": "string", "description": "Occupation of the person." }
  },
  "required": ["name", "jobTitle", "address"],
  "additionalProperties": false
}"#;

pub fn system_message() -> String {
    format!(
        "You read OCR text from a historical Dutch city address book. The text may contain \
recognition errors.\n\
\n\
Each entry is laid out as:\n\
- Name: surname first, then initials, often in brackets: 'Jansen (A.B.)', 'Vries (J. de)'.\n\
- Job title, when present: after the name, usually separated by a comma. It may be abbreviated \
('Dr.', 'Ir.', 'Boekbindkn.').\n\
- Address: at the end. A street name, possibly abbreviated ('Verl. Hereweg', 'O. Ebbingestr.'), \
followed by a house number when there is one.\n\
\n\
Extract name, jobTitle and address. Tolerate extra spaces and missing punctuation. If the text \
holds more than one entry, return a JSON array with one object per entry.\n\
\n\
Reply with JSON only, following this schema:\n{REPLY_SCHEMA}\n\
Do not repeat the schema and do not add any text around the JSON."
    )
}

pub fn user_message(record: &str) -> String {
    format!("Record: {record}\n\nExtract the entry fields from this record.")
}

/// Cleans a logical line before it is sent. Returns `None` when the result
/// falls outside the accepted length range.
pub fn prepare_line(line: &str) -> Option<String> {
    let repaired = dot_bare_initials(&restore_misread_initials(line));
    let trimmed = repaired.trim_start_matches(|c: char| !c.is_alphabetic()).trim_end();
    let len = trimmed.chars().count();
    (len > MIN_LINE_CHARS && len < MAX_LINE_CHARS).then(|| trimmed.to_string())
}

/// OCR reads a bracketed `J` as `1`, `3` or `4`.
pub fn restore_misread_initials(line: &str) -> String {
    PARENTHESIZED
        .replace_all(line, |caps: &regex::Captures| {
            format!("({})", MISREAD_INITIAL.replace_all(&caps[1], "J"))
        })
        .into_owned()
}

/// Adds the period after a lone capital: `(A B)` -> `(A. B.)`.
pub fn dot_bare_initials(line: &str) -> String {
    line.split_whitespace()
        .map(|word| {
            let inner = word.trim_start_matches('(');
            let core = inner.trim_end_matches([')', ',']);
            let opening = &word[..word.len() - inner.len()];
            let closing = &inner[core.len()..];
            let mut chars = core.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_uppercase() => format!("{opening}{core}.{closing}"),
                _ => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
