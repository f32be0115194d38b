use serde::Deserialize;
use serde_json::Value;

use crate::core::model::{PersonRecord, NO_JOB};

#[derive(Debug, Deserialize)]
struct ReplyEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default, rename = "jobTitle")]
    job_title: Option<String>,
}

/// Reads the records out of a model reply. The JSON may be wrapped in prose
/// or a code fence and may be a single object or an array of objects.
/// Entries without a name are skipped.
pub fn parse_reply(reply: &str) -> Vec<PersonRecord> {
    let Some(value) = find_json(reply) else {
        return Vec::new();
    };

    let entries = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|item| serde_json::from_value::<ReplyEntry>(item).ok())
        .filter_map(into_record)
        .collect()
}

fn into_record(entry: ReplyEntry) -> Option<PersonRecord> {
    let name = entry.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
    let job = entry
        .job_title
        .map(|j| j.trim().to_string())
        .filter(|j| !j.is_empty() && !j.eq_ignore_ascii_case("null"))
        .unwrap_or_else(|| NO_JOB.to_string());
    let address = entry.address.unwrap_or_default().trim().to_string();
    Some(PersonRecord::new(name, job, address))
}

fn find_json(reply: &str) -> Option<Value> {
    let trimmed = reply.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    // Widest span between an opening and a matching closing bracket.
    for (open, close) in [('[', ']'), ('{', '}')] {
        let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) else {
            continue;
        };
        if start < end {
            if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                return Some(value);
            }
        }
    }
    None
}
