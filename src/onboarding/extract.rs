//! Validation of the fields the completion service pulls out of a reply.
//!
//! The service's JSON is untrusted: every field is type-checked, trimmed and
//! range-checked before it can reach a profile.

use serde_json::{Map, Value};

use super::state::ProfileField;

/// Longest name or location we accept.
pub const MAX_TEXT_FIELD_CHARS: usize = 100;

/// Youngest and oldest plausible ages.
pub const AGE_RANGE: std::ops::RangeInclusive<u32> = 1..=120;

/// Fields extracted from one free-text reply. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
}

impl ExtractedFields {
    /// Validate a raw JSON object. Unknown keys are ignored; invalid values
    /// are dropped rather than rejected.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        Self {
            name: map.get("name").and_then(clean_text),
            age: map.get("age").and_then(clean_age),
            location: map.get("location").and_then(clean_text),
        }
    }

    /// Whether the given field was found.
    pub fn has(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Name => self.name.is_some(),
            ProfileField::Age => self.age.is_some(),
            ProfileField::Location => self.location.is_some(),
        }
    }
}

fn clean_text(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() || text.chars().count() > MAX_TEXT_FIELD_CHARS {
        return None;
    }
    Some(text.to_string())
}

fn clean_age(value: &Value) -> Option<u32> {
    let age = match value {
        Value::Number(n) => u32::try_from(n.as_u64()?).ok()?,
        Value::String(s) => s.trim().parse::<u32>().ok()?,
        _ => return None,
    };
    AGE_RANGE.contains(&age).then_some(age)
}
