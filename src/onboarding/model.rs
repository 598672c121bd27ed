//! User profile collected during onboarding.

use serde::{Deserialize, Serialize};

use super::extract::ExtractedFields;
use super::state::ProfileField;

/// What the companion knows about a user.
///
/// Filled in one field per onboarding stage; complete once all three fields
/// are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Profile {
    /// Whether name, age and location are all known.
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.age.is_some() && self.location.is_some()
    }

    /// Copy one field from an extraction result. Returns `false` (and leaves
    /// the profile untouched) when the extraction did not contain it.
    pub fn apply(&mut self, field: ProfileField, extracted: &ExtractedFields) -> bool {
        match field {
            ProfileField::Name => match &extracted.name {
                Some(name) => self.name = Some(name.clone()),
                None => return false,
            },
            ProfileField::Age => match extracted.age {
                Some(age) => self.age = Some(age),
                None => return false,
            },
            ProfileField::Location => match &extracted.location {
                Some(location) => self.location = Some(location.clone()),
                None => return false,
            },
        }
        true
    }

    /// Display name, falling back to a neutral greeting.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("friend")
    }

    /// One-line summary: `name | age | location`.
    pub fn summary_line(&self) -> String {
        format!(
            "{} | {} | {}",
            self.name.as_deref().unwrap_or("?"),
            self.age.map(|a| a.to_string()).unwrap_or_else(|| "?".to_string()),
            self.location.as_deref().unwrap_or("?"),
        )
    }
}
