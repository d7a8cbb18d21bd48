//! Comment form.

use serde::{Deserialize, Serialize};

use super::{FormErrors, required};

/// Comment form values (urlencoded).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

impl CommentForm {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            csrf_token: String::new(),
        }
    }

    /// Trimmed comment text.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        match required(&mut errors, "text", &self.text) {
            Some(text) => Ok(text),
            None => Err(errors),
        }
    }
}
