use serde::{Deserialize, Serialize};

use super::errors::SpindleError;

/// Body of a creation request: the two user-supplied text fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
}

impl CreateTaskRequest {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Both fields are required and must not be empty. Whitespace counts as
    /// content.
    pub fn validate(&self) -> Result<(), SpindleError> {
        if self.title.is_empty() {
            return Err(SpindleError::Validation("title is required".to_string()));
        }
        if self.description.is_empty() {
            return Err(SpindleError::Validation(
                "description is required".to_string(),
            ));
        }
        Ok(())
    }
}
