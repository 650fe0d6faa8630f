//! Generation request value object.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
///
/// Every field defaults so that missing keys surface as a validation error
/// rather than a deserialization error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub content_type: String,
    pub topic: String,
    pub tone: String,
    pub length: Option<u32>,
    pub additional_context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Content type and topic are required")]
pub struct MissingRequiredFields;

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), MissingRequiredFields> {
        if self.content_type.trim().is_empty() || self.topic.trim().is_empty() {
            return Err(MissingRequiredFields);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let request: GenerationRequest = serde_json::from_str(r#"{"content_type":"blog_post"}"#).unwrap();
        assert_eq!(request.topic, "");
        assert_eq!(request.length, None);
        assert_eq!(request.validate(), Err(MissingRequiredFields));
    }

    #[test]
    fn test_blank_topic_rejected() {
        let request = GenerationRequest {
            content_type: "article".into(),
            topic: "   ".into(),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_null_length_accepted() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"content_type":"script","topic":"rust","length":null}"#).unwrap();
        assert_eq!(request.length, None);
        assert_eq!(request.validate(), Ok(()));
    }
}
