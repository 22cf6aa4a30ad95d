//! Request DTOs for the key-value API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for the create operation (POST /kv)
///
/// Creates the key or replaces its value.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    /// The key to write
    pub key: String,
    /// The value to store
    #[serde(default)]
    pub value: String,
}

impl CreateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("key is required".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: CreateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
    }

    #[test]
    fn test_create_request_value_defaults_empty() {
        let req: CreateRequest = serde_json::from_str(r#"{"key": "k"}"#).unwrap();
        assert_eq!(req.value, "");
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = CreateRequest {
            key: "".to_string(),
            value: "test".to_string(),
        };
        assert!(req.validate().is_some());
    }
}
