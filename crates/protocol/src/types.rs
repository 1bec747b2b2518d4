//! Core types shared across the protocol

use serde::{Deserialize, Serialize};

/// Author of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A file attached to an assistant.
///
/// Carried as a JSON-encoded string inside the `value` of a `file` status record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
}

impl FileRecord {
    /// Decode the JSON string stored in a status record value.
    pub fn from_record_value(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }
}

/// Status record keys the client understands
pub mod keys {
    pub const ASSISTANT: &str = "assistant";
    pub const THREAD: &str = "thread";
    pub const FILE: &str = "file";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_values_only() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("assistant"), Some(Role::Assistant));
        assert_eq!(Role::parse("system"), None);
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn file_record_decodes_from_status_value() {
        let value = r#"{"name": "wind_turbines_telemetry.csv", "id": "file-abc"}"#;
        let record = FileRecord::from_record_value(value).expect("valid record");
        assert_eq!(record.id, "file-abc");
        assert_eq!(record.name, "wind_turbines_telemetry.csv");
    }

    #[test]
    fn file_record_requires_id_and_name() {
        assert!(FileRecord::from_record_value(r#"{"name": "only-name.csv"}"#).is_err());
        assert!(FileRecord::from_record_value("not json").is_err());
    }
}
