//! Server → Client response bodies

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// One message returned by `POST process`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "imageContent", default)]
    pub image_content: Option<String>,
}

/// One key/value record returned by `GET status/{user}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvStoreItem {
    pub username: String,
    pub key: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_message_tolerates_null_and_missing_fields() {
        let raw = r#"[
            {"role": "user", "content": "hi", "imageContent": null},
            {"role": "assistant", "content": null},
            {"role": "assistant", "content": "chart", "imageContent": "http://img/1.png"}
        ]"#;
        let messages: Vec<ResponseMessage> = serde_json::from_str(raw).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content, None);
        assert_eq!(messages[1].image_content, None);
        assert_eq!(
            messages[2].image_content.as_deref(),
            Some("http://img/1.png")
        );
    }

    #[test]
    fn response_message_rejects_unknown_role() {
        let raw = r#"{"role": "tool", "content": "x"}"#;
        assert!(serde_json::from_str::<ResponseMessage>(raw).is_err());
    }
}
