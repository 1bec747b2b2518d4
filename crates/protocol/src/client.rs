//! Client → Server request bodies

use serde::{Deserialize, Serialize};

/// Body of `POST create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssistantRequest {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub name: String,
    pub instructions: String,
    #[serde(rename = "fileURLs")]
    pub file_urls: Vec<String>,
}

/// Body of `POST process`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub prompt: String,
}
