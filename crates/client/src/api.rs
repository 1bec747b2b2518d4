//! HTTP client for the assistant API.
//!
//! Endpoints are built by appending a relative path to the configured base
//! URL; nothing is normalized, so the base must end with `/`
//! (e.g. `http://127.0.0.1:8000/api/`).

use std::time::Duration;

use playground_protocol::{CreateAssistantRequest, KvStoreItem, PromptRequest, ResponseMessage};
use reqwest::Response;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Errors from a single API call
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Client with the transport's default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Client with an explicit per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn user_endpoint(&self, path: &str, user_name: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            path,
            urlencoding::encode(user_name)
        )
    }

    /// `POST create`. The response body is not used: session state only ever
    /// comes from a status read.
    pub async fn create_assistant(&self, request: &CreateAssistantRequest) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.endpoint("create"))
            .json(request)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        debug!(
            component = "api",
            event = "create.ok",
            user = %request.user_name,
            status = resp.status().as_u16(),
        );
        Ok(())
    }

    /// `POST process`: returns the messages to append to the transcript.
    pub async fn process_prompt(
        &self,
        request: &PromptRequest,
    ) -> Result<Vec<ResponseMessage>, ApiError> {
        let resp = self
            .http
            .post(self.endpoint("process"))
            .json(request)
            .send()
            .await?;
        decode_json(check_status(resp).await?).await
    }

    /// `GET status/{user}`: the raw key/value records for a user.
    pub async fn read_status(&self, user_name: &str) -> Result<Vec<KvStoreItem>, ApiError> {
        let resp = self
            .http
            .get(self.user_endpoint("status", user_name))
            .send()
            .await?;
        decode_json(check_status(resp).await?).await
    }

    /// `DELETE delete/{user}`: only success or failure matters.
    pub async fn delete_assistant(&self, user_name: &str) -> Result<(), ApiError> {
        let resp = self
            .http
            .delete(self.user_endpoint("delete", user_name))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(ApiError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_protocol::Role;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(format!("{}/api/", server.uri()))
    }

    #[test]
    fn endpoints_are_plain_concatenation() {
        let api = ApiClient::new("http://host/api/");
        assert_eq!(api.endpoint("create"), "http://host/api/create");
        assert_eq!(
            api.user_endpoint("status", "a@b.com"),
            "http://host/api/status/a%40b.com"
        );

        // No normalization: a base without the trailing slash is used verbatim
        let api = ApiClient::new("http://host/api");
        assert_eq!(api.endpoint("create"), "http://host/apicreate");
    }

    #[tokio::test]
    async fn create_posts_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/create"))
            .and(body_json(serde_json::json!({
                "userName": "a@b.com",
                "name": "X",
                "instructions": "Y",
                "fileURLs": ["http://f1.csv"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "userName": "a@b.com",
                "assistant_id": "asst_1",
                "thread_id": "thread_1",
                "file_ids": ["file-1"],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = CreateAssistantRequest {
            user_name: "a@b.com".to_string(),
            name: "X".to_string(),
            instructions: "Y".to_string(),
            file_urls: vec!["http://f1.csv".to_string()],
        };
        client(&server).create_assistant(&request).await.unwrap();
    }

    #[tokio::test]
    async fn process_decodes_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/process"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"role": "user", "content": "hi", "imageContent": null},
                {"role": "assistant", "content": "hello", "imageContent": null},
            ])))
            .mount(&server)
            .await;

        let messages = client(&server)
            .process_prompt(&PromptRequest {
                user_name: "a@b.com".to_string(),
                prompt: "hi".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn status_path_carries_encoded_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/a%40b.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"username": "a@b.com", "key": "assistant", "value": "asst_1"},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let items = client(&server).read_status("a@b.com").await.unwrap();
        assert_eq!(items[0].value, "asst_1");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/delete/a%40b.com"))
            .respond_with(ResponseTemplate::new(404).set_body_string("User a@b.com not found"))
            .mount(&server)
            .await;

        let err = client(&server)
            .delete_assistant("a@b.com")
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_shape_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status/a%40b.com"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"detail": "nope"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).read_status("a@b.com").await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let api = ApiClient::new("http://127.0.0.1:1/api/");
        let err = api.read_status("a@b.com").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
