use super::types::{ProjectRequest, QueryRequest, SearchRequest};
use crate::{Result, config::ApiConfig, config::Credentials};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Outcome of one blocking call. Non-200 replies are data, not errors, so a
/// caller running several probes can report them and carry on.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiReply {
    Success(Value),
    Failure { status: u16, body: String },
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[async_trait]
pub trait CreateAiApi: Send + Sync {
    async fn query(&self, request: &QueryRequest) -> Result<ApiReply>;
    async fn search(&self, request: &SearchRequest) -> Result<ApiReply>;
    async fn project(&self, request: &ProjectRequest) -> Result<ApiReply>;
}

pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig, credentials: Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<ApiReply> {
        let url = self.endpoint(path);
        let payload = serde_json::to_vec(body)?;

        debug!(
            "POST {} ({} bytes, token {})",
            url,
            payload.len(),
            self.credentials.redacted()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.credentials.token())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("Received {} from {} ({} bytes)", status, url, body.len());
        Ok(classify_reply(status, body))
    }
}

/// HTTP 200 is a success; a 200 body that is not JSON is kept as a string.
pub fn classify_reply(status: u16, body: String) -> ApiReply {
    if status != 200 {
        warn!("Request failed with status {}", status);
        return ApiReply::Failure { status, body };
    }

    match serde_json::from_str::<Value>(&body) {
        Ok(value) => ApiReply::Success(value),
        Err(e) => {
            warn!("Response body is not JSON: {}", e);
            ApiReply::Success(Value::String(body))
        }
    }
}

#[async_trait]
impl CreateAiApi for HttpApiClient {
    async fn query(&self, request: &QueryRequest) -> Result<ApiReply> {
        self.post("query", request).await
    }

    async fn search(&self, request: &SearchRequest) -> Result<ApiReply> {
        self.post("search", request).await
    }

    async fn project(&self, request: &ProjectRequest) -> Result<ApiReply> {
        self.post("project", request).await
    }
}
