use crate::config::ModelConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const REQUEST_SOURCE_OVERRIDE: &str = "override_params";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Query,
    Search,
}

/// Body of a `/query` call, also sent verbatim as the single WebSocket frame
/// that starts a streamed answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_source: Option<String>,
    pub session_id: String,
    pub query: String,
    pub model_provider: String,
    pub model_name: String,
    pub model_params: ModelParams,
    /// Free-form caller context. An explicit `null` is kept as `Some(Null)`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub temperature: f32,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub enable_search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_params: Option<SearchParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub top_k: u32,
    #[serde(default)]
    pub reranker: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_type: Option<String>,
    #[serde(default)]
    pub output_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Body of a `/search` call. Returns matching chunks, no generated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub action: Action,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    pub top_k: u32,
    #[serde(default)]
    pub output_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_params: Option<SearchParams>,
}

/// Body of a `/project` call: a query routed through a configured project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub resource: String,
    pub method: String,
    pub details: ProjectDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub project_id: String,
    #[serde(flatten)]
    pub query: QueryRequest,
}

impl ResponseFormat {
    pub fn text() -> Self {
        Self {
            format_type: "text".to_string(),
        }
    }

    pub fn json() -> Self {
        Self {
            format_type: "json".to_string(),
        }
    }
}

impl QueryRequest {
    /// A non-streaming query using the configured model and a fresh session id.
    pub fn new(query: impl Into<String>, model: &ModelConfig) -> Self {
        Self {
            action: Action::Query,
            request_source: None,
            session_id: new_session_id(),
            query: query.into(),
            model_provider: model.provider.clone(),
            model_name: model.name.clone(),
            model_params: ModelParams {
                temperature: model.temperature,
                stream: false,
                system_prompt: Some(model.system_prompt.clone()),
                enable_search: false,
                search_params: None,
                response_format: None,
            },
            context: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.model_params.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.model_params.temperature = temperature;
        self
    }

    pub fn with_search(mut self, search_params: SearchParams) -> Self {
        self.model_params.enable_search = true;
        self.model_params.search_params = Some(search_params);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.model_params.response_format = Some(format);
        self
    }

    /// Marks the request so the server applies these params over the
    /// project defaults.
    pub fn override_params(mut self) -> Self {
        self.request_source = Some(REQUEST_SOURCE_OVERRIDE.to_string());
        self
    }

    pub fn streaming(mut self) -> Self {
        self.model_params.stream = true;
        self
    }
}

impl ProjectRequest {
    pub fn new(project_id: impl Into<String>, query: QueryRequest) -> Self {
        Self {
            resource: "ai".to_string(),
            method: "query".to_string(),
            details: ProjectDetails {
                project_id: project_id.into(),
                query,
            },
        }
    }
}

/// Any value that is present, `null` included, becomes `Some`. Absent
/// fields fall back to `None` through `#[serde(default)]`.
fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// One retrieved chunk. Missing fields fall back to placeholder text.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub source_name: String,
    pub material_id: String,
    pub score: String,
    pub metadata: Value,
}

/// A `/query` reply, read leniently from whatever JSON came back.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub response: Option<String>,
    pub search_results: Option<Vec<SearchHit>>,
    pub metadata: Value,
}

/// A `/search` reply. Results are read from `results`, or `search_results`
/// when the former is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

impl SearchHit {
    pub fn from_value(value: &Value) -> Self {
        Self {
            content: text_field(value, "content").unwrap_or_default(),
            source_name: text_field(value, "source_name").unwrap_or_else(|| "Unknown".to_string()),
            material_id: text_field(value, "material_id").unwrap_or_else(|| "Unknown".to_string()),
            score: text_field(value, "score").unwrap_or_else(|| "N/A".to_string()),
            metadata: value
                .get("metadata")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
        }
    }
}

impl QueryResponse {
    pub fn from_value(value: &Value) -> Self {
        Self {
            response: text_field(value, "response"),
            search_results: value
                .get("search_results")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(SearchHit::from_value).collect()),
            metadata: value
                .get("metadata")
                .filter(|m| !m.is_null())
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
        }
    }
}

impl SearchResponse {
    pub fn from_value(value: &Value) -> Self {
        let results = value
            .get("results")
            .or_else(|| value.get("search_results"))
            .and_then(Value::as_array)
            .map(|items| items.iter().map(SearchHit::from_value).collect())
            .unwrap_or_default();

        Self { results }
    }
}

/// Strings are taken as-is, other scalars and structures are rendered as JSON.
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
