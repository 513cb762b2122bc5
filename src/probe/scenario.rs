use crate::{
    api::{Action, FilterExpr, QueryRequest, ResponseFormat, SearchParams, SearchRequest},
    config::ModelConfig,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const QUERY_OUTPUT_FIELDS: [&str; 4] = ["content", "source_name", "material_id", "score"];
const SEARCH_OUTPUT_FIELDS: [&str; 3] = ["content", "source_name", "metadata"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    #[default]
    Query,
    Search,
}

/// Which documents a scenario restricts retrieval to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFilter {
    #[serde(default)]
    pub material_id: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    /// ANDed with the id clauses.
    #[serde(default)]
    pub expr: Option<FilterExpr>,
    /// Sent as `search_params.source_name`.
    #[serde(default)]
    pub source_name: Vec<String>,
    /// Sent as `search_params.source_names`.
    #[serde(default)]
    pub source_names: Vec<String>,
    #[serde(default)]
    pub collection: Option<String>,
}

/// One probe: the inputs of a single "build payload, send, classify" run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub endpoint: Endpoint,
    pub query: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default)]
    pub output_fields: Vec<String>,
    #[serde(default)]
    pub filter: ScenarioFilter,
    #[serde(default)]
    pub target_source_name: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_top_k() -> u32 {
    10
}

impl ScenarioFilter {
    pub fn expression(&self) -> Option<FilterExpr> {
        let mut clauses = Vec::new();
        if let Some(material_id) = &self.material_id {
            clauses.push(FilterExpr::eq("material_id", material_id));
        }
        if let Some(course_id) = &self.course_id {
            clauses.push(FilterExpr::eq("course_id", course_id));
        }
        if let Some(expr) = &self.expr {
            clauses.push(expr.clone());
        }

        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(FilterExpr::all(clauses)),
        }
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            endpoint: Endpoint::Query,
            query: query.into(),
            temperature: None,
            system_prompt: None,
            top_k: default_top_k(),
            output_fields: Vec::new(),
            filter: ScenarioFilter::default(),
            target_source_name: None,
            keywords: Vec::new(),
        }
    }

    pub fn session_id(&self) -> String {
        format!(
            "probe_{}_{}",
            self.name.replace('-', "_"),
            Uuid::new_v4().simple()
        )
    }

    fn output_fields(&self, defaults: &[&str]) -> Vec<String> {
        if self.output_fields.is_empty() {
            defaults.iter().map(|f| f.to_string()).collect()
        } else {
            self.output_fields.clone()
        }
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            top_k: self.top_k,
            reranker: true,
            retrieval_type: Some("chunk".to_string()),
            output_fields: self.output_fields(&QUERY_OUTPUT_FIELDS),
            expr: self.filter.expression().map(|e| e.to_string()),
            source_name: non_empty(&self.filter.source_name),
            source_names: non_empty(&self.filter.source_names),
            collection: self.filter.collection.clone(),
        }
    }

    pub fn query_request(&self, model: &ModelConfig) -> QueryRequest {
        let mut request = QueryRequest::new(&self.query, model)
            .with_session_id(self.session_id())
            .with_search(self.search_params())
            .with_response_format(ResponseFormat::text());

        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(system_prompt) = &self.system_prompt {
            request = request.with_system_prompt(system_prompt);
        }
        request
    }

    pub fn search_request(&self) -> SearchRequest {
        let output_fields = self.output_fields(&SEARCH_OUTPUT_FIELDS);

        // A source-name allow-list only exists inside search_params
        let search_params = (!self.filter.source_names.is_empty()).then(|| SearchParams {
            top_k: self.top_k,
            reranker: true,
            retrieval_type: None,
            output_fields: output_fields.clone(),
            expr: None,
            source_name: None,
            source_names: Some(self.filter.source_names.clone()),
            collection: None,
        });

        SearchRequest {
            action: Action::Search,
            query: self.query.clone(),
            collection: self.filter.collection.clone(),
            expr: self.filter.expression().map(|e| e.to_string()),
            top_k: self.top_k,
            output_fields,
            search_params,
        }
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}
