//! Built-in document-filtering probes against the ER-model lecture deck.

use super::scenario::{Endpoint, Scenario, ScenarioFilter};
use crate::{Error, Result, api::FilterExpr};

pub const TARGET_SOURCE_NAME: &str = "1-er_model.pptx";
pub const TARGET_MATERIAL_ID: &str = "1005";
pub const TARGET_COURSE_ID: &str = "445567";

const GENERIC_QUERY: &str = "What is this document about?";
const ANALYSIS_PROMPT: &str = "You are analyzing content from course materials. Please provide detailed information about this document.";

fn source_name_variants() -> FilterExpr {
    FilterExpr::eq("source_name", TARGET_SOURCE_NAME)
        .or(FilterExpr::contains("source_name", "er_model"))
        .or(FilterExpr::contains("source_name", "ER_MODEL"))
}

pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            description: "Filter on material_id alone with an ER-focused question".to_string(),
            temperature: Some(0.3),
            system_prompt: Some(
                "You are analyzing course materials about database concepts. Please focus ONLY on Entity Relationship modeling content in the document. If there is no ER modeling content, clearly state that.".to_string(),
            ),
            filter: ScenarioFilter {
                material_id: Some(TARGET_MATERIAL_ID.to_string()),
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new(
                "material-id-only",
                "Tell me specifically about entity relationship modeling in this document. Focus only on ER modeling concepts.",
            )
        },
        Scenario {
            description: "Filter on material_id and course_id, no student constraint".to_string(),
            system_prompt: Some(ANALYSIS_PROMPT.to_string()),
            filter: ScenarioFilter {
                material_id: Some(TARGET_MATERIAL_ID.to_string()),
                course_id: Some(TARGET_COURSE_ID.to_string()),
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new("document-id", GENERIC_QUERY)
        },
        Scenario {
            description: "Filter on material_id and source_name together".to_string(),
            system_prompt: Some(ANALYSIS_PROMPT.to_string()),
            filter: ScenarioFilter {
                material_id: Some(TARGET_MATERIAL_ID.to_string()),
                expr: Some(FilterExpr::eq("source_name", TARGET_SOURCE_NAME)),
                source_name: vec![TARGET_SOURCE_NAME.to_string()],
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new("combined", GENERIC_QUERY)
        },
        Scenario {
            description: "source_name allow-list with exact match".to_string(),
            output_fields: vec!["content".to_string(), "source_name".to_string(), "score".to_string()],
            filter: ScenarioFilter {
                source_name: vec![TARGET_SOURCE_NAME.to_string()],
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new("source-name-array", GENERIC_QUERY)
        },
        Scenario {
            description: "expr equality on source_name".to_string(),
            output_fields: vec!["content".to_string(), "source_name".to_string(), "score".to_string()],
            filter: ScenarioFilter {
                expr: Some(FilterExpr::eq("source_name", TARGET_SOURCE_NAME)),
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new("expr-equals", GENERIC_QUERY)
        },
        Scenario {
            description: "expr disjunction of exact and CONTAINS matches".to_string(),
            output_fields: vec!["content".to_string(), "source_name".to_string(), "score".to_string()],
            filter: ScenarioFilter {
                expr: Some(source_name_variants()),
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new("expr-multi", GENERIC_QUERY)
        },
        Scenario {
            description: "File name named in the system prompt plus allow-list".to_string(),
            system_prompt: Some(format!(
                "You are analyzing course materials. Answer using only the document named '{TARGET_SOURCE_NAME}'."
            )),
            filter: ScenarioFilter {
                source_name: vec![TARGET_SOURCE_NAME.to_string()],
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new(
                "prompt-mention",
                format!("Using ONLY the document '{TARGET_SOURCE_NAME}', what are the main concepts?"),
            )
        },
        Scenario {
            description: "Every filtering method at once, low temperature".to_string(),
            temperature: Some(0.1),
            system_prompt: Some(format!(
                "You are analyzing course materials. The user is requesting information ONLY about the document named '{TARGET_SOURCE_NAME}'. You must ONLY use information from this specific document and explicitly acknowledge the document by name. If you cannot find this exact document, inform the user that this specific document is not available."
            )),
            output_fields: vec![
                "content".to_string(),
                "source_name".to_string(),
                "score".to_string(),
                "metadata".to_string(),
            ],
            filter: ScenarioFilter {
                expr: Some(
                    FilterExpr::eq("source_name", TARGET_SOURCE_NAME)
                        .or(FilterExpr::contains("source_name", "er_model"))
                        .or(FilterExpr::contains("source_name", "er model")),
                ),
                source_name: vec![TARGET_SOURCE_NAME.to_string()],
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new(
                "force-filtering",
                format!(
                    "Describe in detail the content of the file named '{TARGET_SOURCE_NAME}' and ONLY this document. Ignore all other documents."
                ),
            )
        },
        Scenario {
            description: "Raw search restricted to the target source name".to_string(),
            endpoint: Endpoint::Search,
            filter: ScenarioFilter {
                expr: Some(FilterExpr::eq("source_name", TARGET_SOURCE_NAME)),
                collection: Some("main".to_string()),
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new("direct-search", "model")
        },
        Scenario {
            description: "Broad search listing every indexed document".to_string(),
            endpoint: Endpoint::Search,
            top_k: 100,
            output_fields: vec!["source_name".to_string(), "metadata".to_string()],
            filter: ScenarioFilter {
                collection: Some("main".to_string()),
                ..ScenarioFilter::default()
            },
            ..Scenario::new("document-existence", "the")
        },
        Scenario {
            description: "Search with search_params.source_names allow-list".to_string(),
            endpoint: Endpoint::Search,
            top_k: 5,
            output_fields: vec![
                "content".to_string(),
                "source_name".to_string(),
                "material_id".to_string(),
                "course_id".to_string(),
            ],
            filter: ScenarioFilter {
                source_names: vec![TARGET_SOURCE_NAME.to_string()],
                ..ScenarioFilter::default()
            },
            target_source_name: Some(TARGET_SOURCE_NAME.to_string()),
            ..Scenario::new("search-source-names", "entity relationship concepts")
        },
    ]
}

/// Picks scenarios by name, in the order asked for. No names means all.
pub fn select(scenarios: &[Scenario], names: &[String]) -> Result<Vec<Scenario>> {
    if names.is_empty() {
        return Ok(scenarios.to_vec());
    }

    names
        .iter()
        .map(|name| {
            scenarios
                .iter()
                .find(|s| &s.name == name)
                .cloned()
                .ok_or_else(|| Error::UnknownScenario { name: name.clone() })
        })
        .collect()
}
