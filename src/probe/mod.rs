pub mod catalog;
mod report;
mod scenario;
mod summary;

pub use catalog::{builtin_scenarios, select};
pub use report::snippet;
pub use scenario::{Endpoint, Scenario, ScenarioFilter};
pub use summary::{DEFAULT_KEYWORDS, Mention, QuerySummary, SearchSummary, check_mentions};

use crate::{
    Result,
    api::{ApiReply, CreateAiApi, SearchResponse},
    config::ModelConfig,
};
use std::io::Write;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Query {
        summary: QuerySummary,
        mention: Mention,
    },
    Search(SearchSummary),
    Failed {
        status: u16,
        body: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: Outcome,
}

impl ScenarioReport {
    /// A query passes when the answer mentions the target or a keyword; a
    /// search passes unless a named target was missing.
    pub fn passed(&self) -> bool {
        match &self.outcome {
            Outcome::Query { mention, .. } => mention.is_match(),
            Outcome::Search(summary) => summary.target_found != Some(false),
            Outcome::Failed { .. } => false,
        }
    }
}

/// Prints a reply and turns it into an [`Outcome`]. Shared by scenario runs
/// and the one-off `query`/`search` commands.
pub fn report_reply<W: Write>(
    out: &mut W,
    endpoint: Endpoint,
    reply: ApiReply,
    target: Option<&str>,
    keywords: &[String],
) -> Result<Outcome> {
    let value = match reply {
        ApiReply::Failure { status, body } => {
            report::write_failure(out, status, &body)?;
            return Ok(Outcome::Failed { status, body });
        }
        ApiReply::Success(value) => value,
    };
    report::write_status(out, 200)?;

    match endpoint {
        Endpoint::Query => {
            let summary = QuerySummary::from_value(&value);
            let mention = if keywords.is_empty() {
                check_mentions(&summary.response, target, &DEFAULT_KEYWORDS)
            } else {
                check_mentions(&summary.response, target, keywords)
            };
            report::write_query_report(out, &summary, &mention)?;
            Ok(Outcome::Query { summary, mention })
        }
        Endpoint::Search => {
            let summary = SearchSummary::from_response(&SearchResponse::from_value(&value), target);
            report::write_search_report(out, &summary, target)?;
            Ok(Outcome::Search(summary))
        }
    }
}

/// Prints a reply without summarizing it. Returns whether it was a success.
pub fn report_raw_reply<W: Write>(out: &mut W, reply: &ApiReply) -> Result<bool> {
    match reply {
        ApiReply::Success(value) => {
            report::write_raw_success(out, value)?;
            Ok(true)
        }
        ApiReply::Failure { status, body } => {
            report::write_failure(out, *status, body)?;
            Ok(false)
        }
    }
}

/// Build the payload for `scenario`, send it, classify and print the reply.
/// A non-200 reply is reported, not returned as an error.
pub async fn run_scenario<W: Write>(
    api: &dyn CreateAiApi,
    scenario: &Scenario,
    model: &ModelConfig,
    out: &mut W,
) -> Result<ScenarioReport> {
    report::write_header(out, &scenario.name)?;
    if !scenario.description.is_empty() {
        writeln!(out, "{}", scenario.description)?;
    }
    if let Some(expr) = scenario.filter.expression() {
        writeln!(out, "Filter: {expr}")?;
    }

    info!("Running scenario '{}' against /{:?}", scenario.name, scenario.endpoint);
    let reply = match scenario.endpoint {
        Endpoint::Query => api.query(&scenario.query_request(model)).await?,
        Endpoint::Search => api.search(&scenario.search_request()).await?,
    };

    let outcome = report_reply(
        out,
        scenario.endpoint,
        reply,
        scenario.target_source_name.as_deref(),
        &scenario.keywords,
    )?;

    if let Outcome::Failed { status, .. } = &outcome {
        warn!("Scenario '{}' failed with status {}", scenario.name, status);
    }

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        outcome,
    })
}

/// Runs scenarios one after another. Transport errors stop the run.
pub async fn run_all<W: Write>(
    api: &dyn CreateAiApi,
    scenarios: &[Scenario],
    model: &ModelConfig,
    out: &mut W,
) -> Result<Vec<ScenarioReport>> {
    let mut reports = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        reports.push(run_scenario(api, scenario, model, out).await?);
    }

    let passed = reports.iter().filter(|r| r.passed()).count();
    writeln!(out, "\n===== RESULTS =====")?;
    for report in &reports {
        let mark = if report.passed() { "PASS" } else { "FAIL" };
        writeln!(out, "{mark} {}", report.name)?;
    }
    writeln!(out, "\nPassed {passed}/{}", reports.len())?;

    Ok(reports)
}
