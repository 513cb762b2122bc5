use super::summary::{Mention, QuerySummary, SearchSummary};
use crate::Result;
use serde_json::{Value, json};
use std::io::Write;

const SNIPPET_CHARS: usize = 100;
const SAMPLE_CHARS: usize = 200;

pub fn write_header<W: Write>(out: &mut W, title: &str) -> Result<()> {
    writeln!(out, "\n===== {} =====", title.to_uppercase())?;
    Ok(())
}

pub fn write_status<W: Write>(out: &mut W, status: u16) -> Result<()> {
    writeln!(out, "Status Code: {status}")?;
    Ok(())
}

pub fn write_failure<W: Write>(out: &mut W, status: u16, body: &str) -> Result<()> {
    write_status(out, status)?;
    writeln!(out, "Error: {body}")?;
    Ok(())
}

/// Successful body printed as-is, for replies with no summary shape.
pub fn write_raw_success<W: Write>(out: &mut W, value: &Value) -> Result<()> {
    write_status(out, 200)?;
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn write_query_report<W: Write>(
    out: &mut W,
    summary: &QuerySummary,
    mention: &Mention,
) -> Result<()> {
    let overview = json!({
        "status": "success",
        "response_length": summary.response_length,
        "has_search_results": summary.has_search_results,
        "metadata": summary.metadata,
    });
    writeln!(out, "API Response Summary:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&overview)?)?;

    if summary.has_search_results {
        writeln!(out, "\nSearch Results Details:")?;
        for (i, hit) in summary.results.iter().enumerate() {
            writeln!(out, "\n[Result {}]", i + 1)?;
            writeln!(out, "Source: {}", hit.source_name)?;
            writeln!(out, "Material ID: {}", hit.material_id)?;
            writeln!(out, "Score: {}", hit.score)?;
            writeln!(out, "Content snippet: {}", snippet(&hit.content, SNIPPET_CHARS))?;
        }
    }

    writeln!(out, "\nFull response:")?;
    if summary.response.is_empty() {
        writeln!(out, "No response")?;
    } else {
        writeln!(out, "{}", summary.response)?;
    }

    match mention {
        Mention::TargetSource(name) => writeln!(out, "\nResponse explicitly mentions '{name}'")?,
        Mention::Keywords(found) => writeln!(out, "\nFound keyword terms: {}", found.join(", "))?,
        Mention::Nothing => writeln!(out, "\nNo target document or keyword terms found in response")?,
    }
    Ok(())
}

pub fn write_search_report<W: Write>(
    out: &mut W,
    summary: &SearchSummary,
    target: Option<&str>,
) -> Result<()> {
    writeln!(out, "Found {} results", summary.total)?;

    writeln!(out, "\nFound {} unique documents:", summary.sources.len())?;
    for (source, chunks) in &summary.sources {
        writeln!(out, "- {source} ({chunks} chunks)")?;
    }

    if let (Some(target), Some(found)) = (target, summary.target_found) {
        if found {
            writeln!(out, "\nFound target document '{target}'")?;
            if let Some(sample) = &summary.target_sample {
                writeln!(out, "Sample content: {}", snippet(sample, SAMPLE_CHARS))?;
            }
        } else {
            writeln!(out, "\nWARNING: Target document '{target}' NOT FOUND in results")?;
        }
    }
    Ok(())
}

/// First `max` characters, with an ellipsis when something was cut.
pub fn snippet(content: &str, max: usize) -> String {
    match content.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
