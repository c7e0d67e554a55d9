//! Schema-tolerant decoding of screening responses.
//!
//! The scoring service does not guarantee its shapes: `analysis` arrives as
//! either an object or a JSON-encoded (sometimes fenced) string, and
//! `match_score` may sit on the result or inside the analysis, or be absent.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::service_client::ScreenResponse;

/// Score assumed when the service does not provide a usable one.
pub const DEFAULT_MATCH_SCORE: u8 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnalysisPayload {
    /// Free text that could not be parsed as JSON.
    Raw(String),
    Structured(Value),
}

impl AnalysisPayload {
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            AnalysisPayload::Structured(value) => value.get(name),
            AnalysisPayload::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Screening response did not include any results")]
    MissingResults,

    #[error("Screening result did not include an analysis")]
    MissingAnalysis,

    #[error("Screening failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEntry {
    pub candidate_name: Option<String>,
    pub match_score: u8,
    pub analysis: AnalysisPayload,
}

/// Decodes a single-resume screening response.
pub fn decode_response(response: ScreenResponse) -> Result<DecodedEntry, DecodeError> {
    let entry = response
        .results
        .and_then(|results| results.into_iter().next())
        .ok_or(DecodeError::MissingResults)?;
    decode_entry(&entry)
}

pub fn decode_entry(entry: &Value) -> Result<DecodedEntry, DecodeError> {
    if entry.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = entry
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(DecodeError::Failed(reason.to_string()));
    }

    let analysis = match entry.get("analysis") {
        None | Some(Value::Null) => return Err(DecodeError::MissingAnalysis),
        Some(value) => decode_analysis(value),
    };

    let match_score = entry
        .get("match_score")
        .or_else(|| analysis.field("match_score"))
        .and_then(decode_score)
        .unwrap_or(DEFAULT_MATCH_SCORE);

    let candidate_name = non_empty_str(entry.get("candidate_name"))
        .or_else(|| non_empty_str(analysis.field("candidate_name")));

    Ok(DecodedEntry {
        candidate_name,
        match_score,
        analysis,
    })
}

/// Strings are parsed as JSON where possible and kept raw otherwise.
pub fn decode_analysis(value: &Value) -> AnalysisPayload {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(strip_code_fences(text)) {
            Ok(parsed @ (Value::Object(_) | Value::Array(_))) => AnalysisPayload::Structured(parsed),
            _ => AnalysisPayload::Raw(text.clone()),
        },
        other => AnalysisPayload::Structured(other.clone()),
    }
}

/// Accepts numbers and numeric strings ("72", "72.5%"); rounds and clamps
/// into 0..=100. Anything else is unusable.
pub fn decode_score(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Strips ```json ... ``` or ``` ... ``` fences around model output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}
