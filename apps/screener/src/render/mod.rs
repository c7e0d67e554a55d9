//! View models for result cards and the engagement panel.
//!
//! Structured analysis payloads come from a model and are only loosely
//! shaped. Fields that are absent render as empty; fields present with the
//! wrong shape are a `RenderError`, which the caller contains with a
//! `fault::Boundary`.

use serde::Serialize;
use serde_json::Value;

use crate::engagement::{EngagementContent, MessagePackage, Tab};
use crate::fault::RenderError;
use crate::registry::FileId;
use crate::screening::{AnalysisPayload, AnalysisResult, Recommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBadge {
    Strong,
    Moderate,
    Weak,
}

impl MatchBadge {
    pub fn for_score(score: u8) -> Self {
        match score {
            80.. => MatchBadge::Strong,
            70..=79 => MatchBadge::Moderate,
            _ => MatchBadge::Weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub requirement: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultCard {
    pub id: FileId,
    pub name: String,
    pub candidate_name: String,
    pub match_score: u8,
    pub badge: MatchBadge,
    pub recommendation: Recommendation,
    pub suitable: bool,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub top_matches: Vec<Highlight>,
    pub gaps: Vec<Highlight>,
    pub error_message: Option<String>,
}

pub fn render_card(result: &AnalysisResult) -> Result<ResultCard, RenderError> {
    let mut card = ResultCard {
        id: result.id,
        name: result.name.clone(),
        candidate_name: result.candidate_name.clone(),
        match_score: result.match_score,
        badge: MatchBadge::for_score(result.match_score),
        recommendation: result.recommendation,
        suitable: result.suitable,
        summary: None,
        skills: vec![],
        top_matches: vec![],
        gaps: vec![],
        error_message: result.error_message.clone(),
    };
    if result.error {
        return Ok(card);
    }

    match &result.analysis {
        AnalysisPayload::Raw(text) => {
            card.summary = Some(text.trim().to_string()).filter(|s| !s.is_empty());
        }
        AnalysisPayload::Structured(value) => {
            card.summary = optional_str(value, "summary")?;
            card.skills = string_list(value, "skills")?;
            card.top_matches = highlights(value, "top_matches", "match")?;
            card.gaps = highlights(value, "gaps", "gap")?;
        }
    }
    Ok(card)
}

fn optional_str(value: &Value, field: &str) -> Result<Option<String>, RenderError> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RenderError::malformed(field, "expected a string")),
    }
}

fn string_list(value: &Value, field: &str) -> Result<Vec<String>, RenderError> {
    let Some(items) = array_field(value, field)? else {
        return Ok(vec![]);
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| RenderError::malformed(field, "expected a list of strings"))
        })
        .collect()
}

/// `[{"requirement": .., "<detail_key>": ..}]`
fn highlights(value: &Value, field: &str, detail_key: &str) -> Result<Vec<Highlight>, RenderError> {
    let Some(items) = array_field(value, field)? else {
        return Ok(vec![]);
    };
    items
        .iter()
        .map(|item| {
            let requirement = item.get("requirement").and_then(Value::as_str);
            let detail = item.get(detail_key).and_then(Value::as_str);
            match (requirement, detail) {
                (Some(requirement), Some(detail)) => Ok(Highlight {
                    requirement: requirement.to_string(),
                    detail: detail.to_string(),
                }),
                _ => Err(RenderError::malformed(
                    field,
                    format!("each entry needs 'requirement' and '{detail_key}'"),
                )),
            }
        })
        .collect()
}

fn array_field<'a>(value: &'a Value, field: &str) -> Result<Option<&'a Vec<Value>>, RenderError> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(RenderError::malformed(field, "expected an array")),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementView {
    pub candidate_name: String,
    pub tab: Tab,
    pub is_acceptance_default: bool,
    pub active: MessagePackage,
    pub acceptance: MessagePackage,
    pub rejection: MessagePackage,
}

pub fn render_engagement(
    content: &EngagementContent,
    tab: Tab,
    active: &MessagePackage,
) -> Result<EngagementView, RenderError> {
    for (field, package) in [
        ("acceptance", &content.acceptance),
        ("rejection", &content.rejection),
    ] {
        if package.subject.trim().is_empty() && package.body.trim().is_empty() {
            return Err(RenderError::malformed(field, "email has no subject or body"));
        }
    }
    Ok(EngagementView {
        candidate_name: content.candidate_name.clone(),
        tab,
        is_acceptance_default: content.is_acceptance_default,
        active: active.clone(),
        acceptance: content.acceptance.clone(),
        rejection: content.rejection.clone(),
    })
}
