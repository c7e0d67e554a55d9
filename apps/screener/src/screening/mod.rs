// Resume screening: job descriptor validation, per-resume scoring fan-out,
// tolerant response decoding and score → recommendation enforcement.

pub mod coordinator;
pub mod handlers;
pub mod payload;
pub mod recommendation;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::registry::{FileId, UploadedFile};

pub use payload::AnalysisPayload;
pub use recommendation::{is_suitable, recommendation_for, Recommendation};

/// The job a batch is screened against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDescriptor {
    pub title: String,
    pub description: String,
    pub company: String,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
}

impl JobDescriptor {
    /// Title, description and company must all be non-blank before any
    /// request is made.
    pub fn validate(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("description", &self.description),
            ("company", &self.company),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Job {} cannot be empty",
                missing.join(", ")
            )))
        }
    }
}

/// Score and derived recommendation for one resume against one job.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Id of the file record this result was produced for.
    pub id: FileId,
    pub resume_id: String,
    pub name: String,
    pub candidate_name: String,
    pub match_score: u8,
    pub recommendation: Recommendation,
    pub analysis: AnalysisPayload,
    pub suitable: bool,
    pub error: bool,
    pub error_message: Option<String>,
}

impl AnalysisResult {
    pub fn scored(
        id: FileId,
        resume_id: String,
        name: String,
        candidate_name: String,
        match_score: u8,
        analysis: AnalysisPayload,
    ) -> Self {
        Self {
            id,
            resume_id,
            name,
            candidate_name,
            match_score,
            recommendation: recommendation_for(match_score),
            analysis,
            suitable: is_suitable(match_score),
            error: false,
            error_message: None,
        }
    }

    pub fn failed(file: &UploadedFile, message: String) -> Self {
        Self {
            id: file.id,
            resume_id: file.resume_id.clone(),
            name: file.name.clone(),
            candidate_name: file
                .candidate_name
                .clone()
                .unwrap_or_else(|| file.name.clone()),
            match_score: 0,
            recommendation: recommendation_for(0),
            analysis: AnalysisPayload::Raw(String::new()),
            suitable: false,
            error: true,
            error_message: Some(message),
        }
    }
}
