//! Request and response bodies exchanged with the screening service.
//!
//! Response types are deliberately loose (`Option` everywhere, `Value` for
//! screening results): the service's shapes are not guaranteed and the
//! pipeline decides what a missing field means.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    pub success: Option<bool>,
    pub resume_id: Option<String>,
    pub candidate_name: Option<String>,
    pub candidate_info: Option<Value>,
    /// Set when the file was stored but text extraction failed.
    pub parse_error: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenRequest {
    pub job_title: String,
    pub job_description: String,
    pub company: String,
    pub resumes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreenResponse {
    /// Each entry is decoded by `screening::payload`, never trusted as-is.
    pub results: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngageRequest {
    pub candidate_id: String,
    pub candidate_name: String,
    pub job_title: String,
    pub job_description: String,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,
    pub recruiter_name: String,
    pub match_score: u8,
    pub recommendation: String,
    pub is_suitable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailWire {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageWire {
    pub email: EmailWire,
    pub linkedin_message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngageResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub is_acceptance: Option<bool>,
    pub acceptance: Option<PackageWire>,
    pub rejection: Option<PackageWire>,
}
