//! Engagement Generator: acceptance and rejection communications for one
//! screened candidate.
//!
//! One request returns both packages plus the service's choice of default.
//! The client never picks the default itself; it only lets the recruiter
//! override it through the tab selector. Each new engagement replaces the
//! previous one wholesale and resets the tab to `Default`.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::registry::FileId;
use crate::screening::{AnalysisResult, JobDescriptor};
use crate::service_client::wire::PackageWire;
use crate::service_client::{EngageRequest, ScreeningService, ServiceError};

pub mod handlers;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePackage {
    pub subject: String,
    pub body: String,
    pub linkedin_message: String,
}

impl From<PackageWire> for MessagePackage {
    fn from(wire: PackageWire) -> Self {
        Self {
            subject: wire.email.subject,
            body: wire.email.body,
            linkedin_message: wire.linkedin_message,
        }
    }
}

impl MessagePackage {
    /// Text placed on the clipboard: subject, email body, LinkedIn message.
    pub fn clipboard_text(&self) -> String {
        format!(
            "Subject: {}\n\n{}\n\nLinkedIn Message:\n{}",
            self.subject, self.body, self.linkedin_message
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementContent {
    pub candidate_id: FileId,
    pub candidate_name: String,
    pub is_acceptance_default: bool,
    pub acceptance: MessagePackage,
    pub rejection: MessagePackage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Default,
    Acceptance,
    Rejection,
}

/// Engagement panel state: the current content, the selected tab, and a
/// request counter so only the most recently issued request may write back.
#[derive(Debug, Default)]
pub struct EngagementState {
    content: Option<EngagementContent>,
    tab: Tab,
    latest_request: u64,
    /// Candidate of the latest request while it has not installed yet.
    in_flight: Option<FileId>,
}

impl EngagementState {
    /// Registers a new request for `candidate_id` and returns its sequence number.
    pub fn begin(&mut self, candidate_id: FileId) -> u64 {
        self.latest_request += 1;
        self.in_flight = Some(candidate_id);
        self.latest_request
    }

    /// Installs content if `request` is still the latest one issued.
    pub fn install(&mut self, request: u64, content: EngagementContent) -> bool {
        if request != self.latest_request {
            warn!(
                "Dropping engagement content for {} from superseded request",
                content.candidate_name
            );
            return false;
        }
        self.content = Some(content);
        self.tab = Tab::Default;
        self.in_flight = None;
        true
    }

    pub fn content(&self) -> Option<&EngagementContent> {
        self.content.as_ref()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: Tab) -> Result<(), AppError> {
        if self.content.is_none() {
            return Err(AppError::NotFound(
                "No engagement content has been generated".to_string(),
            ));
        }
        self.tab = tab;
        Ok(())
    }

    /// The package the active tab shows; `Default` follows the service's choice.
    pub fn active_package(&self) -> Option<&MessagePackage> {
        let content = self.content.as_ref()?;
        let acceptance = match self.tab {
            Tab::Default => content.is_acceptance_default,
            Tab::Acceptance => true,
            Tab::Rejection => false,
        };
        Some(if acceptance {
            &content.acceptance
        } else {
            &content.rejection
        })
    }

    pub fn clipboard_text(&self) -> Option<String> {
        self.active_package().map(MessagePackage::clipboard_text)
    }

    /// Drops content for a candidate that no longer exists and fences out
    /// a request still in flight for that same candidate.
    pub fn forget(&mut self, candidate_id: FileId) {
        if self
            .content
            .as_ref()
            .is_some_and(|c| c.candidate_id == candidate_id)
        {
            self.content = None;
            self.tab = Tab::Default;
        }
        if self.in_flight == Some(candidate_id) {
            self.latest_request += 1;
            self.in_flight = None;
        }
    }
}

/// Builds the engage request, refusing blank recruiter names and error cards.
pub fn build_request(
    result: &AnalysisResult,
    job: &JobDescriptor,
    recruiter_name: &str,
) -> Result<EngageRequest, AppError> {
    let recruiter_name = recruiter_name.trim();
    if recruiter_name.is_empty() {
        return Err(AppError::Validation(
            "Recruiter name cannot be empty".to_string(),
        ));
    }
    if result.error {
        return Err(AppError::Validation(format!(
            "{} could not be screened and cannot be engaged",
            result.name
        )));
    }
    job.validate()?;

    Ok(EngageRequest {
        candidate_id: result.resume_id.clone(),
        candidate_name: result.candidate_name.clone(),
        job_title: job.title.clone(),
        job_description: job.description.clone(),
        company_name: job.company.clone(),
        salary_range: non_blank(job.salary_range.as_deref()),
        benefits: non_blank(job.benefits.as_deref()),
        recruiter_name: recruiter_name.to_string(),
        match_score: result.match_score,
        recommendation: result.recommendation.to_string(),
        is_suitable: result.suitable,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Issues the combined request and requires both packages and the default.
pub async fn fetch_engagement(
    service: &dyn ScreeningService,
    result: &AnalysisResult,
    request: &EngageRequest,
) -> Result<EngagementContent, AppError> {
    info!("Generating engagement content for {}", result.candidate_name);
    let response = service.engage(request).await?;

    let (Some(acceptance), Some(rejection), Some(is_acceptance)) =
        (response.acceptance, response.rejection, response.is_acceptance)
    else {
        return Err(AppError::Upstream(ServiceError::Rejected(
            "Engagement response is missing acceptance, rejection or default".to_string(),
        )));
    };

    Ok(EngagementContent {
        candidate_id: result.id,
        candidate_name: result.candidate_name.clone(),
        is_acceptance_default: is_acceptance,
        acceptance: acceptance.into(),
        rejection: rejection.into(),
    })
}
