/// Service Client: the single point of entry for all calls to the resume
/// screening service (upload, screen, engage).
///
/// ARCHITECTURAL RULE: no other module talks to the screening service over
/// HTTP. Orchestration code depends on the `ScreeningService` trait so it can
/// be driven by an in-memory fake in tests.
///
/// There is no retry here. Every failure is reported once and recovery is
/// left to the user.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::registry::ResumeFile;

pub mod wire;

#[cfg(test)]
pub mod fake;

pub use wire::{EngageRequest, EngageResponse, ScreenRequest, ScreenResponse, UploadResponse};

const UPLOAD_PATH: &str = "/api/resume/upload";
const SCREEN_PATH: &str = "/api/resume/screen";
const ENGAGE_PATH: &str = "/api/resume/engage";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Service rejected the request: {0}")]
    Rejected(String),
}

/// The three operations the pipeline needs from the external service.
#[async_trait]
pub trait ScreeningService: Send + Sync {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<UploadResponse, ServiceError>;

    async fn screen(&self, request: &ScreenRequest) -> Result<ScreenResponse, ServiceError>;

    async fn engage(&self, request: &EngageRequest) -> Result<EngageResponse, ServiceError>;
}

/// FastAPI-style error body. The service uses `detail` for HTTP errors and
/// `message` for `success: false` envelopes.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

/// reqwest-backed implementation of `ScreeningService`.
#[derive(Clone)]
pub struct ScreeningClient {
    client: Client,
    base_url: String,
}

impl ScreeningClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl ScreeningService for ScreeningClient {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<UploadResponse, ServiceError> {
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new().part("file", part);

        debug!("Uploading {} ({} bytes)", file.name, file.bytes.len());

        let response = self
            .client
            .post(self.url(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;

        let upload: UploadResponse = read_json(response).await?;
        if upload.success == Some(false) {
            return Err(ServiceError::Rejected(
                upload
                    .message
                    .unwrap_or_else(|| "Failed to upload resume".to_string()),
            ));
        }
        Ok(upload)
    }

    async fn screen(&self, request: &ScreenRequest) -> Result<ScreenResponse, ServiceError> {
        debug!(
            "Screening {} resume(s) for '{}'",
            request.resumes.len(),
            request.job_title
        );
        self.post_json(SCREEN_PATH, request).await
    }

    async fn engage(&self, request: &EngageRequest) -> Result<EngageResponse, ServiceError> {
        debug!("Requesting engagement content for {}", request.candidate_name);
        let engagement: EngageResponse = self.post_json(ENGAGE_PATH, request).await?;
        if engagement.success == Some(false) {
            return Err(ServiceError::Rejected(engagement.message.unwrap_or_else(
                || "Failed to generate engagement content".to_string(),
            )));
        }
        Ok(engagement)
    }
}

/// Non-2xx statuses and undecodable bodies are both request failures.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|e| e.detail.or(e.message))
            .unwrap_or(body);
        return Err(ServiceError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(ServiceError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ScreeningClient {
        ScreeningClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn resume(name: &str) -> ResumeFile {
        ResumeFile {
            name: name.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4 fake"),
        }
    }

    #[tokio::test]
    async fn test_upload_success_parses_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPLOAD_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "resume_id": "r1",
                "candidate_name": "Ada Lovelace",
                "candidate_info": {"skills": ["math"]}
            })))
            .mount(&server)
            .await;

        let upload = client_for(&server)
            .upload_resume(&resume("ada.pdf"))
            .await
            .unwrap();
        assert_eq!(upload.resume_id.as_deref(), Some("r1"));
        assert_eq!(upload.candidate_name.as_deref(), Some("Ada Lovelace"));
        assert!(upload.parse_error.is_none());
    }

    #[tokio::test]
    async fn test_upload_http_500_surfaces_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPLOAD_PATH))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"detail": "disk full"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .upload_resume(&resume("ada.pdf"))
            .await
            .unwrap_err();
        match err {
            ServiceError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "disk full");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_success_false_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPLOAD_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Unsupported file format: .txt"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .upload_resume(&resume("notes.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(ref m) if m.contains(".txt")));
    }

    #[tokio::test]
    async fn test_non_json_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SCREEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let request = ScreenRequest {
            job_title: "Engineer".to_string(),
            job_description: "Build things".to_string(),
            company: "Acme".to_string(),
            resumes: vec!["r1".to_string()],
        };
        let err = client_for(&server).screen(&request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_screen_sends_flat_job_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SCREEN_PATH))
            .and(body_json(json!({
                "job_title": "Engineer",
                "job_description": "Build things",
                "company": "Acme",
                "resumes": ["r1"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"candidate_name": "Ada", "match_score": 72, "analysis": "fine"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ScreenRequest {
            job_title: "Engineer".to_string(),
            job_description: "Build things".to_string(),
            company: "Acme".to_string(),
            resumes: vec!["r1".to_string()],
        };
        let response = client_for(&server).screen(&request).await.unwrap();
        assert_eq!(response.results.map(|r| r.len()), Some(1));
    }

    #[tokio::test]
    async fn test_engage_omits_absent_optional_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENGAGE_PATH))
            .and(body_json(json!({
                "candidate_id": "r1",
                "candidate_name": "Ada",
                "job_title": "Engineer",
                "job_description": "Build things",
                "company_name": "Acme",
                "recruiter_name": "Grace",
                "match_score": 72,
                "recommendation": "Recommended",
                "is_suitable": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "is_acceptance": true,
                "acceptance": {"email": {"subject": "Hi", "body": "Come in"}, "linkedin_message": "Hey"},
                "rejection": {"email": {"subject": "Sorry", "body": "Not now"}, "linkedin_message": "Bye"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = EngageRequest {
            candidate_id: "r1".to_string(),
            candidate_name: "Ada".to_string(),
            job_title: "Engineer".to_string(),
            job_description: "Build things".to_string(),
            company_name: "Acme".to_string(),
            salary_range: None,
            benefits: None,
            recruiter_name: "Grace".to_string(),
            match_score: 72,
            recommendation: "Recommended".to_string(),
            is_suitable: true,
        };
        let response = client_for(&server).engage(&request).await.unwrap();
        assert_eq!(response.is_acceptance, Some(true));
        assert_eq!(
            response.rejection.map(|r| r.email.subject),
            Some("Sorry".to_string())
        );
    }

    #[tokio::test]
    async fn test_engage_success_false_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENGAGE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "Candidate not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = EngageRequest {
            candidate_id: "missing".to_string(),
            candidate_name: "Ada".to_string(),
            job_title: "Engineer".to_string(),
            job_description: "Build things".to_string(),
            company_name: "Acme".to_string(),
            salary_range: Some("100k".to_string()),
            benefits: None,
            recruiter_name: "Grace".to_string(),
            match_score: 40,
            recommendation: "Maybe".to_string(),
            is_suitable: false,
        };
        let err = client_for(&server).engage(&request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(ref m) if m == "Candidate not found"));
    }
}
