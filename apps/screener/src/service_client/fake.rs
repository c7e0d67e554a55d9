//! In-memory `ScreeningService` used by orchestration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use super::{
    EngageRequest, EngageResponse, ScreenRequest, ScreenResponse, ScreeningService,
    ServiceError, UploadResponse,
};
use crate::registry::ResumeFile;

#[derive(Default)]
pub struct FakeService {
    pub uploads: AtomicUsize,
    pub screens: AtomicUsize,
    pub engages: AtomicUsize,
    pub screen_requests: Mutex<Vec<ScreenRequest>>,
    failing_uploads: HashSet<String>,
    parse_errors: HashSet<String>,
    upload_gate: Option<Arc<Notify>>,
    screen_bodies: HashMap<String, Value>,
    screen_delays: HashMap<String, Duration>,
    failing_screens: HashSet<String>,
    engage_delays: HashMap<String, Duration>,
    engage_body: Option<Value>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resume id the fake assigns to an uploaded file name.
    pub fn resume_id_for(name: &str) -> String {
        format!("r-{name}")
    }

    pub fn fail_upload(mut self, name: &str) -> Self {
        self.failing_uploads.insert(name.to_string());
        self
    }

    pub fn parse_error_on(mut self, name: &str) -> Self {
        self.parse_errors.insert(name.to_string());
        self
    }

    /// Every upload waits for one permit on `gate` before responding.
    pub fn gate_uploads(mut self, gate: Arc<Notify>) -> Self {
        self.upload_gate = Some(gate);
        self
    }

    pub fn screen_body(mut self, resume_id: &str, body: Value) -> Self {
        self.screen_bodies.insert(resume_id.to_string(), body);
        self
    }

    pub fn screen_delay(mut self, resume_id: &str, delay: Duration) -> Self {
        self.screen_delays.insert(resume_id.to_string(), delay);
        self
    }

    pub fn fail_screen(mut self, resume_id: &str) -> Self {
        self.failing_screens.insert(resume_id.to_string());
        self
    }

    pub fn engage_delay(mut self, candidate_id: &str, delay: Duration) -> Self {
        self.engage_delays.insert(candidate_id.to_string(), delay);
        self
    }

    /// Replaces the generated envelope for every engage call.
    pub fn engage_body(mut self, body: Value) -> Self {
        self.engage_body = Some(body);
        self
    }
}

fn package(kind: &str, name: &str) -> Value {
    json!({
        "email": {
            "subject": format!("{kind} subject for {name}"),
            "body": format!("{kind} body for {name}")
        },
        "linkedin_message": format!("{kind} LinkedIn note for {name}")
    })
}

#[async_trait]
impl ScreeningService for FakeService {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<UploadResponse, ServiceError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.upload_gate {
            gate.notified().await;
        }
        if self.failing_uploads.contains(&file.name) {
            return Err(ServiceError::Api {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }

        let stem = file.name.rsplit_once('.').map_or(file.name.as_str(), |(s, _)| s);
        let parse_error = self
            .parse_errors
            .contains(&file.name)
            .then(|| "no extractable text".to_string());
        Ok(UploadResponse {
            success: Some(true),
            resume_id: Some(Self::resume_id_for(&file.name)),
            candidate_name: parse_error.is_none().then(|| stem.to_string()),
            candidate_info: Some(json!({ "candidate_name": stem })),
            parse_error,
            message: None,
        })
    }

    async fn screen(&self, request: &ScreenRequest) -> Result<ScreenResponse, ServiceError> {
        self.screens.fetch_add(1, Ordering::SeqCst);
        self.screen_requests
            .lock()
            .expect("screen request log poisoned")
            .push(request.clone());

        let resume_id = request.resumes.first().cloned().unwrap_or_default();
        if let Some(delay) = self.screen_delays.get(&resume_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_screens.contains(&resume_id) {
            return Err(ServiceError::Api {
                status: 502,
                message: "Bad Gateway".to_string(),
            });
        }

        let body = self.screen_bodies.get(&resume_id).cloned().unwrap_or_else(|| {
            json!({
                "results": [{
                    "candidate_name": resume_id,
                    "match_score": 70,
                    "analysis": { "summary": "Solid background." }
                }]
            })
        });
        Ok(serde_json::from_value(body)?)
    }

    async fn engage(&self, request: &EngageRequest) -> Result<EngageResponse, ServiceError> {
        self.engages.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.engage_delays.get(&request.candidate_id) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(body) = &self.engage_body {
            return Ok(serde_json::from_value(body.clone())?);
        }

        let name = &request.candidate_name;
        Ok(serde_json::from_value(json!({
            "success": true,
            "is_acceptance": request.is_suitable,
            "acceptance": package("Acceptance", name),
            "rejection": package("Rejection", name)
        }))?)
    }
}
