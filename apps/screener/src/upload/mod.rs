//! Upload Orchestrator: sends every pending resume to the service at once.
//!
//! Each file is isolated: one failed upload marks only its own record as
//! errored, and the batch reports whatever subset succeeded.

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::registry::{FileId, FileRegistry, UploadOutcome, UploadTicket, WriteBack};
use crate::service_client::{ScreeningService, ServiceError, UploadResponse};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<FileId>,
    pub failed: Vec<FileId>,
    /// Results dropped because their record was removed or re-queued mid-flight.
    pub discarded: usize,
}

/// Uploads one file and maps the response onto an outcome. Never errors:
/// failures become `UploadOutcome::Failed`.
pub async fn upload_one(service: &dyn ScreeningService, ticket: &UploadTicket) -> UploadOutcome {
    match service.upload_resume(&ticket.file).await {
        Ok(response) => outcome_from_response(response),
        Err(e) => {
            warn!("Upload of {} failed: {e}", ticket.file.name);
            UploadOutcome::Failed {
                message: failure_message(&e),
            }
        }
    }
}

fn outcome_from_response(response: UploadResponse) -> UploadOutcome {
    let Some(resume_id) = response.resume_id.filter(|id| !id.trim().is_empty()) else {
        return UploadOutcome::Failed {
            message: "Upload response did not include a resume id".to_string(),
        };
    };

    if let Some(parse_error) = &response.parse_error {
        warn!("Resume {resume_id} stored but could not be parsed: {parse_error}");
    }

    UploadOutcome::Uploaded {
        resume_id,
        candidate_name: response.candidate_name,
        candidate_info: response.candidate_info,
        warning: response
            .parse_error
            .map(|e| format!("Resume uploaded but could not be fully parsed: {e}")),
    }
}

fn failure_message(error: &ServiceError) -> String {
    match error {
        ServiceError::Api { status, message } if message.trim().is_empty() => {
            format!("Failed to upload resume (status {status})")
        }
        ServiceError::Api { status, message } => format!("{message} (status {status})"),
        ServiceError::Rejected(message) => message.clone(),
        other => format!("Failed to upload resume: {other}"),
    }
}

/// Fans out over every pending record and writes each outcome back as soon as
/// it arrives. The registry lock is never held across a request.
pub async fn upload_pending(
    service: &dyn ScreeningService,
    registry: &Mutex<FileRegistry>,
) -> UploadReport {
    let tickets: Vec<UploadTicket> = {
        let mut registry = registry.lock().await;
        registry
            .uploadable()
            .into_iter()
            .filter_map(|id| registry.begin_upload(id))
            .collect()
    };

    if tickets.is_empty() {
        return UploadReport::default();
    }
    let in_flight = tickets.len();
    info!("Uploading {in_flight} resume(s)");

    let mut settled: Vec<(usize, FileId, bool, WriteBack)> =
        stream::iter(tickets.into_iter().enumerate())
            .map(|(idx, ticket)| async move {
                let outcome = upload_one(service, &ticket).await;
                let succeeded = matches!(outcome, UploadOutcome::Uploaded { .. });
                let write_back = registry
                    .lock()
                    .await
                    .apply(ticket.id, ticket.generation, outcome);
                (idx, ticket.id, succeeded, write_back)
            })
            .buffer_unordered(in_flight)
            .collect()
            .await;
    // Report in selection order.
    settled.sort_by_key(|(idx, ..)| *idx);

    let mut report = UploadReport::default();
    for (_, id, succeeded, write_back) in settled {
        match (write_back, succeeded) {
            (WriteBack::Applied, true) => report.uploaded.push(id),
            (WriteBack::Applied, false) => report.failed.push(id),
            _ => report.discarded += 1,
        }
    }

    info!(
        uploaded = report.uploaded.len(),
        failed = report.failed.len(),
        discarded = report.discarded,
        "Upload batch settled"
    );
    report
}
