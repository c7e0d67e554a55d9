//! Screening Coordinator: scores every uploaded resume against one job.
//!
//! Flow: validate job → one request per resume, all in flight at once →
//! decode each response → AnalysisResult (ok or error card).
//!
//! A failed request never aborts the batch. Output order matches input
//! order regardless of which request finishes first.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::registry::UploadedFile;
use crate::screening::payload::decode_response;
use crate::screening::{AnalysisResult, JobDescriptor};
use crate::service_client::{ScreenRequest, ScreeningService};

pub async fn analyze(
    service: &dyn ScreeningService,
    job: &JobDescriptor,
    files: &[UploadedFile],
) -> Result<Vec<AnalysisResult>, AppError> {
    job.validate()?;
    if files.is_empty() {
        return Err(AppError::Validation(
            "No uploaded resumes to analyze".to_string(),
        ));
    }

    info!("Screening {} resume(s) for '{}'", files.len(), job.title);

    let requests: Vec<_> = files
        .iter()
        .enumerate()
        .map(|(idx, file)| async move { (idx, screen_one(service, job, file).await) })
        .collect();
    let mut settled: Vec<(usize, AnalysisResult)> = stream::iter(requests)
        .buffer_unordered(files.len())
        .collect()
        .await;
    settled.sort_by_key(|(idx, _)| *idx);
    let results: Vec<AnalysisResult> = settled.into_iter().map(|(_, result)| result).collect();

    let failed = results.iter().filter(|r| r.error).count();
    info!(
        screened = results.len() - failed,
        failed, "Screening batch settled"
    );
    Ok(results)
}

async fn screen_one(
    service: &dyn ScreeningService,
    job: &JobDescriptor,
    file: &UploadedFile,
) -> AnalysisResult {
    let request = ScreenRequest {
        job_title: job.title.clone(),
        job_description: job.description.clone(),
        company: job.company.clone(),
        resumes: vec![file.resume_id.clone()],
    };

    let decoded = match service.screen(&request).await {
        Ok(response) => decode_response(response).map_err(|e| e.to_string()),
        Err(e) => Err(format!("Failed to screen resume: {e}")),
    };

    match decoded {
        Ok(entry) => {
            let candidate_name = entry
                .candidate_name
                .or_else(|| file.candidate_name.clone())
                .unwrap_or_else(|| file.name.clone());
            AnalysisResult::scored(
                file.id,
                file.resume_id.clone(),
                file.name.clone(),
                candidate_name,
                entry.match_score,
                entry.analysis,
            )
        }
        Err(message) => {
            warn!("Screening {} failed: {message}", file.name);
            AnalysisResult::failed(file, message)
        }
    }
}
