//! One in-memory screening session: the file registry, the current job, the
//! stored results, and the engagement panel.
//!
//! Each piece of state has its own lock and no lock is held across a request
//! to the screening service. `is_analyzing` / `is_engaging` reject a second
//! submission while one is in flight.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::engagement::{build_request, fetch_engagement, EngagementContent, EngagementState, Tab};
use crate::errors::AppError;
use crate::fault::{Boundary, Rendered};
use crate::registry::{FileId, FileRecord, FileRegistry, ResumeFile};
use crate::render::{render_card, render_engagement, EngagementView, ResultCard};
use crate::screening::coordinator;
use crate::screening::recommendation::revalidate;
use crate::screening::{AnalysisResult, JobDescriptor};
use crate::service_client::ScreeningService;
use crate::upload::upload_pending;

const ENGAGEMENT_RENDER_KEY: &str = "engagement";

/// Stored results of the latest batch, in input order.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: Vec<AnalysisResult>,
}

impl ResultStore {
    /// Replaces the collection after one last score → label sweep.
    pub fn replace(&mut self, mut results: Vec<AnalysisResult>) {
        revalidate(&mut results);
        self.results = results;
    }

    pub fn get(&self, id: FileId) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn remove(&mut self, id: FileId) -> bool {
        let before = self.results.len();
        self.results.retain(|r| r.id != id);
        self.results.len() != before
    }

    pub fn all(&self) -> &[AnalysisResult] {
        &self.results
    }
}

/// Clears its flag when dropped, whichever way the guarded call exits.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool, what: &str) -> Result<Self, AppError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(AppError::Conflict(format!("{what} is already in progress")));
        }
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub uploaded: usize,
    pub upload_failed: usize,
    pub screened: usize,
    pub screen_failed: usize,
    pub results: Vec<AnalysisResult>,
}

#[derive(Default)]
pub struct Session {
    registry: Mutex<FileRegistry>,
    job: Mutex<Option<JobDescriptor>>,
    results: Mutex<ResultStore>,
    engagement: Mutex<EngagementState>,
    boundary: Mutex<Boundary>,
    analyzing: AtomicBool,
    engaging: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing.load(Ordering::SeqCst)
    }

    pub fn is_engaging(&self) -> bool {
        self.engaging.load(Ordering::SeqCst)
    }

    pub async fn add_files(&self, files: Vec<ResumeFile>) -> Vec<FileId> {
        let mut registry = self.registry.lock().await;
        let added = registry.add_files(files);
        info!("Added {} file(s), {} in session", added.len(), registry.len());
        added
    }

    pub async fn files(&self) -> Vec<FileRecord> {
        self.registry
            .lock()
            .await
            .records()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Removes a file along with its result and any engagement content for it.
    pub async fn remove_file(&self, id: FileId) -> Result<FileRecord, AppError> {
        let removed = self
            .registry
            .lock()
            .await
            .remove_file(id)
            .ok_or_else(|| AppError::NotFound(format!("File {id} not found")))?;

        self.results.lock().await.remove(id);
        self.engagement.lock().await.forget(id);
        self.boundary.lock().await.retry(&id.to_string());
        info!("Removed {} ({})", removed.name, id);
        Ok(removed)
    }

    pub async fn retry_failed_uploads(&self) -> usize {
        self.registry.lock().await.reset_errored()
    }

    pub async fn set_job(&self, job: JobDescriptor) {
        *self.job.lock().await = Some(job);
    }

    pub async fn job(&self) -> Option<JobDescriptor> {
        self.job.lock().await.clone()
    }

    async fn validated_job(&self) -> Result<JobDescriptor, AppError> {
        let job = self
            .job()
            .await
            .ok_or_else(|| AppError::Validation("Job description has not been set".to_string()))?;
        job.validate()?;
        Ok(job)
    }

    /// Uploads pending files, then screens every uploaded file. Files that
    /// failed to upload are left out; files removed mid-batch are not stored.
    pub async fn analyze(&self, service: &dyn ScreeningService) -> Result<AnalysisSummary, AppError> {
        let _busy = BusyGuard::acquire(&self.analyzing, "Analysis")?;
        let job = self.validated_job().await?;

        let upload = upload_pending(service, &self.registry).await;
        let uploaded_files = self.registry.lock().await.uploaded();
        let results = coordinator::analyze(service, &job, &uploaded_files).await?;

        {
            // Held across the store so a concurrent remove_file lands before or after it.
            let registry = self.registry.lock().await;
            let results: Vec<AnalysisResult> = results
                .into_iter()
                .filter(|r| registry.contains(r.id))
                .collect();
            self.results.lock().await.replace(results);
        }
        self.boundary.lock().await.reset();
        let stored = self.results().await;

        let screen_failed = stored.iter().filter(|r| r.error).count();
        Ok(AnalysisSummary {
            uploaded: upload.uploaded.len(),
            upload_failed: upload.failed.len(),
            screened: stored.len() - screen_failed,
            screen_failed,
            results: stored,
        })
    }

    pub async fn results(&self) -> Vec<AnalysisResult> {
        self.results.lock().await.all().to_vec()
    }

    /// Renders every stored result inside the fault boundary.
    pub async fn render_results(&self) -> Vec<Rendered<ResultCard>> {
        let results = self.results.lock().await;
        let mut boundary = self.boundary.lock().await;
        let cards: Vec<Rendered<ResultCard>> = results
            .all()
            .iter()
            .map(|result| boundary.render(&result.id.to_string(), || render_card(result)))
            .collect();
        debug!(
            "Rendered {} card(s), {} behind a retry placeholder",
            cards.len(),
            cards.iter().filter(|c| c.is_failed()).count()
        );
        cards
    }

    pub async fn retry_render(&self, key: &str) -> bool {
        self.boundary.lock().await.retry(key)
    }

    pub async fn engage(
        &self,
        service: &dyn ScreeningService,
        result_id: FileId,
        recruiter_name: &str,
    ) -> Result<EngagementContent, AppError> {
        let _busy = BusyGuard::acquire(&self.engaging, "Engagement generation")?;

        let result = self
            .results
            .lock()
            .await
            .get(result_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Result {result_id} not found")))?;
        let job = self.validated_job().await?;
        let request = build_request(&result, &job, recruiter_name)?;

        let seq = self.engagement.lock().await.begin(result.id);
        let content = fetch_engagement(service, &result, &request).await?;

        if !self.engagement.lock().await.install(seq, content.clone()) {
            return Err(AppError::Conflict(format!(
                "Engagement for {} was superseded",
                result.candidate_name
            )));
        }
        self.boundary.lock().await.retry(ENGAGEMENT_RENDER_KEY);
        Ok(content)
    }

    pub async fn select_tab(&self, tab: Tab) -> Result<(), AppError> {
        self.engagement.lock().await.select_tab(tab)
    }

    pub async fn clipboard_text(&self) -> Result<String, AppError> {
        self.engagement
            .lock()
            .await
            .clipboard_text()
            .ok_or_else(|| AppError::NotFound("No engagement content has been generated".to_string()))
    }

    pub async fn render_engagement(&self) -> Result<Rendered<EngagementView>, AppError> {
        let engagement = self.engagement.lock().await;
        let (Some(content), Some(active)) = (engagement.content(), engagement.active_package())
        else {
            return Err(AppError::NotFound(
                "No engagement content has been generated".to_string(),
            ));
        };
        let tab = engagement.tab();
        Ok(self
            .boundary
            .lock()
            .await
            .render(ENGAGEMENT_RENDER_KEY, || render_engagement(content, tab, active)))
    }
}
