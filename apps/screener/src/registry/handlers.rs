use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::registry::{FileId, FileRecord, ResumeFile};
use crate::state::AppState;

#[derive(Serialize)]
pub struct FileView {
    #[serde(flatten)]
    pub record: FileRecord,
    pub size_kb: String,
}

impl From<FileRecord> for FileView {
    fn from(record: FileRecord) -> Self {
        Self {
            size_kb: record.size_kb(),
            record,
        }
    }
}

#[derive(Serialize)]
pub struct FilesResponse {
    pub files: Vec<FileView>,
}

#[derive(Serialize)]
pub struct AddFilesResponse {
    pub added: Vec<FileId>,
}

#[derive(Serialize)]
pub struct RequeueResponse {
    pub requeued: usize,
}

/// GET /api/v1/files
pub async fn handle_list_files(State(state): State<AppState>) -> Json<FilesResponse> {
    Json(FilesResponse {
        files: state
            .session
            .files()
            .await
            .into_iter()
            .map(FileView::from)
            .collect(),
    })
}

/// POST /api/v1/files
///
/// Multipart body; every part that carries a file name becomes a pending record.
pub async fn handle_add_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AddFilesResponse>), AppError> {
    let mut selection = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let Some(name) = field.file_name().map(String::from) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        selection.push(ResumeFile {
            name,
            content_type,
            bytes,
        });
    }

    if selection.is_empty() {
        return Err(AppError::Validation("No files were selected".to_string()));
    }

    let added = state.session.add_files(selection).await;
    Ok((StatusCode::CREATED, Json(AddFilesResponse { added })))
}

/// DELETE /api/v1/files/:id
pub async fn handle_remove_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.session.remove_file(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/files/retry-failed
///
/// Puts errored files back to pending so the next analysis uploads them again.
pub async fn handle_retry_failed(State(state): State<AppState>) -> Json<RequeueResponse> {
    Json(RequeueResponse {
        requeued: state.session.retry_failed_uploads().await,
    })
}
