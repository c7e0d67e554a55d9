use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engagement::Tab;
use crate::errors::AppError;
use crate::fault::Rendered;
use crate::render::EngagementView;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EngageRequestBody {
    pub result_id: Uuid,
    pub recruiter_name: String,
}

#[derive(Deserialize)]
pub struct SelectTabRequest {
    pub tab: Tab,
}

#[derive(Serialize)]
pub struct ClipboardResponse {
    pub text: String,
}

/// POST /api/v1/engage
pub async fn handle_engage(
    State(state): State<AppState>,
    Json(req): Json<EngageRequestBody>,
) -> Result<Json<Rendered<EngagementView>>, AppError> {
    state
        .session
        .engage(state.service.as_ref(), req.result_id, &req.recruiter_name)
        .await?;
    Ok(Json(state.session.render_engagement().await?))
}

/// GET /api/v1/engagement
pub async fn handle_get_engagement(
    State(state): State<AppState>,
) -> Result<Json<Rendered<EngagementView>>, AppError> {
    Ok(Json(state.session.render_engagement().await?))
}

/// PUT /api/v1/engagement/tab
pub async fn handle_select_tab(
    State(state): State<AppState>,
    Json(req): Json<SelectTabRequest>,
) -> Result<Json<Rendered<EngagementView>>, AppError> {
    state.session.select_tab(req.tab).await?;
    Ok(Json(state.session.render_engagement().await?))
}

/// GET /api/v1/engagement/clipboard
pub async fn handle_clipboard(
    State(state): State<AppState>,
) -> Result<Json<ClipboardResponse>, AppError> {
    Ok(Json(ClipboardResponse {
        text: state.session.clipboard_text().await?,
    }))
}
