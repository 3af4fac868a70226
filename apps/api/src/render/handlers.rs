use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::state::AppState;

/// POST /api/v1/render
pub async fn handle_render(
    State(state): State<AppState>,
    Json(record): Json<ResumeRecord>,
) -> Result<Response, AppError> {
    let renderer = state.renderer.as_ref().ok_or(AppError::RenderUnavailable)?;
    let pdf = renderer.render(&record).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"resume.pdf\""),
        ],
        pdf,
    )
        .into_response())
}
