use axum::{extract::Multipart, Json};
use serde::Deserialize;
use tracing::info;

use crate::documents::extract_text;
use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::parser::segmenter::Sections;
use crate::parser::{parse_resume, parse_sections};

const UPLOAD_FIELD: &str = "file";

#[derive(Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

/// POST /api/v1/parse
pub async fn handle_parse(Json(req): Json<ParseRequest>) -> Result<Json<ResumeRecord>, AppError> {
    let record = parse_resume(&req.text)?;
    require_signal(record).map(Json)
}

/// POST /api/v1/parse/sections
pub async fn handle_sections(Json(req): Json<ParseRequest>) -> Result<Json<Sections>, AppError> {
    Ok(Json(parse_sections(&req.text)?))
}

/// POST /api/v1/parse/upload
pub async fn handle_upload(mut multipart: Multipart) -> Result<Json<ResumeRecord>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        upload = Some((data, file_name, content_type));
        break;
    }

    let (data, file_name, content_type) = upload.ok_or_else(|| {
        AppError::Validation(format!("multipart field '{UPLOAD_FIELD}' is required"))
    })?;
    if data.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }
    info!(
        file_name = file_name.as_deref().unwrap_or("-"),
        size = data.len(),
        "parsing uploaded résumé"
    );

    // Decoding and parsing are CPU-bound; run them on the blocking pool.
    let record = tokio::task::spawn_blocking(move || -> Result<ResumeRecord, AppError> {
        let text = extract_text(&data, file_name.as_deref(), content_type.as_deref())?;
        if text.trim().is_empty() {
            return Err(AppError::Extraction(
                "document contains no extractable text".to_string(),
            ));
        }
        Ok(parse_resume(&text)?)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in upload parse: {e}")))??;

    require_signal(record).map(Json)
}

/// A record without any typed section must not replace data the caller already holds.
fn require_signal(record: ResumeRecord) -> Result<ResumeRecord, AppError> {
    if !record.has_signal() {
        return Err(AppError::UnprocessableEntity(
            "No education, experience, project or skill sections were recognised; keep the existing data"
                .to_string(),
        ));
    }
    info!(
        education = record.education.len(),
        experience = record.experience.len(),
        projects = record.projects.len(),
        skills = record.skills.len(),
        "résumé parsed"
    );
    Ok(record)
}
