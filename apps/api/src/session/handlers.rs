use std::collections::HashSet;

use axum::{
    body::Bytes,
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{self, ExtractError, UploadedFile, MAX_UPLOAD_BYTES};
use crate::sections::{parse_resume_text, ResumeSection};
use crate::session::load_session;
use crate::session::models::{Slot, Stage, TailorSession};
use crate::session::store::save_slots;
use crate::state::AppState;

/// Multipart field carrying the résumé file.
const UPLOAD_FIELD: &str = "file";

#[derive(Deserialize)]
pub struct ParseTextRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct SectionsResponse {
    pub sections: Vec<ResumeSection>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub session_id: Uuid,
    pub file_name: String,
    pub sections: Vec<ResumeSection>,
    pub stage: Stage,
    pub next: &'static str,
}

#[derive(Deserialize)]
pub struct JobDescriptionRequest {
    pub job_description: String,
}

#[derive(Serialize)]
pub struct StageResponse {
    pub session_id: Uuid,
    pub stage: Stage,
    pub next: &'static str,
}

#[derive(Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub file_name: Option<String>,
    pub job_description: Option<String>,
    pub stage: Stage,
    pub sections: Vec<ResumeSection>,
}

impl From<TailorSession> for SessionView {
    fn from(session: TailorSession) -> Self {
        Self {
            session_id: session.id,
            stage: session.stage(),
            file_name: session.file_name,
            job_description: session.job_description,
            sections: session.sections,
        }
    }
}

#[derive(Deserialize)]
pub struct SectionEditRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub session_id: Uuid,
    pub preview: String,
}

#[derive(Default, Deserialize)]
pub struct FinalizeRequest {
    pub sections: Option<Vec<ResumeSection>>,
}

#[derive(Serialize)]
pub struct FinalizeResponse {
    pub session_id: Uuid,
    pub sections: Vec<ResumeSection>,
    pub finalized_at: DateTime<Utc>,
    pub stage: Stage,
    pub next: &'static str,
}

/// POST /api/v1/resumes/parse
pub async fn handle_parse_text(Json(req): Json<ParseTextRequest>) -> Json<SectionsResponse> {
    Json(SectionsResponse {
        sections: parse_resume_text(&req.text),
    })
}

/// POST /api/v1/sessions
///
/// Accepts a multipart upload (field `file`), extracts and sections the text,
/// and opens a new session at the job-description stage.
#[tracing::instrument(skip(state, multipart))]
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut upload = None;
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let mut file = UploadedFile {
            name: field.file_name().unwrap_or("resume").to_string(),
            size: 0,
            mime: field.content_type().map(String::from),
        };
        // Reject the type before reading the body.
        extraction::resolve_kind(&file)?;

        let data = read_field_limited(&mut field).await?;
        file.size = data.len() as u64;
        upload = Some((file, data));
        break;
    }

    let (file, data) = upload.ok_or_else(|| {
        AppError::Validation(format!("No file uploaded; expected multipart field '{UPLOAD_FIELD}'"))
    })?;

    let text = extraction::extract_text(&file, data).await?;
    let session = TailorSession::from_upload(file.name.clone(), text);
    save_slots(
        state.store.as_ref(),
        &session,
        &[Slot::ResumeFileName, Slot::ResumeText, Slot::ResumeSections],
    )
    .await?;

    info!(
        session_id = %session.id,
        file_name = %file.name,
        sections = session.sections.len(),
        "Resume uploaded and parsed"
    );

    let stage = session.stage();
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            session_id: session.id,
            file_name: file.name,
            sections: session.sections,
            stage,
            next: stage.path(),
        }),
    ))
}

/// Buffers a multipart field, giving up as soon as it crosses the upload limit.
async fn read_field_limited(field: &mut Field<'_>) -> Result<Bytes, AppError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        let size = (buf.len() + chunk.len()) as u64;
        if size > MAX_UPLOAD_BYTES {
            return Err(ExtractError::FileTooLarge {
                size,
                limit: MAX_UPLOAD_BYTES,
            }
            .into());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// PUT /api/v1/sessions/:id/job-description
pub async fn handle_set_job_description(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<JobDescriptionRequest>,
) -> Result<Json<StageResponse>, AppError> {
    let job_description = req.job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::Validation(
            "Please enter a job description.".to_string(),
        ));
    }

    let mut session = load_session(state.store.as_ref(), id).await?;
    session.require_upload()?;
    session.job_description = Some(job_description.to_string());
    save_slots(state.store.as_ref(), &session, &[Slot::JobDescription]).await?;

    info!(session_id = %id, "Job description stored");
    let stage = session.stage();
    Ok(Json(StageResponse {
        session_id: id,
        stage,
        next: stage.path(),
    }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = load_session(state.store.as_ref(), id).await?;
    session.require_editor()?;
    Ok(Json(session.into()))
}

/// PATCH /api/v1/sessions/:id/sections/:section_id
pub async fn handle_update_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, String)>,
    Json(req): Json<SectionEditRequest>,
) -> Result<Json<ResumeSection>, AppError> {
    let mut session = load_session(state.store.as_ref(), id).await?;
    session.require_editor()?;

    let section = session
        .section_mut(&section_id)
        .ok_or_else(|| AppError::NotFound(format!("Section '{section_id}' not found")))?;
    section.content = req.content;
    let updated = section.clone();

    save_slots(state.store.as_ref(), &session, &[Slot::ResumeSections]).await?;
    Ok(Json(updated))
}

/// GET /api/v1/sessions/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewResponse>, AppError> {
    let session = load_session(state.store.as_ref(), id).await?;
    session.require_editor()?;
    Ok(Json(PreviewResponse {
        session_id: id,
        preview: session.preview(),
    }))
}

/// POST /api/v1/sessions/:id/finalize
///
/// Optionally replaces the whole section list, persists it and hands the
/// session over to the template stage. An empty body keeps the stored sections.
pub async fn handle_finalize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<FinalizeResponse>, AppError> {
    let req: FinalizeRequest = if body.iter().all(u8::is_ascii_whitespace) {
        FinalizeRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid finalize request: {e}")))?
    };

    let mut session = load_session(state.store.as_ref(), id).await?;
    session.require_editor()?;

    if let Some(sections) = req.sections {
        validate_section_ids(&sections)?;
        session.sections = sections;
    }
    save_slots(state.store.as_ref(), &session, &[Slot::ResumeSections]).await?;

    info!(session_id = %id, sections = session.sections.len(), "Session finalized");
    Ok(Json(FinalizeResponse {
        session_id: id,
        sections: session.sections,
        finalized_at: Utc::now(),
        stage: Stage::Templates,
        next: Stage::Templates.path(),
    }))
}

fn validate_section_ids(sections: &[ResumeSection]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for section in sections {
        if section.id.trim().is_empty() {
            return Err(AppError::Validation("Section ids must not be empty".to_string()));
        }
        if !seen.insert(section.id.as_str()) {
            return Err(AppError::Validation(format!(
                "Duplicate section id '{}'",
                section.id
            )));
        }
    }
    Ok(())
}
