use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::sections::ResumeSection;
use crate::session::load_session;
use crate::session::models::Slot;
use crate::session::store::save_slots;
use crate::state::AppState;
use crate::suggestions::{rewrite_section, run_bulk_pass, SectionOutcome};

#[derive(Serialize)]
pub struct BulkSuggestionsResponse {
    pub session_id: Uuid,
    pub outcomes: Vec<SectionOutcome>,
    pub sections: Vec<ResumeSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RewriteRequest {
    /// Defaults to the first section.
    pub section_id: Option<String>,
    pub instruction: Option<String>,
}

#[derive(Serialize)]
pub struct RewriteResponse {
    pub session_id: Uuid,
    pub section: ResumeSection,
    pub sections: Vec<ResumeSection>,
}

/// POST /api/v1/sessions/:id/suggestions
///
/// Per-section failures are reported in `outcomes`; the request itself
/// succeeds as long as the session can be loaded and saved. Section edits
/// that land while the pass runs are kept.
#[tracing::instrument(skip(state))]
pub async fn handle_bulk_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BulkSuggestionsResponse>, AppError> {
    let mut session = load_session(state.store.as_ref(), id).await?;
    let job_description = session.require_editor()?.to_string();

    let outcomes = run_bulk_pass(
        state.generator.as_ref(),
        &mut session.sections,
        &job_description,
        state.config.llm_timeout(),
    )
    .await;

    // The pass can take minutes; keep any edits saved in the meantime and
    // write back only the suggestions.
    let mut latest = load_session(state.store.as_ref(), id).await?;
    latest.merge_suggestions(&session.sections);
    save_slots(state.store.as_ref(), &latest, &[Slot::ResumeSections]).await?;

    Ok(Json(BulkSuggestionsResponse {
        session_id: id,
        outcomes,
        sections: latest.sections,
    }))
}

/// POST /api/v1/sessions/:id/rewrite
#[tracing::instrument(skip(state))]
pub async fn handle_rewrite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RewriteRequest>,
) -> Result<Json<RewriteResponse>, AppError> {
    let mut session = load_session(state.store.as_ref(), id).await?;
    let job_description = session.require_editor()?.to_string();

    let section = rewrite_section(
        state.generator.as_ref(),
        &mut session.sections,
        req.section_id.as_deref(),
        &job_description,
        req.instruction.as_deref(),
        state.config.llm_timeout(),
    )
    .await?;
    save_slots(state.store.as_ref(), &session, &[Slot::ResumeSections]).await?;

    Ok(Json(RewriteResponse {
        session_id: id,
        section,
        sections: session.sections,
    }))
}
