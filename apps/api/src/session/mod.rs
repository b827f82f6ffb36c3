// Session pipeline: upload → job description → editor → templates.
// Session state lives in a SessionStore as four string slots; TailorSession
// is the typed view handlers work with.

pub mod handlers;
pub mod models;
pub mod store;

use uuid::Uuid;

use crate::errors::AppError;
use crate::session::models::TailorSession;
use crate::session::store::SessionStore;

/// Loads a session, or `NotFound` when nothing is stored under `id`.
pub async fn load_session(store: &dyn SessionStore, id: Uuid) -> Result<TailorSession, AppError> {
    let slots = store.load(id).await?;
    if slots.is_empty() {
        return Err(AppError::NotFound(format!("Session {id} not found")));
    }
    Ok(TailorSession::from_slots(id, &slots))
}
