use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_ticket_id;
use super::{ApiError, AppState, CreateNoteRequest};
use crate::models::Note;

/// GET /tickets/{ticket_id}/notes
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let ticket_id = validate_ticket_id(&ticket_id)?;
    let notes = state.notes().get_notes(caller, ticket_id).await?;
    Ok(Json(notes))
}

/// POST /tickets/{ticket_id}/notes
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(ticket_id): Path<String>,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let ticket_id = validate_ticket_id(&ticket_id)?;
    let note = state
        .notes()
        .create_note(caller, ticket_id, &payload.text)
        .await?;
    Ok(Json(note))
}
