use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_ticket_id;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::TicketStatus;
use crate::models::Ticket;
use crate::services::{CreateTicketRequest, UpdateTicketRequest};

/// GET /tickets
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let tickets = state.tickets().list_tickets(caller).await?;
    Ok(Json(tickets))
}

/// POST /tickets
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Json(payload): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let ticket = state.tickets().create_ticket(caller, payload).await?;
    tracing::info!(ticket_id = ticket.id.value(), product = %ticket.product, "Ticket created");
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /tickets/{ticket_id}
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket_id = validate_ticket_id(&ticket_id)?;
    let ticket = state.tickets().get_ticket(caller, ticket_id).await?;
    Ok(Json(ticket))
}

/// PUT /tickets/{ticket_id}
/// A body carrying only `{"status": "closed"}` is treated as a close request
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(ticket_id): Path<String>,
    Json(payload): Json<UpdateTicketRequest>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket_id = validate_ticket_id(&ticket_id)?;

    let close_only = payload.product.is_none()
        && payload.description.is_none()
        && payload
            .status
            .as_deref()
            .is_some_and(|s| s.parse::<TicketStatus>() == Ok(TicketStatus::Closed));

    let ticket = if close_only {
        state.tickets().close_ticket(caller, ticket_id).await?
    } else {
        state
            .tickets()
            .update_ticket(caller, ticket_id, payload)
            .await?
    };
    Ok(Json(ticket))
}

/// DELETE /tickets/{ticket_id}
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(ticket_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let ticket_id = validate_ticket_id(&ticket_id)?;
    state.tickets().delete_ticket(caller, ticket_id).await?;
    tracing::info!(ticket_id = ticket_id.value(), "Ticket deleted");
    Ok(Json(ApiResponse::ok()))
}
