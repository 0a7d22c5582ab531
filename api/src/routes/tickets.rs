//! Support ticket endpoints

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use shavasa_support::{ListTicketsParams, PopulatedTicket, Ticket};
use std::sync::Arc;

use crate::error::ApiError;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/", get(list_tickets).post(create_ticket))
}

/// Create a support ticket
#[utoipa::path(
    post,
    path = "/api/support-tickets",
    responses(
        (status = 201, description = "Ticket created", body = Ticket),
        (status = 400, description = "Validation failed")
    ),
    tag = "support-tickets"
)]
pub async fn create_ticket(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let Json(body) = payload?;
    let ticket = state.desk.create_ticket(&body).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// List tickets with filter, sort and pagination
#[utoipa::path(
    get,
    path = "/api/support-tickets",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("assignedTo" = Option<String>, Query, description = "Filter by assigned agent id"),
        ("severity" = Option<String>, Query, description = "Filter by severity"),
        ("type" = Option<String>, Query, description = "Filter by type"),
        ("sortBy" = Option<String>, Query, description = "Field to sort on"),
        ("sortOrder" = Option<String>, Query, description = "asc (default) or desc"),
        ("page" = Option<u64>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<u64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Tickets with assigned agents expanded", body = [PopulatedTicket]),
        (status = 400, description = "Malformed query value")
    ),
    tag = "support-tickets"
)]
pub async fn list_tickets(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<ListTicketsParams>, QueryRejection>,
) -> Result<Json<Vec<PopulatedTicket>>, ApiError> {
    let Query(params) = query?;
    let tickets = state.desk.list_tickets(&params).await?;
    Ok(Json(tickets))
}
