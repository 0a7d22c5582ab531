//! Support agent endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use shavasa_support::Agent;
use std::sync::Arc;

use crate::error::ApiError;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/", post(create_agent))
}

/// Create a support agent
#[utoipa::path(
    post,
    path = "/api/support-agents",
    responses(
        (status = 201, description = "Agent created", body = Agent),
        (status = 400, description = "Validation failed or email already in use")
    ),
    tag = "support-agents"
)]
pub async fn create_agent(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Agent>), ApiError> {
    let Json(body) = payload?;
    let agent = state.desk.create_agent(&body).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}
