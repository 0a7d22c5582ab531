//! Shavasa Support Desk API
//!
//! REST API over the support desk service.
//!
//! | Method | Path                   | Handler                          |
//! |--------|------------------------|----------------------------------|
//! | POST   | `/api/support-agents`  | [`routes::agents::create_agent`] |
//! | POST   | `/api/support-tickets` | [`routes::tickets::create_ticket`] |
//! | GET    | `/api/support-tickets` | [`routes::tickets::list_tickets`] |
//! | GET    | `/health`              | [`routes::health::health_check`] |
//!
//! Every request is logged, and every handler failure is answered with 400.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use axum::routing::get;
use axum::Router;
use shavasa_support::{Agent, PopulatedTicket, SupportUseCases, Ticket, TicketStatus};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::ApiConfig;
pub use error::ApiError;

/// API state
#[derive(Clone)]
pub struct ApiState {
    pub desk: Arc<dyn SupportUseCases>,
}

impl ApiState {
    pub fn new(desk: Arc<dyn SupportUseCases>) -> Self {
        Self { desk }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shavasa Support Desk API",
        version = "1.0.0",
        description = "Support agents and support tickets",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::agents::create_agent,
        routes::tickets::create_ticket,
        routes::tickets::list_tickets,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            Agent, Ticket, PopulatedTicket, TicketStatus
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "support-agents", description = "Support agent management"),
        (name = "support-tickets", description = "Support ticket management")
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: ApiState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes())
        .layer(axum::middleware::from_fn(middleware::request_log::log_request))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/support-agents", routes::agents::router())
        .nest("/support-tickets", routes::tickets::router())
}
