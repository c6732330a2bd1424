use crate::{error::AppError, health::HealthResponse, routes::ApiErrorResponse, server::Server};
use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct HealthCheckQuery {
    /// `all` to probe every component, or a component name for a single probe
    #[serde(default)]
    pub check: Option<String>,
}

/// Create health check routes
pub fn create_health_routes() -> Router<Server> {
    Router::new().route("/", get(health_check))
}

/// Service health
#[utoipa::path(
    get,
    path = "/health",
    summary = "Health check",
    description = "Report service liveness; pass ?check=all to probe registered components",
    params(HealthCheckQuery),
    responses(
        (status = 200, description = "Health report", body = HealthResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(
    State(server): State<Server>,
    Query(params): Query<HealthCheckQuery>,
) -> Result<Json<HealthResponse>, AppError> {
    let filter = params.check.as_deref();
    Ok(Json(server.health_service.check_health(filter).await))
}
