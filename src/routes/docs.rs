use crate::{error::AppError, server::Server};
use axum::{Router, http::header, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Voicemeter API",
        version = "1.0.0",
        description = "Usage metering and demo-account lifecycle enforcement for voice assistant tenants"
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::usage::get_account_usage,
        crate::routes::usage::enforce_account,
        crate::routes::usage::record_call,
    ),
    components(
        schemas(
            crate::routes::ApiErrorResponse,
            crate::routes::health::HealthCheckQuery,
            crate::routes::usage::CallCompletionRequest,
            crate::health::HealthResponse,
            crate::health::HealthStatus,
            crate::health::HealthCheckResult,
            crate::metering::AccountUsageStatus,
            crate::metering::EnforcementDecision,
            crate::metering::UsageSnapshot,
            crate::metering::WarningTier,
            crate::database::entities::AssistantState,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Usage Metering", description = "Per-account usage aggregation and limit classification"),
        (name = "Lifecycle Enforcement", description = "Demo lifecycle enforcement and call ingest"),
    )
)]
pub struct ApiDoc;

/// Create documentation routes
pub fn create_docs_routes() -> Router<Server> {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", ApiDoc::openapi()))
        .route("/docs/openapi.yaml", get(openapi_yaml))
}

/// Serve OpenAPI specification as YAML
async fn openapi_yaml() -> Result<([(header::HeaderName, &'static str); 1], String), AppError> {
    let spec = ApiDoc::openapi();
    let yaml = serde_yaml_ng::to_string(&spec).map_err(|e| {
        AppError::Internal(format!("Failed to serialize OpenAPI spec to YAML: {e}"))
    })?;

    Ok(([(header::CONTENT_TYPE, "application/yaml")], yaml))
}
