use crate::{
    error::AppError,
    metering::{AccountUsageStatus, EnforcementDecision},
    routes::ApiErrorResponse,
    server::Server,
};
use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Create usage metering and enforcement API routes
pub fn create_usage_routes() -> Router<Server> {
    Router::new()
        .route("/accounts/{account_id}/usage", get(get_account_usage))
        .route("/accounts/{account_id}/enforce", post(enforce_account))
        .route("/accounts/{account_id}/calls", post(record_call))
}

/// Call-completion report from the voice platform
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallCompletionRequest {
    /// Assistant that took the call
    pub assistant_id: i32,
    /// Call duration in seconds
    pub duration_seconds: f64,
}

/// Get an account's usage status
#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}/usage",
    summary = "Account usage status",
    description = "Aggregate consumed minutes and active assistants, classified against the account's plan limits",
    params(
        ("account_id" = i32, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Usage status", body = AccountUsageStatus),
        (status = 404, description = "Unknown account", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Usage Metering"
)]
pub async fn get_account_usage(
    State(server): State<Server>,
    Path(account_id): Path<i32>,
) -> Result<Json<AccountUsageStatus>, AppError> {
    let status = server.metering.usage_status(account_id).await?;
    Ok(Json(status))
}

/// Run one enforcement pass over an account
#[utoipa::path(
    post,
    path = "/api/accounts/{account_id}/enforce",
    summary = "Enforce account limits",
    description = "Evaluate the account and retire its assistants when a limit or the demo lifetime is exceeded; safe to re-run",
    params(
        ("account_id" = i32, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Enforcement decision", body = EnforcementDecision),
        (status = 404, description = "Unknown account", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Lifecycle Enforcement"
)]
pub async fn enforce_account(
    State(server): State<Server>,
    Path(account_id): Path<i32>,
) -> Result<Json<EnforcementDecision>, AppError> {
    let decision = server.metering.enforce(account_id).await?;
    Ok(Json(decision))
}

/// Ingest a completed call and re-evaluate the account
#[utoipa::path(
    post,
    path = "/api/accounts/{account_id}/calls",
    summary = "Record completed call",
    description = "Attribute a finished call's duration to an assistant, then run an enforcement pass",
    params(
        ("account_id" = i32, Path, description = "Account ID")
    ),
    request_body = CallCompletionRequest,
    responses(
        (status = 200, description = "Enforcement decision after ingest", body = EnforcementDecision),
        (status = 400, description = "Invalid duration or deleted assistant", body = ApiErrorResponse),
        (status = 404, description = "Unknown account or assistant", body = ApiErrorResponse),
        (status = 500, description = "Internal server error", body = ApiErrorResponse)
    ),
    tag = "Lifecycle Enforcement"
)]
pub async fn record_call(
    State(server): State<Server>,
    Path(account_id): Path<i32>,
    Json(request): Json<CallCompletionRequest>,
) -> Result<Json<EnforcementDecision>, AppError> {
    let decision = server
        .metering
        .record_call(account_id, request.assistant_id, request.duration_seconds)
        .await?;
    Ok(Json(decision))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_account_is_404() {
        let server = crate::test_utils::TestServerBuilder::new().build().await;
        let app = create_usage_routes().with_state(server);

        let request = Request::builder()
            .uri("/accounts/999/usage")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_enforce_unknown_account_is_404() {
        let server = crate::test_utils::TestServerBuilder::new().build().await;
        let app = create_usage_routes().with_state(server);

        let request = Request::builder()
            .uri("/accounts/999/enforce")
            .method("POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_record_call_rejects_negative_duration() {
        let server = crate::test_utils::TestServerBuilder::new().build().await;
        let account_id = crate::test_utils::create_test_account(&server.database).await;
        let assistant_id =
            crate::test_utils::create_test_assistant(&server.database, account_id, 0.0).await;

        let app = create_usage_routes().with_state(server);

        let body = serde_json::json!({
            "assistant_id": assistant_id,
            "duration_seconds": -1.0
        });
        let request = Request::builder()
            .uri(format!("/accounts/{}/calls", account_id))
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
