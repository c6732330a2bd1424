use crate::{
    config::Config,
    database::{DatabaseManager, DatabaseManagerImpl},
    error::AppError,
    health::HealthService,
    metering::MeteringService,
    routes::{create_docs_routes, create_health_routes, create_usage_routes},
};
use axum::{Router, extract::DefaultBodyLimit};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

/// Maximum request body size (1MB); call-completion payloads are tiny
const MAX_BODY_SIZE: usize = 1024 * 1024;

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub database: Arc<dyn DatabaseManager>,
    pub metering: Arc<MeteringService>,
    pub health_service: Arc<HealthService>,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        // Initialize database
        let database_impl = Arc::new(
            DatabaseManagerImpl::new_from_config(&config.database)
                .await
                .map_err(AppError::Database)?,
        );
        let database: Arc<dyn DatabaseManager> = database_impl.clone();

        // Initialize metering service with its storage dependency injected
        let metering = Arc::new(MeteringService::new(database.clone(), &config.limits));

        // Initialize health service
        let health_service = Arc::new(HealthService::new());
        health_service.register(database_impl).await;

        let config = Arc::new(config);
        Ok(Self {
            config,
            database,
            metering,
            health_service,
        })
    }

    pub async fn run(&self) -> Result<(), AppError> {
        if self.config.database.migration_on_startup {
            info!("Running database migrations");
            self.database.migrate().await.map_err(AppError::Database)?;
            info!("Database migrations completed successfully");
        }

        let app = self.create_app();

        let host: std::net::IpAddr = self
            .config
            .server
            .host
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid server host: {}", e)))?;
        let addr = SocketAddr::from((host, self.config.server.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }

    // Creates an application router
    pub fn create_app(&self) -> Router {
        Router::new()
            // Health check routes
            .nest("/health", create_health_routes())
            // Metering API routes
            .nest("/api", self.api_routes())
            // OpenAPI documentation
            .merge(create_docs_routes())
            // All routes use Server as state
            .with_state(self.clone())
    }

    /// Helper method for metering API routes
    fn api_routes(&self) -> Router<Server> {
        create_usage_routes().layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Graceful shutdown initiated");
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
    async fn test_health_check_routing() {
        let server = crate::test_utils::TestServerBuilder::new().build().await;
        let app = server.create_app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = crate::test_utils::TestServerBuilder::new().build().await;
        assert_eq!(server.config.database.url, "sqlite::memory:");
    }

    #[tokio::test]
    async fn test_api_routes_mounted() {
        let server = crate::test_utils::TestServerBuilder::new().build().await;
        let account_id = crate::test_utils::create_test_account(&server.database).await;
        let app = server.create_app();

        let request = Request::builder()
            .uri(format!("/api/accounts/{}/usage", account_id))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
