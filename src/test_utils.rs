use crate::{
    config::Config,
    database::DatabaseManager,
    database::entities::{AccountRecord, AssistantRecord, AssistantState},
    server::Server,
};
use std::sync::Arc;

/// Test server builder for creating test instances with configurable backends
pub struct TestServerBuilder {
    config: Config,
    use_memory_db: bool,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            use_memory_db: true, // Default to memory for tests
        }
    }

    /// Use a real database instead of in-memory SQLite
    pub fn with_real_database(mut self) -> Self {
        self.use_memory_db = false;
        self
    }

    /// Set a custom configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Build the test server with configured settings
    pub async fn build(self) -> Server {
        let mut config = self.config;

        if self.use_memory_db {
            config.database.url = "sqlite::memory:".to_string();
        }

        let server = Server::new(config).await.unwrap();
        server.database.migrate().await.unwrap();
        server
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a demo account with the default plan limits
pub async fn create_test_account(database: &Arc<dyn DatabaseManager>) -> i32 {
    let account = AccountRecord::demo(
        "test_tenant_123",
        "test@example.com",
        &crate::config::LimitsConfig::default(),
    );
    database.accounts().insert(&account).await.unwrap()
}

/// Create an account with custom limits and tenant key
pub async fn create_test_account_with_limits(
    database: &Arc<dyn DatabaseManager>,
    external_id: &str,
    minutes_limit: f64,
    assistant_limit: i32,
) -> i32 {
    let account = AccountRecord::demo(
        external_id,
        "test@example.com",
        &crate::config::LimitsConfig::default(),
    )
    .with_limits(minutes_limit, assistant_limit);
    database.accounts().insert(&account).await.unwrap()
}

/// Create an active assistant with the given consumed minutes
pub async fn create_test_assistant(
    database: &Arc<dyn DatabaseManager>,
    account_id: i32,
    usage_minutes: f64,
) -> i32 {
    let assistant =
        AssistantRecord::new(account_id, "Test Assistant").with_usage_minutes(usage_minutes);
    database.assistants().insert(&assistant).await.unwrap()
}

/// Create an assistant in a specific lifecycle state
pub async fn create_test_assistant_in_state(
    database: &Arc<dyn DatabaseManager>,
    account_id: i32,
    usage_minutes: f64,
    state: AssistantState,
) -> i32 {
    let assistant = AssistantRecord::new(account_id, "Test Assistant")
        .with_usage_minutes(usage_minutes)
        .with_state(state);
    database.assistants().insert(&assistant).await.unwrap()
}
