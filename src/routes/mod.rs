pub mod docs;
pub mod health;
pub mod usage;

pub use docs::create_docs_routes;
pub use health::create_health_routes;
pub use usage::create_usage_routes;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON body returned for every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Short error category
    pub error: String,
    /// Human-readable detail
    pub message: String,
}
