pub mod accounts;
pub mod assistants;

pub use accounts::Entity as Accounts;
pub use assistants::Entity as Assistants;

pub use assistants::AssistantState;

// Type aliases
pub type AccountRecord = accounts::Model;
pub type AssistantRecord = assistants::Model;
