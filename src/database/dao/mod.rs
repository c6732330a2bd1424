pub mod accounts;
pub mod assistants;

pub use accounts::AccountsDao;
pub use assistants::AssistantsDao;
