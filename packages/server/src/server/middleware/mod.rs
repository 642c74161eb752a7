pub mod admin_auth;
pub mod agent_auth;

pub use admin_auth::{admin_auth, ReviewerIdentity};
pub use agent_auth::{agent_auth, AgentIdentity};
