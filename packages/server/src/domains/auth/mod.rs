pub mod api_key;
pub mod jwt;

pub use api_key::{ApiKey, ApiKeyStore, PgApiKeyStore};
pub use jwt::{Claims, JwtService};
