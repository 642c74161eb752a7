// Common types and utilities shared across the application

pub mod ids;
pub mod pagination;
pub mod problem;

pub use ids::normalize_ulid;
pub use problem::{ApiError, ApiResult, Problem};
