pub mod admin_service;
pub mod changes;
pub mod models;
pub mod repository;

pub use admin_service::{AdminError, AdminService, NotDuplicateOutcome};
pub use models::event::{Event, Lifecycle};
pub use models::not_duplicate::NotDuplicate;
pub use models::review_queue::{
    ReviewQueueEntry, ReviewQueueFilters, ReviewQueuePage, ReviewStatus, ValidationWarning,
};
pub use models::tombstone::Tombstone;
pub use repository::{MergeParams, PgReviewStore, ReviewStore};
