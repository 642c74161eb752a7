pub mod event;
pub mod not_duplicate;
pub mod review_queue;
pub mod tombstone;
