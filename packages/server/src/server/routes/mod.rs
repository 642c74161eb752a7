pub mod admin_users;
pub mod api_keys;
pub mod feeds;
pub mod health;
pub mod public_pages;
pub mod review_queue;
pub mod test_helpers;
pub mod wellknown;
