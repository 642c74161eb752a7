pub mod auth;
pub mod events;
pub mod federation;
pub mod linked_data;
pub mod organizations;
pub mod places;
pub mod test_support;
pub mod users;
