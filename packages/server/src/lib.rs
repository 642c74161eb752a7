// SEL Directory Server - API Core
//
// This crate provides the HTTP-facing layer of the shared events/places/
// organizations directory: the moderation review queue, admin CRUD for
// users and API keys, dereferenceable public resource pages with content
// negotiation, and the federation change feed.

pub mod audit;
pub mod common;
pub mod config;
pub mod domains;
pub mod server;

pub use config::*;
