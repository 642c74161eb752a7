pub mod models;

pub use models::place::Place;
