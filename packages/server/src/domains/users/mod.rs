pub mod models;
pub mod service;

pub use models::admin_user::{AdminUser, ListUsersFilters, NewUser, UserRole, UserUpdate};
pub use service::{PgUserStore, UserError, UserService, UserStore};
