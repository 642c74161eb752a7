pub mod changefeed;
pub mod models;

pub use changefeed::{ChangeFeedError, ChangeFeedParams, ChangeFeedResult, ChangeFeedService};
pub use models::change_entry::{ChangeAction, ChangeEntry, ChangeStore, PgChangeStore};
