pub mod resource;
pub mod serializer;
pub mod store;

pub use resource::LinkedDataResource;
pub use serializer::{negotiate, serializer_for, Format, LinkedDataSerializer};
pub use store::{DirectoryStore, PgDirectoryStore};
