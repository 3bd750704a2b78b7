pub mod bson;
pub mod collection;
pub mod errors;

pub use self::bson::Id;
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use errors::is_duplicate_key;
