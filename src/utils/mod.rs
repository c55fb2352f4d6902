pub mod hashing;
pub mod query;
pub mod serializer;

pub use hashing::*;
pub use query::*;
pub use serializer::*;
