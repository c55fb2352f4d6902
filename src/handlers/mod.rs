pub mod health;
pub mod tokens;
pub mod variants;

pub use health::*;
pub use tokens::*;
pub use variants::*;
