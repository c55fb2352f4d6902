pub mod capabilities;
pub mod dispatcher;
pub mod token_service;

pub use capabilities::*;
pub use dispatcher::*;
pub use token_service::*;
