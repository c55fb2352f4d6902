pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::time::Instant;

use config::Config;
use services::TokenService;

pub use error::{EngineError, ImagineError};

#[derive(Clone)]
pub struct AppState {
    pub token_service: TokenService,
    pub config: Config,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ImagineError> {
        let token_service = TokenService::new(&config.imagine)?;
        Ok(Self {
            token_service,
            config,
            start_time: Instant::now(),
        })
    }
}
