use crate::handlers;
use actix_web::{web, Scope};

pub fn config() -> Scope {
    web::scope("/api")
        .route("/health", web::get().to(handlers::health_check))
        .route("/tokens", web::get().to(handlers::issue_token))
        .route("/tokens/verify", web::get().to(handlers::verify_token))
        .route("/variants/{file}", web::get().to(handlers::variant_name))
        .route(
            "/versions/hashes",
            web::post().to(handlers::version_hashes),
        )
}
