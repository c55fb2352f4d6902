use actix_web::{web, HttpResponse};

use crate::error::ImagineError;
use crate::AppState;

type QueryPairs = web::Query<Vec<(String, String)>>;

/// Issues a token for the operations in the query string.
pub async fn issue_token(
    state: web::Data<AppState>,
    query: QueryPairs,
) -> Result<HttpResponse, ImagineError> {
    let issued = state.token_service.issue(query.as_slice())?;
    tracing::info!("Issued token for `{}`", issued.canonical);
    Ok(HttpResponse::Ok().json(issued))
}

pub async fn verify_token(
    state: web::Data<AppState>,
    query: QueryPairs,
) -> Result<HttpResponse, ImagineError> {
    match state.token_service.check(query.as_slice()) {
        Ok(checked) => Ok(HttpResponse::Ok().json(checked)),
        Err(e) => {
            if e.is_denial() {
                tracing::warn!("Token check denied: {}", e);
            }
            Err(e)
        }
    }
}
