use actix_web::{http::header, web, HttpResponse};
use validator::Validate;

use crate::error::ImagineError;
use crate::models::{ErrorResponse, VersionHashesRequest};
use crate::utils::DEFAULT_HASH_LENGTH;
use crate::AppState;

/// Resolves the cached file name of a signed variant of `file`.
pub async fn variant_name(
    state: web::Data<AppState>,
    file: web::Path<String>,
    query: web::Query<Vec<(String, String)>>,
) -> Result<HttpResponse, ImagineError> {
    let variant = state.token_service.variant(file.as_str(), query.as_slice())?;

    Ok(HttpResponse::Ok()
        .insert_header((header::ETAG, variant.etag.clone()))
        .json(variant))
}

pub async fn version_hashes(
    state: web::Data<AppState>,
    req: web::Json<VersionHashesRequest>,
) -> Result<HttpResponse, ImagineError> {
    if let Err(e) = req.validate() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse::with_details(
            "Invalid request",
            format!("Validation error: {}", e),
        )));
    }
    if req.versions.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorResponse::new(
            "No image versions given",
        )));
    }

    let length = req.hash_length.unwrap_or(DEFAULT_HASH_LENGTH);
    let response = state.token_service.version_hashes(&req.versions, length)?;
    Ok(HttpResponse::Ok().json(response))
}
