use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AddDocumentRequest, ApiResponse, CreateApplicantRequest};
use crate::normalizer;
use crate::storage::VerificationStorage;
use crate::sumsub_client::SumsubClient;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Client for the verification provider.
    pub sumsub: SumsubClient,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-kyc-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/applicants
///
/// Creates an applicant at the verification provider.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - JSON body with `externalUserId` (required), optional `info`,
///   `type`, and `levelName`.
///
/// # Returns
///
/// * `Result<(StatusCode, Json<ApiResponse>), AppError>` - 201 with the provider's
///   applicant data, or an error.
pub async fn create_applicant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateApplicantRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    tracing::info!("POST /applicants");

    let external_user_id = payload
        .external_user_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("externalUserId is required".to_string()))?;

    let data = state
        .sumsub
        .create_applicant(
            external_user_id,
            payload.info.as_ref(),
            payload.applicant_type.as_deref(),
            payload.level_name.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Applicant created successfully",
            Some(data),
        )),
    ))
}

/// POST /api/v1/applicants/:applicant_id/documents
///
/// Downloads the document image from the supplied URL and uploads it to the
/// provider for the given applicant.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `applicant_id` - The provider-issued applicant identifier.
/// * `payload` - JSON body with `imgUrl`, `idDocType`, and `country` (all required).
///
/// # Returns
///
/// * `Result<Json<ApiResponse>, AppError>` - The provider's upload response or an error.
pub async fn add_document(
    State(state): State<Arc<AppState>>,
    Path(applicant_id): Path<String>,
    Json(payload): Json<AddDocumentRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    tracing::info!("POST /applicants/{}/documents", applicant_id);

    let img_url = non_empty(payload.img_url.as_deref());
    let id_doc_type = non_empty(payload.id_doc_type.as_deref());
    let country = non_empty(payload.country.as_deref());

    let (img_url, id_doc_type, country) = match (img_url, id_doc_type, country) {
        (Some(u), Some(d), Some(c)) => (u, d, c),
        _ => {
            return Err(AppError::BadRequest(
                "imgUrl, idDocType, and country are required".to_string(),
            ))
        }
    };

    let data = state
        .sumsub
        .add_document(&applicant_id, img_url, id_doc_type, country)
        .await?;

    Ok(Json(ApiResponse::success(
        "Document added successfully",
        Some(data),
    )))
}

/// GET /api/v1/applicants/:applicant_id/status
///
/// Fetches the applicant's verification status from the provider, normalizes
/// it, and upserts the local record. On a provider failure nothing is
/// written.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `applicant_id` - The provider-issued applicant identifier.
///
/// # Returns
///
/// * `Result<Json<ApiResponse>, AppError>` - The raw provider payload or an error.
pub async fn get_verification_status(
    State(state): State<Arc<AppState>>,
    Path(applicant_id): Path<String>,
) -> Result<Json<ApiResponse>, AppError> {
    tracing::info!("GET /applicants/{}/status", applicant_id);

    let raw = state.sumsub.fetch_status(&applicant_id).await?;
    let fields = normalizer::normalize(&raw)?;

    let storage = VerificationStorage::new(state.db.clone());
    storage.upsert(&applicant_id, &fields).await?;

    Ok(Json(ApiResponse::success(
        format!("Verification status for: {}", applicant_id),
        Some(raw),
    )))
}

/// GET /api/v1/applicants/:applicant_id/status/saved
///
/// Returns the locally stored verification record.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `applicant_id` - The provider-issued applicant identifier.
///
/// # Returns
///
/// * `Result<Json<ApiResponse>, AppError>` - The stored record, or a distinct
///   404 when no record exists for the applicant.
pub async fn get_saved_verification(
    State(state): State<Arc<AppState>>,
    Path(applicant_id): Path<String>,
) -> Result<Json<ApiResponse>, AppError> {
    tracing::info!("GET /applicants/{}/status/saved", applicant_id);

    let storage = VerificationStorage::new(state.db.clone());
    let record = storage
        .get(&applicant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Applicant not found".to_string()))?;

    let data = serde_json::to_value(&record)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize record: {}", e)))?;

    Ok(Json(ApiResponse::success(
        format!("Verification data for applicant {}", applicant_id),
        Some(data),
    )))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
