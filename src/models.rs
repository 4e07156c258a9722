use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// ============ Database Models ============

/// Locally persisted verification status for one applicant.
///
/// One row per provider applicant id; every status fetch overwrites the
/// derived fields (last-fetch-wins).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Unique identifier for the row.
    pub id: Uuid,
    /// Provider-issued applicant identifier (unique upsert key).
    pub applicant_id: String,
    /// Document country, "Unknown" when not reported.
    pub country: String,
    /// Document type, "Unknown" when not reported.
    pub id_doc_type: String,
    /// Ordered uploaded-image identifiers.
    pub image_ids: Value,
    /// Per-image review outcomes.
    pub image_review_results: Value,
    /// Whether the applicant is forbidden.
    pub forbidden: bool,
    /// Partial-completion flag, when the provider reported one.
    pub partial_completion: Option<bool>,
    /// Per-step status mapping, when the provider reported one.
    pub step_statuses: Option<Value>,
    /// Ordered per-image statuses.
    pub image_statuses: Option<Value>,
    /// Serialized SELFIE section, when present.
    pub selfie: Option<String>,
    /// Timestamp of creation (first successful status fetch).
    pub created_at: DateTime<Utc>,
    /// Timestamp of last upsert.
    pub updated_at: DateTime<Utc>,
}

// ============ Request DTOs ============

/// Body for `POST /api/v1/applicants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicantRequest {
    /// Caller-side identifier for the end user (required by the provider).
    #[serde(rename = "externalUserId")]
    pub external_user_id: Option<String>,
    /// Optional applicant info block, passed through to the provider.
    pub info: Option<Value>,
    /// Optional applicant type, passed through to the provider.
    #[serde(rename = "type")]
    pub applicant_type: Option<String>,
    /// Verification level; defaults to "basic-kyc-level" when omitted.
    #[serde(rename = "levelName")]
    pub level_name: Option<String>,
}

/// Body for `POST /api/v1/applicants/:applicant_id/documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDocumentRequest {
    /// URL of the document image to download and forward.
    #[serde(rename = "imgUrl")]
    pub img_url: Option<String>,
    /// Provider document type (e.g. "PASSPORT").
    #[serde(rename = "idDocType")]
    pub id_doc_type: Option<String>,
    /// ISO country code of the document.
    pub country: Option<String>,
}

// ============ Response envelope ============

/// Standard response envelope: `{"status", "message", "data"}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    /// "success" or "failed".
    pub status: String,
    /// Human-readable outcome description.
    pub message: String,
    /// Operation payload, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// Builds a success envelope.
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }
}
