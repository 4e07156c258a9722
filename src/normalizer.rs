//! Verification status normalization.
//!
//! The provider's `requiredIdDocsStatus` payload is a nested, partially
//! populated JSON document. Normalization flattens the `IDENTITY` and
//! `SELFIE` sections into the stable field set we persist, with an explicit
//! default for every optional field so a sparse payload never fails.

use serde_json::{Map, Value};

use crate::errors::AppError;

/// The flattened field set derived from one provider status payload.
///
/// This is exactly what an upsert writes; the applicant id is supplied by the
/// caller (it is a request parameter, never part of the payload).
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationFields {
    /// Document country, `"Unknown"` when the provider omits it.
    pub country: String,
    /// Document type, `"Unknown"` when the provider omits it.
    pub id_doc_type: String,
    /// Ordered uploaded-image identifiers; empty list when absent.
    pub image_ids: Value,
    /// Per-image review outcomes; empty object when absent.
    pub image_review_results: Value,
    /// Whether the applicant is forbidden; `false` when absent.
    pub forbidden: bool,
    /// Partial-completion flag; `None` when absent or explicit null.
    pub partial_completion: Option<bool>,
    /// Per-step status mapping; `None` when absent or explicit null.
    pub step_statuses: Option<Value>,
    /// Ordered per-image statuses; empty list when absent.
    pub image_statuses: Value,
    /// Serialized `SELFIE` section; `None` when absent or explicit null.
    pub selfie: Option<String>,
}

/// Normalizes a raw provider status payload into `VerificationFields`.
///
/// Never fails on missing optional fields; the only failure is a payload
/// that is not a JSON object, which callers treat as a transport-layer
/// problem rather than a normalization one.
///
/// # Arguments
///
/// * `raw` - The parsed provider response body.
pub fn normalize(raw: &Value) -> Result<VerificationFields, AppError> {
    let root = raw.as_object().ok_or_else(|| {
        AppError::provider("Verification status payload is not a JSON object".to_string())
    })?;

    // IDENTITY may be missing entirely on a fresh applicant; treat that the
    // same as an empty section.
    let empty = Map::new();
    let identity = root
        .get("IDENTITY")
        .and_then(|v| v.as_object())
        .unwrap_or(&empty);

    let country = identity
        .get("country")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown")
        .to_string();

    let id_doc_type = identity
        .get("idDocType")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown")
        .to_string();

    let image_ids = identity
        .get("imageIds")
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| Value::Array(vec![]));

    let image_review_results = identity
        .get("imageReviewResults")
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    // An explicit `false` is meaningful and distinct from absence; both land
    // on `false` here, which is what last-fetch-wins persistence needs.
    let forbidden = identity
        .get("forbidden")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let partial_completion = identity
        .get("partialCompletion")
        .and_then(|v| v.as_bool());

    let step_statuses = identity
        .get("stepStatuses")
        .filter(|v| !v.is_null())
        .cloned();

    let image_statuses = identity
        .get("imageStatuses")
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| Value::Array(vec![]));

    // SELFIE is stored as an opaque serialized blob, only when present.
    let selfie = root
        .get("SELFIE")
        .filter(|v| !v.is_null())
        .map(|v| v.to_string());

    Ok(VerificationFields {
        country,
        id_doc_type,
        image_ids,
        image_review_results,
        forbidden,
        partial_completion,
        step_statuses,
        image_statuses,
        selfie,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payload_yields_all_defaults() {
        let fields = normalize(&json!({})).unwrap();
        assert_eq!(fields.country, "Unknown");
        assert_eq!(fields.id_doc_type, "Unknown");
        assert_eq!(fields.image_ids, json!([]));
        assert_eq!(fields.image_review_results, json!({}));
        assert!(!fields.forbidden);
        assert_eq!(fields.partial_completion, None);
        assert_eq!(fields.step_statuses, None);
        assert_eq!(fields.image_statuses, json!([]));
        assert_eq!(fields.selfie, None);
    }

    #[test]
    fn identity_fields_are_extracted() {
        let payload = json!({
            "IDENTITY": {
                "country": "USA",
                "idDocType": "PASSPORT",
                "imageIds": ["img-1", "img-2"],
                "imageReviewResults": {"img-1": {"reviewAnswer": "GREEN"}},
                "forbidden": false,
                "partialCompletion": true,
                "stepStatuses": {"IDENTITY": "completed"},
                "imageStatuses": ["approved", "pending"]
            },
            "SELFIE": {"status": "approved"}
        });

        let fields = normalize(&payload).unwrap();
        assert_eq!(fields.country, "USA");
        assert_eq!(fields.id_doc_type, "PASSPORT");
        assert_eq!(fields.image_ids, json!(["img-1", "img-2"]));
        assert_eq!(
            fields.image_review_results,
            json!({"img-1": {"reviewAnswer": "GREEN"}})
        );
        assert!(!fields.forbidden);
        assert_eq!(fields.partial_completion, Some(true));
        assert_eq!(fields.step_statuses, Some(json!({"IDENTITY": "completed"})));
        assert_eq!(fields.image_statuses, json!(["approved", "pending"]));

        // The selfie blob round-trips to the original section.
        let selfie: Value = serde_json::from_str(fields.selfie.as_deref().unwrap()).unwrap();
        assert_eq!(selfie, json!({"status": "approved"}));
    }

    #[test]
    fn explicit_false_forbidden_is_preserved() {
        let fields =
            normalize(&json!({"IDENTITY": {"country": "USA", "forbidden": false}})).unwrap();
        assert_eq!(fields.country, "USA");
        assert!(!fields.forbidden);
    }

    #[test]
    fn explicit_null_sections_behave_like_absent_ones() {
        let payload = json!({
            "IDENTITY": {
                "imageIds": null,
                "stepStatuses": null,
                "partialCompletion": null
            },
            "SELFIE": null
        });
        let fields = normalize(&payload).unwrap();
        assert_eq!(fields.image_ids, json!([]));
        assert_eq!(fields.step_statuses, None);
        assert_eq!(fields.partial_completion, None);
        assert_eq!(fields.selfie, None);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(normalize(&json!([1, 2, 3])).is_err());
        assert!(normalize(&json!("nope")).is_err());
        assert!(normalize(&json!(null)).is_err());
    }

    #[test]
    fn identity_of_wrong_type_falls_back_to_defaults() {
        let fields = normalize(&json!({"IDENTITY": "corrupt"})).unwrap();
        assert_eq!(fields.country, "Unknown");
        assert_eq!(fields.image_ids, json!([]));
    }
}
