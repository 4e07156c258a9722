use reqwest;
use serde_json::{json, Value};
use std::time::Duration;
use tracing;
use url::Url;
use uuid::Uuid;

use crate::errors::AppError;
use crate::signer::{RequestSigner, SignedHeaders, HEADER_ACCESS_SIG, HEADER_ACCESS_TS, HEADER_APP_TOKEN};

/// Verification level applied when the caller does not name one.
pub const DEFAULT_LEVEL_NAME: &str = "basic-kyc-level";

/// Client for the Sumsub verification API.
///
/// Every request is signed over its exact outbound bytes, so bodies are
/// serialized up front and sent verbatim rather than letting reqwest encode
/// them at send time.
#[derive(Clone)]
pub struct SumsubClient {
    client: reqwest::Client,
    base_url: String,
    signer: RequestSigner,
}

impl SumsubClient {
    /// Creates a new `SumsubClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the provider API.
    /// * `signer` - Signs each outbound request.
    /// * `timeout_secs` - Bound on every provider and image-download call.
    pub fn new(
        base_url: String,
        signer: RequestSigner,
        timeout_secs: u64,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create provider client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            signer,
        })
    }

    /// Creates an applicant at the provider.
    ///
    /// `POST /resources/applicants?levelName={level}` with body
    /// `{externalUserId, info, type}`. The provider answers 201 on success;
    /// anything else is surfaced with its status and body.
    ///
    /// # Arguments
    ///
    /// * `external_user_id` - Caller-side identifier for the end user.
    /// * `info` - Optional applicant info block, forwarded as-is.
    /// * `applicant_type` - Optional applicant type, forwarded as-is.
    /// * `level_name` - Verification level; `None` means the default level.
    pub async fn create_applicant(
        &self,
        external_user_id: &str,
        info: Option<&Value>,
        applicant_type: Option<&str>,
        level_name: Option<&str>,
    ) -> Result<Value, AppError> {
        let level = level_name.unwrap_or(DEFAULT_LEVEL_NAME);
        let url = Url::parse_with_params(
            &format!("{}/resources/applicants", self.base_url),
            &[("levelName", level)],
        )
        .map_err(|e| AppError::InternalError(format!("Failed to build URL: {}", e)))?;

        let payload = json!({
            "externalUserId": external_user_id,
            "info": info,
            "type": applicant_type,
        });
        let body = serde_json::to_vec(&payload)
            .map_err(|e| AppError::InternalError(format!("Failed to encode payload: {}", e)))?;

        tracing::info!("Creating applicant for external user {}", external_user_id);

        let headers = self.signer.sign("POST", &path_with_query(&url), &body)?;
        let response = self
            .apply_signature(self.client.post(url), &headers)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::provider(format!("Applicant creation failed: {}", e)))?;

        // 201 is the provider's documented success code for creation.
        if response.status() != reqwest::StatusCode::CREATED {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ProviderError {
                status: Some(status.as_u16()),
                message: format!("Applicant creation rejected: {}", error_text),
            });
        }

        let data: Value = response.json().await.map_err(|e| {
            AppError::provider(format!("Failed to parse applicant creation response: {}", e))
        })?;

        tracing::info!("Applicant created for external user {}", external_user_id);
        Ok(data)
    }

    /// Uploads an identity document image for an applicant.
    ///
    /// Downloads the image from `img_url` into a request-scoped buffer, then
    /// sends `POST /resources/applicants/{id}/info/idDoc` as multipart with a
    /// `content` file part and a `metadata` JSON-string field. The multipart
    /// body is assembled locally because the signature must cover its exact
    /// bytes, boundary included.
    ///
    /// # Arguments
    ///
    /// * `applicant_id` - The provider-issued applicant identifier.
    /// * `img_url` - Where to download the document image from.
    /// * `id_doc_type` - Provider document type (e.g. "PASSPORT").
    /// * `country` - ISO country code of the document.
    pub async fn add_document(
        &self,
        applicant_id: &str,
        img_url: &str,
        id_doc_type: &str,
        country: &str,
    ) -> Result<Value, AppError> {
        let image = self.download_image(img_url).await?;

        let metadata = json!({
            "idDocType": id_doc_type,
            "country": country,
        })
        .to_string();

        let boundary = format!("sumsub-{}", Uuid::new_v4().simple());
        let body = encode_multipart(&boundary, &image, &metadata);

        let url = format!(
            "{}/resources/applicants/{}/info/idDoc",
            self.base_url, applicant_id
        );
        let parsed = Url::parse(&url)
            .map_err(|e| AppError::InternalError(format!("Failed to build URL: {}", e)))?;

        tracing::info!(
            "Uploading {} document for applicant {}",
            id_doc_type,
            applicant_id
        );

        let headers = self.signer.sign("POST", &path_with_query(&parsed), &body)?;
        let response = self
            .apply_signature(self.client.post(parsed), &headers)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::provider(format!("Document upload failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ProviderError {
                status: Some(status.as_u16()),
                message: format!("Document upload rejected: {}", error_text),
            });
        }

        let data: Value = response.json().await.map_err(|e| {
            AppError::provider(format!("Failed to parse document upload response: {}", e))
        })?;

        tracing::info!("Document uploaded for applicant {}", applicant_id);
        Ok(data)
    }

    /// Fetches the applicant's verification status.
    ///
    /// `GET /resources/applicants/{id}/requiredIdDocsStatus`. Non-200 is
    /// reported as a generic fetch failure carrying the provider's status
    /// code, without leaking the upstream body.
    ///
    /// # Arguments
    ///
    /// * `applicant_id` - The provider-issued applicant identifier.
    pub async fn fetch_status(&self, applicant_id: &str) -> Result<Value, AppError> {
        let url = format!(
            "{}/resources/applicants/{}/requiredIdDocsStatus",
            self.base_url, applicant_id
        );
        let parsed = Url::parse(&url)
            .map_err(|e| AppError::InternalError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Fetching verification status for applicant {}", applicant_id);

        let headers = self.signer.sign("GET", &path_with_query(&parsed), b"")?;
        let response = self
            .apply_signature(self.client.get(parsed), &headers)
            .send()
            .await
            .map_err(|e| AppError::provider(format!("Status fetch failed: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            tracing::error!(
                "Provider returned {} fetching status for applicant {}",
                status,
                applicant_id
            );
            return Err(AppError::ProviderError {
                status: Some(status.as_u16()),
                message: "Error fetching data from the verification provider".to_string(),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::provider(format!("Failed to parse status response: {}", e)))?;

        Ok(data)
    }

    /// Downloads the document image into memory.
    ///
    /// The buffer lives only for the duration of the upload request; nothing
    /// is written to disk, so failures leave nothing behind.
    async fn download_image(&self, img_url: &str) -> Result<Vec<u8>, AppError> {
        tracing::debug!("Downloading document image from {}", img_url);

        let mut response = self
            .client
            .get(img_url)
            .send()
            .await
            .map_err(|e| AppError::provider(format!("Image download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ProviderError {
                status: Some(response.status().as_u16()),
                message: format!("Image download returned {}", response.status()),
            });
        }

        // Stream into the buffer chunk by chunk rather than buffering twice.
        let mut image = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::provider(format!("Image download interrupted: {}", e)))?
        {
            image.extend_from_slice(&chunk);
        }

        if image.is_empty() {
            return Err(AppError::provider("Downloaded image is empty".to_string()));
        }

        Ok(image)
    }

    fn apply_signature(
        &self,
        request: reqwest::RequestBuilder,
        headers: &SignedHeaders,
    ) -> reqwest::RequestBuilder {
        request
            .header(HEADER_APP_TOKEN, &headers.app_token)
            .header(HEADER_ACCESS_TS, &headers.access_ts)
            .header(HEADER_ACCESS_SIG, &headers.access_sig)
    }
}

/// Returns the request path including its encoded query string, which is the
/// portion of the URL that participates in the signature.
fn path_with_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Encodes the document upload as a `multipart/form-data` body: a `content`
/// file part followed by a `metadata` text field.
fn encode_multipart(boundary: &str, image: &[u8], metadata: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(image.len() + metadata.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"content\"; filename=\"document.jpg\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"metadata\"\r\n\r\n");
    body.extend_from_slice(metadata.as_bytes());
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let signer = RequestSigner::new("tok".to_string(), "secret".to_string());
        let client = SumsubClient::new("https://api.example.com".to_string(), signer, 30);
        assert!(client.is_ok());
    }

    #[test]
    fn path_with_query_includes_encoded_params() {
        let url = Url::parse_with_params(
            "https://api.example.com/resources/applicants",
            &[("levelName", "basic kyc")],
        )
        .unwrap();
        assert_eq!(
            path_with_query(&url),
            "/resources/applicants?levelName=basic+kyc"
        );
    }

    #[test]
    fn path_without_query_has_no_separator() {
        let url = Url::parse("https://api.example.com/resources/applicants/a1/requiredIdDocsStatus")
            .unwrap();
        assert_eq!(
            path_with_query(&url),
            "/resources/applicants/a1/requiredIdDocsStatus"
        );
    }

    #[test]
    fn multipart_body_contains_both_parts() {
        let body = encode_multipart("bnd", b"IMGDATA", r#"{"idDocType":"PASSPORT"}"#);
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("--bnd\r\n"));
        assert!(text.contains("name=\"content\""));
        assert!(text.contains("IMGDATA"));
        assert!(text.contains("name=\"metadata\""));
        assert!(text.contains(r#"{"idDocType":"PASSPORT"}"#));
        assert!(text.ends_with("--bnd--\r\n"));
    }

    #[test]
    fn multipart_body_is_deterministic_for_fixed_boundary() {
        let a = encode_multipart("b", b"x", "m");
        let b = encode_multipart("b", b"x", "m");
        assert_eq!(a, b);
    }
}
