//! Sumsub request signing.
//!
//! Every provider call carries three headers: the static app token, a Unix
//! timestamp, and an HMAC-SHA256 signature over
//! `ts || METHOD || path?query || body`, rendered as lowercase hex. The
//! provider rejects requests whose timestamp falls outside its clock-skew
//! window, so the signature is recomputed per request.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the static API token.
pub const HEADER_APP_TOKEN: &str = "X-App-Token";
/// Header carrying the signing timestamp (decimal seconds).
pub const HEADER_ACCESS_TS: &str = "X-App-Access-Ts";
/// Header carrying the lowercase-hex HMAC-SHA256 digest.
pub const HEADER_ACCESS_SIG: &str = "X-App-Access-Sig";

/// The authentication headers attached to a signed provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value for `X-App-Token`.
    pub app_token: String,
    /// Value for `X-App-Access-Ts`.
    pub access_ts: String,
    /// Value for `X-App-Access-Sig`.
    pub access_sig: String,
}

/// Signs outbound provider requests.
///
/// Holds the credentials explicitly (injected from `Config`) so the signer is
/// independently testable with known values.
#[derive(Clone)]
pub struct RequestSigner {
    app_token: String,
    secret_key: String,
}

impl RequestSigner {
    /// Creates a new `RequestSigner`.
    ///
    /// # Arguments
    ///
    /// * `app_token` - The static API token sent in `X-App-Token`.
    /// * `secret_key` - The HMAC secret shared with the provider.
    pub fn new(app_token: String, secret_key: String) -> Self {
        Self {
            app_token,
            secret_key,
        }
    }

    /// Signs a request using the current system clock.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method; upper-cased before signing.
    /// * `path_with_query` - Request path including its encoded query string.
    /// * `body` - Raw request body bytes (empty slice for body-less requests).
    pub fn sign(
        &self,
        method: &str,
        path_with_query: &str,
        body: &[u8],
    ) -> Result<SignedHeaders, AppError> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::InternalError(format!("System clock before epoch: {}", e)))?
            .as_secs() as i64;
        self.sign_at(ts, method, path_with_query, body)
    }

    /// Signs a request with an explicit timestamp.
    ///
    /// Deterministic: identical inputs always produce identical headers,
    /// which is what makes the signature testable against known vectors.
    pub fn sign_at(
        &self,
        ts: i64,
        method: &str,
        path_with_query: &str,
        body: &[u8],
    ) -> Result<SignedHeaders, AppError> {
        let ts_str = ts.to_string();

        // Byte concatenation order is the provider contract: ts, method,
        // path+query, body. Any deviation invalidates every signed call.
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| AppError::InternalError(format!("Invalid HMAC key: {}", e)))?;
        mac.update(ts_str.as_bytes());
        mac.update(method.to_uppercase().as_bytes());
        mac.update(path_with_query.as_bytes());
        mac.update(body);

        let digest = mac.finalize().into_bytes();

        Ok(SignedHeaders {
            app_token: self.app_token.clone(),
            access_ts: ts_str,
            access_sig: hex::encode(digest),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::Mac;

    fn test_signer() -> RequestSigner {
        RequestSigner::new("tst:app-token".to_string(), "test-secret".to_string())
    }

    #[test]
    fn sign_at_is_deterministic() {
        let signer = test_signer();
        let a = signer
            .sign_at(1700000000, "POST", "/resources/applicants?levelName=basic-kyc-level", b"{}")
            .unwrap();
        let b = signer
            .sign_at(1700000000, "POST", "/resources/applicants?levelName=basic-kyc-level", b"{}")
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sign_at_matches_manual_hmac() {
        let signer = test_signer();
        let headers = signer
            .sign_at(1700000000, "get", "/resources/applicants/abc/requiredIdDocsStatus", b"")
            .unwrap();

        // Manually build the signing string with the upper-cased method.
        let mut mac = HmacSha256::new_from_slice(b"test-secret").unwrap();
        mac.update(b"1700000000GET/resources/applicants/abc/requiredIdDocsStatus");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(headers.access_sig, expected);
        assert_eq!(headers.access_ts, "1700000000");
        assert_eq!(headers.app_token, "tst:app-token");
    }

    #[test]
    fn text_body_signs_as_its_utf8_bytes() {
        let signer = test_signer();
        let body = r#"{"externalUserId":"user-1"}"#;
        let from_str = signer.sign_at(42, "POST", "/p", body.as_bytes()).unwrap();
        let from_bytes = signer
            .sign_at(42, "POST", "/p", body.to_string().into_bytes().as_slice())
            .unwrap();
        assert_eq!(from_str.access_sig, from_bytes.access_sig);
    }

    #[test]
    fn signature_is_lowercase_hex_sha256_width() {
        let signer = test_signer();
        let headers = signer.sign_at(1, "GET", "/x", b"").unwrap();
        assert_eq!(headers.access_sig.len(), 64);
        assert!(headers
            .access_sig
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn different_timestamps_change_the_signature() {
        let signer = test_signer();
        let a = signer.sign_at(1, "GET", "/x", b"").unwrap();
        let b = signer.sign_at(2, "GET", "/x", b"").unwrap();
        assert_ne!(a.access_sig, b.access_sig);
    }

    #[test]
    fn query_string_participates_in_the_signature() {
        let signer = test_signer();
        let bare = signer.sign_at(7, "POST", "/resources/applicants", b"").unwrap();
        let with_query = signer
            .sign_at(7, "POST", "/resources/applicants?levelName=basic-kyc-level", b"")
            .unwrap();
        assert_ne!(bare.access_sig, with_query.access_sig);
    }
}
