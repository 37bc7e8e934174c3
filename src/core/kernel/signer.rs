use crate::core::errors::BitcoindeError;
use crate::core::kernel::nonce::Nonce;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::collections::HashMap;

type HmacSha256 = Hmac<Sha256>;

/// MD5 of the empty string, used in place of a body digest when a request
/// carries no parameters.
pub const EMPTY_BODY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

pub const HEADER_API_KEY: &str = "X-API-KEY";
pub const HEADER_NONCE: &str = "X-API-NONCE";
pub const HEADER_SIGNATURE: &str = "X-API-SIGNATURE";

/// Result type for signing operations: the authentication headers
pub type SignatureResult = Result<HashMap<String, String>, BitcoindeError>;

/// Signer trait for request authentication
pub trait Signer: Send + Sync {
    /// Sign a request and return the headers to attach to it
    ///
    /// # Arguments
    /// * `method` - Uppercase HTTP method
    /// * `url` - Full request URL, including any query string
    /// * `nonce` - Nonce reserved for this request
    /// * `body_md5` - Hex MD5 of the form body, or [`EMPTY_BODY_MD5`]
    fn sign_request(&self, method: &str, url: &str, nonce: Nonce, body_md5: &str)
        -> SignatureResult;
}

/// Hex MD5 digest of a serialized request body
pub fn body_digest(body: &str) -> String {
    hex::encode(Md5::digest(body.as_bytes()))
}

/// `METHOD#url#apiKey#nonce#md5`
pub fn signing_string(method: &str, url: &str, api_key: &str, nonce: &str, body_md5: &str) -> String {
    [method.to_uppercase().as_str(), url, api_key, nonce, body_md5].join("#")
}

/// HMAC-SHA256 signer for the bitcoin.de API
pub struct HmacSigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

impl HmacSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
        }
    }

    /// Hex HMAC-SHA256 of the signing string built from the given parts
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        nonce: &str,
        body_md5: &str,
    ) -> Result<String, BitcoindeError> {
        let message = signing_string(method, url, self.api_key.expose_secret(), nonce, body_md5);

        let mut mac = HmacSha256::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .map_err(|e| BitcoindeError::AuthError(format!("Invalid secret key: {}", e)))?;

        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl Signer for HmacSigner {
    fn sign_request(
        &self,
        method: &str,
        url: &str,
        nonce: Nonce,
        body_md5: &str,
    ) -> SignatureResult {
        let nonce = nonce.to_string();
        let signature = self.sign(method, url, &nonce, body_md5)?;

        let mut headers = HashMap::new();
        headers.insert(HEADER_API_KEY.to_string(), self.api_key.expose_secret().clone());
        headers.insert(HEADER_NONCE.to_string(), nonce);
        headers.insert(HEADER_SIGNATURE.to_string(), signature);

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_digest() {
        assert_eq!(body_digest(""), EMPTY_BODY_MD5);
        assert_eq!(body_digest("a=1&b=2"), "ed04c91cf6f6ab5a01a31c0295c5da34");
    }

    #[test]
    fn test_signing_string_layout() {
        assert_eq!(
            signing_string("delete", "https://x/v2/orders", "K", "N", EMPTY_BODY_MD5),
            "DELETE#https://x/v2/orders#K#N#d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_reference_signature() {
        let signer = HmacSigner::new("K".to_string(), "S".to_string());
        let signature = signer
            .sign("GET", "https://api.bitcoin.de/v2/account", "N", EMPTY_BODY_MD5)
            .unwrap();
        assert_eq!(
            signature,
            "2affcb4b61ddc396bcb572463b71f7d4b822a5243488030acb6b49276a11b4ab"
        );
    }

    #[test]
    fn test_sign_request_headers() {
        let signer = HmacSigner::new("K".to_string(), "S".to_string());
        let nonce = Nonce::new(1_500_000_000_000, 0);
        let headers = signer
            .sign_request(
                "POST",
                "https://api.bitcoin.de/v2/orders",
                nonce,
                &body_digest("a=1&b=2"),
            )
            .unwrap();

        assert_eq!(headers.len(), 3);
        assert_eq!(headers[HEADER_API_KEY], "K");
        assert_eq!(headers[HEADER_NONCE], "15000000000000000");
        assert_eq!(
            headers[HEADER_SIGNATURE],
            "790f9c039f11ab9805cc6bfd30e12fb7f2ec011599c98b864edd523ca68b6d36"
        );
    }
}
