//! Request signing and transport primitives.
//!
//! - [`nonce`]: per-client strictly increasing nonces
//! - [`signer`]: canonical signing string and HMAC-SHA256 signature headers
//! - [`rest`]: the [`RestTransport`] seam and its reqwest implementation
pub mod nonce;
pub mod rest;
pub mod signer;

// Re-export key types for convenience
pub use nonce::{Clock, Nonce, NonceGenerator, SystemClock};
pub use rest::{
    HttpMethod, RawResponse, ReqwestRest, RestClientBuilder, RestClientConfig, RestTransport,
    SignedRequest,
};
pub use signer::{body_digest, signing_string, HmacSigner, SignatureResult, Signer, EMPTY_BODY_MD5};
