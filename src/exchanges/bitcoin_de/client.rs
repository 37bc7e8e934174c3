use crate::core::config::BitcoindeConfig;
use crate::core::errors::BitcoindeError;
use crate::core::events::{ErrorListeners, ErrorObserver};
use crate::core::kernel::{
    body_digest, HttpMethod, HmacSigner, Nonce, NonceGenerator, RawResponse, ReqwestRest,
    RestTransport, SignedRequest, Signer, EMPTY_BODY_MD5,
};
use crate::core::types::Params;
use crate::exchanges::bitcoin_de::types::reported_errors;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Signed request client for the bitcoin.de API.
///
/// Every call gets a fresh nonce from the instance's generator, is signed with
/// HMAC-SHA256 and dispatched through the transport `T`. Failures are returned
/// to the caller and also emitted to every registered [`ErrorObserver`].
/// Clones share the nonce generator and the observer registry.
///
/// Parameters are anything convertible into [`Params`]: `()` for none, an
/// array or `Vec` of `(key, value)` pairs, or a `Params` built with `with`.
#[derive(Clone)]
pub struct BitcoindeClient<T: RestTransport = ReqwestRest> {
    transport: T,
    config: Arc<BitcoindeConfig>,
    signer: Arc<dyn Signer>,
    nonces: Arc<NonceGenerator>,
    listeners: ErrorListeners,
}

impl<T: RestTransport> std::fmt::Debug for BitcoindeClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitcoindeClient")
            .field("api_root", &self.config.api_root())
            .field("nonces", &self.nonces)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

impl<T: RestTransport> BitcoindeClient<T> {
    /// Create a client over an existing transport.
    ///
    /// Fails with a configuration error if the key or secret is missing.
    pub fn with_transport(config: BitcoindeConfig, transport: T) -> Result<Self, BitcoindeError> {
        Self::from_parts(
            config,
            transport,
            ErrorListeners::new(),
            Arc::new(NonceGenerator::new()),
        )
    }

    pub(crate) fn from_parts(
        config: BitcoindeConfig,
        transport: T,
        listeners: ErrorListeners,
        nonces: Arc<NonceGenerator>,
    ) -> Result<Self, BitcoindeError> {
        if let Err(e) = config.validate() {
            return Err(listeners.report(e.into()));
        }

        let signer = Arc::new(HmacSigner::new(
            config.api_key().to_string(),
            config.api_secret().to_string(),
        ));

        Ok(Self {
            transport,
            config: Arc::new(config),
            signer,
            nonces,
            listeners,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Register an observer that receives every error from now on
    pub fn on_error(&self, observer: impl ErrorObserver + 'static) {
        self.listeners.register(Arc::new(observer));
    }

    pub fn next_nonce(&self) -> Nonce {
        self.nonces.generate()
    }

    /// `{base_url}/{version}/{action}`, normalized the way it goes on the wire
    pub fn action_url(&self, action: &str) -> Result<Url, BitcoindeError> {
        let raw = format!(
            "{}/{}",
            self.config.api_root(),
            action.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| {
            BitcoindeError::InvalidParameters(format!("Invalid URL '{}': {}", raw, e))
        })
    }

    /// Perform a signed GET request
    pub async fn get(
        &self,
        action: &str,
        params: impl Into<Params>,
    ) -> Result<Value, BitcoindeError> {
        self.send(HttpMethod::Get, action, &params.into()).await
    }

    /// Perform a signed POST request
    pub async fn post(
        &self,
        action: &str,
        params: impl Into<Params>,
    ) -> Result<Value, BitcoindeError> {
        self.send(HttpMethod::Post, action, &params.into()).await
    }

    /// Perform a signed DELETE request
    pub async fn delete(
        &self,
        action: &str,
        params: impl Into<Params>,
    ) -> Result<Value, BitcoindeError> {
        self.send(HttpMethod::Delete, action, &params.into()).await
    }

    /// Perform a signed request with the verb given as a string.
    ///
    /// Verbs other than GET, POST and DELETE fail before anything is signed
    /// or sent.
    pub async fn request(
        &self,
        method: &str,
        action: &str,
        params: impl Into<Params>,
    ) -> Result<Value, BitcoindeError> {
        let method: HttpMethod = method.parse().map_err(|e| self.listeners.report(e))?;
        self.send(method, action, &params.into()).await
    }

    pub async fn get_json<R: DeserializeOwned>(
        &self,
        action: &str,
        params: impl Into<Params>,
    ) -> Result<R, BitcoindeError> {
        self.send_json(HttpMethod::Get, action, &params.into()).await
    }

    pub async fn post_json<R: DeserializeOwned>(
        &self,
        action: &str,
        params: impl Into<Params>,
    ) -> Result<R, BitcoindeError> {
        self.send_json(HttpMethod::Post, action, &params.into()).await
    }

    pub async fn delete_json<R: DeserializeOwned>(
        &self,
        action: &str,
        params: impl Into<Params>,
    ) -> Result<R, BitcoindeError> {
        self.send_json(HttpMethod::Delete, action, &params.into()).await
    }

    /// Build and sign a request without sending it
    pub fn build_request(
        &self,
        method: HttpMethod,
        action: &str,
        params: &Params,
    ) -> Result<SignedRequest, BitcoindeError> {
        if action.trim_matches('/').is_empty() {
            return Err(BitcoindeError::InvalidParameters(
                "action must not be empty".to_string(),
            ));
        }

        let nonce = self.nonces.generate();
        let mut url = self.action_url(action)?;
        let mut body = None;
        let mut body_md5 = EMPTY_BODY_MD5.to_string();

        // POST bodies are sorted so the same parameter set always hashes the same
        let encoded = params.encode(method == HttpMethod::Post)?;
        if !encoded.is_empty() {
            match method {
                HttpMethod::Post => {
                    body_md5 = body_digest(&encoded);
                    body = Some(encoded);
                }
                HttpMethod::Get | HttpMethod::Delete => url.set_query(Some(&encoded)),
            }
        }

        // The serialized Url is byte-for-byte what reqwest sends
        let url = String::from(url);
        let mut headers = self
            .signer
            .sign_request(method.as_str(), &url, nonce, &body_md5)?;
        headers.insert("User-Agent".to_string(), self.config.user_agent.clone());

        Ok(SignedRequest {
            method,
            url,
            headers,
            body,
        })
    }

    async fn send(
        &self,
        method: HttpMethod,
        action: &str,
        params: &Params,
    ) -> Result<Value, BitcoindeError> {
        self.dispatch(method, action, params)
            .await
            .map_err(|e| self.listeners.report(e))
    }

    async fn send_json<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        action: &str,
        params: &Params,
    ) -> Result<R, BitcoindeError> {
        self.dispatch(method, action, params)
            .await
            .and_then(|value| {
                serde_json::from_value(value).map_err(|e| {
                    BitcoindeError::DeserializationError(format!(
                        "Failed to deserialize JSON: {}",
                        e
                    ))
                })
            })
            .map_err(|e| self.listeners.report(e))
    }

    #[instrument(skip(self, params), fields(method = %method, action = %action, param_count = params.len()))]
    async fn dispatch(
        &self,
        method: HttpMethod,
        action: &str,
        params: &Params,
    ) -> Result<Value, BitcoindeError> {
        let request = self.build_request(method, action, params)?;
        debug!(url = %request.url, "Dispatching signed request");

        let response = self.transport.execute(request).await?;
        handle_response(&response)
    }
}

/// Turn a raw response into the decoded payload or an error.
///
/// A non-empty `errors` list wins over the HTTP status.
pub fn handle_response(response: &RawResponse) -> Result<Value, BitcoindeError> {
    match serde_json::from_str::<Value>(&response.body) {
        Ok(payload) => {
            if let Some(errors) = reported_errors(&payload) {
                let message = errors[0]
                    .message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                return Err(BitcoindeError::ApiError { message, errors });
            }
            if response.is_success() {
                Ok(payload)
            } else {
                Err(BitcoindeError::HttpStatus {
                    status: response.status,
                    body: response.body.clone(),
                })
            }
        }
        Err(e) if response.is_success() => Err(BitcoindeError::DeserializationError(format!(
            "Failed to parse JSON response: {}",
            e
        ))),
        Err(_) => Err(BitcoindeError::HttpStatus {
            status: response.status,
            body: response.body.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use crate::exchanges::bitcoin_de::builder::build_connector;
    use serde_json::json;

    fn create_client(base_url: &str) -> BitcoindeClient {
        let config = BitcoindeConfig::new("K".to_string(), "S".to_string()).base_url(base_url);
        build_connector(config).unwrap()
    }

    fn assert_wire_form(request: &SignedRequest) {
        let reparsed = Url::parse(&request.url).unwrap();
        assert_eq!(reparsed.as_str(), request.url);
    }

    fn assert_signed_over_url(request: &SignedRequest, body_md5: &str) {
        let expected = HmacSigner::new("K".to_string(), "S".to_string())
            .sign(
                request.method.as_str(),
                &request.url,
                &request.headers["X-API-NONCE"],
                body_md5,
            )
            .unwrap();
        assert_eq!(request.headers["X-API-SIGNATURE"], expected);
    }

    #[test]
    fn test_signed_url_is_normalized_path() {
        let client = create_client("https://api.bitcoin.de");
        let request = client
            .build_request(HttpMethod::Get, "orders/ab c", &Params::new())
            .unwrap();

        assert_eq!(request.url, "https://api.bitcoin.de/v2/orders/ab%20c");
        assert_wire_form(&request);
        assert_signed_over_url(&request, EMPTY_BODY_MD5);
    }

    #[test]
    fn test_signed_url_is_normalized_host_and_port() {
        let client = create_client("https://API.Bitcoin.de:443");
        let request = client
            .build_request(
                HttpMethod::Delete,
                "orders/A1B2",
                &Params::from([("trading_pair", "btceur"), ("note", "a b")]),
            )
            .unwrap();

        assert_eq!(
            request.url,
            "https://api.bitcoin.de/v2/orders/A1B2?trading_pair=btceur&note=a+b"
        );
        assert_wire_form(&request);
        assert_signed_over_url(&request, EMPTY_BODY_MD5);
    }

    #[test]
    fn test_post_body_is_sorted() {
        let client = create_client("https://api.bitcoin.de");
        let request = client
            .build_request(
                HttpMethod::Post,
                "orders",
                &Params::new().with("b", 2).with("a", "1"),
            )
            .unwrap();

        assert_eq!(request.url, "https://api.bitcoin.de/v2/orders");
        assert_eq!(request.body.as_deref(), Some("a=1&b=2"));
        assert_signed_over_url(&request, "ed04c91cf6f6ab5a01a31c0295c5da34");
    }

    #[test]
    fn test_unparseable_base_url() {
        let client = create_client("not a url");
        let err = client
            .build_request(HttpMethod::Get, "account", &Params::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_api_errors_win_over_status() {
        for status in [200, 400, 403] {
            let response = RawResponse::new(status, r#"{"errors":[{"message":"invalid nonce"}]}"#);
            let err = handle_response(&response).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Api);
            assert_eq!(err.api_message(), Some("invalid nonce"));
        }
    }

    #[test]
    fn test_successful_payload() {
        let response = RawResponse::new(200, r#"{"data":{"balances":{}},"errors":[],"credits":20}"#);
        let payload = handle_response(&response).unwrap();
        assert_eq!(payload["credits"], json!(20));
    }

    #[test]
    fn test_malformed_json() {
        let err = handle_response(&RawResponse::new(200, "<html>oops</html>")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = handle_response(&RawResponse::new(502, "Bad Gateway")).unwrap_err();
        assert!(matches!(err, BitcoindeError::HttpStatus { status: 502, .. }));
    }

    #[test]
    fn test_error_status_without_errors_list() {
        let err = handle_response(&RawResponse::new(500, r#"{"detail":"down"}"#)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
