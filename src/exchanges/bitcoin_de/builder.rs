use crate::core::config::BitcoindeConfig;
use crate::core::errors::BitcoindeError;
use crate::core::events::{ErrorListeners, ErrorObserver};
use crate::core::kernel::{
    NonceGenerator, ReqwestRest, RestClientBuilder, RestClientConfig, RestTransport,
};
use crate::exchanges::bitcoin_de::client::BitcoindeClient;
use std::sync::Arc;

/// Builder for [`BitcoindeClient`].
///
/// Observers registered here also receive the configuration error raised by
/// `build` when credentials are missing.
pub struct BitcoindeBuilder {
    config: BitcoindeConfig,
    listeners: ErrorListeners,
    nonces: Option<Arc<NonceGenerator>>,
}

impl BitcoindeBuilder {
    pub fn new(config: BitcoindeConfig) -> Self {
        Self {
            config,
            listeners: ErrorListeners::new(),
            nonces: None,
        }
    }

    pub fn with_observer(self, observer: impl ErrorObserver + 'static) -> Self {
        self.listeners.register(Arc::new(observer));
        self
    }

    /// Share a nonce generator, e.g. between clients using the same API key
    pub fn with_nonce_generator(mut self, nonces: Arc<NonceGenerator>) -> Self {
        self.nonces = Some(nonces);
        self
    }

    /// Build a client backed by reqwest
    pub fn build(self) -> Result<BitcoindeClient<ReqwestRest>, BitcoindeError> {
        if let Err(e) = self.config.validate() {
            return Err(self.listeners.report(e.into()));
        }

        let rest_config = RestClientConfig::new("bitcoin.de".to_string())
            .with_timeout_ms(self.config.timeout_ms);
        let rest = RestClientBuilder::new(rest_config)
            .build()
            .map_err(|e| self.listeners.report(e))?;

        self.build_with_transport(rest)
    }

    /// Build a client over a caller-supplied transport
    pub fn build_with_transport<T: RestTransport>(
        self,
        transport: T,
    ) -> Result<BitcoindeClient<T>, BitcoindeError> {
        let nonces = self
            .nonces
            .unwrap_or_else(|| Arc::new(NonceGenerator::new()));
        BitcoindeClient::from_parts(self.config, transport, self.listeners, nonces)
    }
}

/// Create a reqwest-backed client from configuration
pub fn build_connector(
    config: BitcoindeConfig,
) -> Result<BitcoindeClient<ReqwestRest>, BitcoindeError> {
    BitcoindeBuilder::new(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_build_connector_with_credentials() {
        let config = BitcoindeConfig::new("test_key".to_string(), "test_secret".to_string());
        let client = build_connector(config).unwrap();
        assert_eq!(
            client.action_url("account").unwrap().as_str(),
            "https://api.bitcoin.de/v2/account"
        );
    }

    #[test]
    fn test_build_connector_missing_secret() {
        let config = BitcoindeConfig::new("test_key".to_string(), String::new());
        let err = build_connector(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("secret"));
    }

    #[test]
    fn test_missing_key_is_emitted_once() {
        let emitted = Arc::new(AtomicUsize::new(0));
        let counter = emitted.clone();

        let result = BitcoindeBuilder::new(BitcoindeConfig::new(String::new(), "s".to_string()))
            .with_observer(move |err: &BitcoindeError| {
                assert_eq!(err.kind(), ErrorKind::Configuration);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        assert!(result.is_err());
        assert_eq!(emitted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shared_nonce_generator() {
        let nonces = Arc::new(NonceGenerator::new());
        let config = BitcoindeConfig::new("k".to_string(), "s".to_string());

        let first = BitcoindeBuilder::new(config.clone())
            .with_nonce_generator(nonces.clone())
            .build()
            .unwrap();
        let second = BitcoindeBuilder::new(config)
            .with_nonce_generator(nonces)
            .build()
            .unwrap();

        let a = first.next_nonce();
        let b = second.next_nonce();
        let c = first.next_nonce();
        assert!(a < b && b < c);
    }
}
