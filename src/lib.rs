pub mod core;
pub mod exchanges;

pub use crate::core::{
    config::{BitcoindeConfig, ConfigError},
    errors::{BitcoindeError, ErrorKind},
    events::{ChannelObserver, ErrorObserver},
    kernel::{HttpMethod, Nonce},
    types::{ApiErrorEntry, Params},
};
pub use exchanges::bitcoin_de::{build_connector, BitcoindeBuilder, BitcoindeClient};
