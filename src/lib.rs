//! # betfair-rpc
//!
//! A Rust client for the Betfair Exchange betting API over JSON-RPC, using
//! certificate (mutual TLS) login.
//!
//! ## Quick Start
//!
//! ```no_run
//! use betfair_rpc::{BettingApi, Config, JsonRpcClient};
//! use betfair_rpc::dto::{MarketFilter, MarketProjection};
//!
//! # async fn example() -> anyhow::Result<()> {
//! // Load configuration from config.toml (BETFAIR_APP_KEY overrides api_key)
//! let config = Config::new()?;
//!
//! // Build the certificate-backed client and log in
//! let api = BettingApi::new(JsonRpcClient::new(config)?);
//! api.authenticate().await?;
//!
//! // List available event types (e.g., Soccer, Tennis, Horse Racing)
//! let event_types = api.list_event_types(&MarketFilter::default()).await?;
//!
//! // Get markets for a specific event type
//! let filter = MarketFilter {
//!     event_type_ids: Some(vec!["1".to_string()]), // Soccer
//!     ..Default::default()
//! };
//! let markets = api
//!     .list_market_catalogue(&filter, 10, vec![MarketProjection::RunnerDescription])
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Certificate Login**: Client certificate and key presented on every connection,
//!   server verified against a configured root bundle only
//! - **Typed Operations**: Navigation, market catalogue and books, current orders, order placement
//! - **Retry Logic**: Connection failures retried with exponential backoff until the call deadline
//! - **Sparse Parameters**: Unset request fields are left off the wire
//!
//! ## Configuration
//!
//! Create a `config.toml` file with your Betfair credentials:
//!
//! ```toml
//! [betfair]
//! username = "your_username"
//! password = "your_password"
//! api_key = "your_api_key"          # or set BETFAIR_APP_KEY
//! cert_path = "/path/to/client.crt"
//! key_path = "/path/to/client.key"
//! root_ca_path = "certs/rootca.pem" # optional, this is the default
//! timeout_secs = 20                 # optional
//! ```

pub mod api;
pub mod config;
pub mod dto;
pub mod error;
pub mod params;
pub mod retry;
pub mod tls;
pub mod transport;

// Re-export commonly used types at the crate root
pub use api::BettingApi;
pub use config::Config;
pub use error::{BetfairError, Result};
pub use params::{MarketFilterParams, OperationParams, PlaceInstructionParams};
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::{JsonRpcClient, Session};
