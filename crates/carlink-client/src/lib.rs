//! carlink-client — async client for a vehicle manufacturer's cloud
//! telemetry API
//!
//! The core of the crate is the authentication/session layer: a token
//! cache, a multi-step credential authenticator, and a session manager that
//! answers every "give me a valid access token" request from the cache when
//! it can, refreshes when the cached token went stale, and falls back to a
//! full login exactly once when the refresh is rejected.
//!
//! # Example
//!
//! ```rust,no_run
//! use carlink_client::CarlinkClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CarlinkClient::new("user@example.com", "password")?;
//!     client.login().await?;
//!
//!     for vehicle in client.get_vehicles().await? {
//!         let dashboard = client.get_telemetry(&vehicle.vin).await?;
//!         println!("{}: {} km", vehicle.display_name(), dashboard.odometer.value);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Durable tokens
//!
//! Inject a [`auth::FileTokenCache`] to keep tokens across process restarts;
//! repeated runs then hit the cached-token fast path instead of logging in
//! again:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use carlink_client::{auth::FileTokenCache, CarlinkClient, CloudConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cache = Arc::new(FileTokenCache::new("/var/cache/carlink/tokens.json"));
//! let client = CarlinkClient::with_config(
//!     CloudConfig::default(),
//!     cache,
//!     "user@example.com",
//!     "password",
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! The `testing` module ships an in-process mock of the provider (login
//! realm and telemetry API) with per-endpoint hit counters:
//!
//! ```rust,ignore
//! use carlink_client::testing::{LoginScenario, TestServer};
//!
//! let server = TestServer::start(LoginScenario::Success).await?;
//! let config = CloudConfig::single_host(&server.base_url())?;
//! ```

pub mod auth;
mod client;
mod config;
mod error;
pub mod testing;

pub use client::CarlinkClient;
pub use config::CloudConfig;
pub use error::{AuthError, CarlinkError, Result};

// Re-export the telemetry models for convenience
pub use carlink_core::models::{
    Dashboard, Location, Notification, TripSummary, VehicleSummary, WarningLight,
};
