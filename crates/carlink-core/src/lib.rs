//! carlink-core - Typed telemetry models for the carlink vehicle-cloud client
//!
//! This crate holds the data shapes returned by the manufacturer's cloud API:
//! vehicle summaries, dashboard metrics, location, notifications and trip
//! history, plus the response envelope the provider wraps every payload in.
//! It is a pure data crate; all network access lives in `carlink-client`.

pub mod models;

pub use models::*;
