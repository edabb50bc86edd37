//! Shared data models for cloud telemetry payloads

mod dashboard;
mod location;
mod notification;
mod payload;
mod trip;
mod vehicle;

pub use dashboard::*;
pub use location::*;
pub use notification::*;
pub use payload::*;
pub use trip::*;
pub use vehicle::*;
