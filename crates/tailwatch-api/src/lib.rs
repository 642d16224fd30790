// tailwatch-api: Async Rust client for the WiGLE network search API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::{AreaQuery, WigleClient};
pub use error::Error;
pub use models::{NetworkRecord, SearchResponse};
pub use transport::TransportConfig;
