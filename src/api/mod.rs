//! Remote API access: domain types, wire types, the HTTP client and the
//! concurrent detail fetcher.

pub mod api_types;
pub mod client;
pub mod details;
pub mod types;

pub use client::{PokeApiClient, RemoteSource};
pub use types::Record;
