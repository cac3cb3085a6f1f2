//! REST API client for the clist.by contest listing service.
//!
//! This module provides the `ApiClient` for fetching upcoming and ongoing
//! contests. Requests authenticate with the per-user username and API key
//! kept in the synced storage area; missing credentials short-circuit
//! before any network access.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
