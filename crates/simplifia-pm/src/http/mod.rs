//! Blocking HTTP access for registry lookups and artifact downloads.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpError};
