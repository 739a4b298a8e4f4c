//! sealdrop-transport: signed HTTP transport
//!
//! Every request carries an API key header, a UTC timestamp header, and an
//! HMAC-SHA256 signature over `api_key || path || timestamp || body`.
//! Responses are parsed envelope-first: the status discriminant decides
//! whether a typed payload exists before any type-specific parsing runs.

pub mod client;
pub mod envelope;

pub use client::ApiClient;
pub use envelope::{ApiReply, Envelope, ResponseStatus};

// The HTTP method vocabulary is part of this crate's API surface.
pub use reqwest::Method;
