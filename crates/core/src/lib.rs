//! `bizdesk-core` — shared building blocks for the client layer.
//!
//! Only the error model lives here; state, transport and crypto sit in
//! `bizdesk-client`.

pub mod error;

pub use error::{DomainError, DomainResult};
