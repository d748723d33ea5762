//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature header parsing and HMAC-SHA256 verification
//! - The `create` event payload

pub mod events;
pub mod signature;

pub use events::{CREATE_EVENT, CreateEvent, RefType, Sender};
pub use signature::{
    SignatureHeader, SignatureHeaderError, compute_signature, format_signature_header, verify,
};
