//! Tag Sync Hook - a GitHub webhook receiver that checks whether a local
//! checkout is behind a newly created release tag.
//!
//! Deliveries are authenticated with the shared HMAC secret, filtered down to
//! `create` events, and the created ref is compared with the newest tag in the
//! watched repository.

pub mod config;
pub mod server;
pub mod tags;
pub mod webhooks;
