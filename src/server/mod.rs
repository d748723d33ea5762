//! HTTP server for the tag sync hook.
//!
//! # Endpoints
//!
//! - `POST /` - Accepts GitHub webhook deliveries and reports whether the
//!   watched checkout is behind the created ref
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::tags::{GitTagInspector, TagSource};

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{ErrorBody, InfoBody, WebhookError, webhook_handler};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. It is
/// read-only for the life of the process.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    /// Webhook secret for HMAC-SHA256 signature verification.
    webhook_secret: Vec<u8>,

    /// Where local tags come from.
    tags: S,
}

// Manual impl: cloning the state only clones the `Arc`, so `S` need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: TagSource> AppState<S> {
    pub fn new(webhook_secret: impl Into<Vec<u8>>, tags: S) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret: webhook_secret.into(),
                tags,
            }),
        }
    }

    /// Returns the webhook secret.
    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    /// Returns the tag source.
    pub fn tags(&self) -> &S {
        &self.inner.tags
    }
}

impl AppState<GitTagInspector> {
    /// Builds the production state: tags are read from `config.repo_path`.
    pub fn from_config(config: &Config) -> Self {
        AppState::new(
            config.webhook_secret.clone(),
            GitTagInspector::new(&config.repo_path, config.git_timeout),
        )
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<S>(app_state: AppState<S>) -> axum::Router
where
    S: TagSource + Send + Sync + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", post(webhook_handler::<S>))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn from_config_uses_repo_path() {
        let config = Config {
            webhook_secret: b"test-secret".to_vec(),
            repo_path: "/srv/app".into(),
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            git_timeout: Duration::from_secs(3),
        };

        let state = AppState::from_config(&config);

        assert_eq!(state.webhook_secret(), b"test-secret");
        assert_eq!(state.tags().repo_path(), Path::new("/srv/app"));
    }

    #[test]
    fn app_state_clone_shares_inner() {
        let state = AppState::new(
            b"secret".to_vec(),
            GitTagInspector::new("/srv/app", Duration::from_secs(1)),
        );
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.inner, &cloned.inner));
    }
}
