use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::backend::CacheBackend;
use crate::observability::metrics::Metrics;
use crate::tokens::access_token::AccessToken;
use crate::utils::constants::TOKEN_CACHE_PREFIX;

static CACHE_LABEL: &str = "token";

/// Access tokens issued to a client, keyed by a hash of the client id.
#[derive(Clone)]
pub struct TokenCache {
    backend: Arc<dyn CacheBackend>,
    metrics: Arc<Metrics>,
}

impl TokenCache {
    pub fn new(backend: Arc<dyn CacheBackend>, metrics: Arc<Metrics>) -> Self {
        Self { backend, metrics }
    }

    pub fn key(client_id: &str) -> String {
        let digest = Sha256::digest(client_id.as_bytes());
        format!("{}{}", TOKEN_CACHE_PREFIX, hex::encode(digest))
    }

    pub async fn get_cached_token(&self, client_id: &str) -> Option<AccessToken> {
        let raw = match self.backend.fetch(&Self::key(client_id)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.metrics.cache_op(CACHE_LABEL, "fetch", "miss");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "token cache read failed");
                self.metrics.cache_op(CACHE_LABEL, "fetch", "error");
                return None;
            }
        };

        match serde_json::from_str::<AccessToken>(&raw) {
            Ok(token) => {
                self.metrics.cache_op(CACHE_LABEL, "fetch", "hit");
                Some(token)
            }
            Err(err) => {
                warn!(error = %err, "cached token is not decodable, ignoring it");
                self.metrics.cache_op(CACHE_LABEL, "fetch", "error");
                None
            }
        }
    }

    /// Caches for `expires_in - 60` seconds; nothing is written when that is not positive.
    pub async fn cache_token(&self, client_id: &str, token: &AccessToken) {
        let Some(ttl) = token.cache_ttl_seconds() else {
            debug!(expires_in = token.expires_in, "token expires too soon to be cached");
            return;
        };

        let raw = match serde_json::to_string(token) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "token could not be serialised for caching");
                return;
            }
        };

        match self.backend.save(&Self::key(client_id), raw, Duration::from_secs(ttl)).await {
            Ok(()) => {
                debug!(ttl_secs = ttl, "token cached");
                self.metrics.cache_op(CACHE_LABEL, "save", "ok");
            }
            Err(err) => {
                warn!(error = %err, "token cache write failed");
                self.metrics.cache_op(CACHE_LABEL, "save", "error");
            }
        }
    }
}
