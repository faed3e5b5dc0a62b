use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::backend::CacheBackend;
use crate::observability::metrics::Metrics;
use crate::utils::constants::CERTIFICATE_CACHE_PREFIX;

static CACHE_LABEL: &str = "certificate";

/// Stores the issuer's PEM public key. Entries are opaque here, their
/// validity is only established when a token is decoded with them.
#[derive(Clone)]
pub struct CertificateCache {
    backend: Arc<dyn CacheBackend>,
    metrics: Arc<Metrics>,
}

impl CertificateCache {
    pub fn new(backend: Arc<dyn CacheBackend>, metrics: Arc<Metrics>) -> Self {
        Self { backend, metrics }
    }

    fn key(id: &str) -> String {
        format!("{}{}", CERTIFICATE_CACHE_PREFIX, id)
    }

    pub async fn get_cached_certificate(&self, id: &str) -> Option<String> {
        match self.backend.fetch(&Self::key(id)).await {
            Ok(Some(certificate)) if !certificate.is_empty() => {
                self.metrics.cache_op(CACHE_LABEL, "fetch", "hit");
                Some(certificate)
            }
            Ok(_) => {
                self.metrics.cache_op(CACHE_LABEL, "fetch", "miss");
                None
            }
            Err(err) => {
                warn!(id, error = %err, "certificate cache read failed");
                self.metrics.cache_op(CACHE_LABEL, "fetch", "error");
                None
            }
        }
    }

    pub async fn cache_certificate(&self, certificate: &str, ttl: Duration, id: &str) {
        match self.backend.save(&Self::key(id), certificate.to_owned(), ttl).await {
            Ok(()) => {
                debug!(id, ttl_secs = ttl.as_secs(), "certificate cached");
                self.metrics.cache_op(CACHE_LABEL, "save", "ok");
            }
            Err(err) => {
                warn!(id, error = %err, "certificate cache write failed");
                self.metrics.cache_op(CACHE_LABEL, "save", "error");
            }
        }
    }
}
