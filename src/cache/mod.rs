//! Best-effort caching on top of a pluggable [`backend::CacheBackend`].
//!
//! Failures of the backend are logged and treated as a miss; nothing in this
//! module propagates a cache error to the caller.

pub mod backend;
pub mod certificate_cache;
pub mod token_cache;

pub use backend::{CacheBackend, CacheError, MemoryCache};
pub use certificate_cache::CertificateCache;
pub use token_cache::TokenCache;
