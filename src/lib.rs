//! # Persona Tokens
//!
//! Client side of the Persona OAuth service: obtains client-credentials
//! tokens, validates bearer tokens locally against the issuer's certificate
//! with a remote fallback, caches certificates and tokens, and presigns URLs.
//!
//! Modules:
//! - `tokens` — token service facade, JWT and remote validators
//! - `cache` — cache backend and the certificate/token caches on top of it
//! - `transport` — HTTP transport used to reach the issuer
//! - `signing` — HMAC presigned URLs
//! - `config` — YAML configuration and its validation

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod signing;
pub mod tokens;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::{PersonaSettings, ServiceConfig};
pub use crate::error::{PersonaError, Result};
pub use crate::tokens::{
    ObtainTokenOptions, RequestedScopes, TokenService, ValidateTokenOptions, ValidationCode,
    ValidationResult,
};
