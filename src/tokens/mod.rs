//! Token pipeline
//!
//! `service` is the facade (`obtain_new_token`, `validate_token`,
//! `list_scopes`); `jwt` and `remote` hold the local and issuer-side
//! validators it sequences.

pub mod access_token;
pub mod extract;
pub mod jwt;
pub mod remote;
pub mod service;
pub mod validation;

pub use access_token::{AccessToken, DecodedToken};
pub use extract::{extract_bearer_token, RequestContext};
pub use jwt::decode_token;
pub use service::{ObtainTokenOptions, TokenService, ValidateTokenOptions};
pub use validation::{scopes_permit, RequestedScopes, ValidationCode, ValidationResult};
