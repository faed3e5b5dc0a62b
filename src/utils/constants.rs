//! Shared constants and invariants

/// Seconds subtracted from `expires_in` before an access token is cached.
pub const TOKEN_CACHE_SAFETY_MARGIN_SECS: i64 = 60;
pub const DEFAULT_CERTIFICATE_TTL_SECS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Presigned URLs default to fifteen minutes of validity.
pub const DEFAULT_PRESIGN_TTL_SECS: i64 = 15 * 60;

pub const DEFAULT_OAUTH_ROUTE: &str = "/oauth/tokens";
pub const DEFAULT_KEYS_ROUTE: &str = "/oauth/keys";

pub const SUPERUSER_SCOPE: &str = "su";
pub const DEFAULT_CERTIFICATE_ID: &str = "pub";

// Cache keys
pub const CERTIFICATE_CACHE_PREFIX: &str = "persona:certificate:";
pub const TOKEN_CACHE_PREFIX: &str = "obtain_token:";

// Request parameters
pub const ACCESS_TOKEN_PARAM: &str = "access_token";
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const EXPIRES_PARAM: &str = "expires";
pub const SIGNATURE_PARAM: &str = "signature";

pub const LIBRARY_NAME: &str = env!("CARGO_PKG_NAME");
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
