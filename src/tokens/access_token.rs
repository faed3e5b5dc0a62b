use serde::{Deserialize, Serialize};

use crate::utils::constants::TOKEN_CACHE_SAFETY_MARGIN_SECS;

/// Access token issued by the client-credentials grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

impl AccessToken {
    /// Seconds this token may live in the cache, `None` when it should not be cached at all.
    pub fn cache_ttl_seconds(&self) -> Option<u64> {
        self.expires_in
            .checked_sub(TOKEN_CACHE_SAFETY_MARGIN_SECS)
            .filter(|ttl| *ttl > 0)
            .map(|ttl| ttl as u64)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }
}

/// Claims of a verified Persona JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Present instead of `scopes` when the token holds too many to embed.
    #[serde(default, rename = "scopeCount", skip_serializing_if = "Option::is_none")]
    pub scope_count: Option<u64>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwtid: Option<String>,
}
