use std::time::Duration;

use serde::Deserialize;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::{
    DEFAULT_CERTIFICATE_TTL_SECS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_KEYS_ROUTE,
    DEFAULT_OAUTH_ROUTE,
};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub persona: PersonaSettings,
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// ================================
/// Persona connection
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct PersonaSettings {
    /// Base URL of the issuer, e.g. `https://users.example.com`
    pub host: String,
    #[serde(default = "default_oauth_route")]
    pub oauth_route: String,
    #[serde(default = "default_keys_route")]
    pub keys_route: String,
    /// `<app-id>/<version>`, sent ahead of this library's own agent string
    pub user_agent: String,
    #[serde(default = "default_certificate_ttl")]
    pub certificate_ttl_seconds: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    pub request_id: Option<String>,
}

impl PersonaSettings {
    pub fn new(host: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            oauth_route: default_oauth_route(),
            keys_route: default_keys_route(),
            user_agent: user_agent.into(),
            certificate_ttl_seconds: DEFAULT_CERTIFICATE_TTL_SECS,
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
            request_id: None,
        }
    }

    /// Whole seconds; a fractional part rounds up.
    pub fn with_certificate_ttl(mut self, ttl: Duration) -> Self {
        self.certificate_ttl_seconds = whole_seconds(ttl);
        self
    }

    /// Whole seconds; a fractional part rounds up, so 500ms becomes 1s.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = whole_seconds(timeout);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn certificate_ttl(&self) -> Duration {
        Duration::from_secs(self.certificate_ttl_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn base(&self) -> &str {
        self.host.trim_end_matches('/')
    }

    /// `{host}{oauth_route}`
    pub fn tokens_url(&self) -> String {
        format!("{}{}", self.base(), self.oauth_route)
    }

    /// `{host}{keys_route}`
    pub fn keys_url(&self) -> String {
        format!("{}{}", self.base(), self.keys_route)
    }
}

fn whole_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

fn default_oauth_route() -> String {
    DEFAULT_OAUTH_ROUTE.to_owned()
}

fn default_keys_route() -> String {
    DEFAULT_KEYS_ROUTE.to_owned()
}

fn default_certificate_ttl() -> u64 {
    DEFAULT_CERTIFICATE_TTL_SECS
}

fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}
