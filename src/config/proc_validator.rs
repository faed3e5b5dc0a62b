//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks the persona connection (host URL, routes, user agent, timeouts)
//!   and the logging block.

use regex::RegexBuilder;
use tracing::{error, info};
use url::Url;

use crate::config::persona::{PersonaSettings, ServiceConfig};
use crate::config::settings::SettingsConfig;
use crate::error::PersonaError;

const ALLOWED_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const USER_AGENT_PATTERN: &str = r"^[a-z0-9\-._]+(/\S+)?$";

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_persona(&cfg.persona, &mut errors);
    validate_settings(&cfg.settings, &mut errors);

    if errors.is_empty() {
        info!("configuration validated");
        Ok(())
    } else {
        for e in &errors {
            error!("config validation: {}", e);
        }
        Err(errors)
    }
}

pub fn validate_persona(persona: &PersonaSettings, errors: &mut Vec<String>) {
    if persona.host.trim().is_empty() {
        errors.push("persona.host must not be empty".to_string());
    } else {
        match Url::parse(&persona.host) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(format!(
                "persona.host '{}' must use http or https, got '{}'",
                persona.host,
                url.scheme()
            )),
            Err(e) => errors.push(format!("persona.host '{}' is not a valid URL: {}", persona.host, e)),
        }
    }

    for (name, route) in [("oauth_route", &persona.oauth_route), ("keys_route", &persona.keys_route)] {
        if !route.starts_with('/') {
            errors.push(format!("persona.{} '{}' must start with '/'", name, route));
        }
    }

    let user_agent_ok = RegexBuilder::new(USER_AGENT_PATTERN)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(&persona.user_agent))
        .unwrap_or(false);
    if !user_agent_ok {
        errors.push(format!(
            "persona.user_agent '{}' must look like '<app-id>/<version>'",
            persona.user_agent
        ));
    }

    if persona.timeout_seconds == 0 {
        errors.push("persona.timeout_seconds must be greater than 0".to_string());
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(logging) = &settings.logging {
        if !ALLOWED_LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of {:?}",
                logging.level, ALLOWED_LOG_LEVELS
            ));
        }
    }
}

impl PersonaSettings {
    pub fn validate(&self) -> Result<(), PersonaError> {
        let mut errors = Vec::new();
        validate_persona(self, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PersonaError::Config(errors.join("; ")))
        }
    }
}
