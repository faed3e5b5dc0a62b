use std::collections::BTreeSet;
use std::time::Instant;

use http::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::error::{PersonaError, Result};
use crate::tokens::service::TokenService;
use crate::tokens::validation::{RequestedScopes, ValidationCode, ValidationResult};
use crate::transport::HttpResponse;

static REMOTE_PATH: &str = "remote";

#[derive(Debug, Deserialize)]
struct TokenMetadata {
    scopes: Option<String>,
}

impl TokenService {
    /// Ask the issuer to validate `token`. One round trip, no retries.
    pub async fn validate_using_persona(
        &self,
        token: &str,
        scopes: &RequestedScopes,
    ) -> Result<ValidationResult> {
        let url = self.introspection_url(token, scopes.to_query_value().as_deref())?;
        let start = Instant::now();

        let response = match self.perform_request(Method::GET, url.as_str(), Some(token), None).await {
            Ok(response) => response,
            Err(err) => {
                self.record_remote(ValidationCode::CommunicationIssue, start);
                return Err(err);
            }
        };

        let result = remote_result(&response);
        self.record_remote(result.code, start);
        Ok(result)
    }

    /// Scopes of a token too large to embed them, read from the token metadata.
    pub(crate) async fn fetch_token_scopes(&self, token: &str) -> Result<BTreeSet<String>> {
        let url = self.introspection_url(token, None)?;
        let response = self.perform_request(Method::GET, url.as_str(), Some(token), None).await?;
        let status = response.status.as_u16();

        match response.status {
            s if s.is_success() => {
                let metadata: TokenMetadata = serde_json::from_str(&response.body).map_err(|e| {
                    PersonaError::InvalidToken(format!("token metadata is malformed: {}", e))
                })?;
                let scopes = metadata.scopes.ok_or_else(|| {
                    PersonaError::InvalidToken("token metadata has no scopes".to_string())
                })?;
                Ok(scopes.split_whitespace().map(str::to_owned).collect())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PersonaError::Unauthorised { status }),
            StatusCode::NOT_FOUND => Err(PersonaError::EmptyResponse { status }),
            _ => Err(PersonaError::Unknown {
                status: Some(status),
                message: "unexpected response to token metadata lookup".to_string(),
            }),
        }
    }

    /// `{host}{oauth_route}/{token}[?scope=a,b,su]`
    fn introspection_url(&self, token: &str, scope: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.settings.tokens_url())
            .map_err(|e| PersonaError::Config(format!("invalid persona tokens url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PersonaError::Config("persona tokens url cannot take a path".to_string()))?
            .push(token);
        if let Some(scope) = scope {
            url.set_query(Some(&format!("scope={}", scope)));
        }
        Ok(url)
    }

    fn record_remote(&self, code: ValidationCode, start: Instant) {
        self.metrics.validation(REMOTE_PATH, code.as_str());
        self.metrics
            .remote_validation_duration
            .with_label_values(&[code.as_str()])
            .observe(start.elapsed().as_secs_f64());
    }
}

fn remote_result(response: &HttpResponse) -> ValidationResult {
    let status = response.status;
    match status {
        s if s.is_success() => ValidationResult::success(),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            debug!(status = status.as_u16(), "persona refused the token");
            ValidationResult::with_detail(ValidationCode::Unauthorised, format!("persona answered {}", status))
        }
        StatusCode::NOT_FOUND => ValidationResult::with_detail(ValidationCode::EmptyResponse, "token not found"),
        _ if response.body.trim().is_empty() => {
            ValidationResult::with_detail(ValidationCode::EmptyResponse, format!("empty {} response", status))
        }
        _ => {
            error!(status = status.as_u16(), body = %response.body, "unexpected token validation response");
            ValidationResult::with_detail(ValidationCode::Unknown, format!("persona answered {}", status))
        }
    }
}
