use http::Method;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::debug;

use crate::error::{PersonaError, Result};
use crate::tokens::access_token::DecodedToken;
use crate::tokens::service::TokenService;
use crate::tokens::validation::{scopes_permit, RequestedScopes, ValidationCode, ValidationResult};
use crate::utils::constants::DEFAULT_CERTIFICATE_ID;

static JWT_PATH: &str = "jwt";

/// Verify `token` against the PEM encoded public key and return its claims.
///
/// Only RS256 is accepted, whatever the token header claims. `exp` is
/// required and `nbf` is honoured when present, both without leeway.
pub fn decode_token(token: &str, certificate_pem: &str) -> Result<DecodedToken> {
    // A garbage certificate has to surface as its own error, not as a failed signature.
    let key = DecodingKey::from_rsa_pem(certificate_pem.as_bytes())
        .map_err(|e| PersonaError::InvalidPublicKey(e.to_string()))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = 0;
    validation.validate_nbf = true;
    validation.validate_aud = false;

    decode::<DecodedToken>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(map_jwt_error)
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> PersonaError {
    match err.kind() {
        ErrorKind::InvalidSignature => PersonaError::InvalidSignature,
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
            PersonaError::InvalidPublicKey(err.to_string())
        }
        ErrorKind::ExpiredSignature => PersonaError::InvalidToken("token has expired".to_string()),
        ErrorKind::ImmatureSignature => {
            PersonaError::InvalidToken("token is not valid yet".to_string())
        }
        _ => PersonaError::InvalidToken(err.to_string()),
    }
}

impl TokenService {
    /// Validate locally with the issuer's certificate.
    ///
    /// `Err(CommunicationIssue)` when no certificate can be obtained and
    /// `Err(ScopesNotDefined)` when the token only carries `scopeCount`; both
    /// mean the issuer has to decide. Every other outcome is a value.
    pub async fn validate_using_jwt(
        &self,
        token: &str,
        scopes: &RequestedScopes,
    ) -> Result<ValidationResult> {
        let certificate = self.retrieve_certificate().await?;

        let decoded = match decode_token(token, &certificate) {
            Ok(decoded) => decoded,
            Err(err) => {
                debug!(error = %err, "local token verification failed");
                return Ok(self.record_jwt(ValidationResult::from(err)));
            }
        };

        let token_scopes = match (decoded.scopes, decoded.scope_count) {
            (Some(token_scopes), _) => token_scopes,
            (None, Some(scope_count)) => {
                debug!(scope_count, "token does not embed its scopes");
                return Err(PersonaError::ScopesNotDefined);
            }
            (None, None) => {
                return Ok(self.record_jwt(ValidationResult::with_detail(
                    ValidationCode::InvalidToken,
                    "token carries neither scopes nor scopeCount",
                )));
            }
        };

        let result = if scopes_permit(token_scopes.iter().map(String::as_str), scopes) {
            ValidationResult::success()
        } else {
            ValidationResult::with_detail(
                ValidationCode::Unauthorised,
                "token lacks every requested scope",
            )
        };
        Ok(self.record_jwt(result))
    }

    /// Public certificate from the cache, fetched from the issuer on a miss.
    pub async fn retrieve_certificate(&self) -> Result<String> {
        if let Some(certificate) = self
            .certificates
            .get_cached_certificate(DEFAULT_CERTIFICATE_ID)
            .await
        {
            return Ok(certificate);
        }

        let response = self
            .perform_request(Method::GET, &self.settings.keys_url(), None, None)
            .await?;
        if !response.is_success() || response.body.trim().is_empty() {
            return Err(PersonaError::communication(
                Some(response.status.as_u16()),
                "could not retrieve the public certificate",
            ));
        }

        let certificate = response.body;
        self.certificates
            .cache_certificate(&certificate, self.settings.certificate_ttl(), DEFAULT_CERTIFICATE_ID)
            .await;
        Ok(certificate)
    }

    fn record_jwt(&self, result: ValidationResult) -> ValidationResult {
        self.metrics.validation(JWT_PATH, result.code.as_str());
        result
    }
}
