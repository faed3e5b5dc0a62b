use std::collections::BTreeSet;
use std::sync::Arc;

use http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderName, HeaderValue, Method};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheBackend, CertificateCache, TokenCache};
use crate::config::persona::PersonaSettings;
use crate::error::{PersonaError, Result};
use crate::observability::metrics::Metrics;
use crate::tokens::access_token::AccessToken;
use crate::tokens::extract::RequestContext;
use crate::tokens::jwt::decode_token;
use crate::tokens::validation::{RequestedScopes, ValidationResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::utils::constants::{GRANT_TYPE_CLIENT_CREDENTIALS, LIBRARY_NAME, LIBRARY_VERSION};

static X_REQUEST_ID: &str = "x-request-id";
static FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
pub struct ObtainTokenOptions {
    pub scope: Option<String>,
    pub use_cache: bool,
}

impl Default for ObtainTokenOptions {
    fn default() -> Self {
        Self { scope: None, use_cache: true }
    }
}

impl ObtainTokenOptions {
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

/// What to validate: an explicit token, or the request to read one from.
#[derive(Debug, Clone, Default)]
pub struct ValidateTokenOptions {
    pub access_token: Option<String>,
    pub scope: RequestedScopes,
    pub request: Option<RequestContext>,
}

impl ValidateTokenOptions {
    pub fn token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Default::default()
        }
    }

    pub fn from_request(request: RequestContext) -> Self {
        Self {
            request: Some(request),
            ..Default::default()
        }
    }

    pub fn with_scope(mut self, scope: impl Into<RequestedScopes>) -> Self {
        self.scope = scope.into();
        self
    }
}

/// Entry point of the Persona token pipeline.
///
/// Holds the issuer settings, the transport and the two best-effort caches.
/// Cheap to clone; clones share the caches.
#[derive(Clone)]
pub struct TokenService {
    pub(crate) settings: Arc<PersonaSettings>,
    pub(crate) http: Arc<dyn HttpTransport>,
    pub(crate) certificates: CertificateCache,
    pub(crate) tokens: TokenCache,
    pub(crate) metrics: Arc<Metrics>,
}

impl TokenService {
    pub fn new(
        settings: PersonaSettings,
        cache: Arc<dyn CacheBackend>,
        http: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let metrics = Metrics::new()
            .map_err(|e| PersonaError::Config(format!("metrics registry: {}", e)))?;
        Self::with_metrics(settings, cache, http, metrics)
    }

    pub fn with_metrics(
        settings: PersonaSettings,
        cache: Arc<dyn CacheBackend>,
        http: Arc<dyn HttpTransport>,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
            http,
            certificates: CertificateCache::new(cache.clone(), metrics.clone()),
            tokens: TokenCache::new(cache, metrics.clone()),
            metrics,
        })
    }

    pub fn settings(&self) -> &PersonaSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Client-credentials grant, served from the token cache when allowed.
    pub async fn obtain_new_token(
        &self,
        client_id: &str,
        client_secret: &str,
        options: ObtainTokenOptions,
    ) -> Result<AccessToken> {
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(PersonaError::InvalidCredentials);
        }

        if options.use_cache {
            if let Some(token) = self.tokens.get_cached_token(client_id).await {
                debug!(client_id, "serving access token from cache");
                self.metrics.token_request("cached");
                return Ok(token);
            }
        }

        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS)
            .append_pair("client_id", client_id)
            .append_pair("client_secret", client_secret);
        if let Some(scope) = options.scope.as_deref().filter(|s| !s.is_empty()) {
            form.append_pair("scope", scope);
        }

        let response = self
            .perform_request(Method::POST, &self.settings.tokens_url(), None, Some(form.finish()))
            .await
            .inspect_err(|_| self.metrics.token_request("error"))?;

        if !response.is_success() {
            self.metrics.token_request("rejected");
            error!(client_id, status = response.status.as_u16(), "token request rejected");
            return Err(PersonaError::communication(
                Some(response.status.as_u16()),
                format!("token request rejected: {}", response.body),
            ));
        }

        let token: AccessToken = serde_json::from_str(&response.body).map_err(|e| {
            self.metrics.token_request("malformed");
            PersonaError::InvalidToken(format!("token response is malformed: {}", e))
        })?;
        if token.access_token.is_empty() {
            self.metrics.token_request("malformed");
            return Err(PersonaError::InvalidToken("token response has no access_token".to_string()));
        }

        self.tokens.cache_token(client_id, &token).await;
        self.metrics.token_request("issued");
        info!(client_id, expires_in = token.expires_in, "access token issued");
        Ok(token)
    }

    /// Validate locally first, fall back to the issuer when the token does
    /// not embed its scopes or no certificate is available.
    pub async fn validate_token(&self, options: ValidateTokenOptions) -> Result<ValidationResult> {
        let token = options
            .access_token
            .filter(|t| !t.is_empty())
            .or_else(|| options.request.as_ref().and_then(RequestContext::bearer_token))
            .ok_or(PersonaError::MissingToken)?;
        let scopes = options.scope;

        match self.validate_using_jwt(&token, &scopes).await {
            Ok(result) => Ok(result),
            Err(err) if err.escalates_to_remote() => {
                debug!(reason = %err, "falling back to remote token validation");
                self.validate_using_persona(&token, &scopes).await
            }
            Err(err) => Ok(ValidationResult::from(err)),
        }
    }

    pub async fn list_scopes(&self, access_token: &str) -> Result<BTreeSet<String>> {
        if access_token.is_empty() {
            return Err(PersonaError::InvalidToken("no access token supplied".to_string()));
        }

        let certificate = self.retrieve_certificate().await?;
        let decoded = decode_token(access_token, &certificate)?;

        match (decoded.scopes, decoded.scope_count) {
            (Some(scopes), _) => Ok(scopes.into_iter().collect()),
            (None, Some(_)) => self.fetch_token_scopes(access_token).await,
            (None, None) => Err(PersonaError::InvalidToken(
                "token carries neither scopes nor scopeCount".to_string(),
            )),
        }
    }

    fn user_agent(&self) -> String {
        format!("{} {}/{}", self.settings.user_agent, LIBRARY_NAME, LIBRARY_VERSION)
    }

    /// Single request to the issuer with the standard headers attached.
    /// Transport failures become `CommunicationIssue` without a status.
    pub(crate) async fn perform_request(
        &self,
        method: Method,
        url: &str,
        bearer: Option<&str>,
        form_body: Option<String>,
    ) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(method, url, self.settings.timeout());
        request.headers.insert(USER_AGENT, header_value(&self.user_agent())?);
        if let Some(request_id) = &self.settings.request_id {
            request.headers.insert(HeaderName::from_static(X_REQUEST_ID), header_value(request_id)?);
        }
        if let Some(token) = bearer {
            request.headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        }
        if let Some(body) = form_body {
            request.headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
            request.body = Some(body);
        }

        self.http.send(request).await.map_err(|err| {
            warn!(error = %err, "request to persona failed");
            PersonaError::communication(None, err.to_string())
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| PersonaError::InvalidArgument(format!("'{}' is not a valid header value", value)))
}
