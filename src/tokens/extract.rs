use std::collections::HashMap;

use http::header::AUTHORIZATION;
use http::HeaderMap;

use crate::utils::constants::ACCESS_TOKEN_PARAM;

/// The parts of an incoming request a bearer token can be read from.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
}

impl RequestContext {
    pub fn bearer_token(&self) -> Option<String> {
        extract_bearer_token(&self.headers, &self.query, &self.form)
    }
}

/// `Authorization: Bearer` header first, then the `access_token` query
/// parameter, then the `access_token` form parameter.
pub fn extract_bearer_token(
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    form: &HashMap<String, String>,
) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .or_else(|| non_empty(query.get(ACCESS_TOKEN_PARAM)))
        .or_else(|| non_empty(form.get(ACCESS_TOKEN_PARAM)))
}

fn parse_bearer(value: &str) -> Option<String> {
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.split_whitespace().next()?;
    Some(token.to_owned())
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}
