use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::PersonaError;
use crate::utils::constants::SUPERUSER_SCOPE;

/// Outcome codes of a token validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    Success,
    InvalidPublicKey,
    InvalidToken,
    EmptyResponse,
    Unknown,
    Unauthorised,
    InvalidSignature,
    CommunicationIssue,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match *self {
            ValidationCode::Success => "SUCCESS",
            ValidationCode::InvalidPublicKey => "INVALID_PUBLIC_KEY",
            ValidationCode::InvalidToken => "INVALID_TOKEN",
            ValidationCode::EmptyResponse => "EMPTY_RESPONSE",
            ValidationCode::Unknown => "UNKNOWN",
            ValidationCode::Unauthorised => "UNAUTHORISED",
            ValidationCode::InvalidSignature => "INVALID_SIGNATURE",
            ValidationCode::CommunicationIssue => "COMMUNICATION_ISSUE",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `validate_token`, returned by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub code: ValidationCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self { code: ValidationCode::Success, detail: None }
    }

    pub fn new(code: ValidationCode) -> Self {
        Self { code, detail: None }
    }

    pub fn with_detail(code: ValidationCode, detail: impl Into<String>) -> Self {
        Self { code, detail: Some(detail.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.code == ValidationCode::Success
    }
}

impl From<PersonaError> for ValidationResult {
    fn from(err: PersonaError) -> Self {
        ValidationResult::with_detail(err.validation_code(), err.to_string())
    }
}

/// Scopes a caller requires of a token. A single scope or a collection of
/// scopes both normalise into a set; empty entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedScopes(BTreeSet<String>);

impl RequestedScopes {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// Comma-joined form sent to the introspection endpoint, with the
    /// superuser scope appended so that `su` tokens pass remotely too.
    pub fn to_query_value(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut scopes: Vec<&str> = self.iter().collect();
        if !self.contains(SUPERUSER_SCOPE) {
            scopes.push(SUPERUSER_SCOPE);
        }
        Some(scopes.join(","))
    }
}

impl<S: Into<String>> FromIterator<S> for RequestedScopes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(Into::into)
                .map(|scope| scope.trim().to_owned())
                .filter(|scope| !scope.is_empty())
                .collect(),
        )
    }
}

impl From<&str> for RequestedScopes {
    fn from(scope: &str) -> Self {
        std::iter::once(scope).collect()
    }
}

impl From<String> for RequestedScopes {
    fn from(scope: String) -> Self {
        std::iter::once(scope).collect()
    }
}

impl From<Vec<String>> for RequestedScopes {
    fn from(scopes: Vec<String>) -> Self {
        scopes.into_iter().collect()
    }
}

impl From<Vec<&str>> for RequestedScopes {
    fn from(scopes: Vec<&str>) -> Self {
        scopes.into_iter().collect()
    }
}

impl From<Option<String>> for RequestedScopes {
    fn from(scope: Option<String>) -> Self {
        scope.into_iter().collect()
    }
}

/// `su` passes everything, an empty request passes, otherwise the token needs
/// at least one of the requested scopes.
pub fn scopes_permit<'a, I>(token_scopes: I, requested: &RequestedScopes) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let token_scopes: BTreeSet<&str> = token_scopes.into_iter().collect();
    if token_scopes.contains(SUPERUSER_SCOPE) || requested.is_empty() {
        return true;
    }
    requested.iter().any(|scope| token_scopes.contains(scope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superuser_bypasses_scope_intersection() {
        let requested = RequestedScopes::from(vec!["c", "d"]);
        assert!(scopes_permit(["su"], &requested));
        assert!(scopes_permit(["x", "su"], &requested));
    }

    #[test]
    fn intersection_decides() {
        assert!(scopes_permit(["a", "b"], &RequestedScopes::from(vec!["b", "c"])));
        assert!(!scopes_permit(["a", "b"], &RequestedScopes::from(vec!["c", "d"])));
    }

    #[test]
    fn empty_request_always_passes() {
        assert!(scopes_permit(["a"], &RequestedScopes::none()));
        assert!(scopes_permit(std::iter::empty(), &RequestedScopes::from("")));
    }

    #[test]
    fn single_scope_normalises_into_set() {
        let requested = RequestedScopes::from(" reading ");
        assert!(requested.contains("reading"));
        assert_eq!(requested.iter().count(), 1);
    }

    #[test]
    fn query_value_appends_superuser_once() {
        assert_eq!(RequestedScopes::none().to_query_value(), None);
        assert_eq!(
            RequestedScopes::from(vec!["b", "a"]).to_query_value().as_deref(),
            Some("a,b,su")
        );
        assert_eq!(
            RequestedScopes::from(vec!["su", "a"]).to_query_value().as_deref(),
            Some("a,su")
        );
    }

    #[test]
    fn codes_render_upper_snake() {
        assert_eq!(ValidationCode::InvalidPublicKey.to_string(), "INVALID_PUBLIC_KEY");
        let json = serde_json::to_string(&ValidationResult::success()).unwrap();
        assert_eq!(json, r#"{"code":"SUCCESS"}"#);
    }
}
