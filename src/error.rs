use thiserror::Error;

use crate::tokens::validation::ValidationCode;

pub type Result<T, E = PersonaError> = std::result::Result<T, E>;

/// Failures surfaced by the Persona client.
///
/// Validation outcomes that the caller is expected to branch on are turned
/// into a [`crate::tokens::validation::ValidationResult`] by the token
/// service; only the remaining cases reach the caller as errors.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("client id and client secret must both be provided")]
    InvalidCredentials,

    #[error("no access token supplied and none found in the request")]
    MissingToken,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("token signature verification failed")]
    InvalidSignature,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("empty response from persona (status {status})")]
    EmptyResponse { status: u16 },

    #[error("unauthorised (status {status})")]
    Unauthorised { status: u16 },

    #[error("communication issue with persona (status {status:?}): {message}")]
    CommunicationIssue { status: Option<u16>, message: String },

    #[error("unknown persona failure (status {status:?}): {message}")]
    Unknown { status: Option<u16>, message: String },

    /// The token only carries `scopeCount`, its scopes must be looked up remotely.
    #[error("token does not embed its scopes")]
    ScopesNotDefined,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PersonaError {
    pub fn communication(status: Option<u16>, message: impl Into<String>) -> Self {
        PersonaError::CommunicationIssue {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, when the issuer answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            PersonaError::EmptyResponse { status } | PersonaError::Unauthorised { status } => {
                Some(*status)
            }
            PersonaError::CommunicationIssue { status, .. } | PersonaError::Unknown { status, .. } => {
                *status
            }
            _ => None,
        }
    }

    /// Whether local validation should hand over to the issuer.
    pub fn escalates_to_remote(&self) -> bool {
        matches!(
            self,
            PersonaError::ScopesNotDefined | PersonaError::CommunicationIssue { .. }
        )
    }

    pub fn validation_code(&self) -> ValidationCode {
        match self {
            PersonaError::InvalidPublicKey(_) => ValidationCode::InvalidPublicKey,
            PersonaError::InvalidSignature => ValidationCode::InvalidSignature,
            PersonaError::InvalidToken(_) | PersonaError::MissingToken => ValidationCode::InvalidToken,
            PersonaError::EmptyResponse { .. } => ValidationCode::EmptyResponse,
            PersonaError::Unauthorised { .. } | PersonaError::InvalidCredentials => {
                ValidationCode::Unauthorised
            }
            PersonaError::CommunicationIssue { .. } => ValidationCode::CommunicationIssue,
            PersonaError::Unknown { .. }
            | PersonaError::ScopesNotDefined
            | PersonaError::InvalidArgument(_)
            | PersonaError::Config(_) => ValidationCode::Unknown,
        }
    }
}
