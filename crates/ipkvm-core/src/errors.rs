//! API error taxonomy and its fixed HTTP status mapping.

/// Result alias for operations surfaced through the API.
pub type ApiResult<T> = Result<T, ApiError>;

/// Every error kind the control plane reports to clients.
///
/// Expected kinds (validation, auth, busy, operation) are logged without
/// detail and mapped by [`ApiError::status`]; anything internal is the
/// unexpected-fault path and becomes a 500.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Malformed or out-of-range request input.
    #[error("{0}")]
    Validation(String),

    /// No credentials presented where required.
    #[error("unauthorized")]
    Unauthorized,

    /// Credentials presented but rejected.
    #[error("forbidden")]
    Forbidden,

    /// The collaborator is mid-operation and cannot accept another.
    #[error("{0}")]
    Busy(String),

    /// The collaborator rejected the requested action.
    #[error("{0}")]
    Operation(String),

    /// Unexpected fault inside a request handler.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable kind string carried in the error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::Busy(_) => "Busy",
            Self::Operation(_) => "OperationError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// HTTP status for this kind (the fixed table: 409 busy, 400 bad
    /// input/operation, 401/403 auth, 500 otherwise).
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Operation(_) => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::Busy(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Whether this kind is an expected condition (logged without detail).
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}
