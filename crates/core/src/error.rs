//! Unified error types for the campaign dashboard.
//!
//! Error codes:
//! - NOT_FOUND_001-002: Missing campaign or classification
//! - VALID_001-007: Invalid caller arguments or domain invariants
//! - CONFLICT_001: Concurrent override mutation
//! - DB_001: Datastore unavailable

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Not-found error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundCode {
    /// NOT_FOUND_001: Campaign does not exist
    Campaign,
    /// NOT_FOUND_002: Campaign has no base classification mapping
    Classification,
}

impl NotFoundCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Campaign => "NOT_FOUND_001",
            Self::Classification => "NOT_FOUND_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        404
    }
}

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Malformed date or hour range
    InvalidRange,
    /// VALID_002: Override edit changes nothing
    NoOpOverride,
    /// VALID_003: Unknown display mode
    UnknownDisplayMode,
    /// VALID_004: Override targets a campaign that does not exist
    UnknownCampaign,
    /// VALID_005: Invalid field value, cost, or limit
    InvalidValue,
    /// VALID_006: Unknown time-series granularity
    UnknownGranularity,
    /// VALID_007: Request could not be decoded
    MalformedRequest,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRange => "VALID_001",
            Self::NoOpOverride => "VALID_002",
            Self::UnknownDisplayMode => "VALID_003",
            Self::UnknownCampaign => "VALID_004",
            Self::InvalidValue => "VALID_005",
            Self::UnknownGranularity => "VALID_006",
            Self::MalformedRequest => "VALID_007",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Conflict error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictCode {
    /// CONFLICT_001: Another override mutation for the same campaign won
    ConcurrentOverride,
}

impl ConflictCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConcurrentOverride => "CONFLICT_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        409
    }
}

/// Datastore error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// DB_001: Datastore unreachable or query failed
    Unavailable,
}

impl DbErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable => "DB_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        503
    }
}

/// Broad error category, independent of the specific code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    Unavailable,
    Internal,
}

/// Unified error type for the campaign dashboard.
#[derive(Debug, Error)]
pub enum Error {
    /// Campaign or classification missing.
    #[error("[{code}] {message}")]
    NotFound {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Caller-supplied argument violates a domain rule.
    #[error("[{code}] {message}")]
    InvalidArgument {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Concurrent mutation detected by the datastore layer.
    #[error("[{code}] {message}")]
    Conflict {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Datastore unreachable. Never retried here.
    #[error("[{code}] {message}")]
    Unavailable {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a not-found error.
    pub fn not_found(code: NotFoundCode, msg: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(code: ConflictCode, msg: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a datastore-unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        let code = DbErrorCode::Unavailable;
        Self::Unavailable {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn campaign_not_found(campaign_id: i64) -> Self {
        Self::not_found(
            NotFoundCode::Campaign,
            format!("campaign {} not found", campaign_id),
        )
    }

    pub fn classification_not_found(campaign_id: i64) -> Self {
        Self::not_found(
            NotFoundCode::Classification,
            format!("campaign {} has no classification mapping", campaign_id),
        )
    }

    /// The active override moved between the caller's read and its write.
    pub fn stale_override(campaign_id: i64) -> Self {
        Self::conflict(
            ConflictCode::ConcurrentOverride,
            format!(
                "active override for campaign {} changed concurrently, reload and retry",
                campaign_id
            ),
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::Serialization(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { http_status, .. } => *http_status,
            Self::InvalidArgument { http_status, .. } => *http_status,
            Self::Conflict { http_status, .. } => *http_status,
            Self::Unavailable { http_status, .. } => *http_status,
            Self::Serialization(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { code, .. } => Some(code),
            Self::InvalidArgument { code, .. } => Some(code),
            Self::Conflict { code, .. } => Some(code),
            Self::Unavailable { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Get the human-readable message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound { message, .. }
            | Self::InvalidArgument { message, .. }
            | Self::Conflict { message, .. }
            | Self::Unavailable { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
