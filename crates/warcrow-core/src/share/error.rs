use thiserror::Error;

/// Coarse error category reported to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidList,
    MalformedToken,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidList => "INVALID_LIST",
            ErrorCategory::MalformedToken => "MALFORMED_TOKEN",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Unit {index} cannot be shared: {reason}")]
    InvalidUnit { index: usize, reason: &'static str },

    #[error("Failed to serialize list: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to compress list: {0}")]
    Compress(#[from] std::io::Error),
}

impl EncodeError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::InvalidList
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Share token is empty")]
    Empty,

    #[error("Share token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Share token payload is corrupt: {0}")]
    Corrupt(String),

    #[error("Share token payload is truncated")]
    Truncated,

    #[error("Share token has trailing data after the payload")]
    TrailingData,

    #[error("Share token payload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Share token payload is not a valid list: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Shared unit {index} is invalid: {reason}")]
    InvalidUnit { index: usize, reason: &'static str },
}

impl DecodeError {
    /// Every decode failure is reported as a malformed token; the variants
    /// only exist for logging.
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::MalformedToken
    }
}
