use thiserror::Error;

pub type SdResult<T> = Result<T, SealdropError>;

/// Every failure mode surfaced by the client, matched exhaustively by
/// callers. Transport-level retries happen inside the transfer engine;
/// everything here is already final.
#[derive(Debug, Error)]
pub enum SealdropError {
    #[error("authentication failed: check API key and secret")]
    Credentials,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown or inaccessible package")]
    UnknownPackage,

    #[error("invalid secure link: {0}")]
    InvalidLink(String),

    #[error("account limit exceeded")]
    LimitExceeded,

    #[error("an approver recipient is required before this package can be finalized")]
    ApproverRequired,

    #[error("finalization denied: {}", reasons.join("; "))]
    FinalizationDenied { reasons: Vec<String> },

    #[error("transfer failed: {0}")]
    Upload(String),

    #[error("segment verification failed: {0}")]
    Verification(String),

    #[error("server unavailable: {0}")]
    ServerUnavailable(String),

    #[error("server rejected request ({status}): {message}")]
    ActionFailed { status: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
