//! Response envelope: the status discriminant is extracted before any
//! type-specific parsing, and envelope-level failures are raised first.

use serde::Deserialize;

use sealdrop_core::{SdResult, SealdropError};

/// Envelope-level status codes returned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    AuthenticationFailed,
    UnknownPackage,
    LimitExceeded,
    InvalidEmail,
    InvalidRecipient,
    InvalidPhoneNumber,
    Denied,
    ApproverRequired,
    PackageNeedsApproval,
    Fail,
    /// Forward compatibility: statuses this client does not know.
    #[serde(other)]
    Unknown,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Success => "SUCCESS",
            ResponseStatus::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ResponseStatus::UnknownPackage => "UNKNOWN_PACKAGE",
            ResponseStatus::LimitExceeded => "LIMIT_EXCEEDED",
            ResponseStatus::InvalidEmail => "INVALID_EMAIL",
            ResponseStatus::InvalidRecipient => "INVALID_RECIPIENT",
            ResponseStatus::InvalidPhoneNumber => "INVALID_PHONE_NUMBER",
            ResponseStatus::Denied => "DENIED",
            ResponseStatus::ApproverRequired => "APPROVER_REQUIRED",
            ResponseStatus::PackageNeedsApproval => "PACKAGE_NEEDS_APPROVAL",
            ResponseStatus::Fail => "FAIL",
            ResponseStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Minimal fields present on every JSON response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub response: ResponseStatus,
    #[serde(default)]
    pub message: String,
    /// Structured reasons, populated on DENIED finalizations.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Raise the failures every endpoint shares, before typed parsing.
pub(crate) fn envelope_gate(envelope: &Envelope) -> SdResult<()> {
    match envelope.response {
        ResponseStatus::AuthenticationFailed => Err(SealdropError::Credentials),
        ResponseStatus::LimitExceeded => Err(SealdropError::LimitExceeded),
        ResponseStatus::UnknownPackage => Err(SealdropError::UnknownPackage),
        _ => Ok(()),
    }
}

/// A parsed response: the envelope plus the typed payload, which exists
/// only when the status is SUCCESS.
#[derive(Debug)]
pub struct ApiReply<T> {
    pub status: ResponseStatus,
    pub message: String,
    pub errors: Vec<String>,
    pub payload: Option<T>,
}

impl<T> ApiReply<T> {
    pub fn success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Unwrap the SUCCESS payload; any other status becomes ActionFailed.
    /// Callers that distinguish specific statuses match on `status` instead.
    pub fn into_payload(self) -> SdResult<T> {
        match self.payload {
            Some(payload) => Ok(payload),
            None => Err(SealdropError::ActionFailed {
                status: self.status.as_str().to_string(),
                message: self.message,
            }),
        }
    }
}
