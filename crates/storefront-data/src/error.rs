//! Gateway error type.

use storefront_core::CommerceError;

/// Error type for Catalog Provider and Order Gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Transport(String),

    /// The backend answered with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Deserialization error: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Message suitable for showing to the customer.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the request may never have reached the backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Timeout(_) | GatewayError::Transport(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout(e.to_string())
        } else if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            GatewayError::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e.to_string())
    }
}

impl From<GatewayError> for CommerceError {
    fn from(e: GatewayError) -> Self {
        CommerceError::Gateway(e.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_keeps_backend_message() {
        let err = GatewayError::Rejected("Not Authorized Login Again".into());
        assert_eq!(err.to_string(), "Not Authorized Login Again");
        assert_eq!(
            CommerceError::from(err),
            CommerceError::Gateway("Not Authorized Login Again".into())
        );
    }

    #[test]
    fn test_transport_classification() {
        assert!(GatewayError::Timeout("15s".into()).is_transport());
        assert!(!GatewayError::Http { status: 500, url: "u".into() }.is_transport());
    }
}
