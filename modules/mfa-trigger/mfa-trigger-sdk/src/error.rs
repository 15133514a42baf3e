//! Error types for the `mfa_trigger` module.

use thiserror::Error;

/// Errors that can occur while resolving a step-up requirement.
///
/// Carried inside `authentication-failure` and `error` events, so it is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MfaTriggerError {
    /// A trigger references a provider id that is not registered.
    #[error("multifactor provider '{provider_id}' is not registered")]
    ProviderNotFound { provider_id: String },

    /// A trigger needs a provider but the registry is empty.
    #[error("no multifactor providers are registered")]
    NoProvidersRegistered,

    /// Malformed policy configuration (bad regex, missing field).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The target service is unknown or its access strategy denies the request.
    #[error("service '{service}' is not authorized to use single sign-on")]
    UnauthorizedService { service: String },

    /// The presented credential was rejected, or no authentication could be established.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The selected provider cannot serve this service and the failure mode is closed.
    #[error("multifactor provider '{provider_id}' is unavailable")]
    ProviderUnavailable { provider_id: String },

    /// The referenced ticket-granting ticket does not exist or has expired.
    #[error("ticket-granting ticket '{ticket_id}' not found")]
    TicketNotFound { ticket_id: String },

    /// The ticket store rejected a read or write.
    #[error("ticket store error: {0}")]
    TicketStore(String),

    /// The service registry could not be queried.
    #[error("service registry error: {0}")]
    ServiceRegistry(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MfaTriggerError {
    /// Whether the error stems from policy misconfiguration rather than from the request.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotFound { .. } | Self::NoProvidersRegistered | Self::InvalidConfiguration(_)
        )
    }

    /// Whether the error is a recognized authentication or ticket failure.
    ///
    /// These map to the `authentication-failure` event; everything else maps to `error`.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::UnauthorizedService { .. }
                | Self::AuthenticationFailed(_)
                | Self::ProviderUnavailable { .. }
                | Self::TicketNotFound { .. }
                | Self::TicketStore(_)
        )
    }
}
