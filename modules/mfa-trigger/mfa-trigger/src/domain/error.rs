//! Domain errors for the MFA trigger engine.

use mfa_trigger_sdk::MfaTriggerError;

/// Internal domain errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("multifactor provider '{provider_id}' is not registered")]
    ProviderNotFound { provider_id: String },

    #[error("no multifactor providers are registered")]
    NoProvidersRegistered,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("service '{service}' is not authorized to use single sign-on")]
    UnauthorizedService { service: String },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("multifactor provider '{provider_id}' is unavailable")]
    ProviderUnavailable { provider_id: String },

    #[error("ticket-granting ticket '{ticket_id}' not found")]
    TicketNotFound { ticket_id: String },

    #[error("ticket store error: {0}")]
    TicketStore(String),

    #[error("service registry error: {0}")]
    ServiceRegistry(String),

    /// The REST policy endpoint could not be reached or answered garbage.
    #[error("policy endpoint error: {0}")]
    PolicyEndpoint(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Misconfiguration is fatal and never downgraded to a policy miss.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotFound { .. } | Self::NoProvidersRegistered | Self::InvalidConfiguration(_)
        )
    }
}

impl From<regex::Error> for DomainError {
    fn from(e: regex::Error) -> Self {
        Self::InvalidConfiguration(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<MfaTriggerError> for DomainError {
    fn from(e: MfaTriggerError) -> Self {
        match e {
            MfaTriggerError::ProviderNotFound { provider_id } => Self::ProviderNotFound { provider_id },
            MfaTriggerError::NoProvidersRegistered => Self::NoProvidersRegistered,
            MfaTriggerError::InvalidConfiguration(msg) => Self::InvalidConfiguration(msg),
            MfaTriggerError::UnauthorizedService { service } => Self::UnauthorizedService { service },
            MfaTriggerError::AuthenticationFailed(msg) => Self::AuthenticationFailed(msg),
            MfaTriggerError::ProviderUnavailable { provider_id } => {
                Self::ProviderUnavailable { provider_id }
            }
            MfaTriggerError::TicketNotFound { ticket_id } => Self::TicketNotFound { ticket_id },
            MfaTriggerError::TicketStore(msg) => Self::TicketStore(msg),
            MfaTriggerError::ServiceRegistry(msg) => Self::ServiceRegistry(msg),
            MfaTriggerError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<DomainError> for MfaTriggerError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::ProviderNotFound { provider_id } => Self::ProviderNotFound { provider_id },
            DomainError::NoProvidersRegistered => Self::NoProvidersRegistered,
            DomainError::InvalidConfiguration(msg) => Self::InvalidConfiguration(msg),
            DomainError::UnauthorizedService { service } => Self::UnauthorizedService { service },
            DomainError::AuthenticationFailed(msg) => Self::AuthenticationFailed(msg),
            DomainError::ProviderUnavailable { provider_id } => {
                Self::ProviderUnavailable { provider_id }
            }
            DomainError::TicketNotFound { ticket_id } => Self::TicketNotFound { ticket_id },
            DomainError::TicketStore(msg) => Self::TicketStore(msg),
            DomainError::ServiceRegistry(msg) => Self::ServiceRegistry(msg),
            DomainError::PolicyEndpoint(msg) | DomainError::Internal(msg) => Self::Internal(msg),
        }
    }
}
