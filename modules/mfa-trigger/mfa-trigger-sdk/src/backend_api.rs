//! Collaborators consumed by the engine.
//!
//! Credential verification, ticket persistence, the service registry and
//! geo-location are owned elsewhere; the engine only talks to them through
//! these narrow traits. Each call is assumed to be individually atomic.

use async_trait::async_trait;

use crate::error::MfaTriggerError;
use crate::models::{
    Authentication, AuthenticationResult, AuthenticationResultBuilder, Credential, GeoLocation,
    RegisteredService, Service, TicketGrantingTicket,
};

/// Runs credential-verification transactions.
#[async_trait]
pub trait AuthenticationExecutor: Send + Sync {
    /// Verify `credential` and start a new result builder with its authentication.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if the credential is rejected
    async fn handle_initial_transaction(
        &self,
        service: Option<&Service>,
        credential: &Credential,
    ) -> Result<AuthenticationResultBuilder, MfaTriggerError>;

    /// Finalize all pending transactions into one result.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if the builder is empty or mixes principals
    async fn finalize_all(
        &self,
        builder: &AuthenticationResultBuilder,
        service: Option<&Service>,
    ) -> Result<AuthenticationResult, MfaTriggerError> {
        builder.build(service.cloned())
    }

    /// Seed a result builder with an existing session's authentication, adding
    /// whatever `credential` verifies to.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if the credential is rejected
    async fn establish_context_from_existing(
        &self,
        authentication: &Authentication,
        credential: Option<&Credential>,
    ) -> Result<AuthenticationResultBuilder, MfaTriggerError> {
        let mut builder = AuthenticationResultBuilder::new().collect(authentication.clone());
        if let Some(credential) = credential {
            let fresh = self.handle_initial_transaction(None, credential).await?;
            for authentication in fresh.authentications() {
                builder = builder.collect(authentication.clone());
            }
            builder = builder.collect_credential(credential.clone());
        }
        Ok(builder)
    }
}

/// Lookup of relying-party records.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// # Errors
    ///
    /// - `ServiceRegistry` if the registry cannot be queried
    async fn find_service_by(
        &self,
        service: &Service,
    ) -> Result<Option<RegisteredService>, MfaTriggerError>;

    /// Enforce the service's access strategy.
    ///
    /// # Errors
    ///
    /// - `UnauthorizedService` if the service is unknown, disabled, or the
    ///   principal lacks a required attribute
    fn ensure_access(
        &self,
        service: &Service,
        registered_service: Option<&RegisteredService>,
        authentication: Option<&Authentication>,
    ) -> Result<(), MfaTriggerError> {
        let unauthorized = || MfaTriggerError::UnauthorizedService {
            service: service.id.clone(),
        };
        let registered_service = registered_service.ok_or_else(unauthorized)?;
        let strategy = &registered_service.access_strategy;
        if !strategy.is_service_access_allowed() {
            return Err(unauthorized());
        }
        if let Some(authentication) = authentication
            && !strategy.is_principal_authorized(authentication.principal())
        {
            return Err(unauthorized());
        }
        Ok(())
    }
}

/// Keyed store of ticket-granting tickets.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// # Errors
    ///
    /// - `TicketStore` if the ticket cannot be persisted
    async fn create(
        &self,
        result: &AuthenticationResult,
    ) -> Result<TicketGrantingTicket, MfaTriggerError>;

    /// Returns `None` for unknown or expired tickets.
    ///
    /// # Errors
    ///
    /// - `TicketStore` if the store cannot be read
    async fn get(&self, ticket_id: &str) -> Result<Option<TicketGrantingTicket>, MfaTriggerError>;

    /// # Errors
    ///
    /// - `TicketNotFound` if the ticket vanished meanwhile
    async fn update(&self, ticket: &TicketGrantingTicket) -> Result<(), MfaTriggerError>;

    /// Destroying an unknown ticket is not an error.
    ///
    /// # Errors
    ///
    /// - `TicketStore` if the store cannot be written
    async fn destroy(&self, ticket_id: &str) -> Result<(), MfaTriggerError>;
}

/// Resolves a client address to a location.
#[async_trait]
pub trait GeoLocationService: Send + Sync {
    /// # Errors
    ///
    /// - `Internal` if the lookup backend fails
    async fn locate(
        &self,
        client_ip: &str,
        hint: Option<&str>,
    ) -> Result<Option<GeoLocation>, MfaTriggerError>;
}
