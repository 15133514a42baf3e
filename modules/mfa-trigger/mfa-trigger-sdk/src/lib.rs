//! MFA Trigger SDK
//!
//! This crate provides the public API for the `mfa_trigger` module:
//!
//! - [`MfaTriggerClient`] - Public API trait for the hosting login workflow
//! - [`MultifactorProvider`] / [`ProviderRegistry`] - Provider plugin contracts
//! - [`AuthenticationExecutor`], [`ServiceRegistry`], [`TicketStore`],
//!   [`GeoLocationService`] - Collaborators the engine consumes
//! - [`Event`] - The resolution outcome handed back to the workflow
//! - [`MfaTriggerError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use mfa_trigger_sdk::{EventId, MfaTriggerClient, ResolutionContext};
//!
//! let ctx = ResolutionContext::builder()
//!     .service(Service::new("https://app.example.org"))
//!     .credential(credential)
//!     .build();
//!
//! let event = client.resolve(&ctx).await;
//! match event.id() {
//!     EventId::Provider(id) => { /* route to the provider's flow */ }
//!     other => response.set_status(other.response_status()),
//! }
//! ```

pub mod api;
pub mod backend_api;
pub mod error;
pub mod models;
pub mod plugin_api;

// Re-export main types at crate root
pub use api::MfaTriggerClient;
pub use backend_api::{AuthenticationExecutor, GeoLocationService, ServiceRegistry, TicketStore};
pub use error::MfaTriggerError;
pub use models::{
    AccessStrategy, AttributeValue, Attributes, Authentication, AuthenticationBuilder,
    AuthenticationResult, AuthenticationResultBuilder, Credential, Event, EventAttributes,
    EventId, FailureMode, GeoLocation, HandlerResult, MessageDescriptor, MultifactorPolicy,
    Principal, RegisteredService, RequestAttributes, ResolutionContext, ResolutionContextBuilder,
    Service, TicketGrantingTicket,
};
pub use plugin_api::{MultifactorProvider, ProviderRegistry};
