//! Domain layer for the MFA trigger engine.

pub mod context_validator;
pub mod error;
pub mod local_client;
pub mod outcome;
pub mod provider_registry;
pub mod selection;
pub mod selector;
pub mod service;
pub mod ticket_grant;
pub mod triggers;

pub use context_validator::{ContextValidation, ContextValidator};
pub use error::DomainError;
pub use local_client::MfaTriggerLocalClient;
pub use outcome::TriggerOutcome;
pub use provider_registry::InMemoryProviderRegistry;
pub use selection::{SelectionFilter, SupportedProviderFilter};
pub use selector::{PriorityListProviderSelector, ProviderSelector, RankedProviderSelector};
pub use service::{MfaTriggerService, ServiceDeps};
pub use ticket_grant::TicketGrantCoordinator;
