//! Domain layer for the static MFA plugin.

pub mod authentication;
pub mod geo;
pub mod providers;
pub mod service_registry;
pub mod ticket_store;

pub use authentication::StaticAuthenticationExecutor;
pub use geo::StaticGeoLocationService;
pub use providers::StaticProvider;
pub use service_registry::StaticServiceRegistry;
pub use ticket_store::InMemoryTicketStore;
