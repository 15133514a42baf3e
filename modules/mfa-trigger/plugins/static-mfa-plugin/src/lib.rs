#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static MFA Plugin
//!
//! In-process implementations of every collaborator the MFA trigger engine
//! consumes, driven entirely by configuration. Intended for development,
//! the `mfa-policy-check` tool and tests.
//!
//! ## Collaborators
//!
//! - [`StaticProvider`]: provider with id, aliases, rank and availability rules
//! - [`StaticAuthenticationExecutor`]: username/password and one-time-code verification
//! - [`StaticServiceRegistry`]: regex-matched registered services
//! - [`InMemoryTicketStore`]: `DashMap`-backed ticket store with time-to-live
//! - [`StaticGeoLocationService`]: fixed address-to-location table
//!
//! ## Configuration
//!
//! ```yaml
//! static_mfa_plugin:
//!   ticket_time_to_live: "8h"
//!   providers:
//!     - id: "mfa-duo"
//!       order: 10
//!   accounts:
//!     - username: "casuser"
//!       password: "Mellon"
//!       attributes:
//!         memberOf: ["staff", "mfa-duo"]
//!       tokens:
//!         mfa-duo: "123456"
//!   services:
//!     - id: 1
//!       name: "portal"
//!       service_id: "https://portal\\.example\\.org/.*"
//! ```

pub mod config;
pub mod domain;
pub mod module;

pub use domain::{
    InMemoryTicketStore, StaticAuthenticationExecutor, StaticGeoLocationService, StaticProvider,
    StaticServiceRegistry,
};
pub use module::StaticMfaPlugin;
