//! MFA Trigger Module
//!
//! Decides, for a login or service-access attempt, whether the presented
//! credential is sufficient or which multifactor provider must be satisfied
//! first, and issues or updates the ticket-granting ticket when no step-up is
//! required.
//!
//! Provides the [`mfa_trigger_sdk::MfaTriggerClient`] implementation built by
//! [`module::MfaTrigger::init`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod module;

pub use config::MfaTriggerConfig;
pub use module::{MfaTrigger, MfaTriggerCollaborators};
