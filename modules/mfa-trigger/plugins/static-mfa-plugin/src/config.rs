//! Configuration for the static MFA plugin.

use std::collections::BTreeMap;
use std::time::Duration;

use mfa_trigger_sdk::{Attributes, RegisteredService};
use serde::{Deserialize, Deserializer};

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticMfaPluginConfig {
    /// Multifactor providers to register.
    pub providers: Vec<ProviderConfig>,

    /// Accounts accepted by the static credential verifier.
    pub accounts: Vec<AccountConfig>,

    /// Registered services, matched in ascending id order.
    pub services: Vec<RegisteredService>,

    /// Static client-address to location table.
    pub geo_locations: Vec<GeoLocationConfig>,

    /// Lifetime of a ticket-granting ticket, e.g. `"8h"`.
    #[serde(deserialize_with = "deserialize_duration")]
    pub ticket_time_to_live: Duration,

    /// Attribute recording which providers an authentication satisfied.
    pub authentication_context_attribute: String,
}

impl Default for StaticMfaPluginConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            accounts: Vec::new(),
            services: Vec::new(),
            geo_locations: Vec::new(),
            ticket_time_to_live: Duration::from_secs(8 * 60 * 60),
            authentication_context_attribute: "authnContextClass".to_owned(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A statically configured multifactor provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub id: String,
    /// Additional identifiers the provider answers to.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Rank; higher wins when several providers are eligible.
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub available: bool,
    /// Registered service ids this provider cannot serve.
    #[serde(default)]
    pub unavailable_for_services: Vec<u64>,
    /// Principals this provider must not be offered to.
    #[serde(default)]
    pub excluded_principals: Vec<String>,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            aliases: Vec::new(),
            order: 0,
            available: true,
            unavailable_for_services: Vec::new(),
            excluded_principals: Vec::new(),
        }
    }
}

/// An account accepted by the static credential verifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Warning codes attached to a successful password authentication.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// One-time codes per provider id; presenting one satisfies that provider.
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
}

/// Location reported for one client address.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoLocationConfig {
    pub client_ip: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub addresses: Vec<String>,
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}
