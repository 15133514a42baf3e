//! Configuration for the MFA trigger engine.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use mfa_trigger_sdk::FailureMode;
use serde::{Deserialize, Deserializer};

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MfaTriggerConfig {
    /// Enabled trigger resolvers, evaluated in this order.
    pub triggers: Vec<TriggerKind>,

    /// Provider required for every request, if set.
    pub global_provider_id: Option<String>,

    /// Comma-separated principal attribute names inspected by the principal-attribute trigger.
    pub global_principal_attribute_name_triggers: Option<String>,

    /// Full-match pattern used when exactly one provider is registered.
    pub global_principal_attribute_value_regex: Option<String>,

    /// Comma-separated authentication attribute names inspected by the
    /// authentication-attribute trigger.
    pub global_authentication_attribute_name_triggers: Option<String>,

    pub global_authentication_attribute_value_regex: Option<String>,

    /// Request parameter (and header) naming a provider explicitly.
    pub request_parameter: String,

    pub rest_endpoint: RestEndpointConfig,

    /// Provider id to pattern; a match on client address, user agent or
    /// geo-located address requires the provider.
    pub adaptive: BTreeMap<String, String>,

    /// Applied when a selected provider is unavailable and the service does not override it.
    pub global_failure_mode: FailureMode,

    /// Authentication attribute recording the providers already satisfied.
    pub authentication_context_attribute: String,

    pub provider_selector: ProviderSelectorConfig,
}

impl Default for MfaTriggerConfig {
    fn default() -> Self {
        Self {
            triggers: TriggerKind::DEFAULT_ORDER.to_vec(),
            global_provider_id: None,
            global_principal_attribute_name_triggers: None,
            global_principal_attribute_value_regex: None,
            global_authentication_attribute_name_triggers: None,
            global_authentication_attribute_value_regex: None,
            request_parameter: "authn_method".to_owned(),
            rest_endpoint: RestEndpointConfig::default(),
            adaptive: BTreeMap::new(),
            global_failure_mode: FailureMode::Closed,
            authentication_context_attribute: "authnContextClass".to_owned(),
            provider_selector: ProviderSelectorConfig::default(),
        }
    }
}

/// A trigger resolver variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Adaptive,
    Global,
    RestEndpoint,
    PrincipalAttribute,
    AuthenticationAttribute,
    RequestParameter,
    RegisteredServicePrincipalAttribute,
    RegisteredService,
}

impl TriggerKind {
    pub const DEFAULT_ORDER: [Self; 8] = [
        Self::Adaptive,
        Self::Global,
        Self::RestEndpoint,
        Self::PrincipalAttribute,
        Self::AuthenticationAttribute,
        Self::RequestParameter,
        Self::RegisteredServicePrincipalAttribute,
        Self::RegisteredService,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Adaptive => "adaptive",
            Self::Global => "global",
            Self::RestEndpoint => "rest_endpoint",
            Self::PrincipalAttribute => "principal_attribute",
            Self::AuthenticationAttribute => "authentication_attribute",
            Self::RequestParameter => "request_parameter",
            Self::RegisteredServicePrincipalAttribute => "registered_service_principal_attribute",
            Self::RegisteredService => "registered_service",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound policy endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestEndpointConfig {
    /// Endpoint receiving `{"principalId", "serviceId"}`; the trigger is inert when unset.
    pub url: Option<String>,

    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for RestEndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorStrategy {
    /// Highest provider order wins; ties go to the smallest id.
    #[default]
    Ranked,
    /// First eligible id from `priority`, falling back to `ranked`.
    PriorityList,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSelectorConfig {
    pub strategy: SelectorStrategy,
    pub priority: Vec<String>,
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_trigger() {
        let cfg = MfaTriggerConfig::default();
        assert_eq!(cfg.triggers.len(), 8);
        assert_eq!(cfg.triggers[0], TriggerKind::Adaptive);
        assert_eq!(cfg.request_parameter, "authn_method");
        assert_eq!(cfg.rest_endpoint.timeout, Duration::from_secs(5));
        assert_eq!(cfg.global_failure_mode, FailureMode::Closed);
    }

    #[test]
    fn deserializes_partial_config() {
        let cfg: MfaTriggerConfig = serde_json::from_value(serde_json::json!({
            "triggers": ["global", "request_parameter"],
            "global_provider_id": "mfa-duo",
            "rest_endpoint": { "url": "http://localhost:9000/mfa", "timeout": "250ms" },
            "global_failure_mode": "open",
            "provider_selector": { "strategy": "priority_list", "priority": ["mfa-gauth"] }
        }))
        .unwrap();

        assert_eq!(cfg.triggers, vec![TriggerKind::Global, TriggerKind::RequestParameter]);
        assert_eq!(cfg.rest_endpoint.timeout, Duration::from_millis(250));
        assert_eq!(cfg.global_failure_mode, FailureMode::Open);
        assert_eq!(cfg.provider_selector.strategy, SelectorStrategy::PriorityList);
        assert_eq!(cfg.authentication_context_attribute, "authnContextClass");
    }

    #[test]
    fn rejects_unknown_trigger() {
        let result: Result<MfaTriggerConfig, _> = serde_json::from_value(serde_json::json!({
            "triggers": ["groovy"]
        }));
        assert!(result.is_err());
    }
}
