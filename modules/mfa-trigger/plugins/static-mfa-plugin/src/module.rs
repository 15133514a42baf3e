//! Static MFA plugin wiring.

use std::sync::Arc;

use mfa_trigger_sdk::MultifactorProvider;
use tracing::{info, warn};

use crate::config::StaticMfaPluginConfig;
use crate::domain::{
    InMemoryTicketStore, StaticAuthenticationExecutor, StaticGeoLocationService, StaticProvider,
    StaticServiceRegistry,
};

/// Every collaborator built from one [`StaticMfaPluginConfig`].
///
/// The engine takes each field as a trait object; the concrete types stay
/// visible here so tests can inspect the ticket store directly.
pub struct StaticMfaPlugin {
    pub providers: Vec<Arc<dyn MultifactorProvider>>,
    pub authentication_executor: Arc<StaticAuthenticationExecutor>,
    pub service_registry: Arc<StaticServiceRegistry>,
    pub ticket_store: Arc<InMemoryTicketStore>,
    pub geo_location: Arc<StaticGeoLocationService>,
}

impl StaticMfaPlugin {
    /// # Errors
    ///
    /// Returns an error if a provider id is duplicated or a service pattern does not compile.
    pub fn from_config(cfg: &StaticMfaPluginConfig) -> anyhow::Result<Self> {
        let mut seen = std::collections::BTreeSet::new();
        for provider in &cfg.providers {
            if !seen.insert(provider.id.as_str()) {
                anyhow::bail!("duplicate multifactor provider id '{}'", provider.id);
            }
        }

        if cfg.accounts.iter().any(|a| a.tokens.is_empty()) && !cfg.providers.is_empty() {
            warn!("Some static accounts carry no one-time codes and cannot complete step-up");
        }

        let providers = cfg
            .providers
            .iter()
            .map(|p| Arc::new(StaticProvider::new(p.clone())) as Arc<dyn MultifactorProvider>)
            .collect::<Vec<_>>();

        let plugin = Self {
            providers,
            authentication_executor: Arc::new(StaticAuthenticationExecutor::from_config(cfg)),
            service_registry: Arc::new(StaticServiceRegistry::new(&cfg.services)?),
            ticket_store: Arc::new(InMemoryTicketStore::new(cfg.ticket_time_to_live)),
            geo_location: Arc::new(StaticGeoLocationService::new(&cfg.geo_locations)),
        };

        info!(
            provider_count = plugin.providers.len(),
            account_count = cfg.accounts.len(),
            service_count = cfg.services.len(),
            ticket_time_to_live = %humantime::format_duration(cfg.ticket_time_to_live),
            "Static MFA plugin initialized"
        );
        Ok(plugin)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::config::ProviderConfig;

    use super::*;

    #[test]
    fn rejects_duplicate_provider_ids() {
        let cfg = StaticMfaPluginConfig {
            providers: vec![ProviderConfig::new("mfa-duo"), ProviderConfig::new("mfa-duo")],
            ..StaticMfaPluginConfig::default()
        };
        assert!(StaticMfaPlugin::from_config(&cfg).is_err());
    }

    #[test]
    fn builds_collaborators() {
        let cfg = StaticMfaPluginConfig {
            providers: vec![ProviderConfig::new("mfa-duo"), ProviderConfig::new("mfa-gauth")],
            ..StaticMfaPluginConfig::default()
        };
        let plugin = StaticMfaPlugin::from_config(&cfg).unwrap();
        assert_eq!(plugin.providers.len(), 2);
        assert!(plugin.ticket_store.is_empty());
    }
}
