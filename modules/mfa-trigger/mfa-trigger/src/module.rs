//! MFA trigger module wiring.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use mfa_trigger_sdk::{
    AuthenticationExecutor, GeoLocationService, MfaTriggerClient, MultifactorProvider,
    ServiceRegistry, TicketStore,
};
use tracing::info;

use crate::config::{MfaTriggerConfig, TriggerKind};
use crate::domain::triggers::{
    AdaptiveTrigger, AttributeSource, AttributeTrigger, GlobalTrigger,
    RegisteredServicePrincipalAttributeTrigger, RegisteredServiceTrigger, RequestParameterTrigger,
    RestEndpointTrigger, TriggerResolver, TriggerSupport, full_match, split_names,
};
use crate::domain::{
    InMemoryProviderRegistry, MfaTriggerLocalClient, MfaTriggerService, ServiceDeps,
    SupportedProviderFilter, selector,
};

/// External systems the engine consumes.
pub struct MfaTriggerCollaborators {
    pub providers: Vec<Arc<dyn MultifactorProvider>>,
    pub authentication_executor: Arc<dyn AuthenticationExecutor>,
    pub service_registry: Arc<dyn ServiceRegistry>,
    pub ticket_store: Arc<dyn TicketStore>,
    /// Enables address matching in the adaptive trigger.
    pub geo_location: Option<Arc<dyn GeoLocationService>>,
}

/// MFA trigger module.
///
/// This module:
/// 1. Compiles every configured pattern up front
/// 2. Builds the enabled trigger resolvers in configured order
/// 3. Hands out the local [`MfaTriggerClient`]
///
/// The provider registry outlives initialization and can be swapped with
/// [`Self::reload_providers`].
pub struct MfaTrigger {
    service: OnceLock<Arc<MfaTriggerService>>,
    registry: Arc<InMemoryProviderRegistry>,
}

impl Default for MfaTrigger {
    fn default() -> Self {
        Self {
            service: OnceLock::new(),
            registry: Arc::new(InMemoryProviderRegistry::new(Vec::new())),
        }
    }
}

impl MfaTrigger {
    /// Wire the engine and return its client.
    ///
    /// # Errors
    ///
    /// Returns an error if a trigger is listed twice, a pattern does not
    /// compile, the REST endpoint URL is malformed, or the module was already
    /// initialized.
    #[tracing::instrument(skip_all, fields(trigger_count = cfg.triggers.len()))]
    pub fn init(
        &self,
        cfg: &MfaTriggerConfig,
        collaborators: MfaTriggerCollaborators,
    ) -> anyhow::Result<Arc<dyn MfaTriggerClient>> {
        info!(
            triggers = ?cfg.triggers,
            failure_mode = ?cfg.global_failure_mode,
            selector = ?cfg.provider_selector.strategy,
            "Initializing mfa_trigger"
        );

        if self.service.get().is_some() {
            anyhow::bail!("Service already initialized");
        }

        let support = TriggerSupport::new(
            self.registry.clone(),
            selector::from_config(&cfg.provider_selector),
            cfg.global_failure_mode,
        );

        let mut seen = BTreeSet::new();
        let mut triggers: Vec<Box<dyn TriggerResolver>> = Vec::with_capacity(cfg.triggers.len());
        for kind in &cfg.triggers {
            if !seen.insert(*kind) {
                anyhow::bail!("trigger '{kind}' is listed more than once");
            }
            triggers.push(build_trigger(
                *kind,
                cfg,
                collaborators.geo_location.clone(),
                support.clone(),
            )?);
        }

        let svc = Arc::new(MfaTriggerService::new(
            triggers,
            ServiceDeps {
                support,
                filter: Arc::new(SupportedProviderFilter),
                authentication_executor: collaborators.authentication_executor,
                service_registry: collaborators.service_registry,
                ticket_store: collaborators.ticket_store,
                authentication_context_attribute: cfg.authentication_context_attribute.clone(),
            },
        ));

        self.service
            .set(Arc::clone(&svc))
            .map_err(|_| anyhow::anyhow!("Service already initialized"))?;
        // Providers go live only once this wiring owns the module.
        self.registry.reload(collaborators.providers);

        info!(
            provider_count = self.registry.len(),
            "mfa_trigger initialized"
        );
        Ok(Arc::new(MfaTriggerLocalClient::new(svc)))
    }

    /// Atomically replace the registered providers.
    pub fn reload_providers(&self, providers: Vec<Arc<dyn MultifactorProvider>>) {
        self.registry.reload(providers);
        info!(provider_count = self.registry.len(), "Reloaded multifactor providers");
    }

    #[must_use]
    pub fn service(&self) -> Option<Arc<MfaTriggerService>> {
        self.service.get().cloned()
    }
}

fn build_trigger(
    kind: TriggerKind,
    cfg: &MfaTriggerConfig,
    geo_location: Option<Arc<dyn GeoLocationService>>,
    support: TriggerSupport,
) -> anyhow::Result<Box<dyn TriggerResolver>> {
    let compile = |pattern: Option<&String>| {
        pattern
            .filter(|p| !p.is_empty())
            .map(|p| full_match(p))
            .transpose()
            .map_err(|e| anyhow::anyhow!("trigger '{kind}': {e}"))
    };

    Ok(match kind {
        TriggerKind::Adaptive => {
            let rules = cfg
                .adaptive
                .iter()
                .map(|(provider_id, pattern)| {
                    regex::Regex::new(pattern)
                        .map(|re| (provider_id.clone(), re))
                        .map_err(|e| anyhow::anyhow!("adaptive rule for '{provider_id}': {e}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            Box::new(AdaptiveTrigger::new(rules, geo_location, support))
        }
        TriggerKind::Global => Box::new(GlobalTrigger::new(cfg.global_provider_id.clone(), support)),
        TriggerKind::RestEndpoint => Box::new(RestEndpointTrigger::new(&cfg.rest_endpoint, support)?),
        TriggerKind::PrincipalAttribute => Box::new(AttributeTrigger::new(
            AttributeSource::Principal,
            split_names(cfg.global_principal_attribute_name_triggers.as_deref()),
            compile(cfg.global_principal_attribute_value_regex.as_ref())?,
            support,
        )),
        TriggerKind::AuthenticationAttribute => Box::new(AttributeTrigger::new(
            AttributeSource::Authentication,
            split_names(cfg.global_authentication_attribute_name_triggers.as_deref()),
            compile(cfg.global_authentication_attribute_value_regex.as_ref())?,
            support,
        )),
        TriggerKind::RequestParameter => {
            Box::new(RequestParameterTrigger::new(cfg.request_parameter.as_str(), support))
        }
        TriggerKind::RegisteredServicePrincipalAttribute => {
            Box::new(RegisteredServicePrincipalAttributeTrigger::new(support))
        }
        TriggerKind::RegisteredService => Box::new(RegisteredServiceTrigger::new(support)),
    })
}
