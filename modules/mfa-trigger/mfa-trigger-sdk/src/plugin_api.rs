//! Plugin API traits for multifactor providers.
//!
//! Providers are registered process-wide and looked up by id. The engine never
//! constructs providers itself; it reaches them through a [`ProviderRegistry`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{Authentication, Event, RegisteredService};

/// A pluggable secondary-factor authentication mechanism.
#[async_trait]
pub trait MultifactorProvider: Send + Sync + fmt::Debug {
    /// Stable provider id (e.g. `mfa-duo`), also used as the event id.
    fn id(&self) -> &str;

    /// Rank used by the default selector: higher wins.
    fn order(&self) -> i32 {
        0
    }

    /// Whether `identifier` names this provider (id or alias).
    fn matches(&self, identifier: &str) -> bool {
        self.id() == identifier
    }

    /// Reachability/applicability check for the given service.
    async fn is_available(&self, service: Option<&RegisteredService>) -> bool;

    /// Final gate applied by the selection filter.
    fn supports(
        &self,
        _event: &Event,
        _authentication: &Authentication,
        _service: Option<&RegisteredService>,
    ) -> bool {
        true
    }
}

/// Read-mostly registry of the providers known to this process.
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    /// All registered providers keyed by id.
    fn all_providers(&self) -> BTreeMap<String, Arc<dyn MultifactorProvider>>;

    /// Providers reporting themselves available for `service`.
    async fn available_providers(
        &self,
        service: Option<&RegisteredService>,
    ) -> BTreeMap<String, Arc<dyn MultifactorProvider>> {
        let mut available = BTreeMap::new();
        for (id, provider) in self.all_providers() {
            if provider.is_available(service).await {
                available.insert(id, provider);
            }
        }
        available
    }

    /// Look a provider up by id, falling back to alias matching.
    fn find(&self, identifier: &str) -> Option<Arc<dyn MultifactorProvider>> {
        let providers = self.all_providers();
        if let Some(provider) = providers.get(identifier) {
            return Some(Arc::clone(provider));
        }
        providers
            .into_values()
            .find(|provider| provider.matches(identifier))
    }
}
