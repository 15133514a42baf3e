//! Process-wide provider registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use mfa_trigger_sdk::{MultifactorProvider, ProviderRegistry};

type ProviderMap = BTreeMap<String, Arc<dyn MultifactorProvider>>;

/// Read-mostly provider map, swapped atomically on reload.
///
/// Readers always see either the old or the new set, never a mix.
pub struct InMemoryProviderRegistry {
    providers: ArcSwap<ProviderMap>,
}

impl InMemoryProviderRegistry {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn MultifactorProvider>>) -> Self {
        Self {
            providers: ArcSwap::from_pointee(Self::index(providers)),
        }
    }

    /// Replace the registered providers.
    pub fn reload(&self, providers: Vec<Arc<dyn MultifactorProvider>>) {
        self.providers.store(Arc::new(Self::index(providers)));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.load().is_empty()
    }

    fn index(providers: Vec<Arc<dyn MultifactorProvider>>) -> ProviderMap {
        providers
            .into_iter()
            .map(|p| (p.id().to_owned(), p))
            .collect()
    }
}

impl ProviderRegistry for InMemoryProviderRegistry {
    fn all_providers(&self) -> ProviderMap {
        self.providers.load().as_ref().clone()
    }
}
