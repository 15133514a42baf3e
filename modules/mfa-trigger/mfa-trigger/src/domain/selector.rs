//! Tie-break among several eligible providers.

use std::sync::Arc;

use mfa_trigger_sdk::{MultifactorProvider, Principal, RegisteredService};

use crate::config::{ProviderSelectorConfig, SelectorStrategy};

/// Picks one provider out of several eligible ones.
///
/// Implementations must be total and deterministic: the same eligible set
/// always yields the same provider, whatever order it arrives in.
pub trait ProviderSelector: Send + Sync {
    /// Returns `None` only when `eligible` is empty.
    fn select(
        &self,
        eligible: &[Arc<dyn MultifactorProvider>],
        service: Option<&RegisteredService>,
        principal: &Principal,
    ) -> Option<Arc<dyn MultifactorProvider>>;
}

/// Build the selector named by configuration.
#[must_use]
pub fn from_config(cfg: &ProviderSelectorConfig) -> Arc<dyn ProviderSelector> {
    match cfg.strategy {
        SelectorStrategy::Ranked => Arc::new(RankedProviderSelector),
        SelectorStrategy::PriorityList => Arc::new(PriorityListProviderSelector {
            priority: cfg.priority.clone(),
        }),
    }
}

/// Highest `order` wins; equal orders fall back to the lexicographically smallest id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedProviderSelector;

impl ProviderSelector for RankedProviderSelector {
    fn select(
        &self,
        eligible: &[Arc<dyn MultifactorProvider>],
        _service: Option<&RegisteredService>,
        _principal: &Principal,
    ) -> Option<Arc<dyn MultifactorProvider>> {
        eligible
            .iter()
            .min_by(|a, b| b.order().cmp(&a.order()).then_with(|| a.id().cmp(b.id())))
            .cloned()
    }
}

/// First configured id with an eligible provider; otherwise ranked.
#[derive(Debug, Clone, Default)]
pub struct PriorityListProviderSelector {
    pub priority: Vec<String>,
}

impl ProviderSelector for PriorityListProviderSelector {
    fn select(
        &self,
        eligible: &[Arc<dyn MultifactorProvider>],
        service: Option<&RegisteredService>,
        principal: &Principal,
    ) -> Option<Arc<dyn MultifactorProvider>> {
        self.priority
            .iter()
            .find_map(|id| {
                // Several eligible providers may answer to an alias; rank among them.
                let matching: Vec<_> = eligible.iter().filter(|p| p.matches(id)).cloned().collect();
                RankedProviderSelector.select(&matching, service, principal)
            })
            .or_else(|| RankedProviderSelector.select(eligible, service, principal))
    }
}
