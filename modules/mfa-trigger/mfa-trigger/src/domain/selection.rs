//! Final gate over candidate events.

use mfa_trigger_sdk::{Authentication, Event, ProviderRegistry, RegisteredService};
use tracing::debug;

/// Narrows the candidate set before one event is chosen.
///
/// Deployments may replace the default rule.
pub trait SelectionFilter: Send + Sync {
    fn filter(
        &self,
        candidates: Vec<Event>,
        authentication: &Authentication,
        service: Option<&RegisteredService>,
        registry: &dyn ProviderRegistry,
    ) -> Vec<Event>;
}

/// Keeps the events whose provider still `supports` the request.
///
/// With no providers registered at all the candidates pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportedProviderFilter;

impl SelectionFilter for SupportedProviderFilter {
    fn filter(
        &self,
        candidates: Vec<Event>,
        authentication: &Authentication,
        service: Option<&RegisteredService>,
        registry: &dyn ProviderRegistry,
    ) -> Vec<Event> {
        if registry.all_providers().is_empty() {
            return candidates;
        }

        candidates
            .into_iter()
            .filter(|event| {
                let supported = event
                    .provider_id()
                    .and_then(|id| registry.find(id))
                    .is_some_and(|provider| provider.supports(event, authentication, service));
                if !supported {
                    debug!(event = %event.id(), "Candidate dropped by selection filter");
                }
                supported
            })
            .collect()
    }
}
