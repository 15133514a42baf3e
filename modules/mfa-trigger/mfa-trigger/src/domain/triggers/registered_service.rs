//! Triggers driven by the target service's multifactor policy.

use std::sync::Arc;

use async_trait::async_trait;
use mfa_trigger_sdk::{Event, MultifactorPolicy, MultifactorProvider};
use tracing::debug;

use super::{TriggerInput, TriggerResolver, TriggerSupport, first_non_empty};
use crate::config::TriggerKind;
use crate::domain::DomainError;

fn active_policy<'a>(input: &TriggerInput<'a>) -> Option<&'a MultifactorPolicy> {
    input
        .service?
        .multifactor_policy
        .as_ref()
        .filter(|p| !p.providers.is_empty() && !p.bypass_enabled)
}

fn policy_providers(
    support: &TriggerSupport,
    policy: &MultifactorPolicy,
) -> Result<Vec<Arc<dyn MultifactorProvider>>, DomainError> {
    policy
        .providers
        .iter()
        .map(|id| support.lookup_provider(id))
        .collect()
}

/// Requires the service's providers when a principal attribute contains the
/// policy's value pattern.
///
/// Unlike the global attribute trigger the pattern is searched for, not
/// matched against the whole value.
pub struct RegisteredServicePrincipalAttributeTrigger {
    support: TriggerSupport,
}

impl RegisteredServicePrincipalAttributeTrigger {
    #[must_use]
    pub fn new(support: TriggerSupport) -> Self {
        Self { support }
    }
}

#[async_trait]
impl TriggerResolver for RegisteredServicePrincipalAttributeTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::RegisteredServicePrincipalAttribute
    }

    async fn resolve(&self, input: &TriggerInput<'_>) -> Result<Option<Event>, DomainError> {
        let Some(policy) = active_policy(input) else {
            return Ok(None);
        };
        let names = policy.attribute_names();
        let Some(pattern) = policy
            .principal_attribute_value_to_match
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        else {
            return Ok(None);
        };
        if names.is_empty() {
            return Ok(None);
        }

        let providers = policy_providers(&self.support, policy)?;
        let pattern = self.support.pattern(pattern)?;

        let principal = input.authentication.principal();
        let matched = first_non_empty(&principal.attributes, &names)
            .is_some_and(|value| value.as_slice().iter().any(|v| pattern.is_match(v)));
        if !matched {
            debug!(principal = %principal.id, "Service attribute trigger did not match");
            return Ok(None);
        }

        match self.support.selector.select(&providers, input.service, principal) {
            Some(provider) => self.support.verify_and_build(&provider, input).await,
            None => Ok(None),
        }
    }
}

/// Requires the service's providers unconditionally.
///
/// Stays silent when the policy also defines an attribute trigger; that case
/// belongs to [`RegisteredServicePrincipalAttributeTrigger`].
pub struct RegisteredServiceTrigger {
    support: TriggerSupport,
}

impl RegisteredServiceTrigger {
    #[must_use]
    pub fn new(support: TriggerSupport) -> Self {
        Self { support }
    }
}

#[async_trait]
impl TriggerResolver for RegisteredServiceTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::RegisteredService
    }

    async fn resolve(&self, input: &TriggerInput<'_>) -> Result<Option<Event>, DomainError> {
        let Some(policy) = active_policy(input).filter(|p| !p.has_attribute_trigger()) else {
            return Ok(None);
        };
        let providers = policy_providers(&self.support, policy)?;
        let principal = input.authentication.principal();
        match self.support.selector.select(&providers, input.service, principal) {
            Some(provider) => self.support.verify_and_build(&provider, input).await,
            None => Ok(None),
        }
    }
}
