//! Global principal-attribute and authentication-attribute triggers.

use std::sync::Arc;

use async_trait::async_trait;
use mfa_trigger_sdk::{AttributeValue, Event, MultifactorProvider};
use regex::Regex;
use tracing::debug;

use super::{TriggerInput, TriggerResolver, TriggerSupport, first_non_empty};
use crate::config::TriggerKind;
use crate::domain::DomainError;

/// Which attribute map the trigger reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeSource {
    Principal,
    Authentication,
}

/// Maps an attribute value onto a provider.
///
/// The first non-empty attribute among the configured names is inspected.
/// With exactly one provider registered and a value regex configured, any
/// element fully matching the regex selects that provider. Otherwise each
/// element, in order, is compared against provider ids and aliases; the first
/// element naming at least one provider wins and the selector picks among the
/// providers it names.
pub struct AttributeTrigger {
    source: AttributeSource,
    names: Vec<String>,
    value_regex: Option<Regex>,
    support: TriggerSupport,
}

impl AttributeTrigger {
    /// `value_regex` must already be anchored.
    #[must_use]
    pub fn new(
        source: AttributeSource,
        names: Vec<String>,
        value_regex: Option<Regex>,
        support: TriggerSupport,
    ) -> Self {
        Self {
            source,
            names,
            value_regex,
            support,
        }
    }

    fn eligible_by_id(
        value: &AttributeValue,
        providers: &[Arc<dyn MultifactorProvider>],
    ) -> Vec<Arc<dyn MultifactorProvider>> {
        value
            .as_slice()
            .iter()
            .map(|element| {
                providers
                    .iter()
                    .filter(|p| p.matches(element))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .find(|eligible| !eligible.is_empty())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TriggerResolver for AttributeTrigger {
    fn kind(&self) -> TriggerKind {
        match self.source {
            AttributeSource::Principal => TriggerKind::PrincipalAttribute,
            AttributeSource::Authentication => TriggerKind::AuthenticationAttribute,
        }
    }

    async fn resolve(&self, input: &TriggerInput<'_>) -> Result<Option<Event>, DomainError> {
        if self.names.is_empty() {
            return Ok(None);
        }

        let providers: Vec<_> = self.support.registry.all_providers().into_values().collect();
        if providers.is_empty() {
            debug!(trigger = %self.kind(), "No providers registered");
            return Ok(None);
        }

        let attributes = match self.source {
            AttributeSource::Principal => &input.authentication.principal().attributes,
            AttributeSource::Authentication => input.authentication.attributes(),
        };
        let Some(value) = first_non_empty(attributes, &self.names) else {
            return Ok(None);
        };

        let eligible = match (&self.value_regex, providers.as_slice()) {
            (Some(regex), [single]) => {
                if value.as_slice().iter().any(|v| regex.is_match(v)) {
                    vec![Arc::clone(single)]
                } else {
                    Vec::new()
                }
            }
            _ => Self::eligible_by_id(value, &providers),
        };

        let principal = input.authentication.principal();
        let Some(provider) = self.support.selector.select(&eligible, input.service, principal)
        else {
            debug!(trigger = %self.kind(), principal = %principal.id, "Attribute value matched no provider");
            return Ok(None);
        };
        self.support.verify_and_build(&provider, input).await
    }
}
