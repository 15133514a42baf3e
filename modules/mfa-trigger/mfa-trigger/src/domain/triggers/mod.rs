//! Trigger resolvers.
//!
//! Each resolver inspects the request and the current authentication and
//! either names a provider (`Ok(Some(event))`), has no opinion (`Ok(None)`) or
//! fails. Only misconfiguration and closed-mode unavailability are errors; the
//! composite resolver classifies them through [`super::TriggerOutcome`].

pub mod adaptive;
pub mod attribute;
pub mod global;
pub mod registered_service;
pub mod request_parameter;
pub mod rest_endpoint;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use mfa_trigger_sdk::{
    AttributeValue, Attributes, Authentication, Event, FailureMode, MultifactorProvider,
    ProviderRegistry, RegisteredService, ResolutionContext,
};
use regex::Regex;
use tracing::warn;

use super::DomainError;
use super::selector::ProviderSelector;
use crate::config::TriggerKind;

pub use adaptive::AdaptiveTrigger;
pub use attribute::{AttributeSource, AttributeTrigger};
pub use global::GlobalTrigger;
pub use registered_service::{RegisteredServicePrincipalAttributeTrigger, RegisteredServiceTrigger};
pub use request_parameter::RequestParameterTrigger;
pub use rest_endpoint::RestEndpointTrigger;

/// Everything a trigger may look at for one request.
pub struct TriggerInput<'a> {
    pub ctx: &'a ResolutionContext,
    pub authentication: &'a Authentication,
    pub service: Option<&'a RegisteredService>,
}

#[async_trait]
pub trait TriggerResolver: Send + Sync {
    fn kind(&self) -> TriggerKind;

    /// # Errors
    ///
    /// Configuration errors for unknown providers or invalid patterns;
    /// `ProviderUnavailable` in closed failure mode.
    async fn resolve(&self, input: &TriggerInput<'_>) -> Result<Option<Event>, DomainError>;
}

/// Collaborators shared by all trigger resolvers.
#[derive(Clone)]
pub struct TriggerSupport {
    pub registry: Arc<dyn ProviderRegistry>,
    pub selector: Arc<dyn ProviderSelector>,
    pub global_failure_mode: FailureMode,
    patterns: Arc<DashMap<String, Regex>>,
}

impl TriggerSupport {
    #[must_use]
    pub fn new(
        registry: Arc<dyn ProviderRegistry>,
        selector: Arc<dyn ProviderSelector>,
        global_failure_mode: FailureMode,
    ) -> Self {
        Self {
            registry,
            selector,
            global_failure_mode,
            patterns: Arc::new(DashMap::new()),
        }
    }

    /// # Errors
    ///
    /// `ProviderNotFound` if nothing in the registry answers to `provider_id`.
    pub fn lookup_provider(
        &self,
        provider_id: &str,
    ) -> Result<Arc<dyn MultifactorProvider>, DomainError> {
        self.registry
            .find(provider_id)
            .ok_or_else(|| DomainError::ProviderNotFound {
                provider_id: provider_id.to_owned(),
            })
    }

    /// Emit the provider event if the provider can serve the service.
    ///
    /// An unavailable provider is skipped in open failure mode and fails the
    /// attempt in closed mode. The service's policy overrides the global mode.
    ///
    /// # Errors
    ///
    /// `ProviderUnavailable` in closed failure mode.
    pub async fn verify_and_build(
        &self,
        provider: &Arc<dyn MultifactorProvider>,
        input: &TriggerInput<'_>,
    ) -> Result<Option<Event>, DomainError> {
        if provider.is_available(input.service).await {
            return Ok(Some(Event::provider_required(
                provider.id(),
                input.authentication.principal(),
                input.service,
            )));
        }

        let mode = input
            .service
            .and_then(|s| s.multifactor_policy.as_ref())
            .and_then(|p| p.failure_mode)
            .unwrap_or(self.global_failure_mode);
        match mode {
            FailureMode::Open => {
                warn!(provider_id = provider.id(), "Provider unavailable, failing open");
                Ok(None)
            }
            FailureMode::Closed => Err(DomainError::ProviderUnavailable {
                provider_id: provider.id().to_owned(),
            }),
        }
    }

    /// Compile `pattern` once; later calls reuse the cached regex.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if the pattern does not compile.
    pub fn pattern(&self, pattern: &str) -> Result<Regex, DomainError> {
        if let Some(regex) = self.patterns.get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(pattern)?;
        self.patterns.insert(pattern.to_owned(), regex.clone());
        Ok(regex)
    }
}

/// Split a comma-separated attribute-name list.
#[must_use]
pub fn split_names(names: Option<&str>) -> Vec<String> {
    names
        .map(|names| {
            names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// The first non-empty value among `names`, in order.
#[must_use]
pub fn first_non_empty<'a, S: AsRef<str>>(
    attributes: &'a Attributes,
    names: &[S],
) -> Option<&'a AttributeValue> {
    names
        .iter()
        .find_map(|name| attributes.get(name.as_ref()).filter(|value| !value.is_empty()))
}

/// Anchor `pattern` so it must match the whole value.
///
/// # Errors
///
/// `InvalidConfiguration` if the pattern does not compile.
pub fn full_match(pattern: &str) -> Result<Regex, DomainError> {
    Ok(Regex::new(&format!("^(?:{pattern})$"))?)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use mfa_trigger_sdk::{MultifactorPolicy, Principal};

    use super::*;
    use crate::domain::provider_registry::tests::{FakeProvider, registry};
    use crate::domain::selector::RankedProviderSelector;

    pub(crate) fn support(providers: Vec<Arc<dyn MultifactorProvider>>) -> TriggerSupport {
        TriggerSupport::new(
            registry(providers),
            Arc::new(RankedProviderSelector),
            FailureMode::Closed,
        )
    }

    #[test]
    fn first_non_empty_skips_blank_values() {
        let attributes = Principal::new("casuser")
            .with_attribute("mail", "")
            .with_attribute("memberOf", vec!["staff"])
            .attributes;
        let value = first_non_empty(&attributes, &["missing", "mail", "memberOf"]).unwrap();
        assert_eq!(value.as_slice(), ["staff"]);
    }

    #[test]
    fn full_match_is_anchored() {
        let regex = full_match("mfa-.*|admin").unwrap();
        assert!(regex.is_match("admin"));
        assert!(!regex.is_match("sysadmin"));
        assert!(full_match("(").is_err());
    }

    #[tokio::test]
    async fn unavailable_provider_honours_failure_mode() {
        let support = support(vec![FakeProvider::new("mfa-duo").unavailable().shared()]);
        let provider = support.lookup_provider("mfa-duo").unwrap();
        let auth = Authentication::builder(Principal::new("casuser")).build();
        let ctx = ResolutionContext::default();

        let closed = TriggerInput {
            ctx: &ctx,
            authentication: &auth,
            service: None,
        };
        assert!(matches!(
            support.verify_and_build(&provider, &closed).await,
            Err(DomainError::ProviderUnavailable { .. })
        ));

        let open_service = RegisteredService::new(1, "app", ".*").with_multifactor_policy(MultifactorPolicy {
            failure_mode: Some(FailureMode::Open),
            ..MultifactorPolicy::default()
        });
        let open = TriggerInput {
            ctx: &ctx,
            authentication: &auth,
            service: Some(&open_service),
        };
        assert_eq!(support.verify_and_build(&provider, &open).await, Ok(None));
    }

    #[test]
    fn unknown_provider_is_a_configuration_error() {
        let support = support(vec![]);
        let err = support.lookup_provider("mfa-duo").unwrap_err();
        assert!(err.is_configuration_error());
    }
}
