use async_trait::async_trait;
use mfa_trigger_sdk::Event;

use super::{TriggerInput, TriggerResolver, TriggerSupport};
use crate::config::TriggerKind;
use crate::domain::DomainError;

/// Requires one configured provider for every request.
pub struct GlobalTrigger {
    provider_id: Option<String>,
    support: TriggerSupport,
}

impl GlobalTrigger {
    #[must_use]
    pub fn new(provider_id: Option<String>, support: TriggerSupport) -> Self {
        Self {
            provider_id: provider_id.filter(|id| !id.trim().is_empty()),
            support,
        }
    }
}

#[async_trait]
impl TriggerResolver for GlobalTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::Global
    }

    async fn resolve(&self, input: &TriggerInput<'_>) -> Result<Option<Event>, DomainError> {
        let Some(provider_id) = self.provider_id.as_deref() else {
            return Ok(None);
        };
        let provider = self.support.lookup_provider(provider_id)?;
        self.support.verify_and_build(&provider, input).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use mfa_trigger_sdk::{Authentication, Principal, ResolutionContext};

    use super::*;
    use crate::domain::provider_registry::tests::FakeProvider;
    use crate::domain::triggers::tests::support;

    #[tokio::test]
    async fn emits_configured_provider() {
        let trigger = GlobalTrigger::new(
            Some("mfa-duo".to_owned()),
            support(vec![FakeProvider::new("mfa-duo").shared()]),
        );
        let auth = Authentication::builder(Principal::new("casuser")).build();
        let ctx = ResolutionContext::default();
        let input = TriggerInput {
            ctx: &ctx,
            authentication: &auth,
            service: None,
        };
        let event = trigger.resolve(&input).await.unwrap().unwrap();
        assert_eq!(event.provider_id(), Some("mfa-duo"));
        assert_eq!(event.attributes().principal.as_ref().unwrap().id, "casuser");
    }

    #[tokio::test]
    async fn unset_is_a_miss_and_unknown_is_fatal() {
        let auth = Authentication::builder(Principal::new("casuser")).build();
        let ctx = ResolutionContext::default();
        let input = TriggerInput {
            ctx: &ctx,
            authentication: &auth,
            service: None,
        };

        let unset = GlobalTrigger::new(None, support(vec![]));
        assert_eq!(unset.resolve(&input).await, Ok(None));

        let unknown = GlobalTrigger::new(Some("mfa-duo".to_owned()), support(vec![]));
        assert!(unknown.resolve(&input).await.unwrap_err().is_configuration_error());
    }
}
