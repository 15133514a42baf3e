//! Statically configured multifactor providers.

use async_trait::async_trait;
use mfa_trigger_sdk::{Authentication, Event, MultifactorProvider, RegisteredService};

use crate::config::ProviderConfig;

/// Provider whose identity and availability come from configuration.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    config: ProviderConfig,
}

impl StaticProvider {
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MultifactorProvider for StaticProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn order(&self) -> i32 {
        self.config.order
    }

    fn matches(&self, identifier: &str) -> bool {
        self.config.id == identifier || self.config.aliases.iter().any(|a| a == identifier)
    }

    async fn is_available(&self, service: Option<&RegisteredService>) -> bool {
        self.config.available
            && service.is_none_or(|s| !self.config.unavailable_for_services.contains(&s.id))
    }

    fn supports(
        &self,
        _event: &Event,
        authentication: &Authentication,
        _service: Option<&RegisteredService>,
    ) -> bool {
        !self
            .config
            .excluded_principals
            .contains(&authentication.principal().id)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use mfa_trigger_sdk::Principal;

    use super::*;

    fn duo() -> StaticProvider {
        StaticProvider::new(ProviderConfig {
            aliases: vec!["duo".to_owned()],
            unavailable_for_services: vec![7],
            excluded_principals: vec!["robot".to_owned()],
            ..ProviderConfig::new("mfa-duo")
        })
    }

    #[test]
    fn matches_id_and_aliases() {
        let provider = duo();
        assert!(provider.matches("mfa-duo"));
        assert!(provider.matches("duo"));
        assert!(!provider.matches("mfa-gauth"));
    }

    #[tokio::test]
    async fn availability_honours_service_exclusions() {
        let provider = duo();
        let portal = RegisteredService::new(1, "portal", ".*");
        let legacy = RegisteredService::new(7, "legacy", ".*");

        assert!(provider.is_available(None).await);
        assert!(provider.is_available(Some(&portal)).await);
        assert!(!provider.is_available(Some(&legacy)).await);
    }

    #[test]
    fn does_not_support_excluded_principals() {
        let provider = duo();
        let robot = Authentication::builder(Principal::new("robot")).build();
        let human = Authentication::builder(Principal::new("casuser")).build();
        let event = Event::success();

        assert!(!provider.supports(&event, &robot, None));
        assert!(provider.supports(&event, &human, None));
    }
}
