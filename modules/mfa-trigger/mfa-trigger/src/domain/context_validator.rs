//! Checks whether an authentication already satisfies a requested provider.

use std::sync::Arc;

use mfa_trigger_sdk::{Authentication, MultifactorProvider, ProviderRegistry, RegisteredService};

/// Result of [`ContextValidator::validate`].
#[derive(Debug, Clone)]
pub enum ContextValidation {
    /// The requested provider was already satisfied (or the service bypasses MFA).
    Satisfied,
    /// Not yet satisfied; this provider has to run.
    Required(Arc<dyn MultifactorProvider>),
    /// Not satisfied and the requested id names no registered provider.
    Unrecognized,
}

pub struct ContextValidator {
    registry: Arc<dyn ProviderRegistry>,
    context_attribute: String,
}

impl ContextValidator {
    #[must_use]
    pub fn new(registry: Arc<dyn ProviderRegistry>, context_attribute: impl Into<String>) -> Self {
        Self {
            registry,
            context_attribute: context_attribute.into(),
        }
    }

    /// A success bound to the provider, or the provider id in the context
    /// attribute, satisfies the request. Ids are compared through
    /// `matches` so aliases count.
    #[must_use]
    pub fn validate(
        &self,
        authentication: &Authentication,
        requested_id: &str,
        service: Option<&RegisteredService>,
    ) -> ContextValidation {
        if service
            .and_then(|s| s.multifactor_policy.as_ref())
            .is_some_and(|policy| policy.bypass_enabled)
        {
            return ContextValidation::Satisfied;
        }

        let provider = self.registry.find(requested_id);
        let satisfied = authentication
            .satisfied_provider_ids(&self.context_attribute)
            .into_iter()
            .any(|id| {
                id == requested_id || provider.as_ref().is_some_and(|p| p.matches(id))
            });

        match (satisfied, provider) {
            (true, _) => ContextValidation::Satisfied,
            (false, Some(provider)) => ContextValidation::Required(provider),
            (false, None) => ContextValidation::Unrecognized,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use mfa_trigger_sdk::{HandlerResult, MultifactorPolicy, Principal};

    use super::*;
    use crate::domain::provider_registry::tests::{FakeProvider, registry};

    fn validator() -> ContextValidator {
        ContextValidator::new(
            registry(vec![FakeProvider::new("mfa-duo").alias("duo").shared()]),
            "authnContextClass",
        )
    }

    #[test]
    fn handler_success_satisfies_provider() {
        let auth = Authentication::builder(Principal::new("casuser"))
            .success(HandlerResult::new("DuoHandler").for_provider("mfa-duo"))
            .build();
        assert!(matches!(
            validator().validate(&auth, "mfa-duo", None),
            ContextValidation::Satisfied
        ));
    }

    #[test]
    fn context_attribute_alias_satisfies_provider() {
        let auth = Authentication::builder(Principal::new("casuser"))
            .attribute("authnContextClass", "duo")
            .build();
        assert!(matches!(
            validator().validate(&auth, "mfa-duo", None),
            ContextValidation::Satisfied
        ));
    }

    #[test]
    fn unsatisfied_known_provider_is_required() {
        let auth = Authentication::builder(Principal::new("casuser")).build();
        match validator().validate(&auth, "mfa-duo", None) {
            ContextValidation::Required(provider) => assert_eq!(provider.id(), "mfa-duo"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            validator().validate(&auth, "mfa-unknown", None),
            ContextValidation::Unrecognized
        ));
    }

    #[test]
    fn bypass_counts_as_satisfied() {
        let auth = Authentication::builder(Principal::new("casuser")).build();
        let service = RegisteredService::new(1, "app", ".*").with_multifactor_policy(MultifactorPolicy {
            providers: vec!["mfa-duo".to_owned()],
            bypass_enabled: true,
            ..MultifactorPolicy::default()
        });
        assert!(matches!(
            validator().validate(&auth, "mfa-duo", Some(&service)),
            ContextValidation::Satisfied
        ));
    }
}
