//! Static credential verification.

use std::collections::HashMap;

use async_trait::async_trait;
use mfa_trigger_sdk::{
    Authentication, AuthenticationExecutor, AuthenticationResultBuilder, Credential,
    HandlerResult, MessageDescriptor, MfaTriggerError, Principal, Service,
};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::{AccountConfig, StaticMfaPluginConfig};

/// Name recorded for password successes.
pub const PASSWORD_HANDLER: &str = "StaticPasswordHandler";

/// Verifies credentials against configured accounts.
///
/// A secret equal to the account password yields a password success (with the
/// account's configured warnings). A secret equal to one of the account's
/// one-time codes yields a success bound to that provider and records the
/// provider id in the authentication context attribute.
pub struct StaticAuthenticationExecutor {
    accounts: HashMap<String, AccountConfig>,
    context_attribute: String,
}

impl StaticAuthenticationExecutor {
    #[must_use]
    pub fn from_config(cfg: &StaticMfaPluginConfig) -> Self {
        Self {
            accounts: cfg
                .accounts
                .iter()
                .map(|a| (a.username.clone(), a.clone()))
                .collect(),
            context_attribute: cfg.authentication_context_attribute.clone(),
        }
    }

    fn authenticate(&self, credential: &Credential) -> Option<Authentication> {
        let account = self.accounts.get(credential.id())?;
        let secret = credential.secret()?.expose_secret();
        let principal = Principal {
            id: account.username.clone(),
            attributes: account.attributes.clone(),
        };

        if secret == account.password {
            let result = account
                .warnings
                .iter()
                .fold(HandlerResult::new(PASSWORD_HANDLER), |result, code| {
                    result.with_warning(MessageDescriptor::new(code.as_str()))
                });
            return Some(Authentication::builder(principal).success(result).build());
        }

        let (provider_id, _) = account
            .tokens
            .iter()
            .find(|(_, code)| code.as_str() == secret)?;
        Some(
            Authentication::builder(principal)
                .attribute(self.context_attribute.as_str(), provider_id.as_str())
                .success(
                    HandlerResult::new(format!("{provider_id}-token")).for_provider(provider_id.as_str()),
                )
                .build(),
        )
    }
}

#[async_trait]
impl AuthenticationExecutor for StaticAuthenticationExecutor {
    async fn handle_initial_transaction(
        &self,
        service: Option<&Service>,
        credential: &Credential,
    ) -> Result<AuthenticationResultBuilder, MfaTriggerError> {
        let authentication = self.authenticate(credential).ok_or_else(|| {
            MfaTriggerError::AuthenticationFailed(format!(
                "credential '{}' was rejected",
                credential.id()
            ))
        })?;
        debug!(
            principal = %authentication.principal().id,
            service = service.map(|s| s.id.as_str()),
            "Credential verified"
        );
        Ok(AuthenticationResultBuilder::new()
            .collect(authentication)
            .collect_credential(credential.clone()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn executor() -> StaticAuthenticationExecutor {
        StaticAuthenticationExecutor::from_config(&StaticMfaPluginConfig {
            accounts: vec![AccountConfig {
                username: "casuser".to_owned(),
                password: "Mellon".to_owned(),
                attributes: BTreeMap::new(),
                warnings: vec!["password.expiring".to_owned()],
                tokens: BTreeMap::from([("mfa-duo".to_owned(), "123456".to_owned())]),
            }],
            ..StaticMfaPluginConfig::default()
        })
    }

    #[tokio::test]
    async fn password_success_carries_configured_warnings() {
        let builder = executor()
            .handle_initial_transaction(None, &Credential::new("casuser").with_secret("Mellon".to_owned()))
            .await
            .unwrap();
        let auth = builder.initial_authentication().unwrap();
        assert_eq!(auth.successes()[0].handler_name, PASSWORD_HANDLER);
        assert!(auth.has_warnings());
    }

    #[tokio::test]
    async fn token_success_is_bound_to_provider() {
        let builder = executor()
            .handle_initial_transaction(None, &Credential::new("casuser").with_secret("123456".to_owned()))
            .await
            .unwrap();
        let auth = builder.initial_authentication().unwrap();
        assert!(auth.satisfied_provider_ids("authnContextClass").contains("mfa-duo"));
    }

    #[tokio::test]
    async fn rejects_unknown_secret() {
        let result = executor()
            .handle_initial_transaction(None, &Credential::new("casuser").with_secret("nope".to_owned()))
            .await;
        assert!(matches!(result, Err(MfaTriggerError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn establishes_context_from_existing_session() {
        let existing = Authentication::builder(Principal::new("casuser")).build();
        let builder = executor()
            .establish_context_from_existing(
                &existing,
                Some(&Credential::new("casuser").with_secret("123456".to_owned())),
            )
            .await
            .unwrap();
        assert_eq!(builder.authentications().len(), 2);
        let merged = builder.build(None).unwrap();
        assert!(merged.authentication.satisfied_provider_ids("authnContextClass").contains("mfa-duo"));
    }
}
