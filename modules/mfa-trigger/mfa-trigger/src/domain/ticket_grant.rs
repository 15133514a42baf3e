//! Issue-or-update of the ticket-granting ticket.

use std::sync::Arc;

use mfa_trigger_sdk::{
    AuthenticationExecutor, AuthenticationResult, AuthenticationResultBuilder, Event, Service,
    TicketStore,
};
use tracing::{debug, info, warn};

use super::DomainError;

pub struct TicketGrantCoordinator {
    executor: Arc<dyn AuthenticationExecutor>,
    ticket_store: Arc<dyn TicketStore>,
}

impl TicketGrantCoordinator {
    #[must_use]
    pub fn new(executor: Arc<dyn AuthenticationExecutor>, ticket_store: Arc<dyn TicketStore>) -> Self {
        Self {
            executor,
            ticket_store,
        }
    }

    /// Finalize the attempt and bind it to a ticket.
    ///
    /// A presented ticket of the same principal absorbs the new authentication
    /// and keeps its id. A ticket of another principal is left untouched and a
    /// new one is issued. A stale ticket reference is destroyed and replaced.
    ///
    /// # Errors
    ///
    /// Finalization and ticket store failures.
    #[tracing::instrument(skip_all, fields(ticket_granting_ticket_id = ticket_id))]
    pub async fn grant(
        &self,
        builder: &AuthenticationResultBuilder,
        service: Option<&Service>,
        ticket_id: Option<&str>,
    ) -> Result<Event, DomainError> {
        let result = self.executor.finalize_all(builder, service).await?;
        let principal_id = &result.authentication.principal().id;

        let granted_id = match ticket_id {
            None => self.issue(&result).await?,
            Some(id) => match self.ticket_store.get(id).await? {
                None => {
                    warn!(ticket_id = id, "Presented ticket no longer exists, issuing a new one");
                    self.ticket_store.destroy(id).await?;
                    self.issue(&result).await?
                }
                Some(mut ticket) if ticket.authentication().principal().id == *principal_id => {
                    ticket.merge_authentication(&result.authentication);
                    self.ticket_store.update(&ticket).await?;
                    debug!(ticket_id = id, "Merged authentication into existing ticket");
                    ticket.id().to_owned()
                }
                Some(ticket) => {
                    info!(
                        ticket_id = id,
                        previous_principal = %ticket.authentication().principal().id,
                        principal = %principal_id,
                        "Principal changed, issuing a new ticket"
                    );
                    self.issue(&result).await?
                }
            },
        };

        let warnings: Vec<_> = result.authentication.warnings().cloned().collect();
        let event = if warnings.is_empty() {
            Event::success()
        } else {
            Event::success_with_warnings(warnings)
        };
        Ok(event.with_ticket_granting_ticket(granted_id))
    }

    async fn issue(&self, result: &AuthenticationResult) -> Result<String, DomainError> {
        let ticket = self.ticket_store.create(result).await?;
        debug!(ticket_id = ticket.id(), "Issued ticket-granting ticket");
        Ok(ticket.id().to_owned())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use mfa_trigger_sdk::{
        Authentication, EventId, HandlerResult, MessageDescriptor, Principal, TicketStore,
    };
    use static_mfa_plugin::config::StaticMfaPluginConfig;
    use static_mfa_plugin::{InMemoryTicketStore, StaticAuthenticationExecutor};

    use super::*;

    fn coordinator() -> (TicketGrantCoordinator, Arc<InMemoryTicketStore>) {
        let store = Arc::new(InMemoryTicketStore::new(Duration::from_secs(60)));
        let executor = Arc::new(StaticAuthenticationExecutor::from_config(&StaticMfaPluginConfig::default()));
        (TicketGrantCoordinator::new(executor, store.clone()), store)
    }

    fn builder_for(principal: &str, success: HandlerResult) -> AuthenticationResultBuilder {
        AuthenticationResultBuilder::new()
            .collect(Authentication::builder(Principal::new(principal)).success(success).build())
    }

    fn ticket_of(event: &Event) -> String {
        event.attributes().ticket_granting_ticket_id.clone().unwrap()
    }

    #[tokio::test]
    async fn same_principal_keeps_ticket_id() {
        let (grant, store) = coordinator();
        let first = grant
            .grant(&builder_for("casuser", HandlerResult::new("password")), None, None)
            .await
            .unwrap();
        let tgt = ticket_of(&first);

        let second = grant
            .grant(
                &builder_for("casuser", HandlerResult::new("duo").for_provider("mfa-duo")),
                None,
                Some(&tgt),
            )
            .await
            .unwrap();
        assert_eq!(ticket_of(&second), tgt);
        assert_eq!(store.len(), 1);

        let ticket = store.get(&tgt).await.unwrap().unwrap();
        assert_eq!(ticket.authentication().successes().len(), 2);
    }

    #[tokio::test]
    async fn different_principal_gets_new_ticket_and_old_survives() {
        let (grant, store) = coordinator();
        let first = grant
            .grant(&builder_for("casuser", HandlerResult::new("password")), None, None)
            .await
            .unwrap();
        let old = ticket_of(&first);

        let second = grant
            .grant(&builder_for("other", HandlerResult::new("password")), None, Some(&old))
            .await
            .unwrap();
        assert_ne!(ticket_of(&second), old);
        assert!(store.get(&old).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn stale_ticket_is_replaced() {
        let (grant, store) = coordinator();
        let event = grant
            .grant(&builder_for("casuser", HandlerResult::new("password")), None, Some("TGT-gone"))
            .await
            .unwrap();
        assert_ne!(ticket_of(&event), "TGT-gone");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn warnings_yield_success_with_warnings() {
        let (grant, _store) = coordinator();
        let plain = grant
            .grant(&builder_for("casuser", HandlerResult::new("password")), None, None)
            .await
            .unwrap();
        assert_eq!(plain.id(), &EventId::Success);

        let warned = grant
            .grant(
                &builder_for(
                    "casuser",
                    HandlerResult::new("password").with_warning(MessageDescriptor::new("password.expiring")),
                ),
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(warned.id(), &EventId::SuccessWithWarnings);
        assert_eq!(warned.attributes().warnings[0].code, "password.expiring");
    }

    #[tokio::test]
    async fn empty_builder_fails() {
        let (grant, _store) = coordinator();
        let err = grant
            .grant(&AuthenticationResultBuilder::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AuthenticationFailed(_)));
    }
}
