//! In-memory ticket store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use dashmap::DashMap;
use mfa_trigger_sdk::{AuthenticationResult, MfaTriggerError, TicketGrantingTicket, TicketStore};
use tracing::debug;
use uuid::Uuid;

/// `DashMap`-backed ticket store.
///
/// Writes to one ticket id are serialized by the map's shard lock; expired
/// tickets are reported as absent and evicted on read.
pub struct InMemoryTicketStore {
    tickets: DashMap<String, TicketGrantingTicket>,
    time_to_live: TimeDelta,
}

impl InMemoryTicketStore {
    #[must_use]
    pub fn new(time_to_live: Duration) -> Self {
        Self {
            tickets: DashMap::new(),
            time_to_live: TimeDelta::from_std(time_to_live).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Number of stored tickets, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    fn next_id() -> String {
        format!("TGT-{}", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn create(
        &self,
        result: &AuthenticationResult,
    ) -> Result<TicketGrantingTicket, MfaTriggerError> {
        let ticket = TicketGrantingTicket::new(Self::next_id(), result.authentication.clone());
        self.tickets.insert(ticket.id().to_owned(), ticket.clone());
        debug!(ticket_id = %ticket.id(), principal = %ticket.authentication().principal().id, "Created ticket-granting ticket");
        Ok(ticket)
    }

    async fn get(&self, ticket_id: &str) -> Result<Option<TicketGrantingTicket>, MfaTriggerError> {
        let Some(ticket) = self.tickets.get(ticket_id).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };

        if ticket.is_expired_at(Utc::now(), self.time_to_live) {
            self.tickets.remove(ticket_id);
            debug!(ticket_id, "Evicted expired ticket-granting ticket");
            return Ok(None);
        }

        Ok(Some(ticket))
    }

    async fn update(&self, ticket: &TicketGrantingTicket) -> Result<(), MfaTriggerError> {
        match self.tickets.get_mut(ticket.id()) {
            Some(mut entry) => {
                *entry = ticket.clone();
                Ok(())
            }
            None => Err(MfaTriggerError::TicketNotFound {
                ticket_id: ticket.id().to_owned(),
            }),
        }
    }

    async fn destroy(&self, ticket_id: &str) -> Result<(), MfaTriggerError> {
        if self.tickets.remove(ticket_id).is_some() {
            debug!(ticket_id, "Destroyed ticket-granting ticket");
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use mfa_trigger_sdk::{Authentication, Principal};

    use super::*;

    fn result_for(principal: &str) -> AuthenticationResult {
        AuthenticationResult {
            authentication: Authentication::builder(Principal::new(principal)).build(),
            service: None,
        }
    }

    #[tokio::test]
    async fn create_get_update_destroy() {
        let store = InMemoryTicketStore::new(Duration::from_secs(60));
        let mut ticket = store.create(&result_for("casuser")).await.unwrap();
        assert!(ticket.id().starts_with("TGT-"));

        let fetched = store.get(ticket.id()).await.unwrap().unwrap();
        assert_eq!(fetched.authentication().principal().id, "casuser");

        ticket.merge_authentication(&result_for("casuser").authentication);
        store.update(&ticket).await.unwrap();
        assert_eq!(store.get(ticket.id()).await.unwrap().unwrap().usage_count(), 1);

        store.destroy(ticket.id()).await.unwrap();
        assert!(store.get(ticket.id()).await.unwrap().is_none());
        assert!(store.destroy(ticket.id()).await.is_ok());
    }

    #[tokio::test]
    async fn update_of_unknown_ticket_fails() {
        let store = InMemoryTicketStore::new(Duration::from_secs(60));
        let ticket = TicketGrantingTicket::new("TGT-missing", result_for("casuser").authentication);
        assert!(matches!(
            store.update(&ticket).await,
            Err(MfaTriggerError::TicketNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn expired_tickets_are_evicted() {
        let store = InMemoryTicketStore::new(Duration::ZERO);
        let ticket = store.create(&result_for("casuser")).await.unwrap();
        assert!(store.get(ticket.id()).await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
