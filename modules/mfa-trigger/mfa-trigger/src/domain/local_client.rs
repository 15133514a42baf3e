//! Local (in-process) client for the MFA trigger engine.

use std::sync::Arc;

use async_trait::async_trait;
use mfa_trigger_sdk::{Event, MfaTriggerClient, MfaTriggerError, ResolutionContext};

use super::{DomainError, MfaTriggerService};

/// Local client wrapping the service.
///
/// Every failure becomes a terminal event here; callers never see an error.
pub struct MfaTriggerLocalClient {
    svc: Arc<MfaTriggerService>,
}

impl MfaTriggerLocalClient {
    #[must_use]
    pub fn new(svc: Arc<MfaTriggerService>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> MfaTriggerError {
    tracing::error!(operation = op, error = ?e, "mfa_trigger call failed");
    e.into()
}

#[async_trait]
impl MfaTriggerClient for MfaTriggerLocalClient {
    async fn resolve(&self, ctx: &ResolutionContext) -> Event {
        self.svc
            .resolve(ctx)
            .await
            .unwrap_or_else(|e| Event::from_failure(log_and_convert("resolve", e)))
    }

    async fn resolve_existing_session(&self, ctx: &ResolutionContext) -> Event {
        self.svc
            .resolve_existing_session(ctx)
            .await
            .unwrap_or_else(|e| Event::from_failure(log_and_convert("resolve_existing_session", e)))
    }
}
