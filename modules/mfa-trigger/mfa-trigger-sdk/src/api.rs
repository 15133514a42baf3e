//! Public API trait for the MFA trigger engine.
//!
//! The hosting login workflow calls this trait and maps the returned event id
//! to a UI transition. Both operations always produce an event: failures come
//! back as `authentication-failure` or `error` carrying the cause.

use async_trait::async_trait;

use crate::models::{Event, ResolutionContext};

/// Public API trait for the MFA trigger engine.
///
/// ```ignore
/// let event = mfa.resolve(&ctx).await;
/// response.set_status(event.id().response_status());
/// ```
#[async_trait]
pub trait MfaTriggerClient: Send + Sync {
    /// Resolve an initial authentication attempt.
    ///
    /// Verifies the presented credential, runs every configured trigger and
    /// either names the provider that must be satisfied or grants the session.
    async fn resolve(&self, ctx: &ResolutionContext) -> Event;

    /// Resolve a request that carries an existing session.
    ///
    /// Returns `success` when the session already satisfies whatever the
    /// target service requires.
    async fn resolve_existing_session(&self, ctx: &ResolutionContext) -> Event;
}
