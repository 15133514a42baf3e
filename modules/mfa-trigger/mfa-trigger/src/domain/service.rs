//! Composite resolver and rank validator.

use std::sync::Arc;

use mfa_trigger_sdk::{
    Authentication, AuthenticationExecutor, AuthenticationResultBuilder, Event, ProviderRegistry,
    RegisteredService, ResolutionContext, ServiceRegistry, TicketStore,
};
use tracing::{debug, error, warn};

use super::context_validator::{ContextValidation, ContextValidator};
use super::selection::SelectionFilter;
use super::selector::ProviderSelector;
use super::ticket_grant::TicketGrantCoordinator;
use super::triggers::{TriggerInput, TriggerResolver, TriggerSupport};
use super::{DomainError, TriggerOutcome};

/// Step-up policy engine.
pub struct MfaTriggerService {
    triggers: Vec<Box<dyn TriggerResolver>>,
    support: TriggerSupport,
    registry: Arc<dyn ProviderRegistry>,
    selector: Arc<dyn ProviderSelector>,
    filter: Arc<dyn SelectionFilter>,
    context_validator: ContextValidator,
    ticket_grant: TicketGrantCoordinator,
    authentication_executor: Arc<dyn AuthenticationExecutor>,
    service_registry: Arc<dyn ServiceRegistry>,
    ticket_store: Arc<dyn TicketStore>,
}

/// Collaborators of [`MfaTriggerService`].
pub struct ServiceDeps {
    /// Registry, selector and failure mode shared with the triggers.
    pub support: TriggerSupport,
    pub filter: Arc<dyn SelectionFilter>,
    pub authentication_executor: Arc<dyn AuthenticationExecutor>,
    pub service_registry: Arc<dyn ServiceRegistry>,
    pub ticket_store: Arc<dyn TicketStore>,
    pub authentication_context_attribute: String,
}

impl MfaTriggerService {
    #[must_use]
    pub fn new(triggers: Vec<Box<dyn TriggerResolver>>, deps: ServiceDeps) -> Self {
        Self {
            triggers,
            context_validator: ContextValidator::new(
                Arc::clone(&deps.support.registry),
                deps.authentication_context_attribute,
            ),
            ticket_grant: TicketGrantCoordinator::new(
                Arc::clone(&deps.authentication_executor),
                Arc::clone(&deps.ticket_store),
            ),
            registry: Arc::clone(&deps.support.registry),
            selector: Arc::clone(&deps.support.selector),
            support: deps.support,
            filter: deps.filter,
            authentication_executor: deps.authentication_executor,
            service_registry: deps.service_registry,
            ticket_store: deps.ticket_store,
        }
    }

    /// Decide whether the attempt needs a provider, otherwise grant the ticket.
    ///
    /// # Errors
    ///
    /// Rejected credentials, unauthorized services, misconfigured triggers,
    /// closed-mode unavailable providers and collaborator failures.
    #[tracing::instrument(skip_all, fields(service = ctx.service().map(|s| s.id.as_str())))]
    pub async fn resolve(&self, ctx: &ResolutionContext) -> Result<Event, DomainError> {
        let builder = self.establish(ctx).await?;
        let authentication = self
            .authentication_executor
            .finalize_all(&builder, ctx.service())
            .await?
            .authentication;

        let registered_service = match ctx.service() {
            Some(service) => {
                let registered = self.service_registry.find_service_by(service).await?;
                self.service_registry
                    .ensure_access(service, registered.as_ref(), Some(&authentication))?;
                registered
            }
            None => None,
        };

        let input = TriggerInput {
            ctx,
            authentication: &authentication,
            service: registered_service.as_ref(),
        };
        let candidates = self.collect_candidates(&input).await?;

        if !candidates.is_empty() {
            let survivors = self.filter.filter(
                candidates,
                &authentication,
                registered_service.as_ref(),
                self.registry.as_ref(),
            );
            if let Some(event) = self.choose(survivors, &authentication, registered_service.as_ref()) {
                debug!(event = %event.id(), "Step-up required");
                return Ok(event);
            }
        }

        self.ticket_grant
            .grant(&builder, ctx.service(), ctx.ticket_granting_ticket_id())
            .await
    }

    /// Re-evaluate policy for a request carrying an existing session.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve`], plus ticket store failures and requested
    /// providers that are no longer registered.
    #[tracing::instrument(skip_all, fields(
        service = ctx.service().map(|s| s.id.as_str()),
        ticket_granting_ticket_id = ctx.ticket_granting_ticket_id()
    ))]
    pub async fn resolve_existing_session(&self, ctx: &ResolutionContext) -> Result<Event, DomainError> {
        let (Some(_), Some(ticket_id)) = (ctx.service(), ctx.ticket_granting_ticket_id()) else {
            return Ok(Event::success());
        };
        let Some(ticket) = self.ticket_store.get(ticket_id).await? else {
            debug!("Presented ticket is unknown or expired, resuming flow");
            return Ok(Event::success());
        };

        let builder = self
            .authentication_executor
            .establish_context_from_existing(ticket.authentication(), ctx.credential())
            .await?;
        let working = ctx.with_result_builder(builder.clone());

        let event = self.resolve(&working).await?;
        let Some(requested) = event.provider_id() else {
            return Ok(event);
        };

        let authentication = self
            .authentication_executor
            .finalize_all(&builder, ctx.service())
            .await?
            .authentication;
        let registered_service = event.attributes().registered_service.as_ref();

        match self
            .context_validator
            .validate(&authentication, requested, registered_service)
        {
            ContextValidation::Satisfied => {
                debug!(provider_id = requested, "Requested provider already satisfied");
                // Record the fresh factor on the session so later requests see it.
                let granted = self
                    .ticket_grant
                    .grant(&builder, ctx.service(), Some(ticket_id))
                    .await?;
                let granted_id = granted
                    .attributes()
                    .ticket_granting_ticket_id
                    .clone()
                    .unwrap_or_else(|| ticket_id.to_owned());
                Ok(Event::success().with_ticket_granting_ticket(granted_id))
            }
            ContextValidation::Required(provider) => Ok(Event::provider_required(
                provider.id(),
                authentication.principal(),
                registered_service,
            )),
            ContextValidation::Unrecognized => Err(DomainError::ProviderNotFound {
                provider_id: requested.to_owned(),
            }),
        }
    }

    async fn establish(&self, ctx: &ResolutionContext) -> Result<AuthenticationResultBuilder, DomainError> {
        let existing = ctx.result_builder().cloned();
        let Some(credential) = ctx.credential() else {
            return existing.filter(|b| !b.is_empty()).ok_or_else(|| {
                DomainError::AuthenticationFailed(
                    "no credential presented and no authentication established".to_owned(),
                )
            });
        };

        let fresh = self
            .authentication_executor
            .handle_initial_transaction(ctx.service(), credential)
            .await?;
        let Some(existing) = existing else {
            return Ok(fresh);
        };
        let merged = fresh
            .authentications()
            .iter()
            .fold(existing, |builder, auth| builder.collect(auth.clone()));
        Ok(fresh
            .credentials()
            .iter()
            .fold(merged, |builder, c| builder.collect_credential(c.clone())))
    }

    async fn collect_candidates(&self, input: &TriggerInput<'_>) -> Result<Vec<Event>, DomainError> {
        let mut candidates: Vec<Event> = Vec::new();
        // Only provider events are carried over from earlier passes, and only
        // for providers still registered and able to serve the service.
        for provider_id in input.ctx.resolved_events().iter().filter_map(Event::provider_id) {
            let Some(provider) = self.registry.find(provider_id) else {
                warn!(provider_id, "Dropping resolved event for unregistered provider");
                continue;
            };
            if let Some(event) = self.support.verify_and_build(&provider, input).await? {
                push_unique(&mut candidates, event);
            }
        }

        for trigger in &self.triggers {
            match TriggerOutcome::from(trigger.resolve(input).await) {
                TriggerOutcome::Required(event) => {
                    debug!(trigger = %trigger.kind(), event = %event.id(), "Trigger fired");
                    push_unique(&mut candidates, event);
                }
                TriggerOutcome::Miss => {}
                TriggerOutcome::ConfigError(e) => {
                    error!(trigger = %trigger.kind(), error = %e, "Trigger is misconfigured");
                    return Err(e);
                }
                TriggerOutcome::UpstreamFailure(e) => {
                    warn!(trigger = %trigger.kind(), error = %e, "Trigger failed");
                    return Err(e);
                }
            }
        }
        Ok(candidates)
    }

    /// Exactly one survivor wins outright; several are tie-broken by the selector.
    fn choose(
        &self,
        mut survivors: Vec<Event>,
        authentication: &Authentication,
        service: Option<&RegisteredService>,
    ) -> Option<Event> {
        if survivors.len() <= 1 {
            return survivors.pop();
        }

        let providers: Vec<_> = survivors
            .iter()
            .filter_map(|e| e.provider_id().and_then(|id| self.registry.find(id)))
            .collect();
        let chosen = self
            .selector
            .select(&providers, service, authentication.principal());
        let index = chosen
            .and_then(|p| {
                survivors
                    .iter()
                    .position(|e| e.provider_id().is_some_and(|id| p.matches(id)))
            })
            .unwrap_or(0);
        Some(survivors.swap_remove(index))
    }
}

fn push_unique(candidates: &mut Vec<Event>, event: Event) {
    if !candidates.iter().any(|c| c.id() == event.id()) {
        candidates.push(event);
    }
}
