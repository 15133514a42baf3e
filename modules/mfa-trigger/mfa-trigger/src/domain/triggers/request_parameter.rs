use async_trait::async_trait;
use mfa_trigger_sdk::Event;

use super::{TriggerInput, TriggerResolver, TriggerSupport};
use crate::config::TriggerKind;
use crate::domain::DomainError;

/// Honours an explicit provider request carried by a request parameter, or a
/// header of the same name when the parameter is absent.
pub struct RequestParameterTrigger {
    parameter: String,
    support: TriggerSupport,
}

impl RequestParameterTrigger {
    #[must_use]
    pub fn new(parameter: impl Into<String>, support: TriggerSupport) -> Self {
        Self {
            parameter: parameter.into(),
            support,
        }
    }
}

#[async_trait]
impl TriggerResolver for RequestParameterTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::RequestParameter
    }

    async fn resolve(&self, input: &TriggerInput<'_>) -> Result<Option<Event>, DomainError> {
        let request = input.ctx.request();
        let Some(value) = request
            .parameter(&self.parameter)
            .or_else(|| request.header(&self.parameter))
            .map(str::trim)
            .filter(|v| !v.is_empty())
        else {
            return Ok(None);
        };

        if self.support.registry.all_providers().is_empty() {
            return Err(DomainError::NoProvidersRegistered);
        }
        let provider = self.support.lookup_provider(value)?;
        self.support.verify_and_build(&provider, input).await
    }
}
