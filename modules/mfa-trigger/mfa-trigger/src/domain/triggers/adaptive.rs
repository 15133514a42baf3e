//! Adaptive (client address, user agent and geo-location) trigger.

use std::sync::Arc;

use async_trait::async_trait;
use mfa_trigger_sdk::{Event, GeoLocationService};
use regex::Regex;
use tracing::{debug, warn};

use super::{TriggerInput, TriggerResolver, TriggerSupport};
use crate::config::TriggerKind;
use crate::domain::DomainError;

/// Requires a provider when the request looks like a configured risk pattern.
///
/// Rules are evaluated in provider-id order. A rule matches when its pattern
/// is found in the client address, the user agent, or the geo-located address.
pub struct AdaptiveTrigger {
    rules: Vec<(String, Regex)>,
    geo_location: Option<Arc<dyn GeoLocationService>>,
    support: TriggerSupport,
}

impl AdaptiveTrigger {
    #[must_use]
    pub fn new(
        rules: Vec<(String, Regex)>,
        geo_location: Option<Arc<dyn GeoLocationService>>,
        support: TriggerSupport,
    ) -> Self {
        Self {
            rules,
            geo_location,
            support,
        }
    }

    async fn geo_address(&self, client_ip: Option<&str>) -> Option<String> {
        let (service, ip) = (self.geo_location.as_ref()?, client_ip?);
        match service.locate(ip, None).await {
            Ok(location) => location.map(|l| l.build_address()).filter(|a| !a.is_empty()),
            Err(e) => {
                warn!(client_ip = ip, error = %e, "Geo-location lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl TriggerResolver for AdaptiveTrigger {
    fn kind(&self) -> TriggerKind {
        TriggerKind::Adaptive
    }

    async fn resolve(&self, input: &TriggerInput<'_>) -> Result<Option<Event>, DomainError> {
        if self.rules.is_empty() {
            return Ok(None);
        }

        let request = input.ctx.request();
        let client_ip = request.client_ip.as_deref();
        let user_agent = request.user_agent.as_deref();
        let address = self.geo_address(client_ip).await;

        for (provider_id, pattern) in &self.rules {
            let matched = [client_ip, user_agent, address.as_deref()]
                .into_iter()
                .flatten()
                .any(|value| pattern.is_match(value));
            if !matched {
                continue;
            }

            debug!(provider_id, pattern = pattern.as_str(), "Adaptive rule matched");
            let provider = self.support.lookup_provider(provider_id)?;
            if let Some(event) = self.support.verify_and_build(&provider, input).await? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}
