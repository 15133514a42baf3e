//! Static service registry.

use async_trait::async_trait;
use mfa_trigger_sdk::{MfaTriggerError, RegisteredService, Service, ServiceRegistry};
use regex::Regex;

/// Registered services matched by full-match regex on the service URL.
pub struct StaticServiceRegistry {
    services: Vec<(Regex, RegisteredService)>,
}

impl StaticServiceRegistry {
    /// Compile every service pattern; services are evaluated in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns an error if a `service_id` pattern is not a valid regex.
    pub fn new(services: &[RegisteredService]) -> anyhow::Result<Self> {
        let mut compiled = services
            .iter()
            .map(|service| {
                let pattern = Regex::new(&format!("^(?:{})$", service.service_id)).map_err(|e| {
                    anyhow::anyhow!("invalid service_id pattern for service {}: {e}", service.id)
                })?;
                Ok((pattern, service.clone()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        compiled.sort_by_key(|(_, service)| service.id);
        Ok(Self { services: compiled })
    }
}

#[async_trait]
impl ServiceRegistry for StaticServiceRegistry {
    async fn find_service_by(
        &self,
        service: &Service,
    ) -> Result<Option<RegisteredService>, MfaTriggerError> {
        Ok(self
            .services
            .iter()
            .find(|(pattern, _)| pattern.is_match(&service.id))
            .map(|(_, registered)| registered.clone()))
    }
}
