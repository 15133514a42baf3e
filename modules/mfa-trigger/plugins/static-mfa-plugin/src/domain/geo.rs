//! Static geo-location table.

use std::collections::HashMap;

use async_trait::async_trait;
use mfa_trigger_sdk::{GeoLocation, GeoLocationService, MfaTriggerError};

use crate::config::GeoLocationConfig;

pub struct StaticGeoLocationService {
    locations: HashMap<String, GeoLocation>,
}

impl StaticGeoLocationService {
    #[must_use]
    pub fn new(entries: &[GeoLocationConfig]) -> Self {
        Self {
            locations: entries
                .iter()
                .map(|e| {
                    (
                        e.client_ip.clone(),
                        GeoLocation {
                            latitude: e.latitude,
                            longitude: e.longitude,
                            addresses: e.addresses.clone(),
                        },
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl GeoLocationService for StaticGeoLocationService {
    async fn locate(
        &self,
        client_ip: &str,
        _hint: Option<&str>,
    ) -> Result<Option<GeoLocation>, MfaTriggerError> {
        Ok(self.locations.get(client_ip).cloned())
    }
}
