use std::net::IpAddr;

use async_trait::async_trait;

use super::types::GeoInfo;

/// External geolocation collaborator. The gateway never requires a real
/// implementation to function correctly.
#[async_trait]
pub trait GeoEnricher: Send + Sync {
    async fn lookup(&self, ip: IpAddr) -> Option<GeoInfo>;
}

/// Enrichment disabled: every lookup reports unknown.
#[derive(Debug, Default)]
pub struct NullGeoEnricher;

#[async_trait]
impl GeoEnricher for NullGeoEnricher {
    async fn lookup(&self, _ip: IpAddr) -> Option<GeoInfo> {
        None
    }
}
