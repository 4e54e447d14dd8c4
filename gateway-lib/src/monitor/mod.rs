mod geo;
mod monitor;
mod persistence;
mod resolver;
mod types;

pub use geo::{GeoEnricher, NullGeoEnricher};
pub use monitor::DomainIpMonitor;
pub use types::{DomainPool, GeoInfo, TargetIpRecord};
