use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

/// One outbound fetch, addressed directly at a target IP (not a domain —
/// the caller has already picked which IP to hit).
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub work_id: String,
    pub domain: String,
    pub method: String,
    /// Full URL, e.g. `https://93.184.216.34/path`.
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub target_ip: IpAddr,
    pub local_ip: Option<IpAddr>,
    pub fingerprint: Option<&'static crate::fingerprint::FingerprintProfile>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub duration: Duration,
    pub local_ip: Option<IpAddr>,
}
