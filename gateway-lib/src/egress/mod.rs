pub mod iface;
mod ipv6_gen;
mod pool;

pub use pool::{EgressAddr, LocalEgressPool};
