use std::sync::Arc;

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;

use crate::error::Result;

/// Counters and histograms for the admission gate, dispatch loop, hot pool,
/// warmup sweeps, blacklist transitions, and the domain monitor.
#[derive(Clone)]
pub struct Metrics {
    pub admission_wait_seconds: Histogram<f64>,
    pub admission_busy_total: Counter<u64>,

    pub dispatch_attempts_total: Counter<u64>,
    pub dispatch_duration_seconds: Histogram<f64>,
    pub dispatch_errors_total: Counter<u64>,

    pub pool_hits_total: Counter<u64>,
    pub pool_misses_total: Counter<u64>,

    pub warmup_success_total: Counter<u64>,
    pub warmup_failure_total: Counter<u64>,

    pub blacklist_transitions_total: Counter<u64>,
    pub rehabilitation_transitions_total: Counter<u64>,

    pub monitor_refresh_duration_seconds: Histogram<f64>,
    pub monitor_new_ips_total: Counter<u64>,

    pub response_body_bytes: Histogram<f64>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            admission_wait_seconds: meter
                .f64_histogram("gateway_admission_wait_seconds")
                .with_description("Time spent waiting for an admission permit")
                .build(),
            admission_busy_total: meter
                .u64_counter("gateway_admission_busy_total")
                .with_description("Requests rejected because the admission gate stayed full")
                .build(),

            dispatch_attempts_total: meter
                .u64_counter("gateway_dispatch_attempts_total")
                .with_description("Total number of dispatch attempts across all target IPs")
                .build(),
            dispatch_duration_seconds: meter
                .f64_histogram("gateway_dispatch_duration_seconds")
                .with_description("Duration of a full Execute call, including retries")
                .build(),
            dispatch_errors_total: meter
                .u64_counter("gateway_dispatch_errors_total")
                .with_description("Execute calls that returned a non-success error_message")
                .build(),

            pool_hits_total: meter
                .u64_counter("gateway_pool_hits_total")
                .with_description("Acquires satisfied from a parked connection")
                .build(),
            pool_misses_total: meter
                .u64_counter("gateway_pool_misses_total")
                .with_description("Acquires that required dialing a fresh connection")
                .build(),

            warmup_success_total: meter
                .u64_counter("gateway_warmup_success_total")
                .with_description("Warmup probes that whitelisted their target IP")
                .build(),
            warmup_failure_total: meter
                .u64_counter("gateway_warmup_failure_total")
                .with_description("Warmup probes that did not whitelist their target IP")
                .build(),

            blacklist_transitions_total: meter
                .u64_counter("gateway_blacklist_transitions_total")
                .with_description("whitelist -> blacklist transitions (403 responses)")
                .build(),
            rehabilitation_transitions_total: meter
                .u64_counter("gateway_rehabilitation_transitions_total")
                .with_description("blacklist -> whitelist transitions from retesting")
                .build(),

            monitor_refresh_duration_seconds: meter
                .f64_histogram("gateway_monitor_refresh_duration_seconds")
                .with_description("Duration of one domain IP monitor refresh cycle")
                .build(),
            monitor_new_ips_total: meter
                .u64_counter("gateway_monitor_new_ips_total")
                .with_description("Previously unseen IPs discovered by the monitor")
                .build(),

            response_body_bytes: meter
                .f64_histogram("gateway_response_body_bytes")
                .with_description("Size of response bodies returned to RPC callers")
                .build(),
        }
    }
}

/// Builds the process-wide `Metrics` handle plus the Prometheus registry
/// backing it. Call once at startup.
pub fn init_metrics() -> Result<(Arc<Metrics>, Registry)> {
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()
        .map_err(|e| crate::error::GatewayError::Config(format!("failed to build prometheus exporter: {e}")))?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();
    global::set_meter_provider(meter_provider);

    let meter = global::meter("gateway");
    Ok((Arc::new(Metrics::new(meter)), registry))
}
