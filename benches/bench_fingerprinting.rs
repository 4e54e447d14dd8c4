//! Micro benchmarks for the fingerprint catalog and TLS client-config
//! construction. Pure CPU - no network, no IO.
//!
//! ```bash
//! cargo bench --bench bench_fingerprinting
//! ```

use criterion::{criterion_group, criterion_main, Criterion};
use gateway_lib::fingerprint::{random_accept_language, Browser, FingerprintLibrary, TlsClientFactory};

fn bench_random_profile(c: &mut Criterion) {
    let library = FingerprintLibrary::new();
    assert!(!library.random_profile().synthetic);

    c.bench_function("fingerprint_library_random_profile", |b| {
        b.iter(|| std::hint::black_box(&library).random_profile());
    });
}

fn bench_by_name(c: &mut Criterion) {
    let library = FingerprintLibrary::new();
    assert!(library.by_name("chrome-124-windows").is_some());

    c.bench_function("fingerprint_library_by_name", |b| {
        b.iter(|| std::hint::black_box(&library).by_name(std::hint::black_box("chrome-124-windows")));
    });
}

fn bench_by_browser(c: &mut Criterion) {
    let library = FingerprintLibrary::new();
    assert!(!library.by_browser(Browser::Chrome).is_empty());

    c.bench_function("fingerprint_library_by_browser", |b| {
        b.iter(|| std::hint::black_box(&library).by_browser(std::hint::black_box(Browser::Chrome)));
    });
}

fn bench_random_accept_language(c: &mut Criterion) {
    let header = random_accept_language();
    assert!(header.split(", ").count() >= 2);

    c.bench_function("random_accept_language", |b| {
        b.iter(random_accept_language);
    });
}

/// Builds a `rustls::ClientConfig` from a profile's cipher-suite and
/// curve-preference names. First call per profile pays the build cost;
/// this benchmark measures the cache-miss path directly, bypassing
/// `TlsClientFactory`'s cache so every iteration rebuilds from scratch.
fn bench_build_client_config(c: &mut Criterion) {
    let library = FingerprintLibrary::new();
    let profile = library.by_name("chrome-124-windows").expect("known profile missing from catalog");

    c.bench_function("tls_client_factory_config_for_cold", |b| {
        b.iter(|| {
            let factory = TlsClientFactory::new();
            factory.config_for(std::hint::black_box(profile)).expect("config build failed")
        });
    });
}

fn bench_config_for_cached(c: &mut Criterion) {
    let library = FingerprintLibrary::new();
    let profile = library.by_name("chrome-124-windows").expect("known profile missing from catalog");
    let factory = TlsClientFactory::new();
    factory.config_for(profile).expect("config build failed");

    c.bench_function("tls_client_factory_config_for_warm", |b| {
        b.iter(|| factory.config_for(std::hint::black_box(profile)).expect("config build failed"));
    });
}

criterion_group!(
    fingerprinting_benches,
    bench_random_profile,
    bench_by_name,
    bench_by_browser,
    bench_random_accept_language,
    bench_build_client_config,
    bench_config_for_cached,
);
criterion_main!(fingerprinting_benches);
