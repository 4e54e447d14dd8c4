use super::profile::{Browser, FingerprintProfile, Platform};

// Cipher suite and curve names are rustls's own naming (see
// `tls_client::cipher_suite_by_name` / `kx_group_by_name`), ordered to match
// each browser's real-world ClientHello preference.

const CHROME_CIPHERS: &[&str] = &[
    "TLS13_AES_128_GCM_SHA256",
    "TLS13_AES_256_GCM_SHA384",
    "TLS13_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
];

const CHROME_CURVES: &[&str] = &["X25519", "secp256r1", "secp384r1"];

const FIREFOX_CIPHERS: &[&str] = &[
    "TLS13_AES_128_GCM_SHA256",
    "TLS13_CHACHA20_POLY1305_SHA256",
    "TLS13_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
];

const FIREFOX_CURVES: &[&str] = &["X25519", "secp256r1", "secp384r1", "secp521r1"];

const SAFARI_CIPHERS: &[&str] = &[
    "TLS13_AES_256_GCM_SHA384",
    "TLS13_AES_128_GCM_SHA256",
    "TLS13_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
    "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256",
    "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256",
];

const SAFARI_CURVES: &[&str] = &["X25519", "secp256r1", "secp384r1", "secp521r1"];

const EDGE_CIPHERS: &[&str] = CHROME_CIPHERS;
const EDGE_CURVES: &[&str] = CHROME_CURVES;

/// Static catalog of impersonable browser profiles, known at build time.
pub fn catalog() -> &'static [FingerprintProfile] {
    &[
        FingerprintProfile {
            name: "chrome-124-windows",
            browser: Browser::Chrome,
            major_version: 124,
            platform: Platform::Windows,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
            cipher_suites: CHROME_CIPHERS,
            curve_preferences: CHROME_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "chrome-124-macos",
            browser: Browser::Chrome,
            major_version: 124,
            platform: Platform::MacOs,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
            cipher_suites: CHROME_CIPHERS,
            curve_preferences: CHROME_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "chrome-124-linux",
            browser: Browser::Chrome,
            major_version: 124,
            platform: Platform::Linux,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
            cipher_suites: CHROME_CIPHERS,
            curve_preferences: CHROME_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "chrome-124-android",
            browser: Browser::Chrome,
            major_version: 124,
            platform: Platform::Android,
            user_agent: "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
            cipher_suites: CHROME_CIPHERS,
            curve_preferences: CHROME_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "firefox-125-windows",
            browser: Browser::Firefox,
            major_version: 125,
            platform: Platform::Windows,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
            cipher_suites: FIREFOX_CIPHERS,
            curve_preferences: FIREFOX_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "firefox-125-linux",
            browser: Browser::Firefox,
            major_version: 125,
            platform: Platform::Linux,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
            cipher_suites: FIREFOX_CIPHERS,
            curve_preferences: FIREFOX_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "firefox-125-macos",
            browser: Browser::Firefox,
            major_version: 125,
            platform: Platform::MacOs,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:125.0) Gecko/20100101 Firefox/125.0",
            cipher_suites: FIREFOX_CIPHERS,
            curve_preferences: FIREFOX_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "safari-17-macos",
            browser: Browser::Safari,
            major_version: 17,
            platform: Platform::MacOs,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
            cipher_suites: SAFARI_CIPHERS,
            curve_preferences: SAFARI_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "safari-17-ios",
            browser: Browser::Safari,
            major_version: 17,
            platform: Platform::Ios,
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
            cipher_suites: SAFARI_CIPHERS,
            curve_preferences: SAFARI_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "edge-124-windows",
            browser: Browser::Edge,
            major_version: 124,
            platform: Platform::Windows,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
            cipher_suites: EDGE_CIPHERS,
            curve_preferences: EDGE_CURVES,
            synthetic: false,
        },
        FingerprintProfile {
            name: "synthetic-minimal-tls12",
            browser: Browser::Chrome,
            major_version: 124,
            platform: Platform::Linux,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
            cipher_suites: &["TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"],
            curve_preferences: &["secp256r1"],
            synthetic: true,
        },
    ]
}
