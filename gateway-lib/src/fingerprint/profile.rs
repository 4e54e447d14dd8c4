/// A browser family a [`FingerprintProfile`] impersonates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

impl Browser {
    pub fn as_str(self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Safari => "safari",
            Browser::Edge => "edge",
        }
    }
}

/// Client platform a [`FingerprintProfile`] claims to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

/// Immutable descriptor of one browser TLS client-hello profile: identity,
/// the cipher-suite/curve ordering that produces its fingerprint, and the
/// User-Agent string it presents.
///
/// Not tagged `real` are excluded from [`crate::fingerprint::FingerprintLibrary::random_profile`]
/// (see the `synthetic` flag) — reserved for profiles added for testing or
/// deliberately unusual fingerprints.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintProfile {
    pub name: &'static str,
    pub browser: Browser,
    pub major_version: u32,
    pub platform: Platform,
    pub user_agent: &'static str,
    /// Cipher suite names, most preferred first. See `tls_client::cipher_suite_by_name`.
    pub cipher_suites: &'static [&'static str],
    /// Key-exchange group names, most preferred first. See `tls_client::kx_group_by_name`.
    pub curve_preferences: &'static [&'static str],
    /// Excluded from `random_profile` when true.
    pub synthetic: bool,
}
