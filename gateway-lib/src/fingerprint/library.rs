use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand::Rng;

use super::catalog::catalog;
use super::profile::{Browser, FingerprintProfile, Platform};

/// Process-wide, effectively-immutable view over the fingerprint catalog.
/// The only mutable state is the PRNG backing `random_profile`.
pub struct FingerprintLibrary {
    rng: Mutex<StdRng>,
}

impl Default for FingerprintLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintLibrary {
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_os_rng()) }
    }

    /// Uniform pick among profiles tagged as real browsers (excludes
    /// synthetic/test entries).
    pub fn random_profile(&self) -> &'static FingerprintProfile {
        let real: Vec<&'static FingerprintProfile> =
            catalog().iter().filter(|p| !p.synthetic).collect();
        let mut rng = self.rng.lock().expect("fingerprint rng poisoned");
        let idx = rng.random_range(0..real.len());
        real[idx]
    }

    pub fn by_name(&self, name: &str) -> Option<&'static FingerprintProfile> {
        catalog().iter().find(|p| p.name == name)
    }

    pub fn by_browser(&self, browser: Browser) -> Vec<&'static FingerprintProfile> {
        catalog().iter().filter(|p| p.browser == browser).collect()
    }

    pub fn by_platform(&self, platform: Platform) -> Vec<&'static FingerprintProfile> {
        catalog().iter().filter(|p| p.platform == platform).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_profile_never_returns_synthetic() {
        let library = FingerprintLibrary::new();
        for _ in 0..200 {
            assert!(!library.random_profile().synthetic);
        }
    }

    #[test]
    fn by_name_finds_known_profile() {
        let library = FingerprintLibrary::new();
        assert!(library.by_name("chrome-124-windows").is_some());
        assert!(library.by_name("nonexistent").is_none());
    }

    #[test]
    fn by_browser_filters_correctly() {
        let library = FingerprintLibrary::new();
        let firefox = library.by_browser(Browser::Firefox);
        assert!(!firefox.is_empty());
        assert!(firefox.iter().all(|p| p.browser == Browser::Firefox));
    }
}
