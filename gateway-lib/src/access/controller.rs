use std::collections::HashSet;

use tokio::sync::RwLock;

/// Thread-safe whitelist/blacklist over target IPs: "deny by default,
/// blacklist wins". An IP never occupies both sets simultaneously; flips
/// between them happen inside a single exclusive section so no reader ever
/// observes it in both.
#[derive(Debug, Default)]
pub struct IpAccessController {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    whitelist: HashSet<String>,
    blacklist: HashSet<String>,
}

impl IpAccessController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `ip` to the whitelist or blacklist, removing it from the other
    /// set first so it never occupies both.
    pub async fn add(&self, ip: &str, is_white: bool) {
        let mut state = self.state.write().await;
        if is_white {
            state.blacklist.remove(ip);
            state.whitelist.insert(ip.to_string());
        } else {
            state.whitelist.remove(ip);
            state.blacklist.insert(ip.to_string());
        }
    }

    pub async fn remove(&self, ip: &str, is_white: bool) {
        let mut state = self.state.write().await;
        if is_white {
            state.whitelist.remove(ip);
        } else {
            state.blacklist.remove(ip);
        }
    }

    /// `ip ∈ blacklist ⇒ false; else ip ∈ whitelist ⇒ true; else false`.
    pub async fn is_allowed(&self, ip: &str) -> bool {
        let state = self.state.read().await;
        if state.blacklist.contains(ip) {
            return false;
        }
        state.whitelist.contains(ip)
    }

    pub async fn allowed_snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.whitelist.iter().cloned().collect()
    }

    pub async fn blocked_snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.blacklist.iter().cloned().collect()
    }

    /// 200 ⇒ whitelist. Single call replacing the remove-then-add sequence
    /// at every pool call site.
    pub async fn mark_success(&self, ip: &str) {
        self.add(ip, true).await;
    }

    /// 403 ⇒ blacklist.
    pub async fn mark_failure(&self, ip: &str) {
        self.add(ip, false).await;
    }

    pub async fn whitelist_is_empty(&self) -> bool {
        self.state.read().await.whitelist.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deny_by_default() {
        let controller = IpAccessController::new();
        assert!(!controller.is_allowed("1.2.3.4").await);
    }

    #[tokio::test]
    async fn whitelisted_ip_is_allowed() {
        let controller = IpAccessController::new();
        controller.add("1.2.3.4", true).await;
        assert!(controller.is_allowed("1.2.3.4").await);
    }

    #[tokio::test]
    async fn blacklist_wins_over_whitelist() {
        let controller = IpAccessController::new();
        controller.add("1.2.3.4", true).await;
        controller.add("1.2.3.4", false).await;
        assert!(!controller.is_allowed("1.2.3.4").await);
        assert!(controller.blocked_snapshot().await.contains(&"1.2.3.4".to_string()));
        assert!(!controller.allowed_snapshot().await.contains(&"1.2.3.4".to_string()));
    }

    #[tokio::test]
    async fn rehabilitation_moves_blacklist_back_to_whitelist() {
        let controller = IpAccessController::new();
        controller.mark_failure("1.2.3.4").await;
        assert!(!controller.is_allowed("1.2.3.4").await);
        controller.mark_success("1.2.3.4").await;
        assert!(controller.is_allowed("1.2.3.4").await);
        assert!(!controller.blocked_snapshot().await.contains(&"1.2.3.4".to_string()));
    }

    #[tokio::test]
    async fn snapshots_are_defensive_copies() {
        let controller = IpAccessController::new();
        controller.add("1.2.3.4", true).await;
        let mut snapshot = controller.allowed_snapshot().await;
        snapshot.push("5.6.7.8".to_string());
        assert_eq!(controller.allowed_snapshot().await.len(), 1);
    }
}
