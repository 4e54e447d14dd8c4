/// Connectivity failures worth retrying inside one `FetchClient::do` call,
/// as opposed to timeouts and non-2xx statuses (which the dispatcher's
/// outer retry loop handles instead).
pub fn is_retryable(message: &str) -> bool {
    const MARKERS: &[&str] = &[
        "eof",
        "broken pipe",
        "connection reset",
        "use of closed network connection",
        "frame_size_error",
    ];
    let lower = message.to_lowercase();
    MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_connectivity_errors() {
        assert!(is_retryable("unexpected EOF"));
        assert!(is_retryable("Broken pipe (os error 32)"));
        assert!(is_retryable("connection reset by peer"));
        assert!(is_retryable("use of closed network connection"));
        assert!(is_retryable("http2 error: FRAME_SIZE_ERROR"));
    }

    #[test]
    fn does_not_retry_unrelated_errors() {
        assert!(!is_retryable("timed out"));
        assert!(!is_retryable("404 not found"));
    }
}
