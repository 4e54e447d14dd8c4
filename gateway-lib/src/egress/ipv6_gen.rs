use std::net::Ipv6Addr;

use ipnet::Ipv6Net;
use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Suffixes in this range are treated as likely provider-assigned and are
/// never generated, to avoid colliding with addresses already in active use
/// on the prefix.
const RESERVED_SUFFIX_RANGE: std::ops::RangeInclusive<u16> = 0x1001..=0x1100;

/// Produces a random host address within `prefix`. For a `/64` prefix only
/// the low 16 bits vary (bytes 8..13 stay zero, matching real assignment
/// conventions); other mask lengths fill every host bit.
fn random_host_in(prefix: &Ipv6Net, rng: &mut impl Rng) -> Ipv6Addr {
    let base = u128::from(prefix.network());

    if prefix.prefix_len() == 64 {
        let suffix = loop {
            let candidate: u16 = rng.random_range(1..=0xFFFF);
            if !RESERVED_SUFFIX_RANGE.contains(&candidate) {
                break candidate;
            }
        };
        return Ipv6Addr::from(base | u128::from(suffix));
    }

    let host_bits = 128 - prefix.prefix_len() as u32;
    let mask: u128 = if host_bits >= 128 { u128::MAX } else { (1u128 << host_bits) - 1 };
    let host: u128 = rng.random::<u128>() & mask;
    Ipv6Addr::from(base | host)
}

/// Background task that keeps a bounded channel of random `prefix`-scoped
/// addresses topped up, so `LocalEgressPool::get_ip` never blocks on
/// randomness generation under steady state.
pub async fn run_generator(
    prefix: Ipv6Net,
    tx: mpsc::Sender<Ipv6Addr>,
    cancel: CancellationToken,
) {
    let mut rng = rand::rng();
    loop {
        let addr = random_host_in(&prefix, &mut rng);
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(prefix = %prefix, "ipv6 generator shutting down");
                return;
            }
            send_result = tx.send(addr) => {
                if send_result.is_err() {
                    debug!(prefix = %prefix, "ipv6 generator channel closed");
                    return;
                }
            }
        }
    }
}
