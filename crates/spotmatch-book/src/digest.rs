//! Snapshot digests for observers that rebuild books from notifications.
//!
//! An observer replaying orderbook-change messages can hash its own
//! reconstruction and compare it with the digest of a published snapshot
//! at the same sequence.

use sha2::{Digest, Sha256};
use spotmatch_types::{LevelAmount, MarketId, Snapshot};

/// Hash a snapshot deterministically.
///
/// Depends on the market, the sequence, and every level in best-first
/// order. Amounts are normalized so `5` and `5.00` hash alike.
#[must_use]
pub fn compute_snapshot_digest(market: &MarketId, snapshot: &Snapshot) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"spotmatch:snapshot:v1:");
    hasher.update(market.as_str().as_bytes());
    hasher.update(snapshot.sequence.to_le_bytes());

    for (tag, levels) in [(b'B', &snapshot.bids), (b'A', &snapshot.asks)] {
        hasher.update([tag]);
        hasher.update((levels.len() as u64).to_le_bytes());
        for LevelAmount { price, amount } in levels {
            hasher.update(price.normalize().to_string().as_bytes());
            hasher.update(b"@");
            hasher.update(amount.normalize().to_string().as_bytes());
            hasher.update(b";");
        }
    }

    let result = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    digest
}

/// Hex form of [`compute_snapshot_digest`], convenient for logs and caches.
#[must_use]
pub fn snapshot_digest_hex(market: &MarketId, snapshot: &Snapshot) -> String {
    hex::encode(compute_snapshot_digest(market, snapshot))
}

/// Check a snapshot against an expected digest.
#[must_use]
pub fn verify_snapshot_digest(market: &MarketId, snapshot: &Snapshot, expected: &[u8; 32]) -> bool {
    compute_snapshot_digest(market, snapshot) == *expected
}
