//! Core types used throughout the system
//!
//! These are fundamental types shared by the ledger adapter, the
//! orchestrator and the reporter.

use std::fmt;

/// Account ID - a ledger participant, mapped 1:1 from a chat user id.
///
/// # Constraints:
/// - **Stable**: never changes for the participant's lifetime
/// - **Never reused** across participants
/// - Encoded on-chain as a `uint256` word
pub type AccountId = u64;

/// Amount in the smallest ledger unit (fixed-point, scaled by `10^decimals`).
///
/// Always non-negative. On-chain values are `uint256`; anything above
/// `u128::MAX` is treated as a decode error rather than truncated.
pub type Amount = u128;

/// Request ID attached to every tip for log correlation.
pub type RequestId = ulid::Ulid;

/// Transaction handle returned on submission.
///
/// Wraps the 32-byte transaction hash. Displayed as `0x`-prefixed lowercase hex,
/// which is what explorers and `eth_getTransactionReceipt` expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle([u8; 32]);

impl TxHandle {
    pub fn new(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a `0x`-prefixed hex hash as returned by JSON-RPC.
    pub fn from_hex(s: &str) -> Option<Self> {
        let raw = hex::decode(s.trim_start_matches("0x")).ok()?;
        let hash: [u8; 32] = raw.try_into().ok()?;
        Some(Self(hash))
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_handle_hex() {
        let handle = TxHandle::new([0xab; 32]);
        let s = handle.to_string();
        assert!(s.starts_with("0xabab"));
        assert_eq!(s.len(), 66);
        assert_eq!(TxHandle::from_hex(&s), Some(handle));
    }

    #[test]
    fn test_tx_handle_rejects_short_hash() {
        assert!(TxHandle::from_hex("0x1234").is_none());
        assert!(TxHandle::from_hex("not hex").is_none());
    }
}
