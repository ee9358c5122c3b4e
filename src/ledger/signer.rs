//! EIP-1559 transaction signing
//!
//! ```text
//! signing hash = keccak256(0x02 ‖ rlp([chain_id, nonce, max_priority_fee, max_fee,
//!                                      gas_limit, to, value, data, access_list]))
//! envelope     = 0x02 ‖ rlp([...same fields..., y_parity, r, s])
//! tx hash      = keccak256(envelope)
//! ```
//!
//! The tx hash is known before broadcast, which lets the orchestrator hand the
//! user a lookup handle even when the broadcast acknowledgement is lost.

use alloy_rlp::{Encodable, Header};
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};

use super::LedgerError;
use super::abi::keccak256;
use crate::core_types::TxHandle;

const EIP1559_TX_TYPE: u8 = 0x02;

pub type Address = [u8; 20];

/// Parse a `0x`-prefixed (or bare) 20-byte hex address
pub fn parse_address(s: &str) -> Result<Address, LedgerError> {
    let raw = hex::decode(s.trim().trim_start_matches("0x"))
        .map_err(|e| LedgerError::Decode(format!("invalid address {}: {}", s, e)))?;
    raw.try_into()
        .map_err(|_| LedgerError::Decode(format!("address {} is not 20 bytes", s)))
}

/// Unsigned dynamic-fee transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip1559Tx {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

impl Eip1559Tx {
    fn encode_fields(&self, out: &mut Vec<u8>) {
        self.chain_id.encode(out);
        self.nonce.encode(out);
        self.max_priority_fee_per_gas.encode(out);
        self.max_fee_per_gas.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        Encodable::encode(self.data.as_slice(), out);
        // Empty access list
        Header {
            list: true,
            payload_length: 0,
        }
        .encode(out);
    }

    fn envelope(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(payload.len() + 10);
        out.push(EIP1559_TX_TYPE);
        Header {
            list: true,
            payload_length: payload.len(),
        }
        .encode(&mut out);
        out.extend_from_slice(payload);
        out
    }

    /// Hash the signer commits to
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut payload = Vec::new();
        self.encode_fields(&mut payload);
        keccak256(&Self::envelope(&payload))
    }
}

/// Signed, broadcast-ready transaction
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub raw: Vec<u8>,
    pub hash: TxHandle,
}

impl SignedTx {
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }
}

/// Holds the bot's signing key
pub struct TxSigner {
    secp: Secp256k1<All>,
    secret: SecretKey,
    address: Address,
}

impl TxSigner {
    /// Build from a hex private key (with or without `0x`)
    pub fn from_hex(key: &str) -> Result<Self, LedgerError> {
        let raw = hex::decode(key.trim().trim_start_matches("0x"))
            .map_err(|e| LedgerError::Signing(format!("private key is not hex: {}", e)))?;
        let secret = SecretKey::from_slice(&raw)
            .map_err(|e| LedgerError::Signing(format!("invalid private key: {}", e)))?;
        let secp = Secp256k1::new();
        let address = address_of(&PublicKey::from_secret_key(&secp, &secret));
        Ok(Self {
            secp,
            secret,
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn address_hex(&self) -> String {
        format!("0x{}", hex::encode(self.address))
    }

    pub fn sign(&self, tx: &Eip1559Tx) -> SignedTx {
        let message = Message::from_digest(tx.signing_hash());
        let signature = self.secp.sign_ecdsa_recoverable(&message, &self.secret);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut payload = Vec::new();
        tx.encode_fields(&mut payload);
        (recovery_id.to_i32() as u64).encode(&mut payload);
        // r and s are RLP integers: no leading zero bytes
        Encodable::encode(trim_leading_zeros(&compact[..32]), &mut payload);
        Encodable::encode(trim_leading_zeros(&compact[32..]), &mut payload);

        let raw = Eip1559Tx::envelope(&payload);
        let hash = TxHandle::new(keccak256(&raw));
        SignedTx { raw, hash }
    }
}

impl std::fmt::Debug for TxSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the key
        f.debug_struct("TxSigner")
            .field("address", &self.address_hex())
            .finish()
    }
}

fn address_of(public: &PublicKey) -> Address {
    let uncompressed = public.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::Decodable;
    use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    fn sample_tx() -> Eip1559Tx {
        Eip1559Tx {
            chain_id: 8453,
            nonce: 7,
            max_priority_fee_per_gas: 1_000_000,
            max_fee_per_gas: 2_000_000_000,
            gas_limit: 60_000,
            to: parse_address("0x00000000000000000000000000000000000000aa").unwrap(),
            value: 0,
            data: vec![0xde, 0xad, 0xbe, 0xef],
        }
    }

    #[test]
    fn test_address_derivation_known_key() {
        // Private key 1 maps to a well-known address
        let signer = TxSigner::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            signer.address_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(TxSigner::from_hex("zz").is_err());
        assert!(TxSigner::from_hex("0x00").is_err());
        assert!(TxSigner::from_hex(&format!("0x{}", "00".repeat(32))).is_err());
    }

    fn take_string<'a>(buf: &mut &'a [u8]) -> &'a [u8] {
        let header = Header::decode(buf).unwrap();
        assert!(!header.list);
        let (value, rest) = buf.split_at(header.payload_length);
        *buf = rest;
        value
    }

    #[test]
    fn test_envelope_recovers_signer() {
        let signer = TxSigner::from_hex(KEY_ONE).unwrap();
        let tx = sample_tx();
        let signed = signer.sign(&tx);

        assert_eq!(signed.raw[0], EIP1559_TX_TYPE);
        assert_eq!(signed.hash, TxHandle::new(keccak256(&signed.raw)));

        let mut body = &signed.raw[1..];
        let header = Header::decode(&mut body).unwrap();
        assert!(header.list);
        assert_eq!(header.payload_length, body.len());

        assert_eq!(u64::decode(&mut body).unwrap(), tx.chain_id);
        assert_eq!(u64::decode(&mut body).unwrap(), tx.nonce);
        assert_eq!(u128::decode(&mut body).unwrap(), tx.max_priority_fee_per_gas);
        assert_eq!(u128::decode(&mut body).unwrap(), tx.max_fee_per_gas);
        assert_eq!(u64::decode(&mut body).unwrap(), tx.gas_limit);
        assert_eq!(<[u8; 20]>::decode(&mut body).unwrap(), tx.to);
        assert_eq!(u128::decode(&mut body).unwrap(), tx.value);
        assert_eq!(take_string(&mut body), tx.data.as_slice());

        let access_list = Header::decode(&mut body).unwrap();
        assert!(access_list.list);
        assert_eq!(access_list.payload_length, 0);

        let parity = u8::decode(&mut body).unwrap();
        let r = take_string(&mut body);
        let s = take_string(&mut body);
        assert!(body.is_empty());

        let mut compact = [0u8; 64];
        compact[32 - r.len()..32].copy_from_slice(r);
        compact[64 - s.len()..].copy_from_slice(s);
        let signature =
            RecoverableSignature::from_compact(&compact, RecoveryId::from_i32(parity as i32).unwrap())
                .unwrap();

        let message = Message::from_digest(tx.signing_hash());
        let public = Secp256k1::new().recover_ecdsa(&message, &signature).unwrap();
        assert_eq!(address_of(&public), signer.address());
    }

    #[test]
    fn test_signing_hash_commits_to_fields() {
        let tx = sample_tx();
        let mut other = tx.clone();
        other.nonce += 1;
        assert_ne!(tx.signing_hash(), other.signing_hash());
    }

    #[test]
    fn test_parse_address() {
        assert!(parse_address("0x00000000000000000000000000000000000000aa").is_ok());
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("0xnothex").is_err());
    }
}
