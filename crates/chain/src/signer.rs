//! Local secp256k1 signing key for the executor account.

use std::fmt;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::error::ChainError;
use crate::tx::Eip1559Transaction;

/// A signed, broadcast-ready transaction.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub raw: Bytes,
    pub hash: B256,
}

/// Holds the executor's private key. Constructed once at startup and shared
/// read-only.
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Parse a 32-byte hex private key, with or without `0x`.
    pub fn from_hex(raw: &str) -> Result<Self, ChainError> {
        let trimmed = raw.trim();
        let hex_key = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(hex_key)
            .map_err(|_| ChainError::Signer("private key must be hex encoded".into()))?;
        if bytes.len() != 32 {
            return Err(ChainError::Signer("private key must be 32 bytes".into()));
        }
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| ChainError::Signer("private key is not a valid secp256k1 scalar".into()))?;
        let address = public_address(&key);
        Ok(Self { key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sign_transaction(
        &self,
        tx: &Eip1559Transaction,
    ) -> Result<SignedTransaction, ChainError> {
        let hash = tx.signing_hash();
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|error| ChainError::Signer(format!("signing failed: {error}")))?;
        let (r, s) = signature.split_bytes();
        let raw = tx.encode_signed(
            recovery_id.is_y_odd(),
            U256::from_be_slice(r.as_slice()),
            U256::from_be_slice(s.as_slice()),
        );
        Ok(SignedTransaction {
            hash: keccak256(&raw),
            raw: Bytes::from(raw),
        })
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn public_address(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag.
    let digest = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&digest[12..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
    use keeper_core::address::format_address;

    // First account of the default anvil/hardhat mnemonic.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn sample_tx() -> Eip1559Transaction {
        Eip1559Transaction {
            chain_id: 31_337,
            nonce: 3,
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
            max_fee_per_gas: U256::from(3_000_000_000u64),
            gas_limit: 120_000,
            to: Address::repeat_byte(0x42),
            value: U256::ZERO,
            data: Bytes::from(vec![1, 2, 3]),
        }
    }

    #[test]
    fn derives_address_from_key() {
        let signer = LocalSigner::from_hex(DEV_KEY).unwrap();
        assert_eq!(format_address(&signer.address()), DEV_ADDRESS);

        let unprefixed = LocalSigner::from_hex(DEV_KEY.trim_start_matches("0x")).unwrap();
        assert_eq!(unprefixed.address(), signer.address());
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_matches!(LocalSigner::from_hex("0xnothex"), Err(ChainError::Signer(_)));
        assert_matches!(LocalSigner::from_hex("0x1234"), Err(ChainError::Signer(_)));
        assert_matches!(
            LocalSigner::from_hex(&format!("0x{}", "00".repeat(32))),
            Err(ChainError::Signer(_))
        );
    }

    #[test]
    fn debug_output_hides_key_material() {
        let signer = LocalSigner::from_hex(DEV_KEY).unwrap();
        let rendered = format!("{signer:?}");
        assert!(!rendered.contains("ac0974bec39a17e3"));
    }

    #[test]
    fn signature_recovers_to_signer_address() {
        let signer = LocalSigner::from_hex(DEV_KEY).unwrap();
        let tx = sample_tx();
        let signed = signer.sign_transaction(&tx).unwrap();
        assert_eq!(signed.hash, keccak256(&signed.raw));

        let (signature, recovery_id): (Signature, RecoveryId) = signer
            .key
            .sign_prehash_recoverable(tx.signing_hash().as_slice())
            .unwrap();
        let recovered = VerifyingKey::recover_from_prehash(
            tx.signing_hash().as_slice(),
            &signature,
            recovery_id,
        )
        .unwrap();
        assert_eq!(&recovered, signer.key.verifying_key());

        // RFC 6979 signing is deterministic, so the broadcast bytes must match.
        let (r, s) = signature.split_bytes();
        let expected = tx.encode_signed(
            recovery_id.is_y_odd(),
            U256::from_be_slice(r.as_slice()),
            U256::from_be_slice(s.as_slice()),
        );
        assert_eq!(signed.raw, Bytes::from(expected));
    }
}
