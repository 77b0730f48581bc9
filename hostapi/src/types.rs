//! Core chain types and byte-level helpers.
//!
//! Addresses are 20 bytes, hashes 32 bytes. Amounts crossing the guest
//! boundary ("value", "amount", "cost", "balance") are big-endian byte
//! strings interpreted as 256-bit unsigned integers.

use alloy_primitives::{b256, keccak256};

pub use alloy_primitives::{Address, U256};

/// 32-byte hash used for block hashes, code hashes, and log topics.
pub type Hash = alloy_primitives::B256;

/// Keccak-256 of the empty byte string — the code hash of a codeless account.
pub const EMPTY_CODE_HASH: Hash =
    b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");

/// Interpret a guest-supplied big-endian byte string as a 256-bit integer.
///
/// Strings longer than 32 bytes are reduced modulo 2^256: only the
/// low-order 32 bytes are kept.
pub fn u256_from_be(bytes: &[u8]) -> U256 {
    if bytes.len() > 32 {
        U256::from_be_slice(&bytes[bytes.len() - 32..])
    } else {
        U256::from_be_slice(bytes)
    }
}

/// The full-width big-endian encoding written back to guests for balances
/// and call values.
pub fn u256_to_be(value: &U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

/// Standard creation-address rule: `keccak256(rlp([sender, nonce]))[12..]`.
pub fn create_address(sender: Address, nonce: u64) -> Address {
    sender.create(nonce)
}

/// Keccak-256 of arbitrary bytes.
pub fn keccak(data: &[u8]) -> Hash {
    keccak256(data)
}
