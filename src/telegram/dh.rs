//! Diffie-Hellman material for `phone.requestCall`.
//!
//! Only the caller's half is produced here: `g_a = g^a mod p` over Telegram's
//! fixed 2048-bit group, and its SHA-256 hash which is what the request
//! carries. Completing the exchange is left to the server side.

use std::sync::LazyLock;

use num_bigint::BigUint;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Telegram's well-known 2048-bit safe prime.
const DH_PRIME_HEX: &str = concat!(
    "C71CAEB9C6B1C9048E6C522F70F13F73980D40238E3E21C14934D037563D930F",
    "48198A0AA7C14058229493D22530F4DBFA336F6E0AC925139543AED44CCE7C37",
    "20FD51F69458705AC68CD4FE6B6B13ABDC9746512969328454F18FAF8C595F64",
    "2477FE96BB2A941D5BCD1D4AC8CC49880708FA9B378E3C4F3A9060BEE67CF9A4",
    "A4A695811051907E162753B56B0F6B410DBA74D8A84B2A14B3144E0EF1284754",
    "FD17ED950D5965B4B9DD46582DB1178D169C6BC465B0D6FF9CA3928FEF5B9AE4",
    "E418FC15E83EBEA0F87FA9FF5EED70050DED2849F47BF959D956850CE929851F",
    "0D8115F635B105EE2E4E15D04B2454BF6F4FADF034B10403119CD8E3B92FCC5B",
);

/// Generator paired with [`DH_PRIME_HEX`].
pub const DH_GENERATOR: u32 = 3;

/// Size of `g_a` on the wire.
pub const DH_BYTES: usize = 256;

/// Size of the random exponent in bytes (256 bits).
const EXPONENT_BYTES: usize = 32;

/// Attempts before giving up on landing in the safe range.
const MAX_ATTEMPTS: usize = 16;

#[allow(clippy::expect_used)]
static DH_PRIME: LazyLock<BigUint> = LazyLock::new(|| {
    BigUint::parse_bytes(DH_PRIME_HEX.as_bytes(), 16).expect("DH prime constant is valid hex")
});

/// The caller's half of a call key exchange.
#[derive(Clone)]
pub struct DhParams {
    /// `g^a mod p`, big-endian, exactly [`DH_BYTES`] long.
    g_a: Vec<u8>,
    /// SHA-256 of `g_a`.
    g_a_hash: [u8; 32],
}

impl DhParams {
    /// Generates fresh parameters from a random 256-bit exponent.
    ///
    /// Exponents whose `g_a` falls outside the range Telegram accepts are
    /// redrawn.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut params = Self::from_exponent(&random_exponent(&mut rng));
        for _ in 1..MAX_ATTEMPTS {
            if params.is_in_safe_range() {
                break;
            }
            params = Self::from_exponent(&random_exponent(&mut rng));
        }
        params
    }

    /// Derives parameters from a known exponent.
    #[must_use]
    pub fn from_exponent(a: &BigUint) -> Self {
        let g_a = BigUint::from(DH_GENERATOR).modpow(a, &DH_PRIME);
        let g_a = to_fixed_bytes(&g_a);
        let g_a_hash: [u8; 32] = Sha256::digest(&g_a).into();
        Self { g_a, g_a_hash }
    }

    /// The public value `g_a`.
    #[must_use]
    pub fn g_a(&self) -> &[u8] {
        &self.g_a
    }

    /// The hash sent with the call request.
    #[must_use]
    pub const fn g_a_hash(&self) -> &[u8; 32] {
        &self.g_a_hash
    }

    /// Checks `2^(2048-64) <= g_a <= p - 2^(2048-64)`.
    #[must_use]
    pub fn is_in_safe_range(&self) -> bool {
        let g_a = BigUint::from_bytes_be(&self.g_a);
        let margin = BigUint::from(1u8) << (DH_BYTES * 8 - 64);
        let prime: &BigUint = &DH_PRIME;
        g_a >= margin && prime > &margin && g_a <= prime - &margin
    }
}

impl std::fmt::Debug for DhParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DhParams")
            .field("g_a_hash", &self.g_a_hash)
            .finish_non_exhaustive()
    }
}

fn random_exponent(rng: &mut impl RngCore) -> BigUint {
    let mut bytes = [0u8; EXPONENT_BYTES];
    rng.fill_bytes(&mut bytes);
    BigUint::from_bytes_be(&bytes)
}

/// Left-pads a value to [`DH_BYTES`] big-endian bytes.
fn to_fixed_bytes(value: &BigUint) -> Vec<u8> {
    let raw = value.to_bytes_be();
    let mut out = vec![0u8; DH_BYTES.saturating_sub(raw.len())];
    out.extend_from_slice(&raw);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prime_is_2048_bits() {
        assert_eq!(DH_PRIME.bits(), 2048);
    }

    #[test]
    fn test_small_exponent_is_padded() {
        let params = DhParams::from_exponent(&BigUint::from(1u8));
        assert_eq!(params.g_a().len(), DH_BYTES);
        assert_eq!(params.g_a()[DH_BYTES - 1], 3);
        assert!(params.g_a()[..DH_BYTES - 1].iter().all(|&b| b == 0));
        assert!(!params.is_in_safe_range());
    }

    #[test]
    fn test_hash_matches_public_value() {
        let params = DhParams::from_exponent(&BigUint::from(12_345u32));
        let expected: [u8; 32] = Sha256::digest(params.g_a()).into();
        assert_eq!(params.g_a_hash(), &expected);
    }

    #[test]
    fn test_generated_value_below_prime() {
        let params = DhParams::generate();
        assert_eq!(params.g_a().len(), DH_BYTES);

        let g_a = BigUint::from_bytes_be(params.g_a());
        assert!(g_a > BigUint::from(1u8));
        assert!(g_a < *DH_PRIME);
        assert!(params.is_in_safe_range());
    }

    #[test]
    fn test_generate_is_random() {
        let first = DhParams::generate();
        let second = DhParams::generate();
        assert_ne!(first.g_a_hash(), second.g_a_hash());
    }
}
