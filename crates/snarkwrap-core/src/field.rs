//! BN254 scalar-field helpers: decimal parsing and fixed-width byte encodings.
//!
//! All circuit coefficients and witness values live in the BN254 scalar field
//! `Fr`. Textual inputs are decimal strings with an optional leading `-`
//! (meaning the additive inverse); they must be canonical, i.e. the magnitude
//! is strictly below the field modulus.

use anyhow::{anyhow, bail, ensure, Result};
use ark_ff::{BigInteger, PrimeField, Zero};
use num_bigint::BigUint;

/// BN254 scalar field element.
pub type Fr = ark_bn254::Fr;

/// Width of one serialized field element (big-endian).
pub const FIELD_BYTES: usize = 32;

/// Field modulus as an arbitrary-precision integer.
#[must_use]
pub fn modulus() -> BigUint {
    BigUint::from(Fr::MODULUS)
}

/// Parse a decimal string (optionally prefixed with `-`) into `Fr`.
pub fn parse_decimal(s: &str) -> Result<Fr> {
    let trimmed = s.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        bail!("`{s}` is not a decimal integer");
    }
    let magnitude = BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| anyhow!("`{s}` is not a decimal integer"))?;
    ensure!(
        magnitude < modulus(),
        "`{s}` is not a canonical field element (must be below the BN254 scalar modulus)"
    );
    let v = Fr::from(magnitude);
    Ok(if negative { -v } else { v })
}

/// Canonical decimal rendering (no sign).
#[must_use]
pub fn to_decimal(v: &Fr) -> String {
    BigUint::from(*v).to_str_radix(10)
}

/// 32-byte big-endian encoding of `v`.
#[must_use]
pub fn to_be_bytes(v: &Fr) -> [u8; FIELD_BYTES] {
    let bytes = v.into_bigint().to_bytes_be();
    let mut out = [0u8; FIELD_BYTES];
    // `to_bytes_be` yields exactly four limbs; right-align for safety.
    let off = FIELD_BYTES.saturating_sub(bytes.len());
    out[off..].copy_from_slice(&bytes[bytes.len().saturating_sub(FIELD_BYTES)..]);
    out
}

/// 32-byte little-endian encoding of `v` (used by halo2 `from_repr`).
#[must_use]
pub fn to_le_bytes(v: &Fr) -> [u8; FIELD_BYTES] {
    let mut out = to_be_bytes(v);
    out.reverse();
    out
}

/// Decode a canonical 32-byte big-endian element.
pub fn from_be_bytes(bytes: &[u8]) -> Result<Fr> {
    ensure!(
        bytes.len() == FIELD_BYTES,
        "field element must be {FIELD_BYTES} bytes, got {}",
        bytes.len()
    );
    let n = BigUint::from_bytes_be(bytes);
    ensure!(n < modulus(), "non-canonical field element 0x{}", hex::encode(bytes));
    Ok(Fr::from(n))
}

/// `true` for the additive identity.
#[inline]
#[must_use]
pub fn is_zero(v: &Fr) -> bool {
    v.is_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_decimal_is_additive_inverse() {
        let a = parse_decimal("5").unwrap();
        let b = parse_decimal("-5").unwrap();
        assert!(is_zero(&(a + b)));
    }

    #[test]
    fn rejects_modulus_and_garbage() {
        let p = modulus().to_str_radix(10);
        assert!(parse_decimal(&p).is_err());
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("-").is_err());
        assert!(parse_decimal("12a").is_err());
        assert!(parse_decimal("+3").is_err());
    }

    #[test]
    fn be_bytes_round_trip() {
        let v = parse_decimal("123456789012345678901234567890").unwrap();
        let bytes = to_be_bytes(&v);
        assert_eq!(from_be_bytes(&bytes).unwrap(), v);
        assert_eq!(to_decimal(&v), "123456789012345678901234567890");
    }

    #[test]
    fn be_layout_is_right_aligned() {
        let bytes = to_be_bytes(&Fr::from(0x0102u64));
        assert_eq!(&bytes[30..], &[0x01, 0x02]);
        assert!(bytes[..30].iter().all(|b| *b == 0));
        let le = to_le_bytes(&Fr::from(0x0102u64));
        assert_eq!(&le[..2], &[0x02, 0x01]);
    }

    #[test]
    fn from_be_rejects_non_canonical() {
        assert!(from_be_bytes(&[0xff; 32]).is_err());
        assert!(from_be_bytes(&[0u8; 31]).is_err());
    }
}
