//! EVM byte layout for Groth16 proofs.
//!
//! The raw proof is eight 32-byte big-endian words:
//!
//! ```text
//! A.x | A.y | B.x.c1 | B.x.c0 | B.y.c1 | B.y.c0 | C.x | C.y
//! ```
//!
//! G2 coordinates put the imaginary part first, which is the order the
//! BN254 pairing precompile expects. [`Groth16Calldata`] regroups the words
//! into the `(a, b, c)` arguments of the verifier contract.

use anyhow::{ensure, Result};
use ark_bn254::{Bn254, Fq, G1Affine, G2Affine};
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::Proof;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Words in a raw proof.
pub const RAW_PROOF_WORDS: usize = 8;
/// Bytes in a raw proof.
pub const RAW_PROOF_BYTES: usize = RAW_PROOF_WORDS * 32;

fn word(f: &Fq) -> [u8; 32] {
    let bytes = f.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// G1 point as `[x, y]`; the identity encodes as zeros.
pub(crate) fn g1_words(p: &G1Affine) -> [[u8; 32]; 2] {
    if p.infinity {
        return [[0u8; 32]; 2];
    }
    [word(&p.x), word(&p.y)]
}

/// G2 point as `[x.c1, x.c0, y.c1, y.c0]`; the identity encodes as zeros.
pub(crate) fn g2_words(p: &G2Affine) -> [[u8; 32]; 4] {
    if p.infinity {
        return [[0u8; 32]; 4];
    }
    [word(&p.x.c1), word(&p.x.c0), word(&p.y.c1), word(&p.y.c0)]
}

/// Encode `proof` in the 256-byte EVM layout.
#[must_use]
pub fn raw_proof(proof: &Proof<Bn254>) -> Vec<u8> {
    let mut out = Vec::with_capacity(RAW_PROOF_BYTES);
    for w in g1_words(&proof.a) {
        out.extend_from_slice(&w);
    }
    for w in g2_words(&proof.b) {
        out.extend_from_slice(&w);
    }
    for w in g1_words(&proof.c) {
        out.extend_from_slice(&w);
    }
    out
}

/// Contract arguments decoded from a raw proof, as big integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groth16Calldata {
    /// `A` as `[x, y]`.
    pub a: [BigUint; 2],
    /// `B` as `[[x.c1, x.c0], [y.c1, y.c0]]`.
    pub b: [[BigUint; 2]; 2],
    /// `C` as `[x, y]`.
    pub c: [BigUint; 2],
}

/// JSON shape of [`Groth16Calldata`] (decimal strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalldataJson {
    /// `A`.
    pub a: [String; 2],
    /// `B`.
    pub b: [[String; 2]; 2],
    /// `C`.
    pub c: [String; 2],
    /// Public inputs.
    pub input: Vec<String>,
}

impl Groth16Calldata {
    /// Decode the eight words of a raw proof.
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        ensure!(
            raw.len() == RAW_PROOF_BYTES,
            "raw Groth16 proof must be {RAW_PROOF_BYTES} bytes, got {}",
            raw.len()
        );
        let w = |i: usize| BigUint::from_bytes_be(&raw[32 * i..32 * (i + 1)]);
        Ok(Self {
            a: [w(0), w(1)],
            b: [[w(2), w(3)], [w(4), w(5)]],
            c: [w(6), w(7)],
        })
    }

    /// JSON form together with the public inputs (decimal).
    #[must_use]
    pub fn to_json(&self, public_inputs: Vec<String>) -> CalldataJson {
        let d = |n: &BigUint| n.to_str_radix(10);
        CalldataJson {
            a: [d(&self.a[0]), d(&self.a[1])],
            b: [
                [d(&self.b[0][0]), d(&self.b[0][1])],
                [d(&self.b[1][0]), d(&self.b[1][1])],
            ],
            c: [d(&self.c[0]), d(&self.c[1])],
            input: public_inputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;

    #[test]
    fn words_map_onto_a_b_c() {
        let mut raw = vec![0u8; RAW_PROOF_BYTES];
        for i in 0..RAW_PROOF_WORDS {
            raw[32 * i + 31] = (i + 1) as u8;
        }
        let cd = Groth16Calldata::from_raw(&raw).unwrap();
        let n = |v: u32| BigUint::from(v);
        assert_eq!(cd.a, [n(1), n(2)]);
        assert_eq!(cd.b, [[n(3), n(4)], [n(5), n(6)]]);
        assert_eq!(cd.c, [n(7), n(8)]);

        let json = cd.to_json(vec!["35".into()]);
        assert_eq!(json.b[1][0], "5");
        assert_eq!(json.input, vec!["35".to_string()]);

        let text = serde_json::to_string(&json).unwrap();
        assert!(text.starts_with(r#"{"a":["1","2"],"b":[["3","4"],["5","6"]]"#));
        let back: CalldataJson = serde_json::from_str(&text).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(Groth16Calldata::from_raw(&[0u8; 255]).is_err());
    }

    #[test]
    fn generator_coordinates_land_in_order() {
        let g1 = G1Affine::generator();
        let g2 = G2Affine::generator();
        let proof = Proof::<Bn254> { a: g1, b: g2, c: g1 };
        let raw = raw_proof(&proof);
        assert_eq!(raw.len(), RAW_PROOF_BYTES);

        // BN254 G1 generator is (1, 2).
        let cd = Groth16Calldata::from_raw(&raw).unwrap();
        assert_eq!(cd.a, [BigUint::from(1u8), BigUint::from(2u8)]);
        assert_eq!(cd.c, cd.a);

        // Imaginary part first.
        assert_eq!(cd.b[0][0], BigUint::from(g2.x.c1.into_bigint()));
        assert_eq!(cd.b[0][1], BigUint::from(g2.x.c0.into_bigint()));
        assert_eq!(cd.b[1][0], BigUint::from(g2.y.c1.into_bigint()));
        assert_eq!(cd.b[1][1], BigUint::from(g2.y.c0.into_bigint()));
    }

    #[test]
    fn identity_encodes_as_zero() {
        let proof = Proof::<Bn254> {
            a: G1Affine::zero(),
            b: G2Affine::zero(),
            c: G1Affine::zero(),
        };
        assert!(raw_proof(&proof).iter().all(|b| *b == 0));
    }
}
