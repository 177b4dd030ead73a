//! Solidity verifier export.
//!
//! Fills `templates/Groth16Verifier.sol` with the verifying key as decimal
//! constants. The contract checks
//! `e(-A, B) · e(α, β) · e(vk_x, γ) · e(C, δ) = 1` with the BN254 precompiles.

use std::fmt::Write as _;

use anyhow::{ensure, Result};
use ark_bn254::{Bn254, Fq};
use ark_ff::PrimeField;
use ark_groth16::VerifyingKey;
use num_bigint::BigUint;
use snarkwrap_core::Fr;

use crate::raw::{g1_words, g2_words};

const TEMPLATE: &str = include_str!("../templates/Groth16Verifier.sol");

fn dec(word: &[u8; 32]) -> String {
    BigUint::from_bytes_be(word).to_str_radix(10)
}

/// Render the verifier contract for `vk`.
pub fn verifier_contract(vk: &VerifyingKey<Bn254>) -> Result<String> {
    ensure!(
        !vk.gamma_abc_g1.is_empty(),
        "verifying key has no input commitments"
    );

    let alpha = g1_words(&vk.alpha_g1);
    let beta = g2_words(&vk.beta_g2);
    let gamma = g2_words(&vk.gamma_g2);
    let delta = g2_words(&vk.delta_g2);

    let mut ic = String::new();
    for (i, p) in vk.gamma_abc_g1.iter().enumerate() {
        let [x, y] = g1_words(p);
        writeln!(
            ic,
            "        ic[{i}] = [uint256({}), uint256({})];",
            dec(&x),
            dec(&y)
        )?;
    }

    let mut vars: Vec<(String, String)> = [
        ("PRIME_Q", BigUint::from(Fq::MODULUS).to_str_radix(10)),
        ("PRIME_R", BigUint::from(Fr::MODULUS).to_str_radix(10)),
        ("N_PUBLIC", (vk.gamma_abc_g1.len() - 1).to_string()),
        ("IC_LEN", vk.gamma_abc_g1.len().to_string()),
        ("IC_ASSIGN", ic.trim_end().to_string()),
        ("ALPHA_X", dec(&alpha[0])),
        ("ALPHA_Y", dec(&alpha[1])),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    for (name, words) in [("BETA", beta), ("GAMMA", gamma), ("DELTA", delta)] {
        for (suffix, w) in ["X1", "X0", "Y1", "Y0"].into_iter().zip(words.iter()) {
            vars.push((format!("{name}_{suffix}"), dec(w)));
        }
    }

    let mut out = TEMPLATE.to_string();
    for (k, v) in &vars {
        out = out.replace(&format!("<%{k}%>"), v);
    }
    ensure!(!out.contains("<%"), "unfilled placeholder in verifier template");
    Ok(out)
}
