//! On-chain verification for PLONK proofs.
//!
//! [`verifier_contract`] renders a complete Solidity verifier for a verifying
//! key (SHPLONK batch opening, Keccak transcript). Its entry point is
//!
//! ```text
//! function verifyProof(bytes calldata proof, uint256[] calldata instances) returns (bool)
//! ```
//!
//! where `proof` is the transcript the prover wrote (the `proof` artifact)
//! and `instances` are the public inputs (the `public_witness` artifact read
//! as big-endian words). [`PlonkCalldata`] bundles both together with the
//! ABI-encoded call.

use anyhow::{ensure, Context, Result};
use halo2_solidity_verifier::{encode_calldata, BatchOpenScheme, SolidityGenerator};
use serde::{Deserialize, Serialize};
use snarkwrap_core::{field, PublicWitness};

use crate::keys::PlonkVerifyingKey;
use crate::PlonkProof;

/// Render the Solidity verifier for `vk`.
pub fn verifier_contract(vk: &PlonkVerifyingKey) -> Result<String> {
    let generator =
        SolidityGenerator::new(&vk.params, &vk.vk, BatchOpenScheme::Bdfg21, vk.n_public);
    let source = generator.render().context("render halo2 Solidity verifier")?;
    ensure!(
        source.contains("function verifyProof("),
        "rendered verifier has no verifyProof entry point"
    );
    Ok(source)
}

/// Inputs of `verifyProof` in JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlonkCalldata {
    /// `proof` argument, `0x`-prefixed hex.
    pub proof: String,
    /// `instances` argument, decimal.
    pub instances: Vec<String>,
    /// Full ABI-encoded call (selector included), `0x`-prefixed hex.
    pub calldata: String,
}

impl PlonkCalldata {
    /// Build the call for `proof` over `public`.
    pub fn new(proof: &PlonkProof, public: &PublicWitness) -> Result<Self> {
        let instances = crate::instances(public.values())?;
        let calldata = encode_calldata(None, proof.as_bytes(), &instances);
        Ok(Self {
            proof: format!("0x{}", hex::encode(proof.as_bytes())),
            instances: public.values().iter().map(field::to_decimal).collect(),
            calldata: format!("0x{}", hex::encode(calldata)),
        })
    }
}
