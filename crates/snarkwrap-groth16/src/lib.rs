// crates/snarkwrap-groth16/src/lib.rs

//! snarkwrap-groth16: pairing-based backend (Groth16 over BN254, arkworks).
//!
//! - [`r1cs`]: gate list → one rank-1 constraint per gate,
//! - [`setup`]: authentic circuit-specific setup and the insecure dummy setup,
//! - [`raw`]: the 256-byte EVM proof layout and [`Groth16Calldata`],
//! - [`solidity`]: verifier contract export.
//!
//! The [`Groth16`] marker implements [`snarkwrap_core::ProofSystem`]. Keys and
//! native proofs use arkworks' compressed canonical serialization.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod r1cs;
pub mod raw;
pub mod setup;
pub mod solidity;

use anyhow::{Context, Result};
use ark_bn254::Bn254;
use ark_groth16::Groth16 as ArkGroth16;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use rand::rngs::OsRng;
use snarkwrap_core::{
    Assignment, Backend, ConstraintSystem, PipelineError, PipelineResult, ProofSystem,
    PublicWitness,
};
use tracing::debug;

pub use raw::{raw_proof, CalldataJson, Groth16Calldata, RAW_PROOF_BYTES};
pub use setup::{dummy_setup, setup};

/// Groth16 over BN254.
#[derive(Debug, Clone, Copy, Default)]
pub struct Groth16;

fn to_bytes<T: CanonicalSerialize>(v: &T, what: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(v.compressed_size());
    v.serialize_compressed(&mut out)
        .with_context(|| format!("serialize groth16 {what}"))?;
    Ok(out)
}

fn from_bytes<T: CanonicalDeserialize>(bytes: &[u8], what: &str) -> Result<T> {
    let mut rd = bytes;
    let v = T::deserialize_compressed(&mut rd).with_context(|| format!("deserialize groth16 {what}"))?;
    anyhow::ensure!(rd.is_empty(), "{} trailing bytes after groth16 {what}", rd.len());
    Ok(v)
}

impl ProofSystem for Groth16 {
    const BACKEND: Backend = Backend::Groth16;

    type ProvingKey = ark_groth16::ProvingKey<Bn254>;
    type VerifyingKey = ark_groth16::VerifyingKey<Bn254>;
    type Proof = ark_groth16::Proof<Bn254>;

    fn prove(
        cs: &ConstraintSystem,
        pk: &Self::ProvingKey,
        assignment: &Assignment,
    ) -> PipelineResult<Self::Proof> {
        let circuit = r1cs::R1csCircuit::with_assignment(cs, assignment);
        ArkGroth16::<Bn254>::prove(pk, circuit, &mut OsRng)
            .map_err(|e| PipelineError::ProvingFailed(format!("groth16 prover: {e}")))
    }

    fn verify(
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public: &PublicWitness,
    ) -> PipelineResult<bool> {
        match ArkGroth16::<Bn254>::verify(vk, public.values(), proof) {
            Ok(ok) => Ok(ok),
            Err(e) => {
                // Malformed inputs (e.g. wrong input count) count as rejection.
                debug!(error = %e, "groth16 verifier error");
                Ok(false)
            }
        }
    }

    fn encode_proving_key(pk: &Self::ProvingKey) -> Result<Vec<u8>> {
        to_bytes(pk, "proving key")
    }

    fn decode_proving_key(_cs: &ConstraintSystem, bytes: &[u8]) -> Result<Self::ProvingKey> {
        from_bytes(bytes, "proving key")
    }

    fn encode_verifying_key(vk: &Self::VerifyingKey) -> Result<Vec<u8>> {
        to_bytes(vk, "verifying key")
    }

    fn decode_verifying_key(cs: &ConstraintSystem, bytes: &[u8]) -> Result<Self::VerifyingKey> {
        let vk: Self::VerifyingKey = from_bytes(bytes, "verifying key")?;
        anyhow::ensure!(
            vk.gamma_abc_g1.len() == cs.nb_public() + 1,
            "verifying key expects {} public inputs, circuit declares {}",
            vk.gamma_abc_g1.len().saturating_sub(1),
            cs.nb_public()
        );
        Ok(vk)
    }

    fn encode_proof(proof: &Self::Proof) -> Result<Vec<u8>> {
        to_bytes(proof, "proof")
    }

    fn contract_proof(proof: &Self::Proof) -> Result<Vec<u8>> {
        Ok(raw_proof(proof))
    }

    fn export_verifier_contract(vk: &Self::VerifyingKey) -> Result<String> {
        solidity::verifier_contract(vk)
    }
}

impl Groth16 {
    /// Decode a native proof produced by [`ProofSystem::encode_proof`].
    pub fn decode_proof(bytes: &[u8]) -> Result<ark_groth16::Proof<Bn254>> {
        from_bytes(bytes, "proof")
    }
}
