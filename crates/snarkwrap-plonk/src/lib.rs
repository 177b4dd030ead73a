// crates/snarkwrap-plonk/src/lib.rs

//! snarkwrap-plonk: SRS-based backend (PLONK with KZG commitments on BN254, halo2).
//!
//! - [`circuit`]: gate list → one halo2 custom gate with copy-constrained wiring,
//! - [`srs`]: loading and trimming the structured reference string,
//! - [`keys`]: key types that bundle their trimmed parameters,
//! - [`contract`]: Solidity verifier export and `verifyProof` calldata.
//!
//! Proofs use the SHPLONK multi-open argument with a Keccak-256 transcript,
//! which the exported verifier replays on-chain; the transcript bytes are
//! both the native and the on-chain proof encoding. There is no dummy setup
//! for this backend.

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

pub mod circuit;
pub mod contract;
pub mod keys;
pub mod srs;

use anyhow::{anyhow, Result};
use halo2_proofs::halo2curves::bn256::{Bn256, Fr as HFr, G1Affine};
use halo2_proofs::plonk::{create_proof, keygen_pk, keygen_vk, verify_proof};
use halo2_proofs::poly::kzg::commitment::KZGCommitmentScheme;
use halo2_proofs::poly::kzg::multiopen::{ProverSHPLONK, VerifierSHPLONK};
use halo2_proofs::poly::kzg::strategy::SingleStrategy;
use halo2_proofs::poly::VerificationStrategy;
use halo2_proofs::transcript::{Challenge255, TranscriptWriterBuffer};
use halo2_solidity_verifier::Keccak256Transcript;
use rand::rngs::OsRng;
use snarkwrap_core::{
    Assignment, Backend, ConstraintSystem, KeyPair, PipelineError, PipelineResult, ProofSystem,
    PublicWitness, Trusted,
};
use tracing::debug;

pub use circuit::{circuit_k, GateCircuit};
pub use contract::PlonkCalldata;
pub use keys::{PlonkProvingKey, PlonkVerifyingKey};
pub use srs::Srs;

/// PLONK/KZG over BN254.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plonk;

/// Keccak transcript bytes: the `proof` argument of the exported verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlonkProof(pub Vec<u8>);

impl PlonkProof {
    /// Transcript bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

fn instances(values: &[snarkwrap_core::Fr]) -> Result<Vec<HFr>> {
    values.iter().map(circuit::to_halo2).collect()
}

/// Generate keys for `cs` from `srs`, trimmed to the circuit size.
///
/// # Errors
/// [`PipelineError::SetupFailed`] if `cs` targets another backend, the SRS is
/// too small, or halo2 key generation fails.
pub fn setup(cs: &ConstraintSystem, srs: &Srs) -> PipelineResult<KeyPair<Plonk, Trusted>> {
    if cs.backend() != Backend::Plonk {
        return Err(PipelineError::SetupFailed(format!(
            "constraint system was compiled for {}, not plonk",
            cs.backend()
        )));
    }
    let k = circuit_k(cs);
    let params = srs.downsized(k)?;
    let circuit =
        GateCircuit::for_setup(cs).map_err(|e| PipelineError::SetupFailed(format!("{e:#}")))?;
    let vk = keygen_vk(&params, &circuit)
        .map_err(|e| PipelineError::SetupFailed(format!("halo2 keygen_vk: {e:?}")))?;
    let pk = keygen_pk(&params, vk, &circuit)
        .map_err(|e| PipelineError::SetupFailed(format!("halo2 keygen_pk: {e:?}")))?;
    debug!(circuit = cs.name(), k, srs_k = srs.k(), "plonk setup complete");

    let vk = PlonkVerifyingKey {
        n_public: cs.nb_public(),
        params: params.clone(),
        vk: pk.get_vk().clone(),
    };
    Ok(KeyPair::new(PlonkProvingKey { params, pk }, vk))
}

impl ProofSystem for Plonk {
    const BACKEND: Backend = Backend::Plonk;

    type ProvingKey = PlonkProvingKey;
    type VerifyingKey = PlonkVerifyingKey;
    type Proof = PlonkProof;

    fn prove(
        cs: &ConstraintSystem,
        pk: &Self::ProvingKey,
        assignment: &Assignment,
    ) -> PipelineResult<Self::Proof> {
        let failed = |e: String| PipelineError::ProvingFailed(format!("plonk prover: {e}"));
        let circuit =
            GateCircuit::with_assignment(cs, assignment).map_err(|e| failed(format!("{e:#}")))?;
        let public = instances(assignment.public()).map_err(|e| failed(format!("{e:#}")))?;

        let mut transcript = Keccak256Transcript::<G1Affine, _>::new(Vec::new());
        create_proof::<
            KZGCommitmentScheme<Bn256>,
            ProverSHPLONK<'_, Bn256>,
            Challenge255<G1Affine>,
            _,
            Keccak256Transcript<G1Affine, Vec<u8>>,
            _,
        >(
            &pk.params,
            &pk.pk,
            &[circuit],
            &[&[&public]],
            OsRng,
            &mut transcript,
        )
        .map_err(|e| failed(format!("{e:?}")))?;
        Ok(PlonkProof(transcript.finalize()))
    }

    fn verify(
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public: &PublicWitness,
    ) -> PipelineResult<bool> {
        if public.len() != vk.n_public {
            debug!(expected = vk.n_public, got = public.len(), "plonk public input count mismatch");
            return Ok(false);
        }
        let public = match instances(public.values()) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "plonk public input conversion failed");
                return Ok(false);
            }
        };
        let mut rest: &[u8] = proof.as_bytes();
        let result = {
            let mut transcript = Keccak256Transcript::<G1Affine, _>::new(&mut rest);
            verify_proof::<
                KZGCommitmentScheme<Bn256>,
                VerifierSHPLONK<'_, Bn256>,
                Challenge255<G1Affine>,
                Keccak256Transcript<G1Affine, &mut &[u8]>,
                SingleStrategy<'_, Bn256>,
            >(
                &vk.params,
                &vk.vk,
                SingleStrategy::new(&vk.params),
                &[&[&public]],
                &mut transcript,
            )
        };
        match result {
            // Bytes past the transcript are not part of the proof.
            Ok(()) if !rest.is_empty() => {
                debug!(trailing = rest.len(), "plonk proof has trailing bytes");
                Ok(false)
            }
            Ok(()) => Ok(true),
            Err(e) => {
                debug!(error = ?e, "plonk verifier rejected");
                Ok(false)
            }
        }
    }

    fn encode_proving_key(pk: &Self::ProvingKey) -> Result<Vec<u8>> {
        keys::encode_pk(pk)
    }

    fn decode_proving_key(cs: &ConstraintSystem, bytes: &[u8]) -> Result<Self::ProvingKey> {
        let pk = keys::decode_pk(bytes)?;
        let k = circuit_k(cs);
        if pk.k() != k {
            return Err(anyhow!("proving key has k = {}, circuit needs k = {k}", pk.k()));
        }
        Ok(pk)
    }

    fn encode_verifying_key(vk: &Self::VerifyingKey) -> Result<Vec<u8>> {
        keys::encode_vk(vk)
    }

    fn decode_verifying_key(cs: &ConstraintSystem, bytes: &[u8]) -> Result<Self::VerifyingKey> {
        keys::decode_vk(cs, bytes)
    }

    fn encode_proof(proof: &Self::Proof) -> Result<Vec<u8>> {
        Ok(proof.0.clone())
    }

    fn contract_proof(proof: &Self::Proof) -> Result<Vec<u8>> {
        Ok(proof.0.clone())
    }

    fn export_verifier_contract(vk: &Self::VerifyingKey) -> Result<String> {
        contract::verifier_contract(vk)
    }
}

impl Plonk {
    /// Wrap transcript bytes produced by [`ProofSystem::encode_proof`].
    #[must_use]
    pub fn decode_proof(bytes: &[u8]) -> PlonkProof {
        PlonkProof(bytes.to_vec())
    }

    /// `verifyProof` inputs and ABI calldata for the exported verifier.
    pub fn calldata(proof: &PlonkProof, public: &PublicWitness) -> Result<PlonkCalldata> {
        PlonkCalldata::new(proof, public)
    }
}
