//! Artifact serializer.
//!
//! On-chain artifacts are only produced from a [`VerifiedProof`], so a proof
//! that skipped or failed local verification has no path to them.
//!
//! - `proof`: the backend's contract encoding (Groth16: 256 raw bytes,
//!   PLONK: Keccak transcript bytes),
//! - `public_witness`: binary public witness minus its 12-byte header,
//! - `proof_calldata.json`: Groth16 decimal `(a, b, c, input)`; PLONK
//!   `verifyProof` arguments plus the ABI-encoded call.

use std::io;
use std::path::{Path, PathBuf};

use snarkwrap_core::{
    field, remove_stale, strip_witness_header, write_atomic, Dummy, PipelineError, PipelineResult, Proof,
    ProofSystem, PublicWitness, StorageLayout, VerifiedProof, Witness,
};
use snarkwrap_groth16::{raw_proof, Groth16, Groth16Calldata};
use snarkwrap_plonk::Plonk;
use tracing::info;

/// Backend-specific extras of the on-chain artifact set.
pub trait OnChainArtifacts: ProofSystem {
    /// Calldata JSON for the verifier contract, if the backend has one.
    fn calldata_json(
        _proof: &Self::Proof,
        _public: &PublicWitness,
    ) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

impl OnChainArtifacts for Plonk {
    fn calldata_json(
        proof: &Self::Proof,
        public: &PublicWitness,
    ) -> anyhow::Result<Option<Vec<u8>>> {
        let json = serde_json::to_vec_pretty(&Plonk::calldata(proof, public)?)?;
        Ok(Some(json))
    }
}

impl OnChainArtifacts for Groth16 {
    fn calldata_json(
        proof: &Self::Proof,
        public: &PublicWitness,
    ) -> anyhow::Result<Option<Vec<u8>>> {
        let calldata = Groth16Calldata::from_raw(&raw_proof(proof))?;
        let inputs = public.values().iter().map(field::to_decimal).collect();
        let json = serde_json::to_vec_pretty(&calldata.to_json(inputs))?;
        Ok(Some(json))
    }
}

fn encode_failed(path: &Path, e: &anyhow::Error) -> PipelineError {
    PipelineError::ArtifactWriteFailed {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, format!("{e:#}")),
    }
}

/// `N × 32` bytes: the binary public witness without its header.
pub fn public_witness_bytes(public: &PublicWitness) -> anyhow::Result<Vec<u8>> {
    let binary = public.marshal_binary();
    Ok(strip_witness_header(&binary)?.to_vec())
}

/// Write `proof`, `public_witness` and `proof_calldata.json`.
pub fn write_onchain<S: OnChainArtifacts>(
    layout: &StorageLayout,
    verified: &VerifiedProof<S>,
) -> PipelineResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(3);

    let path = layout.proof_path();
    let bytes = S::contract_proof(verified.proof()).map_err(|e| encode_failed(&path, &e))?;
    write_atomic(&path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "proof written");
    written.push(path);

    let path = layout.public_witness_path();
    let bytes =
        public_witness_bytes(verified.public_witness()).map_err(|e| encode_failed(&path, &e))?;
    write_atomic(&path, &bytes)?;
    info!(path = %path.display(), inputs = verified.public_witness().len(), "public witness written");
    written.push(path);

    let path = layout.calldata_path();
    let calldata = S::calldata_json(verified.proof(), verified.public_witness())
        .map_err(|e| encode_failed(&path, &e))?;
    if let Some(json) = calldata {
        write_atomic(&path, &json)?;
        info!(path = %path.display(), "calldata written");
        written.push(path);
    }

    Ok(written)
}

/// Persist the full binary witness.
pub fn write_witness(layout: &StorageLayout, witness: &Witness) -> PipelineResult<PathBuf> {
    let path = layout.witness_path();
    write_atomic(&path, &witness.marshal_binary())?;
    Ok(path)
}

/// Persist a dummy-setup proof (cost measurement only).
///
/// The bytes use the same contract layout as a verified run. The public
/// witness and calldata of an earlier run are removed, since they do not
/// belong to this proof.
pub fn write_dummy_proof<S: ProofSystem>(
    layout: &StorageLayout,
    proof: &Proof<S, Dummy>,
) -> PipelineResult<PathBuf> {
    let path = layout.proof_path();
    let bytes = S::contract_proof(proof.inner()).map_err(|e| encode_failed(&path, &e))?;
    write_atomic(&path, &bytes)?;
    remove_stale(layout.public_witness_path())?;
    remove_stale(layout.calldata_path())?;
    Ok(path)
}
