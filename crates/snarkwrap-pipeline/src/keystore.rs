//! Key store: load persisted keys or fail, never regenerate.
//!
//! Every key file is a [`KeyEnvelope`]. Loading checks, in order:
//! 1. the file exists ([`PipelineError::MissingArtifact`]),
//! 2. the envelope parses ([`PipelineError::CorruptArtifact`]),
//! 3. backend, role and circuit fingerprint match the current run
//!    ([`PipelineError::IncompatibleKey`]),
//! 4. the payload decodes ([`PipelineError::CorruptArtifact`]).
//!
//! Writers live here too but are only called by the setup coordinator.

use std::path::{Path, PathBuf};

use snarkwrap_core::{
    read_artifact, write_atomic, Backend, ConstraintSystem, KeyEnvelope, KeyPair, KeyRole,
    PipelineError, PipelineResult, ProofSystem, StorageLayout, Trusted,
};
use tracing::{debug, error};

fn open_envelope<S: ProofSystem>(
    path: &Path,
    cs: &ConstraintSystem,
    role: KeyRole,
) -> PipelineResult<Vec<u8>> {
    let bytes = read_artifact(path).map_err(|e| {
        error!(path = %path.display(), "{} unavailable: {e}", role.label());
        e
    })?;
    let envelope = KeyEnvelope::open(&bytes).map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to read {}", role.label());
        PipelineError::corrupt(path, format!("{e:#}"))
    })?;
    envelope
        .check(S::BACKEND, role, &cs.fingerprint())
        .map_err(|reason| {
            error!(path = %path.display(), %reason, "refusing {}", role.label());
            PipelineError::incompatible(path, reason)
        })?;
    Ok(envelope.payload)
}

/// Load the proving key for `cs`.
pub fn load_proving_key<S: ProofSystem>(
    layout: &StorageLayout,
    cs: &ConstraintSystem,
) -> PipelineResult<S::ProvingKey> {
    let path = layout.proving_key_path();
    let payload = open_envelope::<S>(&path, cs, KeyRole::Proving)?;
    S::decode_proving_key(cs, &payload).map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to decode proving key");
        PipelineError::corrupt(&path, format!("{e:#}"))
    })
}

/// Load the verifying key for `cs`.
pub fn load_verifying_key<S: ProofSystem>(
    layout: &StorageLayout,
    cs: &ConstraintSystem,
) -> PipelineResult<S::VerifyingKey> {
    let path = layout.verifying_key_path();
    let payload = open_envelope::<S>(&path, cs, KeyRole::Verifying)?;
    S::decode_verifying_key(cs, &payload).map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to decode verifying key");
        PipelineError::corrupt(&path, format!("{e:#}"))
    })
}

/// Load both keys of an authentic setup. Fails on any missing or mismatched file.
pub fn load_keys<S: ProofSystem>(
    layout: &StorageLayout,
    cs: &ConstraintSystem,
) -> PipelineResult<KeyPair<S, Trusted>> {
    let pk = load_proving_key::<S>(layout, cs)?;
    let vk = load_verifying_key::<S>(layout, cs)?;
    debug!(backend = %S::BACKEND, circuit = cs.name(), "keys loaded");
    Ok(KeyPair::new(pk, vk))
}

fn persist(
    path: PathBuf,
    cs: &ConstraintSystem,
    backend: Backend,
    role: KeyRole,
    payload: anyhow::Result<Vec<u8>>,
) -> PipelineResult<PathBuf> {
    let payload =
        payload.map_err(|e| PipelineError::SetupFailed(format!("encode {}: {e:#}", role.label())))?;
    let envelope = KeyEnvelope {
        backend,
        role,
        fingerprint: cs.fingerprint(),
        payload,
    };
    write_atomic(&path, &envelope.seal())?;
    Ok(path)
}

/// Persist an authentic proving key.
pub fn persist_proving_key<S: ProofSystem>(
    layout: &StorageLayout,
    cs: &ConstraintSystem,
    pk: &S::ProvingKey,
) -> PipelineResult<PathBuf> {
    persist(
        layout.proving_key_path(),
        cs,
        S::BACKEND,
        KeyRole::Proving,
        S::encode_proving_key(pk),
    )
}

/// Persist a dummy proving key. A later load refuses it.
pub fn persist_dummy_proving_key<S: ProofSystem>(
    layout: &StorageLayout,
    cs: &ConstraintSystem,
    pk: &S::ProvingKey,
) -> PipelineResult<PathBuf> {
    persist(
        layout.proving_key_path(),
        cs,
        S::BACKEND,
        KeyRole::DummyProving,
        S::encode_proving_key(pk),
    )
}

/// Persist a verifying key.
pub fn persist_verifying_key<S: ProofSystem>(
    layout: &StorageLayout,
    cs: &ConstraintSystem,
    vk: &S::VerifyingKey,
) -> PipelineResult<PathBuf> {
    persist(
        layout.verifying_key_path(),
        cs,
        S::BACKEND,
        KeyRole::Verifying,
        S::encode_verifying_key(vk),
    )
}
