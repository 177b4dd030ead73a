//! Setup coordinator.
//!
//! Produces a key pair for a compiled constraint system and, when saving is
//! on, persists it next to the exported verifier contract:
//!
//! | strategy | backend | writes |
//! |---|---|---|
//! | authentic | plonk | `proving.key`, `verifying.key`, `PlonkVerifier.sol` |
//! | authentic | groth16 | `proving.key`, `verifying.key`, `Groth16Verifier.sol` |
//! | dummy | groth16 | `proving.key` (dummy role) |
//!
//! The PLONK setup loads the SRS from the storage layout; it never samples
//! one. Nothing here retries: any backend failure is
//! [`PipelineError::SetupFailed`].

use std::path::PathBuf;

use snarkwrap_core::{
    write_atomic, ConstraintSystem, Dummy, KeyPair, PipelineError, PipelineResult, ProofSystem,
    SetupKind, StorageLayout, Trusted,
};
use snarkwrap_groth16::Groth16;
use snarkwrap_plonk::{Plonk, Srs};
use tracing::{debug, info};

use crate::keystore;

/// Backends with an authentic setup the coordinator can drive.
pub trait AuthenticSetup: ProofSystem + Sized {
    /// Generate a key pair for `cs`, reading any setup inputs from `layout`.
    fn authentic_setup(
        cs: &ConstraintSystem,
        layout: &StorageLayout,
    ) -> PipelineResult<KeyPair<Self, Trusted>>;
}

impl AuthenticSetup for Plonk {
    fn authentic_setup(
        cs: &ConstraintSystem,
        layout: &StorageLayout,
    ) -> PipelineResult<KeyPair<Self, Trusted>> {
        let srs = Srs::load(layout.srs_path())?;
        snarkwrap_plonk::setup(cs, &srs)
    }
}

impl AuthenticSetup for Groth16 {
    fn authentic_setup(
        cs: &ConstraintSystem,
        _layout: &StorageLayout,
    ) -> PipelineResult<KeyPair<Self, Trusted>> {
        snarkwrap_groth16::setup(cs)
    }
}

/// Keys from a setup run plus every file it wrote.
pub struct SetupOutput<S: ProofSystem, K: SetupKind> {
    /// Generated keys.
    pub keys: KeyPair<S, K>,
    /// Persisted files, in write order.
    pub written: Vec<PathBuf>,
}

/// Authentic setup; with `save`, persist both keys and the verifier contract.
pub fn run_setup<S: AuthenticSetup>(
    cs: &ConstraintSystem,
    layout: &StorageLayout,
    save: bool,
) -> PipelineResult<SetupOutput<S, Trusted>> {
    info!(backend = %S::BACKEND, circuit = cs.name(), "running authentic setup");
    let keys = S::authentic_setup(cs, layout)?;
    let mut written = Vec::new();
    if save {
        written.push(keystore::persist_proving_key::<S>(layout, cs, keys.proving_key())?);
        written.push(keystore::persist_verifying_key::<S>(layout, cs, keys.verifying_key())?);
        written.push(export_contract::<S>(layout, keys.verifying_key())?);
    } else {
        debug!("save disabled, setup outputs kept in memory");
    }
    Ok(SetupOutput { keys, written })
}

/// Insecure Groth16 dummy setup; with `save`, persist the proving key only.
pub fn run_dummy_setup(
    cs: &ConstraintSystem,
    layout: &StorageLayout,
    save: bool,
) -> PipelineResult<SetupOutput<Groth16, Dummy>> {
    info!(circuit = cs.name(), "running dummy setup");
    let keys = snarkwrap_groth16::dummy_setup(cs)?;
    let mut written = Vec::new();
    if save {
        written.push(keystore::persist_dummy_proving_key::<Groth16>(
            layout,
            cs,
            keys.proving_key(),
        )?);
    }
    Ok(SetupOutput { keys, written })
}

/// Write the Solidity verifier for `vk` to the layout's contract path.
pub fn export_contract<S: ProofSystem>(
    layout: &StorageLayout,
    vk: &S::VerifyingKey,
) -> PipelineResult<PathBuf> {
    let source = S::export_verifier_contract(vk)
        .map_err(|e| PipelineError::SetupFailed(format!("verifier contract export: {e:#}")))?;
    let path = layout.contract_path(S::BACKEND);
    write_atomic(&path, source.as_bytes())?;
    debug!(path = %path.display(), "verifier contract exported");
    Ok(path)
}
