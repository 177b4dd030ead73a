//! The proof pipeline state machine.
//!
//! ```text
//! Compiled → KeysReady → WitnessReady → Proved → (Verified | VerificationSkipped)
//! ```
//!
//! Each transition is a stage; the first failing stage ends the run with
//! its [`PipelineError`]. Witness counts are checked right after compilation
//! so a shape mismatch never pays for a setup.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use snarkwrap_core::{
    compile, prove, Backend, CircuitDefinition, CircuitStats, ConstraintSystem, Dummy, KeyPlan,
    PipelineError, PipelineResult, RunConfig, SetupKind, StorageLayout, Trusted, Witness,
    WitnessInputs,
};
use snarkwrap_groth16::Groth16;
use snarkwrap_plonk::Plonk;
use tracing::{debug, info, warn};

use crate::artifacts::{self, OnChainArtifacts};
use crate::keystore;
use crate::setup::{self, AuthenticSetup};

/// Where a run stands (or ended).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    /// Circuit compiled into a constraint system.
    Compiled,
    /// Keys loaded or generated.
    KeysReady,
    /// Witness built from the inputs.
    WitnessReady,
    /// Proof produced.
    Proved,
    /// Proof passed local verification; on-chain artifacts written.
    Verified,
    /// Dummy setup: no verifying key, verification skipped.
    VerificationSkipped,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compiled => "compiled",
            Self::KeysReady => "keys-ready",
            Self::WitnessReady => "witness-ready",
            Self::Proved => "proved",
            Self::Verified => "verified",
            Self::VerificationSkipped => "verification-skipped",
        })
    }
}

impl RunState {
    /// Final state of a successful run whose keys come from setup kind `K`.
    #[must_use]
    pub const fn terminal<K: SetupKind>() -> Self {
        if K::VERIFIABLE {
            Self::Verified
        } else {
            Self::VerificationSkipped
        }
    }
}

/// Wall-clock time spent reaching `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    /// State entered.
    pub state: RunState,
    /// Time spent in the transition.
    pub elapsed: Duration,
}

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Proof system.
    pub backend: Backend,
    /// Key source.
    pub keys: KeyPlan,
    /// Log circuit stats and stage timings at `info`.
    pub profile: bool,
    /// Persist setup outputs, the full witness and dummy proofs.
    pub save: bool,
    /// File locations.
    pub storage: StorageLayout,
}

impl RunOptions {
    /// Defaults for `backend`: its default key plan, saving on, profiling off,
    /// current directory.
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            keys: backend.default_key_plan(),
            profile: false,
            save: true,
            storage: StorageLayout::default(),
        }
    }

    /// Options from a config file. `backend` overrides the configured one.
    ///
    /// # Errors
    /// [`PipelineError::UnsupportedBackend`] for an unknown backend name,
    /// [`PipelineError::InvalidInput`] for an unknown key plan or when no
    /// backend is given anywhere.
    pub fn from_config(cfg: &RunConfig, backend: Option<Backend>) -> PipelineResult<Self> {
        let configured = cfg.backend()?;
        let backend = backend.or(configured).ok_or_else(|| {
            PipelineError::InvalidInput("no backend selected (set `backend` or pass one)".into())
        })?;
        let mut options = Self::new(backend);
        if let Some(plan) = cfg.key_plan()? {
            options.keys = plan;
        }
        if let Some(profile) = cfg.profile {
            options.profile = profile;
        }
        if let Some(save) = cfg.save {
            options.save = save;
        }
        options.storage = cfg.storage_layout();
        Ok(options)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Proof system used.
    pub backend: Backend,
    /// Key source used.
    pub keys: KeyPlan,
    /// Final state: `Verified` or `VerificationSkipped`.
    pub state: RunState,
    /// Circuit size metrics.
    pub stats: CircuitStats,
    /// Constraint-system fingerprint (hex).
    pub fingerprint: String,
    /// Per-stage timings, in order.
    pub timings: Vec<StageTiming>,
    /// Every file written, in order.
    pub written: Vec<PathBuf>,
}

impl RunReport {
    /// Sum of all stage timings.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }
}

/// Tracks state transitions and their timings.
struct Stages {
    profile: bool,
    state: RunState,
    timings: Vec<StageTiming>,
}

impl Stages {
    fn enter<T>(
        &mut self,
        next: RunState,
        f: impl FnOnce() -> PipelineResult<T>,
    ) -> PipelineResult<T> {
        let start = Instant::now();
        let out = f()?;
        let elapsed = start.elapsed();
        if self.profile {
            info!(from = %self.state, to = %next, ?elapsed, "stage complete");
        } else {
            info!(from = %self.state, to = %next, "stage complete");
        }
        self.state = next;
        self.timings.push(StageTiming {
            state: next,
            elapsed,
        });
        Ok(out)
    }
}

/// One configured proof pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: RunOptions,
}

impl Pipeline {
    /// Pipeline with `options`.
    #[must_use]
    pub const fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Drive `definition` and `inputs` through every stage.
    ///
    /// # Errors
    /// The [`PipelineError`] of the first stage that fails. A dummy-setup run
    /// that skips verification is a success.
    pub fn run(
        &self,
        definition: &CircuitDefinition,
        inputs: &WitnessInputs,
    ) -> PipelineResult<RunReport> {
        let o = &self.options;
        if o.backend == Backend::Plonk && o.keys == KeyPlan::DummySetup {
            return Err(PipelineError::UnsupportedSetup(o.backend));
        }
        info!(backend = %o.backend, keys = %o.keys, save = o.save, "pipeline start");

        let start = Instant::now();
        let cs = compile(definition, o.backend)?;
        let mut stages = Stages {
            profile: o.profile,
            state: RunState::Compiled,
            timings: vec![StageTiming {
                state: RunState::Compiled,
                elapsed: start.elapsed(),
            }],
        };
        if o.profile {
            info!(
                circuit = cs.name(),
                stats = %cs.stats(),
                fingerprint = %cs.fingerprint_hex(),
                "compiled"
            );
        } else {
            debug!(circuit = cs.name(), stats = %cs.stats(), "compiled");
        }
        inputs.check_shape(&cs)?;

        let mut written = Vec::new();
        let state = match o.backend {
            Backend::Plonk => self.run_trusted::<Plonk>(&cs, inputs, &mut stages, &mut written)?,
            Backend::Groth16 if o.keys == KeyPlan::DummySetup => {
                self.run_dummy(&cs, inputs, &mut stages, &mut written)?
            }
            Backend::Groth16 => {
                self.run_trusted::<Groth16>(&cs, inputs, &mut stages, &mut written)?
            }
        };

        let report = RunReport {
            backend: o.backend,
            keys: o.keys,
            state,
            stats: cs.stats(),
            fingerprint: cs.fingerprint_hex(),
            timings: stages.timings,
            written,
        };
        if o.profile {
            for t in &report.timings {
                info!(state = %t.state, elapsed = ?t.elapsed, "timing");
            }
            info!(total = ?report.total(), "pipeline finished");
        }
        Ok(report)
    }

    fn run_trusted<S: AuthenticSetup + OnChainArtifacts>(
        &self,
        cs: &ConstraintSystem,
        inputs: &WitnessInputs,
        stages: &mut Stages,
        written: &mut Vec<PathBuf>,
    ) -> PipelineResult<RunState> {
        let o = &self.options;
        let keys = stages.enter(RunState::KeysReady, || match o.keys {
            KeyPlan::Load => keystore::load_keys::<S>(&o.storage, cs),
            KeyPlan::Setup => {
                let out = setup::run_setup::<S>(cs, &o.storage, o.save)?;
                written.extend(out.written);
                Ok(out.keys)
            }
            KeyPlan::DummySetup => Err(PipelineError::UnsupportedSetup(S::BACKEND)),
        })?;

        let witness = stages.enter(RunState::WitnessReady, || Witness::from_inputs(cs, inputs))?;
        if o.save && S::BACKEND == Backend::Groth16 {
            written.push(artifacts::write_witness(&o.storage, &witness)?);
        }

        let proof = stages.enter(RunState::Proved, || prove(cs, &keys, &witness))?;
        let verified = stages.enter(RunState::Verified, || {
            proof.verify(&keys, witness.public()).map_err(|e| {
                warn!(backend = %S::BACKEND, "local verification rejected the proof");
                e
            })
        })?;

        written.extend(artifacts::write_onchain(&o.storage, &verified)?);
        Ok(RunState::terminal::<Trusted>())
    }

    fn run_dummy(
        &self,
        cs: &ConstraintSystem,
        inputs: &WitnessInputs,
        stages: &mut Stages,
        written: &mut Vec<PathBuf>,
    ) -> PipelineResult<RunState> {
        let o = &self.options;
        let keys = stages.enter(RunState::KeysReady, || {
            let out = setup::run_dummy_setup(cs, &o.storage, o.save)?;
            written.extend(out.written);
            Ok(out.keys)
        })?;

        let witness = stages.enter(RunState::WitnessReady, || Witness::from_inputs(cs, inputs))?;
        if o.save {
            written.push(artifacts::write_witness(&o.storage, &witness)?);
        }

        let proof = stages.enter(RunState::Proved, || prove(cs, &keys, &witness))?;
        if o.save {
            written.push(artifacts::write_dummy_proof(&o.storage, &proof)?);
        }

        warn!("dummy setup has no verifying key, skipping proof verification");
        Ok(RunState::terminal::<Dummy>())
    }
}
