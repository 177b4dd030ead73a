// crates/snarkwrap-pipeline/src/lib.rs

//! snarkwrap-pipeline: one proof-generation run, end to end.
//!
//! - [`keystore`]: load-or-fail for persisted keys, envelope checks, writers,
//! - [`setup`]: the setup coordinator (SRS-based, authentic, dummy),
//! - [`run`]: [`Pipeline::run`] and its state machine,
//! - [`artifacts`]: byte-exact on-chain artifacts from a verified proof.
//!
//! ```no_run
//! use snarkwrap_core::{Backend, CircuitDefinition, StorageLayout, WitnessInputs};
//! use snarkwrap_pipeline::{Pipeline, RunOptions};
//!
//! let mut options = RunOptions::new(Backend::Groth16);
//! options.storage = StorageLayout::in_dir("build");
//! let def = CircuitDefinition::from_json_file("circuit.json")?;
//! let inputs = WitnessInputs::from_json_file("inputs.json")?;
//! let report = Pipeline::new(options).run(&def, &inputs)?;
//! println!("{} → {:?}", report.backend, report.state);
//! # Ok::<(), snarkwrap_core::PipelineError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod artifacts;
pub mod keystore;
pub mod run;
pub mod setup;

pub use artifacts::{public_witness_bytes, write_onchain, OnChainArtifacts};
pub use keystore::load_keys;
pub use run::{Pipeline, RunOptions, RunReport, RunState, StageTiming};
pub use setup::{run_dummy_setup, run_setup, AuthenticSetup, SetupOutput};
pub use snarkwrap_groth16::Groth16;
pub use snarkwrap_plonk::{Plonk, Srs};
