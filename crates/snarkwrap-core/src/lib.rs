// crates/snarkwrap-core/src/lib.rs

//! snarkwrap-core: circuit IR, witnesses, storage and the proof-system trait.
//!
//! This crate defines the **stable boundary** used across snarkwrap crates:
//! - the gate-list front end ([`CircuitDefinition`]) and its compiled,
//!   fingerprinted [`ConstraintSystem`] with a built-in solver,
//! - [`Witness`] / [`PublicWitness`] and the gnark-style binary witness format,
//! - the backend-agnostic [`ProofSystem`] trait with setup provenance carried
//!   in the type system ([`Trusted`], [`Dummy`], [`VerifiedProof`]),
//! - explicit [`StorageLayout`], atomic writes and [`KeyEnvelope`]s,
//! - the stage-level [`PipelineError`] and the TOML [`RunConfig`].
//!
//! ```no_run
//! use snarkwrap_core::{compile, Backend, CircuitDefinition, Witness, WitnessInputs};
//! let def = CircuitDefinition::from_json_file("circuit.json")?;
//! let cs = compile(&def, Backend::Groth16)?;
//! let inputs = WitnessInputs::from_json_file("inputs.json")?;
//! let witness = Witness::from_inputs(&cs, &inputs)?;
//! let assignment = cs.solve(&witness)?;
//! # let _ = assignment;
//! # Ok::<(), snarkwrap_core::PipelineError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Backend enum, key plans, setup markers and the proof-system trait.
pub mod backend;
/// Gate-list circuit descriptions, compilation and solving.
pub mod circuit;
/// TOML run configuration.
pub mod config;
/// Key envelope (magic, backend, role, fingerprint).
pub mod envelope;
/// Stage-level error taxonomy.
pub mod error;
/// BN254 scalar-field parsing and encodings.
pub mod field;
/// Storage layout and atomic file I/O.
pub mod storage;
/// Witness building and binary format.
pub mod witness;

pub use backend::*;
pub use circuit::*;
pub use config::*;
pub use envelope::*;
pub use error::*;
pub use field::Fr;
pub use storage::*;
pub use witness::*;

/// Commonly-used items for quick imports.
pub mod prelude {
    pub use crate::{
        compile, prove, Backend, CircuitDefinition, ConstraintSystem, Dummy, KeyPair, KeyPlan,
        PipelineError, PipelineResult, ProofSystem, PublicWitness, StorageLayout, Trusted,
        VerifiedProof, Witness,
    };
}
