//! Stage-level error taxonomy for the proof pipeline.
//!
//! Every fatal condition of a run maps to exactly one [`PipelineError`]
//! variant so callers (CLI, tests, orchestrators) can branch on
//! [`PipelineError::kind`] instead of parsing messages. Nothing in this crate
//! retries; the only non-fatal path (dummy setup skipping verification) is not
//! an error at all.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::Backend;

/// Result alias used by every pipeline stage.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Fatal conditions raised by the pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Backend selector did not name a supported proof system.
    #[error("unsupported backend `{0}` (supported: plonk, groth16)")]
    UnsupportedBackend(String),

    /// The requested setup strategy does not exist for this backend.
    #[error("dummy setup is not available for the {0} backend")]
    UnsupportedSetup(Backend),

    /// The circuit description could not be compiled.
    #[error("circuit compilation failed: {0}")]
    CompilationFailed(String),

    /// A run input (inputs file, config file) could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A persisted key or artifact the run depends on does not exist.
    #[error("missing artifact {}", .path.display())]
    MissingArtifact {
        /// Expected location.
        path: PathBuf,
    },

    /// The structured reference string file does not exist.
    #[error("missing SRS file {}", .path.display())]
    MissingSrs {
        /// Expected location.
        path: PathBuf,
    },

    /// A persisted artifact exists but does not decode.
    #[error("corrupt artifact {}: {reason}", .path.display())]
    CorruptArtifact {
        /// Offending file.
        path: PathBuf,
        /// Decoder diagnostic.
        reason: String,
    },

    /// A key decodes but belongs to another backend, role or circuit.
    #[error("incompatible key {}: {reason}", .path.display())]
    IncompatibleKey {
        /// Offending file.
        path: PathBuf,
        /// What did not match.
        reason: String,
    },

    /// Supplied values do not fit the declared public/secret slots.
    #[error("witness shape mismatch: {0}")]
    WitnessShapeMismatch(String),

    /// Key generation failed inside the proof system.
    #[error("setup failed: {0}")]
    SetupFailed(String),

    /// The witness does not satisfy the circuit, or the prover failed.
    #[error("proving failed: {0}")]
    ProvingFailed(String),

    /// A freshly generated proof did not pass local verification.
    #[error("proof rejected by local verification")]
    ProofRejectedLocally,

    /// Writing an artifact to storage failed.
    #[error("failed to write artifact {}", .path.display())]
    ArtifactWriteFailed {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Flat discriminant of [`PipelineError`], stable for matching in tests and
/// orchestration code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`PipelineError::UnsupportedBackend`].
    UnsupportedBackend,
    /// See [`PipelineError::UnsupportedSetup`].
    UnsupportedSetup,
    /// See [`PipelineError::CompilationFailed`].
    CompilationFailed,
    /// See [`PipelineError::InvalidInput`].
    InvalidInput,
    /// See [`PipelineError::MissingArtifact`].
    MissingArtifact,
    /// See [`PipelineError::MissingSrs`].
    MissingSrs,
    /// See [`PipelineError::CorruptArtifact`].
    CorruptArtifact,
    /// See [`PipelineError::IncompatibleKey`].
    IncompatibleKey,
    /// See [`PipelineError::WitnessShapeMismatch`].
    WitnessShapeMismatch,
    /// See [`PipelineError::SetupFailed`].
    SetupFailed,
    /// See [`PipelineError::ProvingFailed`].
    ProvingFailed,
    /// See [`PipelineError::ProofRejectedLocally`].
    ProofRejectedLocally,
    /// See [`PipelineError::ArtifactWriteFailed`].
    ArtifactWriteFailed,
}

impl PipelineError {
    /// Discriminant without payload.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedBackend(_) => ErrorKind::UnsupportedBackend,
            Self::UnsupportedSetup(_) => ErrorKind::UnsupportedSetup,
            Self::CompilationFailed(_) => ErrorKind::CompilationFailed,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::MissingArtifact { .. } => ErrorKind::MissingArtifact,
            Self::MissingSrs { .. } => ErrorKind::MissingSrs,
            Self::CorruptArtifact { .. } => ErrorKind::CorruptArtifact,
            Self::IncompatibleKey { .. } => ErrorKind::IncompatibleKey,
            Self::WitnessShapeMismatch(_) => ErrorKind::WitnessShapeMismatch,
            Self::SetupFailed(_) => ErrorKind::SetupFailed,
            Self::ProvingFailed(_) => ErrorKind::ProvingFailed,
            Self::ProofRejectedLocally => ErrorKind::ProofRejectedLocally,
            Self::ArtifactWriteFailed { .. } => ErrorKind::ArtifactWriteFailed,
        }
    }

    /// Convenience constructor for [`PipelineError::CorruptArtifact`].
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CorruptArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Convenience constructor for [`PipelineError::IncompatibleKey`].
    pub fn incompatible(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::IncompatibleKey {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
