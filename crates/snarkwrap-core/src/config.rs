//! TOML run configuration.
//!
//! ```toml
//! backend = "groth16"   # plonk | groth16
//! keys    = "setup"     # load | setup | dummy-setup
//! profile = true
//! save    = true
//!
//! [storage]
//! dir = "build"
//! srs = "srs_setup"
//! plonk_contract = "contracts/PlonkVerifier.sol"
//! ```
//!
//! Every field is optional; the CLI overlays its flags on top. Strings are
//! parsed through [`Backend`]'s and [`KeyPlan`]'s `FromStr`, so an unknown
//! backend name surfaces as [`PipelineError::UnsupportedBackend`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Backend, KeyPlan, PipelineError, PipelineResult, StorageLayout};

/// `[storage]` table. Unset names keep the [`StorageLayout`] defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Base directory.
    pub dir: Option<PathBuf>,
    /// SRS file.
    pub srs: Option<PathBuf>,
    /// Proving key file.
    pub proving_key: Option<PathBuf>,
    /// Verifying key file.
    pub verifying_key: Option<PathBuf>,
    /// Full witness file.
    pub witness: Option<PathBuf>,
    /// Proof file.
    pub proof: Option<PathBuf>,
    /// Public witness file.
    pub public_witness: Option<PathBuf>,
    /// Calldata JSON file.
    pub calldata: Option<PathBuf>,
    /// Exported PLONK verifier contract.
    pub plonk_contract: Option<PathBuf>,
    /// Exported Groth16 verifier contract.
    pub groth16_contract: Option<PathBuf>,
}

/// Top-level run configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Backend name.
    pub backend: Option<String>,
    /// Key plan name.
    pub keys: Option<String>,
    /// Profiling toggle.
    pub profile: Option<bool>,
    /// Persistence toggle.
    pub save: Option<bool>,
    /// File locations.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl RunConfig {
    /// Parse TOML text.
    pub fn from_toml_str(s: &str) -> PipelineResult<Self> {
        toml::from_str(s).map_err(|e| PipelineError::InvalidInput(format!("config: {e}")))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::InvalidInput(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&s)
    }

    /// Configured backend, if any.
    pub fn backend(&self) -> PipelineResult<Option<Backend>> {
        self.backend.as_deref().map(str::parse).transpose()
    }

    /// Configured key plan, if any.
    pub fn key_plan(&self) -> PipelineResult<Option<KeyPlan>> {
        self.keys.as_deref().map(str::parse).transpose()
    }

    /// Storage layout with configured overrides applied.
    #[must_use]
    pub fn storage_layout(&self) -> StorageLayout {
        let s = &self.storage;
        let mut layout = StorageLayout::in_dir(s.dir.clone().unwrap_or_else(|| PathBuf::from(".")));
        let overrides: [(&Option<PathBuf>, &mut PathBuf); 9] = [
            (&s.srs, &mut layout.srs),
            (&s.proving_key, &mut layout.proving_key),
            (&s.verifying_key, &mut layout.verifying_key),
            (&s.witness, &mut layout.witness),
            (&s.proof, &mut layout.proof),
            (&s.public_witness, &mut layout.public_witness),
            (&s.calldata, &mut layout.calldata),
            (&s.plonk_contract, &mut layout.plonk_contract),
            (&s.groth16_contract, &mut layout.groth16_contract),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        layout
    }
}
