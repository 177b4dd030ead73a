//! Storage layout and file primitives for persisted artifacts.
//!
//! Every file a run reads or writes is named by a [`StorageLayout`] value
//! rather than a process-wide constant, so concurrent pipelines (and tests)
//! can use disjoint directories.
//!
//! Writes are atomic per file: the bytes go to `<name>.<pid>.tmp` next to the
//! destination, are flushed with `sync_all`, and the temp file is renamed
//! over the target. Readers therefore never observe a half-written key. There
//! is no cross-process lock; two runs sharing one layout must be serialized
//! by the caller.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::{Backend, PipelineError, PipelineResult};

/// Where a run keeps its inputs and outputs.
///
/// File names are joined onto `dir`; an absolute name overrides `dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageLayout {
    /// Base directory.
    pub dir: PathBuf,
    /// Proving key.
    pub proving_key: PathBuf,
    /// Verifying key.
    pub verifying_key: PathBuf,
    /// Full binary witness.
    pub witness: PathBuf,
    /// On-chain proof bytes.
    pub proof: PathBuf,
    /// Header-stripped public witness.
    pub public_witness: PathBuf,
    /// Calldata JSON for the verifier contract.
    pub calldata: PathBuf,
    /// Exported PLONK verifier contract.
    pub plonk_contract: PathBuf,
    /// Exported Groth16 verifier contract.
    pub groth16_contract: PathBuf,
    /// Structured reference string for the PLONK backend.
    pub srs: PathBuf,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

impl StorageLayout {
    /// Default file names under `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            proving_key: "proving.key".into(),
            verifying_key: "verifying.key".into(),
            witness: "witness".into(),
            proof: "proof".into(),
            public_witness: "public_witness".into(),
            calldata: "proof_calldata.json".into(),
            plonk_contract: PathBuf::from("contracts").join("PlonkVerifier.sol"),
            groth16_contract: PathBuf::from("contracts").join("Groth16Verifier.sol"),
            srs: "srs_setup".into(),
        }
    }

    fn at(&self, name: &Path) -> PathBuf {
        self.dir.join(name)
    }

    /// Resolved proving-key path.
    #[must_use]
    pub fn proving_key_path(&self) -> PathBuf {
        self.at(&self.proving_key)
    }

    /// Resolved verifying-key path.
    #[must_use]
    pub fn verifying_key_path(&self) -> PathBuf {
        self.at(&self.verifying_key)
    }

    /// Resolved witness path.
    #[must_use]
    pub fn witness_path(&self) -> PathBuf {
        self.at(&self.witness)
    }

    /// Resolved proof path.
    #[must_use]
    pub fn proof_path(&self) -> PathBuf {
        self.at(&self.proof)
    }

    /// Resolved public-witness path.
    #[must_use]
    pub fn public_witness_path(&self) -> PathBuf {
        self.at(&self.public_witness)
    }

    /// Resolved calldata path.
    #[must_use]
    pub fn calldata_path(&self) -> PathBuf {
        self.at(&self.calldata)
    }

    /// Resolved verifier-contract path for `backend`.
    #[must_use]
    pub fn contract_path(&self, backend: Backend) -> PathBuf {
        match backend {
            Backend::Plonk => self.at(&self.plonk_contract),
            Backend::Groth16 => self.at(&self.groth16_contract),
        }
    }

    /// Resolved SRS path.
    #[must_use]
    pub fn srs_path(&self) -> PathBuf {
        self.at(&self.srs)
    }
}

/// Ensure the parent directory for a file exists (no-op if none).
fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn write_then_rename(path: &Path, bytes: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let tmp = temp_sibling(path);
    let result = (|| {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Atomically replace `path` with `bytes`.
///
/// # Errors
/// [`PipelineError::ArtifactWriteFailed`] on any I/O failure.
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> PipelineResult<()> {
    let path = path.as_ref();
    write_then_rename(path, bytes).map_err(|source| PipelineError::ArtifactWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
    Ok(())
}

/// Remove an artifact left over from an earlier run. Returns whether a file
/// was removed.
///
/// # Errors
/// [`PipelineError::ArtifactWriteFailed`] if the file exists but cannot be
/// removed.
pub fn remove_stale(path: impl AsRef<Path>) -> PipelineResult<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "stale artifact removed");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(PipelineError::ArtifactWriteFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read a persisted artifact.
///
/// # Errors
/// - [`PipelineError::MissingArtifact`] if the file does not exist,
/// - [`PipelineError::CorruptArtifact`] for any other read failure.
pub fn read_artifact(path: impl AsRef<Path>) -> PipelineResult<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PipelineError::MissingArtifact {
            path: path.to_path_buf(),
        },
        _ => PipelineError::corrupt(path, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("snarkwrap-{name}-{nanos}"))
    }

    #[test]
    fn default_names() {
        let l = StorageLayout::in_dir("build");
        assert_eq!(l.proving_key_path(), PathBuf::from("build/proving.key"));
        assert_eq!(
            l.contract_path(Backend::Plonk),
            PathBuf::from("build/contracts/PlonkVerifier.sol")
        );
        assert_eq!(l.srs_path(), PathBuf::from("build/srs_setup"));
    }

    #[test]
    fn absolute_names_override_dir() {
        let mut l = StorageLayout::in_dir("build");
        l.srs = PathBuf::from("/opt/srs");
        assert_eq!(l.srs_path(), PathBuf::from("/opt/srs"));
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp() {
        let dir = tmp_dir("atomic");
        let path = dir.join("nested").join("proof");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(read_artifact(&path).unwrap(), b"second");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn stale_removal_tolerates_absent_files() {
        let dir = tmp_dir("stale");
        let path = dir.join("public_witness");
        assert!(!remove_stale(&path).unwrap());
        write_atomic(&path, b"old").unwrap();
        assert!(remove_stale(&path).unwrap());
        assert!(!path.exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_file_is_missing_artifact() {
        let err = read_artifact(tmp_dir("missing").join("proving.key")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArtifact);
    }

    #[test]
    fn write_into_a_file_path_fails() {
        let dir = tmp_dir("blocked");
        fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let err = write_atomic(blocker.join("proof"), b"y").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArtifactWriteFailed);
        let _ = fs::remove_dir_all(dir);
    }
}
