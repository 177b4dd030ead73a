//! Structured reference string handling.
//!
//! The SRS is a KZG parameter file in halo2's raw `ParamsKZG` format. The
//! pipeline only ever *loads* one; [`Srs::unsafe_setup`] exists for tests
//! and local experiments and knows its own trapdoor.

use std::io::Cursor;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use halo2_proofs::halo2curves::bn256::Bn256;
use halo2_proofs::poly::commitment::Params;
use halo2_proofs::poly::kzg::commitment::ParamsKZG;
use rand::RngCore;
use snarkwrap_core::{PipelineError, PipelineResult};
use tracing::debug;

/// Two-adicity of the BN254 scalar field.
const MAX_K: u32 = 28;

/// KZG parameters for BN254.
#[derive(Debug, Clone)]
pub struct Srs {
    params: ParamsKZG<Bn256>,
}

impl Srs {
    /// Load an SRS file.
    ///
    /// # Errors
    /// [`PipelineError::MissingSrs`] if the file does not exist,
    /// [`PipelineError::CorruptArtifact`] if it does not decode.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::MissingSrs {
                path: path.to_path_buf(),
            },
            _ => PipelineError::corrupt(path, e),
        })?;
        let srs = Self::from_bytes(&bytes)
            .map_err(|e| PipelineError::corrupt(path, format!("{e:#}")))?;
        debug!(path = %path.display(), k = srs.k(), "loaded SRS");
        Ok(srs)
    }

    /// Decode raw `ParamsKZG` bytes.
    ///
    /// The size exponent is checked against the file length before decoding
    /// so a garbage header cannot trigger a huge allocation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ensure!(bytes.len() >= 4, "SRS file is truncated");
        let k = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        ensure!(k <= MAX_K, "SRS claims k = {k}, BN254 supports at most {MAX_K}");
        // Two G1 vectors of 2^k points, at least 32 bytes per point.
        let min_len = 4 + (2usize << k) * 32;
        ensure!(
            bytes.len() >= min_len,
            "SRS file is {} bytes, k = {k} needs at least {min_len}",
            bytes.len()
        );
        let mut rd = Cursor::new(bytes);
        let params = ParamsKZG::<Bn256>::read(&mut rd).context("decode KZG parameters")?;
        Ok(Self { params })
    }

    /// Encode as raw `ParamsKZG` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.params.write(&mut out).context("encode KZG parameters")?;
        Ok(out)
    }

    /// Insecure SRS from a locally sampled trapdoor. Test and demo use only.
    #[must_use]
    pub fn unsafe_setup(k: u32, rng: impl RngCore) -> Self {
        Self {
            params: ParamsKZG::<Bn256>::setup(k, rng),
        }
    }

    pub(crate) fn into_params(self) -> ParamsKZG<Bn256> {
        self.params
    }

    /// Size exponent (the SRS supports circuits up to `2^k` rows).
    #[must_use]
    pub fn k(&self) -> u32 {
        self.params.k()
    }

    /// Parameters trimmed to exactly `2^k` rows.
    ///
    /// # Errors
    /// [`PipelineError::SetupFailed`] if the SRS is smaller than `2^k`.
    pub fn downsized(&self, k: u32) -> PipelineResult<ParamsKZG<Bn256>> {
        if self.k() < k {
            return Err(PipelineError::SetupFailed(format!(
                "SRS supports 2^{} rows, circuit needs 2^{k}",
                self.k()
            )));
        }
        let mut params = self.params.clone();
        if params.k() > k {
            params.downsize(k);
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn bytes_round_trip_and_downsize() {
        let srs = Srs::unsafe_setup(5, OsRng);
        let back = Srs::from_bytes(&srs.to_bytes().unwrap()).unwrap();
        assert_eq!(back.k(), 5);
        assert_eq!(srs.downsized(4).unwrap().k(), 4);
        assert_eq!(srs.downsized(5).unwrap().k(), 5);
        let err = srs.downsized(6).unwrap_err();
        assert_eq!(err.kind(), snarkwrap_core::ErrorKind::SetupFailed);
    }

    #[test]
    fn missing_and_corrupt_files() {
        let dir = std::env::temp_dir().join(format!(
            "snarkwrap-srs-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let err = Srs::load(dir.join("srs_setup")).unwrap_err();
        assert_eq!(err.kind(), snarkwrap_core::ErrorKind::MissingSrs);

        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("srs_setup"), b"definitely not params").unwrap();
        let err = Srs::load(dir.join("srs_setup")).unwrap_err();
        assert_eq!(err.kind(), snarkwrap_core::ErrorKind::CorruptArtifact);
        let _ = std::fs::remove_dir_all(dir);
    }
}
