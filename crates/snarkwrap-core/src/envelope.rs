//! Self-describing wrapper around persisted key bytes.
//!
//! ```text
//! [magic "SWK1":4][backend:1][role:1][fingerprint:32][payload...]
//! ```
//!
//! The fingerprint is [`ConstraintSystem::fingerprint`](crate::ConstraintSystem::fingerprint)
//! at the time the key was generated. A loader compares all three header
//! fields against the current run so a key produced for another backend,
//! another role, or a since-edited circuit is refused instead of silently
//! reused.

use anyhow::{anyhow, ensure, Result};

use crate::Backend;

/// File magic for key envelopes.
pub const ENVELOPE_MAGIC: [u8; 4] = *b"SWK1";

/// Header length in bytes.
pub const ENVELOPE_HEADER_BYTES: usize = 4 + 1 + 1 + 32;

/// Which half of a key pair an envelope holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// Proving key.
    Proving,
    /// Verifying key.
    Verifying,
    /// Proving key from the insecure dummy setup. Never accepted by a load.
    DummyProving,
}

impl KeyRole {
    const fn tag(self) -> u8 {
        match self {
            Self::Proving => 1,
            Self::Verifying => 2,
            Self::DummyProving => 3,
        }
    }

    fn from_tag(t: u8) -> Option<Self> {
        match t {
            1 => Some(Self::Proving),
            2 => Some(Self::Verifying),
            3 => Some(Self::DummyProving),
            _ => None,
        }
    }

    /// Lowercase label for diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Proving => "proving key",
            Self::Verifying => "verifying key",
            Self::DummyProving => "dummy proving key",
        }
    }
}

/// Decoded envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEnvelope {
    /// Backend that produced the key.
    pub backend: Backend,
    /// Key role.
    pub role: KeyRole,
    /// Constraint-system fingerprint the key belongs to.
    pub fingerprint: [u8; 32],
    /// Backend-encoded key.
    pub payload: Vec<u8>,
}

impl KeyEnvelope {
    /// Serialize header and payload.
    #[must_use]
    pub fn seal(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENVELOPE_HEADER_BYTES + self.payload.len());
        out.extend_from_slice(&ENVELOPE_MAGIC);
        out.push(self.backend.tag());
        out.push(self.role.tag());
        out.extend_from_slice(&self.fingerprint);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse an envelope. Fails on truncation, bad magic or unknown tags.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() >= ENVELOPE_HEADER_BYTES,
            "file is {} bytes, shorter than the key header",
            bytes.len()
        );
        ensure!(bytes[..4] == ENVELOPE_MAGIC, "not a snarkwrap key file (bad magic)");
        let backend = Backend::from_tag(bytes[4])
            .ok_or_else(|| anyhow!("unknown backend tag {}", bytes[4]))?;
        let role =
            KeyRole::from_tag(bytes[5]).ok_or_else(|| anyhow!("unknown key role tag {}", bytes[5]))?;
        let mut fingerprint = [0u8; 32];
        fingerprint.copy_from_slice(&bytes[6..ENVELOPE_HEADER_BYTES]);
        Ok(Self {
            backend,
            role,
            fingerprint,
            payload: bytes[ENVELOPE_HEADER_BYTES..].to_vec(),
        })
    }

    /// Compare the header against what the current run expects.
    ///
    /// Returns a human-readable reason on mismatch.
    pub fn check(
        &self,
        backend: Backend,
        role: KeyRole,
        fingerprint: &[u8; 32],
    ) -> std::result::Result<(), String> {
        if self.backend != backend {
            return Err(format!(
                "key was generated for the {} backend, this run uses {backend}",
                self.backend
            ));
        }
        if self.role != role {
            return Err(format!("expected a {}, found a {}", role.label(), self.role.label()));
        }
        if &self.fingerprint != fingerprint {
            return Err(format!(
                "key belongs to constraint system {}, current is {} (stale key, rerun setup)",
                hex::encode(self.fingerprint),
                hex::encode(fingerprint)
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> KeyEnvelope {
        KeyEnvelope {
            backend: Backend::Groth16,
            role: KeyRole::Verifying,
            fingerprint: [7u8; 32],
            payload: vec![1, 2, 3],
        }
    }

    #[test]
    fn seal_open() {
        let bytes = env().seal();
        assert_eq!(&bytes[..4], b"SWK1");
        assert_eq!(bytes.len(), ENVELOPE_HEADER_BYTES + 3);
        assert_eq!(KeyEnvelope::open(&bytes).unwrap(), env());
    }

    #[test]
    fn open_rejects_garbage() {
        assert!(KeyEnvelope::open(b"SWK1").is_err());
        let mut bytes = env().seal();
        bytes[0] = b'X';
        assert!(KeyEnvelope::open(&bytes).is_err());
        let mut bytes = env().seal();
        bytes[4] = 9;
        assert!(KeyEnvelope::open(&bytes).is_err());
    }

    #[test]
    fn check_reports_each_mismatch() {
        let e = env();
        assert!(e.check(Backend::Groth16, KeyRole::Verifying, &[7u8; 32]).is_ok());
        assert!(e
            .check(Backend::Plonk, KeyRole::Verifying, &[7u8; 32])
            .unwrap_err()
            .contains("groth16"));
        assert!(e.check(Backend::Groth16, KeyRole::Proving, &[7u8; 32]).is_err());
        let dummy = KeyEnvelope {
            role: KeyRole::DummyProving,
            ..env()
        };
        let reopened = KeyEnvelope::open(&dummy.seal()).unwrap();
        assert!(reopened
            .check(Backend::Groth16, KeyRole::Proving, &[7u8; 32])
            .unwrap_err()
            .contains("dummy proving key"));
        assert!(e
            .check(Backend::Groth16, KeyRole::Verifying, &[8u8; 32])
            .unwrap_err()
            .contains("stale"));
    }
}
