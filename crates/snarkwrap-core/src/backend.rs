//! Backend abstraction for setup-independent proving and verification.
//!
//! A [`ProofSystem`] is a stateless type (associated functions only) that
//! knows how to prove over a solved [`Assignment`], verify against a
//! [`PublicWitness`], and encode its own keys and proofs. Setup is
//! backend-specific (the SRS-based system needs an SRS, the pairing-based one
//! can run a dummy setup) and lives in the backend crates.
//!
//! ## Setup provenance in the type system
//! Keys and proofs carry a [`SetupKind`] marker:
//! - [`Trusted`] key pairs hold a verifying key; their proofs can be verified
//!   and, once verified, become a [`VerifiedProof`].
//! - [`Dummy`] key pairs have no verifying key at all, so their proofs have
//!   no `verify` method and can never reach the on-chain serializer.
//!
//! Implementors should never panic on malformed inputs; decoding helpers
//! return `anyhow::Result` and the key store maps failures to
//! [`PipelineError::CorruptArtifact`].

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Assignment, ConstraintSystem, PipelineError, PipelineResult, PublicWitness, Witness};

/// Closed set of supported proof systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// PLONK with KZG commitments over BN254; needs an SRS.
    Plonk,
    /// Groth16 over BN254; supports authentic and dummy setup.
    Groth16,
}

impl Backend {
    /// All backends, in tag order.
    pub const ALL: [Self; 2] = [Self::Plonk, Self::Groth16];

    /// Stable one-byte tag used in key envelopes and fingerprints.
    #[inline]
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Plonk => 1,
            Self::Groth16 => 2,
        }
    }

    /// Inverse of [`Backend::tag`].
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.tag() == tag)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plonk => "plonk",
            Self::Groth16 => "groth16",
        }
    }

    /// Key plan used when none is configured: PLONK loads persisted keys,
    /// Groth16 runs a fresh setup.
    #[must_use]
    pub const fn default_key_plan(self) -> KeyPlan {
        match self {
            Self::Plonk => KeyPlan::Load,
            Self::Groth16 => KeyPlan::Setup,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plonk" => Ok(Self::Plonk),
            "groth16" => Ok(Self::Groth16),
            _ => Err(PipelineError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Where the key pair of a run comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPlan {
    /// Load persisted keys; fail if absent.
    Load,
    /// Run an authentic setup and persist its outputs.
    Setup,
    /// Run the insecure dummy setup (Groth16 only, benchmarking).
    DummySetup,
}

impl fmt::Display for KeyPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Setup => "setup",
            Self::DummySetup => "dummy-setup",
        })
    }
}

impl FromStr for KeyPlan {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "load" => Ok(Self::Load),
            "setup" => Ok(Self::Setup),
            "dummy-setup" | "dummy" => Ok(Self::DummySetup),
            other => Err(PipelineError::InvalidInput(format!(
                "unknown key plan `{other}` (expected load, setup or dummy-setup)"
            ))),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Trusted {}
    impl Sealed for super::Dummy {}
}

/// Marker trait for setup provenance. Sealed.
pub trait SetupKind: sealed::Sealed {
    /// Storage for the verifying key: the key itself, or nothing.
    type VerifyingSlot<V>;

    /// Whether proofs under this setup may be verified.
    const VERIFIABLE: bool;
}

/// Authentic setup: a verifying key exists.
#[derive(Debug, Clone, Copy)]
pub enum Trusted {}

/// Insecure dummy setup: no verifying key, proofs are for cost measurement.
#[derive(Debug, Clone, Copy)]
pub enum Dummy {}

impl SetupKind for Trusted {
    type VerifyingSlot<V> = V;
    const VERIFIABLE: bool = true;
}

impl SetupKind for Dummy {
    type VerifyingSlot<V> = ();
    const VERIFIABLE: bool = false;
}

/// Minimal backend API the pipeline depends on.
///
/// Backends are used as type parameters, e.g. `prove::<Groth16, Trusted>(..)`.
pub trait ProofSystem {
    /// Which [`Backend`] this implementation serves.
    const BACKEND: Backend;

    /// Proving key.
    type ProvingKey;
    /// Verifying key.
    type VerifyingKey;
    /// Native proof object.
    type Proof;

    /// Prove over a solved assignment.
    ///
    /// # Errors
    /// [`PipelineError::ProvingFailed`] if the backend prover fails.
    fn prove(
        cs: &ConstraintSystem,
        pk: &Self::ProvingKey,
        assignment: &Assignment,
    ) -> PipelineResult<Self::Proof>;

    /// Verify `proof` against `public`. `Ok(false)` means rejected.
    fn verify(
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public: &PublicWitness,
    ) -> PipelineResult<bool>;

    /// Serialize a proving key.
    fn encode_proving_key(pk: &Self::ProvingKey) -> anyhow::Result<Vec<u8>>;
    /// Deserialize a proving key for `cs`.
    fn decode_proving_key(cs: &ConstraintSystem, bytes: &[u8]) -> anyhow::Result<Self::ProvingKey>;
    /// Serialize a verifying key.
    fn encode_verifying_key(vk: &Self::VerifyingKey) -> anyhow::Result<Vec<u8>>;
    /// Deserialize a verifying key for `cs`.
    fn decode_verifying_key(
        cs: &ConstraintSystem,
        bytes: &[u8],
    ) -> anyhow::Result<Self::VerifyingKey>;

    /// Native proof encoding (round-trippable).
    fn encode_proof(proof: &Self::Proof) -> anyhow::Result<Vec<u8>>;

    /// Byte string the on-chain verifier consumes.
    fn contract_proof(proof: &Self::Proof) -> anyhow::Result<Vec<u8>>;

    /// Solidity source of the verifier contract for `vk`.
    fn export_verifier_contract(vk: &Self::VerifyingKey) -> anyhow::Result<String>;
}

/// Proving key plus (for [`Trusted`] setups) the matching verifying key.
pub struct KeyPair<S: ProofSystem, K: SetupKind> {
    pk: S::ProvingKey,
    vk: K::VerifyingSlot<S::VerifyingKey>,
}

impl<S: ProofSystem> KeyPair<S, Trusted> {
    /// Pair an authentic proving key with its verifying key.
    pub fn new(pk: S::ProvingKey, vk: S::VerifyingKey) -> Self {
        Self { pk, vk }
    }

    /// Verifying key.
    pub fn verifying_key(&self) -> &S::VerifyingKey {
        &self.vk
    }

    /// Split into `(pk, vk)`.
    pub fn into_parts(self) -> (S::ProvingKey, S::VerifyingKey) {
        (self.pk, self.vk)
    }
}

impl<S: ProofSystem> KeyPair<S, Dummy> {
    /// Wrap a dummy proving key. There is no verifying key.
    pub fn dummy(pk: S::ProvingKey) -> Self {
        Self { pk, vk: () }
    }
}

impl<S: ProofSystem, K: SetupKind> KeyPair<S, K> {
    /// Proving key.
    pub fn proving_key(&self) -> &S::ProvingKey {
        &self.pk
    }
}

/// Proof tagged with the provenance of the keys that produced it.
pub struct Proof<S: ProofSystem, K: SetupKind> {
    inner: S::Proof,
    _kind: PhantomData<K>,
}

impl<S: ProofSystem, K: SetupKind> Proof<S, K> {
    /// Native proof object.
    pub fn inner(&self) -> &S::Proof {
        &self.inner
    }

    /// Native (round-trippable) encoding.
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        S::encode_proof(&self.inner)
    }
}

impl<S: ProofSystem> Proof<S, Trusted> {
    /// Verify locally; only an accepted proof becomes a [`VerifiedProof`].
    ///
    /// # Errors
    /// [`PipelineError::ProofRejectedLocally`] if the backend rejects.
    pub fn verify(
        self,
        keys: &KeyPair<S, Trusted>,
        public: PublicWitness,
    ) -> PipelineResult<VerifiedProof<S>> {
        if S::verify(keys.verifying_key(), &self.inner, &public)? {
            Ok(VerifiedProof {
                proof: self.inner,
                public,
            })
        } else {
            Err(PipelineError::ProofRejectedLocally)
        }
    }
}

/// A proof that passed local verification, with its public witness.
pub struct VerifiedProof<S: ProofSystem> {
    proof: S::Proof,
    public: PublicWitness,
}

impl<S: ProofSystem> VerifiedProof<S> {
    /// Native proof object.
    pub fn proof(&self) -> &S::Proof {
        &self.proof
    }

    /// Public witness the proof was verified against.
    pub fn public_witness(&self) -> &PublicWitness {
        &self.public
    }
}

/// Solve `witness` against `cs`, then prove with `keys`.
///
/// The solver runs first, so an unsatisfying witness fails with
/// [`PipelineError::ProvingFailed`] before any backend work.
pub fn prove<S: ProofSystem, K: SetupKind>(
    cs: &ConstraintSystem,
    keys: &KeyPair<S, K>,
    witness: &Witness,
) -> PipelineResult<Proof<S, K>> {
    if cs.backend() != S::BACKEND {
        return Err(PipelineError::ProvingFailed(format!(
            "constraint system was compiled for {}, not {}",
            cs.backend(),
            S::BACKEND
        )));
    }
    let assignment = cs.solve(witness)?;
    let inner = S::prove(cs, keys.proving_key(), &assignment)?;
    Ok(Proof {
        inner,
        _kind: PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn backend_parsing() {
        assert_eq!("plonk".parse::<Backend>().unwrap(), Backend::Plonk);
        assert_eq!(" Groth16 ".parse::<Backend>().unwrap(), Backend::Groth16);
        let err = "marlin".parse::<Backend>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedBackend);
        assert!(err.to_string().contains("marlin"));
    }

    #[test]
    fn tags_round_trip() {
        for b in Backend::ALL {
            assert_eq!(Backend::from_tag(b.tag()), Some(b));
            assert_eq!(b.to_string().parse::<Backend>().unwrap(), b);
        }
        assert_eq!(Backend::from_tag(0), None);
    }

    #[test]
    fn key_plan_defaults_and_parsing() {
        assert_eq!(Backend::Plonk.default_key_plan(), KeyPlan::Load);
        assert_eq!(Backend::Groth16.default_key_plan(), KeyPlan::Setup);
        assert_eq!("dummy-setup".parse::<KeyPlan>().unwrap(), KeyPlan::DummySetup);
        assert_eq!(KeyPlan::DummySetup.to_string(), "dummy-setup");
        assert!("sometimes".parse::<KeyPlan>().is_err());
    }

    #[test]
    fn setup_kinds() {
        assert!(Trusted::VERIFIABLE);
        assert!(!Dummy::VERIFIABLE);
    }
}
