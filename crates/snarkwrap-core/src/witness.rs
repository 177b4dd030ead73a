//! Witness construction and the binary witness format.
//!
//! A [`Witness`] holds values for the declared public and secret slots of a
//! [`ConstraintSystem`]; internal wires are never part of it (the solver
//! derives them). [`Witness::public`] projects the public half, which is what
//! local verification and the on-chain verifier consume.
//!
//! ## Binary format
//! ```text
//! [nbPublic:u32 BE][nbSecret:u32 BE][nbTotal:u32 BE][nbTotal × 32-byte BE elements]
//! ```
//! Public values come first. The public witness uses `nbSecret = 0`, and
//! [`strip_witness_header`] drops the 12-byte header to leave the `N × 32`
//! byte string the verifier contract reads.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::field::{self, Fr, FIELD_BYTES};
use crate::{ConstraintSystem, PipelineError, PipelineResult};

/// Size of the binary witness header.
pub const WITNESS_HEADER_BYTES: usize = 12;

/// Externally supplied witness values (decimal strings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WitnessInputs {
    /// Values for the public slots, in declaration order.
    pub public_inputs: Vec<String>,
    /// Values for the secret slots, in declaration order.
    #[serde(default)]
    pub auxiliary: Vec<String>,
}

impl WitnessInputs {
    /// Compare value counts with the slots `cs` declares. No parsing.
    pub fn check_shape(&self, cs: &ConstraintSystem) -> PipelineResult<()> {
        if self.public_inputs.len() != cs.nb_public() || self.auxiliary.len() != cs.nb_secret() {
            return Err(PipelineError::WitnessShapeMismatch(format!(
                "circuit declares {}/{} public/secret inputs, got {}/{}",
                cs.nb_public(),
                cs.nb_secret(),
                self.public_inputs.len(),
                self.auxiliary.len()
            )));
        }
        Ok(())
    }

    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> PipelineResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| PipelineError::InvalidInput(format!("witness inputs JSON: {e}")))
    }

    /// Read from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::InvalidInput(format!("read {}: {e}", path.display())))?;
        Self::from_json_str(&s)
    }

    fn parse(label: &str, values: &[String]) -> PipelineResult<Vec<Fr>> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                field::parse_decimal(v)
                    .map_err(|e| PipelineError::InvalidInput(format!("{label}[{i}]: {e}")))
            })
            .collect()
    }
}

/// Public + secret assignment for one proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    public: Vec<Fr>,
    secret: Vec<Fr>,
}

impl Witness {
    /// Map values onto the declared slots of `cs`.
    ///
    /// # Errors
    /// [`PipelineError::WitnessShapeMismatch`] if either count differs from
    /// the declaration.
    pub fn build(
        cs: &ConstraintSystem,
        public_inputs: Vec<Fr>,
        auxiliary: Vec<Fr>,
    ) -> PipelineResult<Self> {
        if public_inputs.len() != cs.nb_public() {
            return Err(PipelineError::WitnessShapeMismatch(format!(
                "circuit declares {} public inputs, got {}",
                cs.nb_public(),
                public_inputs.len()
            )));
        }
        if auxiliary.len() != cs.nb_secret() {
            return Err(PipelineError::WitnessShapeMismatch(format!(
                "circuit declares {} secret inputs, got {}",
                cs.nb_secret(),
                auxiliary.len()
            )));
        }
        Ok(Self {
            public: public_inputs,
            secret: auxiliary,
        })
    }

    /// Parse decimal inputs, then [`Witness::build`].
    ///
    /// Counts are checked before parsing so a shape error wins over a value
    /// error.
    pub fn from_inputs(cs: &ConstraintSystem, inputs: &WitnessInputs) -> PipelineResult<Self> {
        inputs.check_shape(cs)?;
        let public = WitnessInputs::parse("public_inputs", &inputs.public_inputs)?;
        let secret = WitnessInputs::parse("auxiliary", &inputs.auxiliary)?;
        Self::build(cs, public, secret)
    }

    /// Public slot values.
    #[must_use]
    pub fn public_values(&self) -> &[Fr] {
        &self.public
    }

    /// Secret slot values.
    #[must_use]
    pub fn secret_values(&self) -> &[Fr] {
        &self.secret
    }

    /// Public projection.
    #[must_use]
    pub fn public(&self) -> PublicWitness {
        PublicWitness::new(self.public.clone())
    }

    /// Binary encoding of the full witness.
    #[must_use]
    pub fn marshal_binary(&self) -> Vec<u8> {
        marshal(&self.public, &self.secret)
    }

    /// Decode a full witness produced by [`Witness::marshal_binary`].
    pub fn unmarshal_binary(bytes: &[u8]) -> Result<Self> {
        let (public, secret) = unmarshal(bytes)?;
        Ok(Self { public, secret })
    }
}

/// Public-only projection of a [`Witness`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicWitness {
    values: Vec<Fr>,
}

impl PublicWitness {
    /// Wrap public values.
    #[must_use]
    pub fn new(values: Vec<Fr>) -> Self {
        Self { values }
    }

    /// Values in declaration order.
    #[must_use]
    pub fn values(&self) -> &[Fr] {
        &self.values
    }

    /// Number of public values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no public values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Binary encoding with `nbSecret = 0`.
    #[must_use]
    pub fn marshal_binary(&self) -> Vec<u8> {
        marshal(&self.values, &[])
    }

    /// Decode a public witness; rejects encodings that carry secret values.
    pub fn unmarshal_binary(bytes: &[u8]) -> Result<Self> {
        let (values, secret) = unmarshal(bytes)?;
        ensure!(secret.is_empty(), "public witness carries {} secret values", secret.len());
        Ok(Self { values })
    }
}

fn marshal(public: &[Fr], secret: &[Fr]) -> Vec<u8> {
    let total = public.len() + secret.len();
    let mut out = Vec::with_capacity(WITNESS_HEADER_BYTES + total * FIELD_BYTES);
    for n in [public.len(), secret.len(), total] {
        // Counts beyond u32 cannot come out of `compile`.
        out.extend_from_slice(&u32::try_from(n).unwrap_or(u32::MAX).to_be_bytes());
    }
    for v in public.iter().chain(secret) {
        out.extend_from_slice(&field::to_be_bytes(v));
    }
    out
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&bytes[at..at + 4]);
    u32::from_be_bytes(b)
}

/// Parse and validate the 12-byte header; returns `(nbPublic, nbSecret)`.
fn header(bytes: &[u8]) -> Result<(usize, usize)> {
    ensure!(
        bytes.len() >= WITNESS_HEADER_BYTES,
        "witness shorter than its {WITNESS_HEADER_BYTES}-byte header"
    );
    let nb_public = read_u32(bytes, 0) as usize;
    let nb_secret = read_u32(bytes, 4) as usize;
    let total = read_u32(bytes, 8) as usize;
    ensure!(
        nb_public + nb_secret == total,
        "witness header inconsistent: {nb_public} + {nb_secret} != {total}"
    );
    let body = bytes.len() - WITNESS_HEADER_BYTES;
    ensure!(
        body == total * FIELD_BYTES,
        "witness body is {body} bytes, header announces {total} elements"
    );
    Ok((nb_public, nb_secret))
}

fn unmarshal(bytes: &[u8]) -> Result<(Vec<Fr>, Vec<Fr>)> {
    let (nb_public, _) = header(bytes)?;
    let mut values = bytes[WITNESS_HEADER_BYTES..]
        .chunks_exact(FIELD_BYTES)
        .enumerate()
        .map(|(i, c)| field::from_be_bytes(c).with_context(|| format!("witness element {i}")))
        .collect::<Result<Vec<_>>>()?;
    let secret = values.split_off(nb_public);
    Ok((values, secret))
}

/// Drop the 12-byte header of a binary witness after checking it.
///
/// The remainder is exactly `nbTotal × 32` bytes.
pub fn strip_witness_header(bytes: &[u8]) -> Result<&[u8]> {
    header(bytes)?;
    Ok(&bytes[WITNESS_HEADER_BYTES..])
}
