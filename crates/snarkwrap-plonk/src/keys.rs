//! PLONK key types and their byte encodings.
//!
//! halo2 keys do not carry the commitment parameters, but both proving and
//! verifying need them, so each key here bundles the SRS trimmed to the
//! circuit size. Encodings:
//!
//! ```text
//! proving:   [params_len:u32 LE][ParamsKZG raw][ProvingKey RawBytes]
//! verifying: [n_public:u32 LE][params_len:u32 LE][ParamsKZG raw][VerifyingKey RawBytes]
//! ```

use std::io::{Cursor, Read};

use anyhow::{ensure, Context, Result};
use halo2_proofs::halo2curves::bn256::{Bn256, G1Affine};
use halo2_proofs::plonk::{ProvingKey, VerifyingKey};
use halo2_proofs::poly::commitment::Params;
use halo2_proofs::poly::kzg::commitment::ParamsKZG;
use halo2_proofs::SerdeFormat;
use snarkwrap_core::ConstraintSystem;

use crate::circuit::GateCircuit;

/// Proving key plus the parameters it was generated against.
#[derive(Debug)]
pub struct PlonkProvingKey {
    pub(crate) params: ParamsKZG<Bn256>,
    pub(crate) pk: ProvingKey<G1Affine>,
}

/// Verifying key plus parameters and the public-input count.
#[derive(Debug, Clone)]
pub struct PlonkVerifyingKey {
    pub(crate) n_public: usize,
    pub(crate) params: ParamsKZG<Bn256>,
    pub(crate) vk: VerifyingKey<G1Affine>,
}

impl PlonkProvingKey {
    /// Circuit size exponent.
    #[must_use]
    pub fn k(&self) -> u32 {
        self.params.k()
    }
}

impl PlonkVerifyingKey {
    /// Circuit size exponent.
    #[must_use]
    pub fn k(&self) -> u32 {
        self.params.k()
    }

    /// Number of public inputs.
    #[must_use]
    pub fn n_public(&self) -> usize {
        self.n_public
    }

    /// halo2 verifying-key bytes (no parameters).
    pub fn vk_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.vk
            .write(&mut out, SerdeFormat::RawBytes)
            .context("encode halo2 verifying key")?;
        Ok(out)
    }
}

fn put_len(out: &mut Vec<u8>, n: usize) -> Result<()> {
    let n = u32::try_from(n).context("length does not fit in u32")?;
    out.extend_from_slice(&n.to_le_bytes());
    Ok(())
}

fn take_len(rd: &mut Cursor<&[u8]>) -> Result<usize> {
    let mut b = [0u8; 4];
    rd.read_exact(&mut b).context("truncated length prefix")?;
    Ok(u32::from_le_bytes(b) as usize)
}

fn write_params(out: &mut Vec<u8>, params: &ParamsKZG<Bn256>) -> Result<()> {
    let mut p = Vec::new();
    params.write(&mut p).context("encode KZG parameters")?;
    put_len(out, p.len())?;
    out.extend_from_slice(&p);
    Ok(())
}

fn read_params(rd: &mut Cursor<&[u8]>) -> Result<ParamsKZG<Bn256>> {
    let len = take_len(rd)?;
    let remaining = rd.get_ref().len() - rd.position() as usize;
    ensure!(len <= remaining, "parameter block claims {len} bytes, {remaining} left");
    let start = rd.position() as usize;
    let slice = &rd.get_ref()[start..start + len];
    let params = crate::Srs::from_bytes(slice)?.into_params();
    rd.set_position((start + len) as u64);
    Ok(params)
}

fn ensure_consumed(rd: &Cursor<&[u8]>, what: &str) -> Result<()> {
    let left = rd.get_ref().len() - rd.position() as usize;
    ensure!(left == 0, "{left} trailing bytes after {what}");
    Ok(())
}

pub(crate) fn encode_pk(key: &PlonkProvingKey) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_params(&mut out, &key.params)?;
    key.pk
        .write(&mut out, SerdeFormat::RawBytes)
        .context("encode halo2 proving key")?;
    Ok(out)
}

pub(crate) fn decode_pk(bytes: &[u8]) -> Result<PlonkProvingKey> {
    let mut rd = Cursor::new(bytes);
    let params = read_params(&mut rd)?;
    let pk = ProvingKey::<G1Affine>::read::<_, GateCircuit>(&mut rd, SerdeFormat::RawBytes)
        .context("decode halo2 proving key")?;
    ensure_consumed(&rd, "proving key")?;
    Ok(PlonkProvingKey { params, pk })
}

pub(crate) fn encode_vk(key: &PlonkVerifyingKey) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    put_len(&mut out, key.n_public)?;
    write_params(&mut out, &key.params)?;
    out.extend_from_slice(&key.vk_bytes()?);
    Ok(out)
}

pub(crate) fn decode_vk(cs: &ConstraintSystem, bytes: &[u8]) -> Result<PlonkVerifyingKey> {
    let mut rd = Cursor::new(bytes);
    let n_public = take_len(&mut rd)?;
    ensure!(
        n_public == cs.nb_public(),
        "verifying key expects {n_public} public inputs, circuit declares {}",
        cs.nb_public()
    );
    let params = read_params(&mut rd)?;
    let vk = VerifyingKey::<G1Affine>::read::<_, GateCircuit>(&mut rd, SerdeFormat::RawBytes)
        .context("decode halo2 verifying key")?;
    ensure_consumed(&rd, "verifying key")?;
    Ok(PlonkVerifyingKey {
        n_public,
        params,
        vk,
    })
}
