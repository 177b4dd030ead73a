//! Groth16 key generation: authentic and dummy.
//!
//! - [`setup`] runs the circuit-specific setup with a fresh OS-RNG trapdoor.
//!   The toxic waste lives only inside the arkworks call.
//! - [`dummy_setup`] builds a proving key of the right *shape* whose every
//!   G1 element is one random point and every G2 element another. Proving
//!   with it costs the same as with a real key, which is all it is for. It
//!   has no verifying key, and the resulting [`KeyPair<Groth16, Dummy>`]
//!   cannot produce verifiable proofs.

use ark_bn254::{Bn254, G1Projective, G2Projective};
use ark_ec::CurveGroup;
use ark_groth16::{Groth16 as ArkGroth16, ProvingKey, VerifyingKey};
use ark_snark::SNARK;
use ark_std::UniformRand;
use rand::rngs::OsRng;
use snarkwrap_core::{
    Backend, ConstraintSystem, Dummy, KeyPair, PipelineError, PipelineResult, Trusted,
};
use tracing::{debug, warn};

use crate::r1cs::{shape, R1csCircuit};
use crate::Groth16;

fn require_groth16(cs: &ConstraintSystem) -> PipelineResult<()> {
    if cs.backend() == Backend::Groth16 {
        Ok(())
    } else {
        Err(PipelineError::SetupFailed(format!(
            "constraint system was compiled for {}, not groth16",
            cs.backend()
        )))
    }
}

/// Authentic circuit-specific setup.
pub fn setup(cs: &ConstraintSystem) -> PipelineResult<KeyPair<Groth16, Trusted>> {
    require_groth16(cs)?;
    let (pk, vk) = ArkGroth16::<Bn254>::circuit_specific_setup(R1csCircuit::for_setup(cs), &mut OsRng)
        .map_err(|e| PipelineError::SetupFailed(e.to_string()))?;
    debug!(
        circuit = cs.name(),
        a_query = pk.a_query.len(),
        h_query = pk.h_query.len(),
        "groth16 setup complete"
    );
    Ok(KeyPair::new(pk, vk))
}

/// Insecure, shape-correct proving key for cost measurement.
pub fn dummy_setup(cs: &ConstraintSystem) -> PipelineResult<KeyPair<Groth16, Dummy>> {
    require_groth16(cs)?;
    let s = shape(cs).map_err(|e| PipelineError::SetupFailed(e.to_string()))?;

    let mut rng = OsRng;
    let g1 = G1Projective::rand(&mut rng).into_affine();
    let g2 = G2Projective::rand(&mut rng).into_affine();

    let num_vars = s.num_instance + s.num_witness;
    let vk = VerifyingKey::<Bn254> {
        alpha_g1: g1,
        beta_g2: g2,
        gamma_g2: g2,
        delta_g2: g2,
        gamma_abc_g1: vec![g1; s.num_instance],
    };
    let pk = ProvingKey::<Bn254> {
        vk,
        beta_g1: g1,
        delta_g1: g1,
        a_query: vec![g1; num_vars],
        b_g1_query: vec![g1; num_vars],
        b_g2_query: vec![g2; num_vars],
        h_query: vec![g1; s.domain_size() - 1],
        l_query: vec![g1; s.num_witness],
    };
    warn!(
        circuit = cs.name(),
        constraints = s.num_constraints,
        "dummy groth16 setup: proofs from this key are not verifiable"
    );
    Ok(KeyPair::dummy(pk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use snarkwrap_core::{compile, CircuitDefinition};

    #[test]
    fn dummy_key_matches_real_key_shape() {
        let def = CircuitDefinition::from_json_str(include_str!("../../../demos/cubic/circuit.json"))
            .unwrap();
        let cs = compile(&def, Backend::Groth16).unwrap();
        let real = setup(&cs).unwrap();
        let dummy = dummy_setup(&cs).unwrap();
        let (r, d) = (real.proving_key(), dummy.proving_key());
        assert_eq!(r.a_query.len(), d.a_query.len());
        assert_eq!(r.b_g1_query.len(), d.b_g1_query.len());
        assert_eq!(r.b_g2_query.len(), d.b_g2_query.len());
        assert_eq!(r.h_query.len(), d.h_query.len());
        assert_eq!(r.l_query.len(), d.l_query.len());
        assert_eq!(r.vk.gamma_abc_g1.len(), d.vk.gamma_abc_g1.len());
    }

    #[test]
    fn wrong_backend_is_a_setup_failure() {
        let def = CircuitDefinition::from_json_str(include_str!("../../../demos/cubic/circuit.json"))
            .unwrap();
        let cs = compile(&def, Backend::Plonk).unwrap();
        let err = setup(&cs).err().unwrap();
        assert_eq!(err.kind(), snarkwrap_core::ErrorKind::SetupFailed);
    }
}
