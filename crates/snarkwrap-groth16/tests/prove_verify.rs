//! End-to-end Groth16: setup → prove → verify on the cubic demo circuit.
//!
//! Purpose:
//! - accepted proofs for a satisfying witness,
//! - rejection of a tampered public witness,
//! - byte-identical key round trips that still prove and verify,
//! - dummy keys that prove but carry no verifying key.

#![allow(clippy::unwrap_used)]

use snarkwrap_core::{
    compile, prove, Backend, CircuitDefinition, ConstraintSystem, ErrorKind, Fr, KeyPair,
    ProofSystem, PublicWitness, Trusted, Witness,
};
use snarkwrap_groth16::{dummy_setup, setup, Groth16, Groth16Calldata, RAW_PROOF_BYTES};

fn cubic() -> ConstraintSystem {
    let def =
        CircuitDefinition::from_json_str(include_str!("../../../demos/cubic/circuit.json")).unwrap();
    compile(&def, Backend::Groth16).unwrap()
}

fn witness(cs: &ConstraintSystem, x: u64) -> Witness {
    let y = x * x * x + x + 5;
    Witness::build(cs, vec![Fr::from(y)], vec![Fr::from(x)]).unwrap()
}

#[test]
fn proof_verifies_and_tampered_public_input_is_rejected() {
    let cs = cubic();
    let keys = setup(&cs).unwrap();
    let w = witness(&cs, 3);

    let proof = prove(&cs, &keys, &w).unwrap();
    assert!(Groth16::verify(keys.verifying_key(), proof.inner(), &w.public()).unwrap());

    let tampered = PublicWitness::new(vec![Fr::from(36u64)]);
    assert!(!Groth16::verify(keys.verifying_key(), proof.inner(), &tampered).unwrap());

    let err = proof.verify(&keys, tampered).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ProofRejectedLocally);
}

#[test]
fn unsatisfying_witness_fails_before_proving() {
    let cs = cubic();
    let keys = setup(&cs).unwrap();
    let bad = Witness::build(&cs, vec![Fr::from(35u64)], vec![Fr::from(4u64)]).unwrap();
    let err = prove(&cs, &keys, &bad).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ProvingFailed);
}

#[test]
fn keys_round_trip_byte_identical_and_still_work() {
    let cs = cubic();
    let (pk, vk) = setup(&cs).unwrap().into_parts();

    let pk_bytes = Groth16::encode_proving_key(&pk).unwrap();
    let vk_bytes = Groth16::encode_verifying_key(&vk).unwrap();
    let pk2 = Groth16::decode_proving_key(&cs, &pk_bytes).unwrap();
    let vk2 = Groth16::decode_verifying_key(&cs, &vk_bytes).unwrap();
    assert_eq!(Groth16::encode_proving_key(&pk2).unwrap(), pk_bytes);
    assert_eq!(Groth16::encode_verifying_key(&vk2).unwrap(), vk_bytes);

    let keys = KeyPair::<Groth16, Trusted>::new(pk2, vk2);
    let w = witness(&cs, 7);
    let verified = prove(&cs, &keys, &w).unwrap().verify(&keys, w.public()).unwrap();

    let raw = Groth16::contract_proof(verified.proof()).unwrap();
    assert_eq!(raw.len(), RAW_PROOF_BYTES);
    let cd = Groth16Calldata::from_raw(&raw).unwrap();
    assert_eq!(cd.a[0], num_bigint::BigUint::from_bytes_be(&raw[..32]));

    let native = Groth16::encode_proof(verified.proof()).unwrap();
    assert_eq!(Groth16::decode_proof(&native).unwrap(), *verified.proof());
}

#[test]
fn truncated_key_does_not_decode() {
    let cs = cubic();
    let (_, vk) = setup(&cs).unwrap().into_parts();
    let bytes = Groth16::encode_verifying_key(&vk).unwrap();
    assert!(Groth16::decode_verifying_key(&cs, &bytes[..bytes.len() - 1]).is_err());
}

#[test]
fn dummy_keys_prove() {
    let cs = cubic();
    let keys = dummy_setup(&cs).unwrap();
    let proof = prove(&cs, &keys, &witness(&cs, 2)).unwrap();
    assert!(!proof.encode().unwrap().is_empty());
}

#[test]
fn contract_embeds_verifying_key() {
    let cs = cubic();
    let keys = setup(&cs).unwrap();
    let sol = Groth16::export_verifier_contract(keys.verifying_key()).unwrap();
    assert!(sol.contains("contract Groth16Verifier"));
    assert!(sol.contains("N_PUBLIC = 1;"));
    assert!(sol.contains("ic[1] = [uint256("));
    assert!(!sol.contains("<%"));
}
