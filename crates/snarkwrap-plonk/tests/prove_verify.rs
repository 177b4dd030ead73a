//! End-to-end PLONK: SRS → setup → prove → verify on the cubic demo circuit.

#![allow(clippy::unwrap_used)]

use rand::rngs::OsRng;
use snarkwrap_core::{
    compile, prove, Backend, CircuitDefinition, ConstraintSystem, ErrorKind, Fr, KeyPair,
    ProofSystem, PublicWitness, Trusted, Witness,
};
use snarkwrap_plonk::{circuit_k, setup, Plonk, PlonkCalldata, Srs};

fn cubic() -> ConstraintSystem {
    let def =
        CircuitDefinition::from_json_str(include_str!("../../../demos/cubic/circuit.json")).unwrap();
    compile(&def, Backend::Plonk).unwrap()
}

fn witness(cs: &ConstraintSystem, x: u64) -> Witness {
    let y = x * x * x + x + 5;
    Witness::build(cs, vec![Fr::from(y)], vec![Fr::from(x)]).unwrap()
}

#[test]
fn proof_verifies_and_tampered_public_input_is_rejected() {
    let cs = cubic();
    let srs = Srs::unsafe_setup(circuit_k(&cs) + 1, OsRng);
    let keys = setup(&cs, &srs).unwrap();
    assert_eq!(keys.verifying_key().k(), circuit_k(&cs));

    let w = witness(&cs, 3);
    let proof = prove(&cs, &keys, &w).unwrap();
    assert!(Plonk::verify(keys.verifying_key(), proof.inner(), &w.public()).unwrap());

    let tampered = PublicWitness::new(vec![Fr::from(36u64)]);
    assert!(!Plonk::verify(keys.verifying_key(), proof.inner(), &tampered).unwrap());

    let mut flipped = proof.inner().clone();
    let mid = flipped.0.len() / 2;
    flipped.0[mid] ^= 1;
    assert!(!Plonk::verify(keys.verifying_key(), &flipped, &w.public()).unwrap());

    let mut padded = proof.inner().clone();
    padded.0.extend_from_slice(&[0u8; 32]);
    assert!(!Plonk::verify(keys.verifying_key(), &padded, &w.public()).unwrap());

    let err = proof.verify(&keys, tampered).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ProofRejectedLocally);
}

#[test]
fn keys_round_trip_byte_identical_and_still_work() {
    let cs = cubic();
    let srs = Srs::unsafe_setup(circuit_k(&cs), OsRng);
    let (pk, vk) = setup(&cs, &srs).unwrap().into_parts();

    let pk_bytes = Plonk::encode_proving_key(&pk).unwrap();
    let vk_bytes = Plonk::encode_verifying_key(&vk).unwrap();
    let pk2 = Plonk::decode_proving_key(&cs, &pk_bytes).unwrap();
    let vk2 = Plonk::decode_verifying_key(&cs, &vk_bytes).unwrap();
    assert_eq!(Plonk::encode_proving_key(&pk2).unwrap(), pk_bytes);
    assert_eq!(Plonk::encode_verifying_key(&vk2).unwrap(), vk_bytes);

    let keys = KeyPair::<Plonk, Trusted>::new(pk2, vk2);
    let w = witness(&cs, 5);
    let verified = prove(&cs, &keys, &w).unwrap().verify(&keys, w.public()).unwrap();
    let raw = Plonk::contract_proof(verified.proof()).unwrap();
    assert_eq!(Plonk::decode_proof(&raw), *verified.proof());
}

#[test]
fn undersized_srs_fails_setup() {
    let cs = cubic();
    let srs = Srs::unsafe_setup(circuit_k(&cs) - 1, OsRng);
    let err = setup(&cs, &srs).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::SetupFailed);
}

#[test]
fn truncated_verifying_key_does_not_decode() {
    let cs = cubic();
    let srs = Srs::unsafe_setup(circuit_k(&cs), OsRng);
    let (_, vk) = setup(&cs, &srs).unwrap().into_parts();
    let bytes = Plonk::encode_verifying_key(&vk).unwrap();
    assert!(Plonk::decode_verifying_key(&cs, &bytes[..bytes.len() - 1]).is_err());
    assert!(Plonk::decode_verifying_key(&cs, &bytes[..3]).is_err());
}

#[test]
fn exported_verifier_has_an_entry_point() {
    let cs = cubic();
    let srs = Srs::unsafe_setup(circuit_k(&cs), OsRng);
    let keys = setup(&cs, &srs).unwrap();
    let sol = Plonk::export_verifier_contract(keys.verifying_key()).unwrap();
    assert!(sol.contains("pragma solidity"));
    assert!(sol.contains("function verifyProof("));

    // Deterministic in the verifying key.
    assert_eq!(Plonk::export_verifier_contract(keys.verifying_key()).unwrap(), sol);
}

#[test]
fn calldata_carries_proof_and_instances() {
    let cs = cubic();
    let srs = Srs::unsafe_setup(circuit_k(&cs), OsRng);
    let keys = setup(&cs, &srs).unwrap();
    let w = witness(&cs, 3);
    let verified = prove(&cs, &keys, &w).unwrap().verify(&keys, w.public()).unwrap();
    let proof = verified.proof();

    let cd = Plonk::calldata(proof, verified.public_witness()).unwrap();
    assert_eq!(cd.instances, vec!["35".to_string()]);
    assert_eq!(cd.proof, format!("0x{}", hex::encode(proof.as_bytes())));

    // ABI layout: selector, two offsets, proof (length + padded bytes),
    // instances (length + words).
    let call = hex::decode(cd.calldata.trim_start_matches("0x")).unwrap();
    let padded = proof.as_bytes().len().div_ceil(32) * 32;
    assert_eq!(call.len(), 4 + 32 * 2 + 32 + padded + 32 + 32);
    assert_eq!(&call[4 + 32 * 3..4 + 32 * 3 + proof.as_bytes().len()], proof.as_bytes());
    assert_eq!(call[call.len() - 1], 35);
    assert!(call[call.len() - 32..call.len() - 1].iter().all(|b| *b == 0));

    let json = serde_json::to_string(&cd).unwrap();
    assert_eq!(serde_json::from_str::<PlonkCalldata>(&json).unwrap(), cd);
}
