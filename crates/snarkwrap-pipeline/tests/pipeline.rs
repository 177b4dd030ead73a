//! Full runs against throwaway storage directories.
//!
//! Purpose:
//! - both backends reach `Verified` and write the on-chain artifact set,
//! - persisted keys reload through the key store and still prove,
//! - stale, foreign, dummy, missing and corrupt keys are refused,
//! - dummy setup ends `VerificationSkipped` without a verifying key,
//! - shape and satisfiability failures stop the run before any output.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use num_bigint::BigUint;
use rand::rngs::OsRng;
use snarkwrap_core::{
    Backend, CircuitDefinition, ErrorKind, KeyPlan, PipelineResult, RunConfig, StorageLayout,
    WitnessInputs,
};
use snarkwrap_groth16::{CalldataJson, RAW_PROOF_BYTES};
use snarkwrap_plonk::PlonkCalldata;
use snarkwrap_pipeline::{Pipeline, RunOptions, RunReport, RunState, Srs};

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("snarkwrap-pipeline-{name}-{nanos}"))
}

fn cubic() -> CircuitDefinition {
    CircuitDefinition::from_json_str(include_str!("../../../demos/cubic/circuit.json")).unwrap()
}

fn inputs(y: u64, x: u64) -> WitnessInputs {
    WitnessInputs {
        public_inputs: vec![y.to_string()],
        auxiliary: vec![x.to_string()],
    }
}

fn options(backend: Backend, keys: KeyPlan, dir: &Path) -> RunOptions {
    RunOptions {
        backend,
        keys,
        profile: true,
        save: true,
        storage: StorageLayout::in_dir(dir),
    }
}

fn run(opts: RunOptions, y: u64, x: u64) -> PipelineResult<RunReport> {
    Pipeline::new(opts).run(&cubic(), &inputs(y, x))
}

#[test]
fn groth16_setup_then_load() {
    let dir = tmp_dir("g16");
    let layout = StorageLayout::in_dir(&dir);

    let report = run(options(Backend::Groth16, KeyPlan::Setup, &dir), 35, 3).unwrap();
    assert_eq!(report.state, RunState::Verified);
    assert_eq!(report.stats.constraints, 4);
    let states: Vec<_> = report.timings.iter().map(|t| t.state).collect();
    assert_eq!(
        states,
        [
            RunState::Compiled,
            RunState::KeysReady,
            RunState::WitnessReady,
            RunState::Proved,
            RunState::Verified
        ]
    );
    for path in [
        layout.proving_key_path(),
        layout.verifying_key_path(),
        layout.contract_path(Backend::Groth16),
        layout.witness_path(),
        layout.proof_path(),
        layout.public_witness_path(),
        layout.calldata_path(),
    ] {
        assert!(report.written.contains(&path), "{} not reported", path.display());
        assert!(path.exists(), "{} missing", path.display());
    }

    let proof = std::fs::read(layout.proof_path()).unwrap();
    assert_eq!(proof.len(), RAW_PROOF_BYTES);
    let public = std::fs::read(layout.public_witness_path()).unwrap();
    assert_eq!(public.len(), 32);
    assert_eq!(public[31], 35);
    assert!(public[..31].iter().all(|b| *b == 0));
    let calldata: CalldataJson =
        serde_json::from_slice(&std::fs::read(layout.calldata_path()).unwrap()).unwrap();
    assert_eq!(calldata.input, vec!["35".to_string()]);
    assert_eq!(calldata.a[0], BigUint::from_bytes_be(&proof[..32]).to_string());
    assert_eq!(calldata.c[1], BigUint::from_bytes_be(&proof[224..]).to_string());

    // Keys round-trip through the store and prove a different witness.
    let report = run(options(Backend::Groth16, KeyPlan::Load, &dir), 135, 5).unwrap();
    assert_eq!(report.state, RunState::Verified);
    assert!(!report.written.contains(&layout.proving_key_path()));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn stale_and_foreign_keys_are_refused() {
    let dir = tmp_dir("stale");
    run(options(Backend::Groth16, KeyPlan::Setup, &dir), 35, 3).unwrap();

    let mut edited = cubic();
    edited.gates[3].qc = Some("6".into());
    let err = Pipeline::new(options(Backend::Groth16, KeyPlan::Load, &dir))
        .run(&edited, &inputs(36, 3))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::IncompatibleKey);
    assert!(err.to_string().contains("stale"));

    let err = run(options(Backend::Plonk, KeyPlan::Load, &dir), 35, 3).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::IncompatibleKey);
    assert!(err.to_string().contains("groth16"));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_and_corrupt_keys() {
    let dir = tmp_dir("missing");
    let layout = StorageLayout::in_dir(&dir);
    let err = run(options(Backend::Groth16, KeyPlan::Load, &dir), 35, 3).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::MissingArtifact);

    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(layout.proving_key_path(), b"SWK1 but far too short").unwrap();
    let err = run(options(Backend::Groth16, KeyPlan::Load, &dir), 35, 3).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::CorruptArtifact);

    // Valid envelope, truncated payload.
    run(options(Backend::Groth16, KeyPlan::Setup, &dir), 35, 3).unwrap();
    let vk = std::fs::read(layout.verifying_key_path()).unwrap();
    std::fs::write(layout.verifying_key_path(), &vk[..vk.len() - 8]).unwrap();
    let err = run(options(Backend::Groth16, KeyPlan::Load, &dir), 35, 3).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::CorruptArtifact);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn dummy_setup_skips_verification() {
    let dir = tmp_dir("dummy");
    let layout = StorageLayout::in_dir(&dir);

    let report = run(options(Backend::Groth16, KeyPlan::DummySetup, &dir), 35, 3).unwrap();
    assert_eq!(report.state, RunState::VerificationSkipped);
    assert!(layout.proving_key_path().exists());
    let proof = std::fs::read(layout.proof_path()).unwrap();
    assert_eq!(proof.len(), RAW_PROOF_BYTES);
    assert!(!layout.verifying_key_path().exists());
    assert!(!layout.contract_path(Backend::Groth16).exists());
    assert!(!layout.public_witness_path().exists());
    assert!(!layout.calldata_path().exists());

    // A dummy proving key is never loaded as an authentic one.
    let err = run(options(Backend::Groth16, KeyPlan::Load, &dir), 35, 3).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::IncompatibleKey);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn dummy_run_clears_artifacts_of_an_earlier_verified_run() {
    let dir = tmp_dir("dummy-after-setup");
    let layout = StorageLayout::in_dir(&dir);
    run(options(Backend::Groth16, KeyPlan::Setup, &dir), 35, 3).unwrap();
    assert!(layout.public_witness_path().exists());
    assert!(layout.calldata_path().exists());

    let report = run(options(Backend::Groth16, KeyPlan::DummySetup, &dir), 135, 5).unwrap();
    assert_eq!(report.state, RunState::VerificationSkipped);
    assert_eq!(std::fs::read(layout.proof_path()).unwrap().len(), RAW_PROOF_BYTES);
    assert!(!layout.public_witness_path().exists());
    assert!(!layout.calldata_path().exists());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn dummy_setup_without_save_writes_nothing() {
    let dir = tmp_dir("dummy-nosave");
    let mut opts = options(Backend::Groth16, KeyPlan::DummySetup, &dir);
    opts.save = false;
    let report = run(opts, 35, 3).unwrap();
    assert_eq!(report.state, RunState::VerificationSkipped);
    assert!(report.written.is_empty());
    assert!(!dir.exists());
}

#[test]
fn plonk_dummy_setup_is_unsupported() {
    let dir = tmp_dir("plonk-dummy");
    let err = run(options(Backend::Plonk, KeyPlan::DummySetup, &dir), 35, 3).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::UnsupportedSetup);
    assert!(!dir.exists());
}

#[test]
fn shape_mismatch_fails_before_setup() {
    let dir = tmp_dir("shape");
    let bad = WitnessInputs {
        public_inputs: vec!["35".into(), "1".into()],
        auxiliary: vec!["3".into()],
    };
    let err = Pipeline::new(options(Backend::Groth16, KeyPlan::Setup, &dir))
        .run(&cubic(), &bad)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::WitnessShapeMismatch);
    assert!(!dir.exists());
}

#[test]
fn unsatisfying_witness_writes_no_proof() {
    let dir = tmp_dir("unsat");
    let layout = StorageLayout::in_dir(&dir);
    let err = run(options(Backend::Groth16, KeyPlan::Setup, &dir), 35, 4).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ProvingFailed);
    assert!(!layout.proof_path().exists());
    assert!(!layout.public_witness_path().exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn plonk_needs_an_srs() {
    let dir = tmp_dir("plonk-nosrs");
    let err = run(options(Backend::Plonk, KeyPlan::Setup, &dir), 35, 3).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::MissingSrs);
}

#[test]
fn plonk_setup_then_load() {
    let dir = tmp_dir("plonk");
    let layout = StorageLayout::in_dir(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let srs = Srs::unsafe_setup(5, OsRng);
    std::fs::write(layout.srs_path(), srs.to_bytes().unwrap()).unwrap();

    let report = run(options(Backend::Plonk, KeyPlan::Setup, &dir), 35, 3).unwrap();
    assert_eq!(report.state, RunState::Verified);
    assert!(layout.contract_path(Backend::Plonk).exists());
    assert!(layout.proof_path().exists());
    assert!(!layout.witness_path().exists());
    let public = std::fs::read(layout.public_witness_path()).unwrap();
    assert_eq!(public.len(), 32);
    assert_eq!(public[31], 35);

    let contract = std::fs::read_to_string(layout.contract_path(Backend::Plonk)).unwrap();
    assert!(contract.contains("function verifyProof("));
    let proof = std::fs::read(layout.proof_path()).unwrap();
    let calldata: PlonkCalldata =
        serde_json::from_slice(&std::fs::read(layout.calldata_path()).unwrap()).unwrap();
    assert_eq!(calldata.instances, vec!["35".to_string()]);
    assert_eq!(calldata.proof, format!("0x{}", hex::encode(&proof)));

    let report = run(options(Backend::Plonk, KeyPlan::Load, &dir), 15, 2).unwrap();
    assert_eq!(report.state, RunState::Verified);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn options_from_config() {
    let cfg =
        RunConfig::from_toml_str(include_str!("../../../demos/cubic/snarkwrap.toml")).unwrap();
    let opts = RunOptions::from_config(&cfg, None).unwrap();
    assert_eq!(opts.backend, Backend::Groth16);
    assert_eq!(opts.keys, KeyPlan::Setup);
    assert!(opts.profile && opts.save);
    assert_eq!(opts.storage.srs_path(), PathBuf::from("build").join("srs_setup"));

    let opts = RunOptions::from_config(&cfg, Some(Backend::Plonk)).unwrap();
    assert_eq!(opts.backend, Backend::Plonk);

    let err = RunOptions::from_config(&RunConfig::default(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let cfg = RunConfig::from_toml_str("backend = \"marlin\"").unwrap();
    assert_eq!(
        RunOptions::from_config(&cfg, None).unwrap_err().kind(),
        ErrorKind::UnsupportedBackend
    );
}
