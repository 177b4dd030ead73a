//! snarkwrap-bench-harness
//!
//! Run the proof pipeline end to end a few times (compile -> keys -> witness
//! -> prove -> verify/skip) and append one CSV row per stage into
//! `benchmarks/reports/bench-<unix>.csv`.
//!
//! Usage examples:
//!   cargo run -p snarkwrap-bench-harness -- --profile benchmarks/profiles/cubic-dummy.toml
//!   cargo run -p snarkwrap-bench-harness -- --profile benchmarks/profiles/cubic-groth16.toml

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Deserialize;

use snarkwrap_core::{Backend, CircuitDefinition, KeyPlan, StorageLayout, WitnessInputs};
use snarkwrap_pipeline::{Pipeline, RunOptions};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Profile {
    /// Circuit description (JSON gate list)
    circuit: PathBuf,
    /// Witness inputs (JSON)
    inputs: PathBuf,
    /// `plonk` or `groth16`
    backend: String,
    /// Key plan; defaults to the backend's default
    keys: Option<String>,
    /// SRS file for PLONK runs
    srs: Option<PathBuf>,
    /// Repetitions of the whole pipeline
    repeats: u32,
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn main() -> Result<()> {
    let profile_path =
        PathBuf::from(parse_flag("profile", "benchmarks/profiles/cubic-dummy.toml"));
    let profile_src = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {}", profile_path.display()))?;
    let profile: Profile = toml::from_str(&profile_src).context("parse profile toml")?;

    let backend: Backend = profile.backend.parse()?;
    let keys = match &profile.keys {
        Some(k) => k.parse::<KeyPlan>()?,
        None => backend.default_key_plan(),
    };
    let srs = profile
        .srs
        .as_ref()
        .map(|p| fs::canonicalize(p).with_context(|| format!("resolve SRS {}", p.display())))
        .transpose()?;
    let def = CircuitDefinition::from_json_file(&profile.circuit)?;
    let inputs = WitnessInputs::from_json_file(&profile.inputs)?;
    println!(
        "Profile: circuit={}, backend={backend}, keys={keys}, repeats={}",
        def.name, profile.repeats
    );

    fs::create_dir_all("benchmarks/reports").ok();

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let csv_path = PathBuf::from(format!("benchmarks/reports/bench-{ts}.csv"));
    let mut csv = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&csv_path)?;
    writeln!(csv, "timestamp,backend,keys,constraints,repeat,stage,ms,extra")?;

    for rep in 0..profile.repeats {
        // per-repeat storage so key files never leak between runs
        let dir = PathBuf::from(format!("benchmarks/tmp-{ts}-{rep}"));
        let mut storage = StorageLayout::in_dir(&dir);
        if let Some(srs) = &srs {
            storage.srs = srs.clone();
        }
        let options = RunOptions {
            backend,
            keys,
            profile: false,
            save: true,
            storage,
        };

        let report = Pipeline::new(options)
            .run(&def, &inputs)
            .with_context(|| format!("repeat {rep}"))?;
        for t in &report.timings {
            let extra = if t.state == report.state {
                format!("written={}", report.written.len())
            } else {
                String::new()
            };
            writeln!(
                csv,
                "{ts},{backend},{keys},{},{rep},{},{},{extra}",
                report.stats.constraints,
                t.state,
                dur_ms(t.elapsed)
            )?;
        }
        println!("repeat {rep}: {} in {} ms", report.state, dur_ms(report.total()));

        // cleanup temp files to avoid disk bloat
        let _ = fs::remove_dir_all(&dir);
    }

    println!("Wrote report → {}", csv_path.display());
    Ok(())
}
