// crates/snarkwrap-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use snarkwrap_core::{
    compile, Backend, CircuitDefinition, KeyPlan, PipelineError, RunConfig, WitnessInputs,
};
use snarkwrap_pipeline::{
    run_dummy_setup, run_setup, Groth16, Pipeline, Plonk, RunOptions, RunReport,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "snarkwrap",
    about = "Proof pipeline orchestrator (PLONK/KZG and Groth16 on BN254)",
    long_about = "Proof pipeline orchestrator.\n\nCompile a gate-list circuit, run or load a setup, prove, verify locally, and write the byte-exact artifacts an on-chain verifier consumes.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run the setup coordinator only: keys and verifier contract.
    Setup {
        /// Proof backend (overrides the config file)
        #[arg(value_enum, long)]
        backend: Option<BackendOpt>,

        /// Circuit description (JSON gate list)
        #[arg(long)]
        circuit: PathBuf,

        /// Insecure dummy setup (Groth16 only; proving-cost measurement)
        #[arg(long, default_value_t = false)]
        dummy: bool,

        #[command(flatten)]
        common: Common,
    },

    /// Run the full pipeline: keys → witness → prove → verify → artifacts.
    Prove {
        /// Proof backend (overrides the config file)
        #[arg(value_enum, long)]
        backend: Option<BackendOpt>,

        /// Circuit description (JSON gate list)
        #[arg(long)]
        circuit: PathBuf,

        /// Witness inputs (JSON: public_inputs, auxiliary)
        #[arg(long)]
        inputs: PathBuf,

        /// Key source (default: load for plonk, setup for groth16)
        #[arg(value_enum, long)]
        keys: Option<KeyPlanOpt>,

        #[command(flatten)]
        common: Common,
    },

    /// Compile a circuit and print its size metrics and fingerprint.
    Inspect {
        /// Proof backend the circuit is compiled for
        #[arg(value_enum, long)]
        backend: BackendOpt,

        /// Circuit description (JSON gate list)
        #[arg(long)]
        circuit: PathBuf,
    },
}

#[derive(Args, Debug)]
struct Common {
    /// TOML run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Storage directory for keys and artifacts
    #[arg(long)]
    dir: Option<PathBuf>,

    /// SRS file (relative to the storage directory unless absolute)
    #[arg(long)]
    srs: Option<PathBuf>,

    /// Log circuit stats and stage timings
    #[arg(long, default_value_t = false)]
    profile: bool,

    /// Do not persist setup outputs, the full witness or dummy proofs
    #[arg(long, default_value_t = false)]
    no_save: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum BackendOpt {
    /// PLONK with KZG commitments (needs an SRS)
    Plonk,
    /// Groth16 (authentic or dummy setup)
    Groth16,
}

impl From<BackendOpt> for Backend {
    fn from(b: BackendOpt) -> Self {
        match b {
            BackendOpt::Plonk => Self::Plonk,
            BackendOpt::Groth16 => Self::Groth16,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum KeyPlanOpt {
    /// Load persisted keys; fail if absent
    Load,
    /// Fresh authentic setup
    Setup,
    /// Insecure dummy setup (groth16 only)
    DummySetup,
}

impl From<KeyPlanOpt> for KeyPlan {
    fn from(k: KeyPlanOpt) -> Self {
        match k {
            KeyPlanOpt::Load => Self::Load,
            KeyPlanOpt::Setup => Self::Setup,
            KeyPlanOpt::DummySetup => Self::DummySetup,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Setup {
            backend,
            circuit,
            dummy,
            common,
        } => setup(backend, circuit, dummy, &common),

        Cmd::Prove {
            backend,
            circuit,
            inputs,
            keys,
            common,
        } => prove(backend, circuit, inputs, keys, &common),

        Cmd::Inspect { backend, circuit } => inspect(backend, circuit),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Config file first, then command-line overrides.
fn resolve_options(common: &Common, backend: Option<BackendOpt>) -> Result<RunOptions> {
    let cfg = match &common.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };
    let mut options = RunOptions::from_config(&cfg, backend.map(Backend::from))
        .context("resolving run options")?;
    if let Some(dir) = &common.dir {
        options.storage.dir = dir.clone();
    }
    if let Some(srs) = &common.srs {
        options.storage.srs = srs.clone();
    }
    if common.profile {
        options.profile = true;
    }
    if common.no_save {
        options.save = false;
    }
    Ok(options)
}

fn load_circuit(path: &Path) -> Result<CircuitDefinition> {
    CircuitDefinition::from_json_file(path)
        .with_context(|| format!("reading circuit {}", path.display()))
}

fn setup(
    backend: Option<BackendOpt>,
    circuit: PathBuf,
    dummy: bool,
    common: &Common,
) -> Result<()> {
    let options = resolve_options(common, backend)?;
    if dummy && options.backend == Backend::Plonk {
        return Err(PipelineError::UnsupportedSetup(Backend::Plonk).into());
    }
    let def = load_circuit(&circuit)?;
    let cs = compile(&def, options.backend).context("compiling circuit")?;
    info!(backend = %options.backend, circuit = cs.name(), stats = %cs.stats(), "setup");

    let written = match (options.backend, dummy) {
        (Backend::Groth16, true) => run_dummy_setup(&cs, &options.storage, options.save)?.written,
        (Backend::Groth16, false) => {
            run_setup::<Groth16>(&cs, &options.storage, options.save)?.written
        }
        (Backend::Plonk, _) => run_setup::<Plonk>(&cs, &options.storage, options.save)?.written,
    };

    println!(
        "Setup ({}{}) for `{}` complete, fingerprint {}",
        options.backend,
        if dummy { ", dummy" } else { "" },
        cs.name(),
        cs.fingerprint_hex()
    );
    for path in &written {
        println!("  wrote {}", path.display());
    }
    Ok(())
}

fn prove(
    backend: Option<BackendOpt>,
    circuit: PathBuf,
    inputs: PathBuf,
    keys: Option<KeyPlanOpt>,
    common: &Common,
) -> Result<()> {
    let mut options = resolve_options(common, backend)?;
    if let Some(k) = keys {
        options.keys = k.into();
    }
    let def = load_circuit(&circuit)?;
    let inputs = WitnessInputs::from_json_file(&inputs)
        .with_context(|| format!("reading witness inputs {}", inputs.display()))?;

    let profile = options.profile;
    let report = Pipeline::new(options).run(&def, &inputs).context("proof pipeline failed")?;

    println!(
        "Proved with {} (keys: {}), final state {:?}",
        report.backend, report.keys, report.state
    );
    for path in &report.written {
        println!("  wrote {}", path.display());
    }
    if profile {
        print_profile(&report);
    }
    Ok(())
}

fn print_profile(report: &RunReport) {
    println!();
    println!("circuit     {}", report.stats);
    println!("fingerprint {}", report.fingerprint);
    println!("{:<22} {:>12}", "stage", "elapsed");
    for t in &report.timings {
        println!("{:<22} {:>12}", t.state.to_string(), format!("{:.3?}", t.elapsed));
    }
    println!("{:<22} {:>12}", "total", format!("{:.3?}", report.total()));
}

fn inspect(backend: BackendOpt, circuit: PathBuf) -> Result<()> {
    let def = load_circuit(&circuit)?;
    let cs = compile(&def, backend.into()).context("compiling circuit")?;
    println!("circuit     {}", cs.name());
    println!("backend     {}", cs.backend());
    println!("variables   {}", cs.nb_variables());
    println!("stats       {}", cs.stats());
    println!("fingerprint {}", cs.fingerprint_hex());
    Ok(())
}
