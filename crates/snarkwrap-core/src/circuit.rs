//! Gate-list circuit descriptions and their compiled constraint systems.
//!
//! A [`CircuitDefinition`] is the front-end boundary: named variables plus a
//! list of sparse gates, each enforcing
//!
//! ```text
//! qL·l + qR·r + qO·o + qM·l·r + qC = 0
//! ```
//!
//! over the BN254 scalar field. [`compile`] validates it and produces an
//! immutable, backend-tagged [`ConstraintSystem`] with size metrics and a
//! BLAKE3 fingerprint that persisted keys are bound to.
//!
//! Variable indices are assigned public first, then secret, then internal,
//! each in declaration order. Internal wires are computed by
//! [`ConstraintSystem::solve`]: every internal variable is defined by the
//! first gate that mentions it, which must output it on `o` with `qO ≠ 0`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use ark_ff::Field;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::field::{self, Fr};
use crate::witness::Witness;
use crate::{Backend, PipelineError, PipelineResult};

/* ----------------------------- description ------------------------------ */

/// One gate as written in the circuit description.
///
/// Wires are variable names; coefficients are decimal strings and default to
/// zero when omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateSpec {
    /// Left wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<String>,
    /// Right wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<String>,
    /// Output wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o: Option<String>,
    /// Left coefficient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ql: Option<String>,
    /// Right coefficient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr: Option<String>,
    /// Output coefficient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qo: Option<String>,
    /// Multiplication coefficient (applies to `l·r`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qm: Option<String>,
    /// Constant term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qc: Option<String>,
}

/// Circuit description as loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitDefinition {
    /// Human-readable circuit name (not part of the fingerprint).
    pub name: String,
    /// Public input names, in on-chain order.
    #[serde(default)]
    pub public: Vec<String>,
    /// Secret input names.
    #[serde(default)]
    pub secret: Vec<String>,
    /// Internal wires computed by the solver.
    #[serde(default)]
    pub internal: Vec<String>,
    /// Gate list.
    pub gates: Vec<GateSpec>,
}

impl CircuitDefinition {
    /// Parse a definition from a JSON string.
    pub fn from_json_str(s: &str) -> PipelineResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| PipelineError::CompilationFailed(format!("circuit JSON: {e}")))
    }

    /// Read a definition from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::CompilationFailed(format!("read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }
}

/* ------------------------------ compiled IR ------------------------------ */

/// Compiled gate: wire indices plus field coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    /// Left wire index.
    pub l: Option<usize>,
    /// Right wire index.
    pub r: Option<usize>,
    /// Output wire index.
    pub o: Option<usize>,
    /// Left coefficient.
    pub ql: Fr,
    /// Right coefficient.
    pub qr: Fr,
    /// Output coefficient.
    pub qo: Fr,
    /// Multiplication coefficient.
    pub qm: Fr,
    /// Constant term.
    pub qc: Fr,
}

impl Gate {
    /// Evaluate the gate polynomial under `value`; zero means satisfied.
    fn residual(&self, value: impl Fn(usize) -> Fr) -> Fr {
        let l = self.l.map_or(Fr::from(0u64), &value);
        let r = self.r.map_or(Fr::from(0u64), &value);
        let o = self.o.map_or(Fr::from(0u64), &value);
        self.ql * l + self.qr * r + self.qo * o + self.qm * l * r + self.qc
    }
}

/// Size metrics reported by the profiling toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CircuitStats {
    /// Backend-specific constraint (row) count.
    pub constraints: usize,
    /// Distinct non-zero coefficients across all gates.
    pub coefficients: usize,
    /// Public variable count.
    pub public: usize,
    /// Secret variable count.
    pub secret: usize,
    /// Internal variable count.
    pub internal: usize,
}

impl fmt::Display for CircuitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "constraints={} coefficients={} public={} secret={} internal={}",
            self.constraints, self.coefficients, self.public, self.secret, self.internal
        )
    }
}

/// Immutable, backend-tagged constraint system.
#[derive(Debug, Clone)]
pub struct ConstraintSystem {
    backend: Backend,
    name: String,
    names: Vec<String>,
    nb_public: usize,
    nb_secret: usize,
    gates: Vec<Gate>,
    stats: CircuitStats,
    fingerprint: [u8; 32],
}

impl ConstraintSystem {
    /// Backend this system was compiled for.
    #[inline]
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Circuit name from the description.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of public variables.
    #[inline]
    #[must_use]
    pub fn nb_public(&self) -> usize {
        self.nb_public
    }

    /// Number of secret variables.
    #[inline]
    #[must_use]
    pub fn nb_secret(&self) -> usize {
        self.nb_secret
    }

    /// Total number of variables (public + secret + internal).
    #[inline]
    #[must_use]
    pub fn nb_variables(&self) -> usize {
        self.names.len()
    }

    /// Variable name for `index`.
    #[must_use]
    pub fn variable_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Compiled gates in evaluation order.
    #[must_use]
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Size metrics.
    #[must_use]
    pub fn stats(&self) -> CircuitStats {
        self.stats
    }

    /// BLAKE3 fingerprint binding persisted keys to this system.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }

    /// Fingerprint as lowercase hex.
    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint)
    }

    /// Compute every internal wire and check every gate.
    ///
    /// # Errors
    /// - [`PipelineError::WitnessShapeMismatch`] if `witness` was built for a
    ///   different shape,
    /// - [`PipelineError::ProvingFailed`] naming the first unsatisfied gate.
    pub fn solve(&self, witness: &Witness) -> PipelineResult<Assignment> {
        let (public, secret) = (witness.public_values(), witness.secret_values());
        if public.len() != self.nb_public || secret.len() != self.nb_secret {
            return Err(PipelineError::WitnessShapeMismatch(format!(
                "witness has {}/{} public/secret values, circuit declares {}/{}",
                public.len(),
                secret.len(),
                self.nb_public,
                self.nb_secret
            )));
        }

        let mut values: Vec<Option<Fr>> = Vec::with_capacity(self.names.len());
        values.extend(public.iter().copied().map(Some));
        values.extend(secret.iter().copied().map(Some));
        values.resize(self.names.len(), None);

        for (i, gate) in self.gates.iter().enumerate() {
            let fetch = |idx: usize| -> PipelineResult<Fr> {
                values[idx].ok_or_else(|| {
                    PipelineError::ProvingFailed(format!(
                        "gate {i} reads unassigned wire `{}`",
                        self.names[idx]
                    ))
                })
            };

            match gate.o {
                Some(o) if values[o].is_none() => {
                    let l = gate.l.map(fetch).transpose()?.unwrap_or_default();
                    let r = gate.r.map(fetch).transpose()?.unwrap_or_default();
                    let partial = gate.ql * l + gate.qr * r + gate.qm * l * r + gate.qc;
                    let inv = gate.qo.inverse().ok_or_else(|| {
                        PipelineError::ProvingFailed(format!("gate {i} has zero output coefficient"))
                    })?;
                    values[o] = Some(-partial * inv);
                }
                _ => {
                    for idx in [gate.l, gate.r, gate.o].into_iter().flatten() {
                        fetch(idx)?;
                    }
                    let residual = gate.residual(|idx| values[idx].unwrap_or_default());
                    if !field::is_zero(&residual) {
                        return Err(PipelineError::ProvingFailed(format!(
                            "gate {i} is not satisfied by the witness"
                        )));
                    }
                }
            }
        }

        let values = values
            .into_iter()
            .enumerate()
            .map(|(idx, v)| {
                v.ok_or_else(|| {
                    PipelineError::ProvingFailed(format!("wire `{}` left unassigned", self.names[idx]))
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        Ok(Assignment {
            nb_public: self.nb_public,
            values,
        })
    }
}

/// Solved values for every wire, indexed like the constraint system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    nb_public: usize,
    values: Vec<Fr>,
}

impl Assignment {
    /// Value of wire `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<Fr> {
        self.values.get(index).copied()
    }

    /// All values (public, secret, internal).
    #[must_use]
    pub fn values(&self) -> &[Fr] {
        &self.values
    }

    /// Public prefix.
    #[must_use]
    pub fn public(&self) -> &[Fr] {
        &self.values[..self.nb_public]
    }
}

/* ------------------------------- compiler -------------------------------- */

fn fail(msg: impl Into<String>) -> PipelineError {
    PipelineError::CompilationFailed(msg.into())
}

fn coefficient(gate: usize, label: &str, s: Option<&String>) -> PipelineResult<Fr> {
    match s {
        None => Ok(Fr::from(0u64)),
        Some(s) => field::parse_decimal(s).map_err(|e| fail(format!("gate {gate} {label}: {e}"))),
    }
}

/// Compile `def` for `backend`.
///
/// # Errors
/// [`PipelineError::CompilationFailed`] on any structural problem: empty or
/// duplicate names, unknown wires, coefficients on absent wires,
/// non-canonical coefficients, internal wires read before being defined or
/// never defined, and an empty gate list.
pub fn compile(def: &CircuitDefinition, backend: Backend) -> PipelineResult<ConstraintSystem> {
    if def.gates.is_empty() {
        return Err(fail("circuit has no gates"));
    }

    let names: Vec<String> = def
        .public
        .iter()
        .chain(&def.secret)
        .chain(&def.internal)
        .cloned()
        .collect();
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(names.len());
    for (i, n) in names.iter().enumerate() {
        if n.trim().is_empty() {
            return Err(fail("variable names must be non-empty"));
        }
        if index.insert(n.as_str(), i).is_some() {
            return Err(fail(format!("variable `{n}` declared twice")));
        }
    }

    let nb_public = def.public.len();
    let nb_secret = def.secret.len();
    let first_internal = nb_public + nb_secret;
    let mut defined = vec![false; names.len()];
    defined[..first_internal].iter_mut().for_each(|d| *d = true);

    let resolve = |g: usize, wire: Option<&String>| -> PipelineResult<Option<usize>> {
        wire.map(|w| {
            index
                .get(w.as_str())
                .copied()
                .ok_or_else(|| fail(format!("gate {g} references unknown variable `{w}`")))
        })
        .transpose()
    };

    let mut gates = Vec::with_capacity(def.gates.len());
    for (g, spec) in def.gates.iter().enumerate() {
        let gate = Gate {
            l: resolve(g, spec.l.as_ref())?,
            r: resolve(g, spec.r.as_ref())?,
            o: resolve(g, spec.o.as_ref())?,
            ql: coefficient(g, "ql", spec.ql.as_ref())?,
            qr: coefficient(g, "qr", spec.qr.as_ref())?,
            qo: coefficient(g, "qo", spec.qo.as_ref())?,
            qm: coefficient(g, "qm", spec.qm.as_ref())?,
            qc: coefficient(g, "qc", spec.qc.as_ref())?,
        };

        let nz = |c: &Fr| !field::is_zero(c);
        if nz(&gate.qm) && (gate.l.is_none() || gate.r.is_none()) {
            return Err(fail(format!("gate {g}: qm is non-zero but l or r is missing")));
        }
        for (present, coeff, label) in [
            (gate.l.is_some(), &gate.ql, "ql"),
            (gate.r.is_some(), &gate.qr, "qr"),
            (gate.o.is_some(), &gate.qo, "qo"),
        ] {
            if !present && nz(coeff) {
                return Err(fail(format!("gate {g}: {label} is non-zero on an absent wire")));
            }
        }

        for idx in [gate.l, gate.r].into_iter().flatten() {
            if !defined[idx] {
                return Err(fail(format!(
                    "gate {g}: internal variable `{}` is read before it is defined",
                    names[idx]
                )));
            }
        }
        if let Some(o) = gate.o {
            if !defined[o] {
                if !nz(&gate.qo) {
                    return Err(fail(format!(
                        "gate {g}: internal variable `{}` must be defined with a non-zero qo",
                        names[o]
                    )));
                }
                defined[o] = true;
            }
        }
        gates.push(gate);
    }

    if let Some(idx) = defined.iter().position(|d| !d) {
        return Err(fail(format!("internal variable `{}` is never defined", names[idx])));
    }

    let mut distinct: HashSet<[u8; 32]> = HashSet::new();
    for g in &gates {
        for c in [&g.ql, &g.qr, &g.qo, &g.qm, &g.qc] {
            if !field::is_zero(c) {
                distinct.insert(field::to_be_bytes(c));
            }
        }
    }

    let constraints = match backend {
        Backend::Groth16 => gates.len(),
        Backend::Plonk => gates.len() + nb_public,
    };
    let stats = CircuitStats {
        constraints,
        coefficients: distinct.len(),
        public: nb_public,
        secret: nb_secret,
        internal: def.internal.len(),
    };
    let fingerprint = fingerprint(backend, nb_public, nb_secret, def.internal.len(), &gates);

    debug!(circuit = %def.name, %backend, %stats, "compiled constraint system");

    Ok(ConstraintSystem {
        backend,
        name: def.name.clone(),
        names,
        nb_public,
        nb_secret,
        gates,
        stats,
        fingerprint,
    })
}

const FINGERPRINT_DOMAIN: &[u8] = b"snarkwrap/constraint-system/v1";

fn fingerprint(
    backend: Backend,
    nb_public: usize,
    nb_secret: usize,
    nb_internal: usize,
    gates: &[Gate],
) -> [u8; 32] {
    let mut h = blake3::Hasher::new();
    h.update(FINGERPRINT_DOMAIN);
    h.update(&[backend.tag()]);
    for n in [nb_public, nb_secret, nb_internal, gates.len()] {
        h.update(&(n as u64).to_le_bytes());
    }
    for g in gates {
        for w in [g.l, g.r, g.o] {
            h.update(&w.map_or(u64::MAX, |i| i as u64).to_le_bytes());
        }
        for c in [&g.ql, &g.qr, &g.qo, &g.qm, &g.qc] {
            h.update(&field::to_be_bytes(c));
        }
    }
    *h.finalize().as_bytes()
}
