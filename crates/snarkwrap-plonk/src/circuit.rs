//! halo2 rendition of a compiled gate list.
//!
//! One custom gate over three advice columns `a, b, c` and five fixed
//! selector columns:
//!
//! ```text
//! q_l·a + q_r·b + q_o·c + q_m·a·b + q_c = 0
//! ```
//!
//! Layout (single region):
//! - rows `0..P`: one row per public input, value in `a`, all selectors
//!   zero, `a` bound to instance row `i`;
//! - rows `P..P+G`: one row per gate, wires in `a/b/c`, coefficients in the
//!   fixed columns.
//!
//! Every occurrence of a variable is copy-constrained to its first cell, so
//! the wiring of the gate list is enforced by the permutation argument.

use anyhow::{anyhow, Result};
use ff::{Field, PrimeField};
use halo2_proofs::circuit::{Cell, Layouter, SimpleFloorPlanner, Value};
use halo2_proofs::halo2curves::bn256::Fr as HFr;
use halo2_proofs::plonk::{
    Advice, Circuit, Column, ConstraintSystem as Halo2Cs, Error, Fixed, Instance,
};
use halo2_proofs::poly::Rotation;
use snarkwrap_core::{field, Assignment, ConstraintSystem, Fr};

/// Rows reserved beyond the used ones (blinding and last-row padding).
const RESERVED_ROWS: usize = 10;
/// Smallest circuit size exponent we emit.
const MIN_K: u32 = 4;

/// Convert a BN254 scalar between the arkworks and halo2curves encodings.
pub fn to_halo2(v: &Fr) -> Result<HFr> {
    let mut repr = <HFr as PrimeField>::Repr::default();
    repr.as_mut().copy_from_slice(&field::to_le_bytes(v));
    Option::from(HFr::from_repr(repr)).ok_or_else(|| anyhow!("scalar out of range for bn256::Fr"))
}

/// Size exponent for `cs`: smallest `k ≥ 4` with `2^k ≥ rows + reserved`.
#[must_use]
pub fn circuit_k(cs: &ConstraintSystem) -> u32 {
    let needed = cs.stats().constraints + RESERVED_ROWS;
    let mut k = MIN_K;
    while (1usize << k) < needed {
        k += 1;
    }
    k
}

/// Column handles.
#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    a: Column<Advice>,
    b: Column<Advice>,
    c: Column<Advice>,
    q_l: Column<Fixed>,
    q_r: Column<Fixed>,
    q_o: Column<Fixed>,
    q_m: Column<Fixed>,
    q_c: Column<Fixed>,
    instance: Column<Instance>,
}

#[derive(Debug, Clone, Copy)]
struct Row {
    wires: [Option<usize>; 3],
    q: [HFr; 5],
}

/// Circuit over a compiled constraint system.
#[derive(Debug, Clone)]
pub struct GateCircuit {
    nb_public: usize,
    rows: Vec<Row>,
    values: Option<Vec<HFr>>,
}

impl GateCircuit {
    /// Shape-only circuit (key generation).
    pub fn for_setup(cs: &ConstraintSystem) -> Result<Self> {
        let rows = cs
            .gates()
            .iter()
            .map(|g| {
                Ok(Row {
                    wires: [g.l, g.r, g.o],
                    q: [
                        to_halo2(&g.ql)?,
                        to_halo2(&g.qr)?,
                        to_halo2(&g.qo)?,
                        to_halo2(&g.qm)?,
                        to_halo2(&g.qc)?,
                    ],
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            nb_public: cs.nb_public(),
            rows,
            values: None,
        })
    }

    /// Circuit with every wire value filled in (proving).
    pub fn with_assignment(cs: &ConstraintSystem, assignment: &Assignment) -> Result<Self> {
        let mut circuit = Self::for_setup(cs)?;
        circuit.values = Some(
            assignment
                .values()
                .iter()
                .map(to_halo2)
                .collect::<Result<Vec<_>>>()?,
        );
        Ok(circuit)
    }

    fn value(&self, var: usize) -> Value<HFr> {
        match &self.values {
            Some(v) => v.get(var).copied().map_or_else(Value::unknown, Value::known),
            None => Value::unknown(),
        }
    }
}

impl Circuit<HFr> for GateCircuit {
    type Config = GateConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self {
            nb_public: self.nb_public,
            rows: self.rows.clone(),
            values: None,
        }
    }

    fn configure(meta: &mut Halo2Cs<HFr>) -> Self::Config {
        let config = GateConfig {
            a: meta.advice_column(),
            b: meta.advice_column(),
            c: meta.advice_column(),
            q_l: meta.fixed_column(),
            q_r: meta.fixed_column(),
            q_o: meta.fixed_column(),
            q_m: meta.fixed_column(),
            q_c: meta.fixed_column(),
            instance: meta.instance_column(),
        };
        meta.enable_equality(config.a);
        meta.enable_equality(config.b);
        meta.enable_equality(config.c);
        meta.enable_equality(config.instance);

        meta.create_gate("sparse arithmetic", |meta| {
            let a = meta.query_advice(config.a, Rotation::cur());
            let b = meta.query_advice(config.b, Rotation::cur());
            let c = meta.query_advice(config.c, Rotation::cur());
            let q_l = meta.query_fixed(config.q_l, Rotation::cur());
            let q_r = meta.query_fixed(config.q_r, Rotation::cur());
            let q_o = meta.query_fixed(config.q_o, Rotation::cur());
            let q_m = meta.query_fixed(config.q_m, Rotation::cur());
            let q_c = meta.query_fixed(config.q_c, Rotation::cur());
            vec![q_l * a.clone() + q_r * b.clone() + q_o * c + q_m * a * b + q_c]
        });

        config
    }

    fn synthesize(
        &self,
        config: Self::Config,
        mut layouter: impl Layouter<HFr>,
    ) -> Result<(), Error> {
        let public_cells = layouter.assign_region(
            || "gate list",
            |mut region| {
                // Fresh per pass; the floor planner runs this closure twice.
                let mut first: Vec<Option<Cell>> = Vec::new();
                let mut bind = |region: &mut halo2_proofs::circuit::Region<'_, HFr>,
                                var: usize,
                                cell: Cell|
                 -> Result<(), Error> {
                    if first.len() <= var {
                        first.resize(var + 1, None);
                    }
                    match first[var] {
                        Some(prev) => region.constrain_equal(prev, cell),
                        None => {
                            first[var] = Some(cell);
                            Ok(())
                        }
                    }
                };

                let mut public_cells = Vec::with_capacity(self.nb_public);
                for var in 0..self.nb_public {
                    let cell = region
                        .assign_advice(|| "public", config.a, var, || self.value(var))?
                        .cell();
                    bind(&mut region, var, cell)?;
                    public_cells.push(cell);
                }

                let columns = [config.a, config.b, config.c];
                let selectors = [config.q_l, config.q_r, config.q_o, config.q_m, config.q_c];
                for (i, row) in self.rows.iter().enumerate() {
                    let offset = self.nb_public + i;
                    for (col, wire) in columns.iter().zip(row.wires) {
                        let value = wire.map_or(Value::known(HFr::ZERO), |v| self.value(v));
                        let cell = region.assign_advice(|| "wire", *col, offset, || value)?.cell();
                        if let Some(var) = wire {
                            bind(&mut region, var, cell)?;
                        }
                    }
                    for (col, q) in selectors.iter().zip(row.q) {
                        region.assign_fixed(|| "selector", *col, offset, || Value::known(q))?;
                    }
                }
                Ok(public_cells)
            },
        )?;

        for (row, cell) in public_cells.into_iter().enumerate() {
            layouter.constrain_instance(cell, config.instance, row)?;
        }
        Ok(())
    }
}
