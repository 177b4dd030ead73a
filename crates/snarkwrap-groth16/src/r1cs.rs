//! Gate list → R1CS.
//!
//! Each sparse gate `qL·l + qR·r + qO·o + qM·l·r + qC = 0` becomes exactly one
//! rank-1 constraint
//!
//! ```text
//! (qM·l) · (r) = -(qL·l + qR·r + qO·o + qC·1)
//! ```
//!
//! Public variables are allocated as instance variables (after the implicit
//! `One`), everything else as witness variables, preserving index order.

use ark_ff::Zero;
use ark_relations::lc;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem as ArkConstraintSystem, ConstraintSystemRef,
    LinearCombination, OptimizationGoal, SynthesisError, SynthesisMode, Variable,
};
use snarkwrap_core::{Assignment, ConstraintSystem, Fr};

/// Synthesizer over a compiled constraint system.
///
/// Without an assignment it only allocates (setup); with one it also
/// provides values (proving).
#[derive(Clone, Copy)]
pub struct R1csCircuit<'a> {
    cs: &'a ConstraintSystem,
    assignment: Option<&'a Assignment>,
}

impl<'a> R1csCircuit<'a> {
    /// Shape-only circuit for key generation.
    #[must_use]
    pub fn for_setup(cs: &'a ConstraintSystem) -> Self {
        Self {
            cs,
            assignment: None,
        }
    }

    /// Circuit carrying solved values for proving.
    #[must_use]
    pub fn with_assignment(cs: &'a ConstraintSystem, assignment: &'a Assignment) -> Self {
        Self {
            cs,
            assignment: Some(assignment),
        }
    }

    fn value(&self, index: usize) -> Result<Fr, SynthesisError> {
        self.assignment
            .and_then(|a| a.value(index))
            .ok_or(SynthesisError::AssignmentMissing)
    }
}

impl ConstraintSynthesizer<Fr> for R1csCircuit<'_> {
    fn generate_constraints(self, acs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let nb_public = self.cs.nb_public();
        let mut vars = Vec::with_capacity(self.cs.nb_variables());
        for i in 0..self.cs.nb_variables() {
            let v = if i < nb_public {
                acs.new_input_variable(|| self.value(i))?
            } else {
                acs.new_witness_variable(|| self.value(i))?
            };
            vars.push(v);
        }

        for gate in self.cs.gates() {
            let mut a: LinearCombination<Fr> = lc!();
            let mut b: LinearCombination<Fr> = lc!();
            let mut c: LinearCombination<Fr> = lc!();

            if let (Some(l), Some(r)) = (gate.l, gate.r) {
                if !gate.qm.is_zero() {
                    a = a + (gate.qm, vars[l]);
                    b = b + (Fr::from(1u64), vars[r]);
                }
            }
            for (wire, coeff) in [(gate.l, gate.ql), (gate.r, gate.qr), (gate.o, gate.qo)] {
                if let Some(w) = wire {
                    if !coeff.is_zero() {
                        c = c + (-coeff, vars[w]);
                    }
                }
            }
            if !gate.qc.is_zero() {
                c = c + (-gate.qc, Variable::One);
            }
            acs.enforce_constraint(a, b, c)?;
        }
        Ok(())
    }
}

/// Sizes of the R1CS instance a constraint system maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct R1csShape {
    /// Instance variables, including the constant `One`.
    pub num_instance: usize,
    /// Witness variables.
    pub num_witness: usize,
    /// Constraints.
    pub num_constraints: usize,
}

impl R1csShape {
    /// Evaluation-domain size used by the Groth16 QAP reduction.
    #[must_use]
    pub fn domain_size(&self) -> usize {
        (self.num_constraints + self.num_instance).next_power_of_two()
    }
}

/// Synthesize `cs` in setup mode and report its R1CS dimensions.
pub fn shape(cs: &ConstraintSystem) -> Result<R1csShape, SynthesisError> {
    let acs = ArkConstraintSystem::<Fr>::new_ref();
    acs.set_optimization_goal(OptimizationGoal::Constraints);
    acs.set_mode(SynthesisMode::Setup);
    R1csCircuit::for_setup(cs).generate_constraints(acs.clone())?;
    acs.finalize();
    Ok(R1csShape {
        num_instance: acs.num_instance_variables(),
        num_witness: acs.num_witness_variables(),
        num_constraints: acs.num_constraints(),
    })
}
