//! Algebraic relations over the gadget's rows.
//!
//! Every relation is a polynomial in the row's columns that must vanish on
//! the whole trace. Branching is encoded through selectors and the
//! inverse-witness columns, so padding rows (`sel = 0`) and operation
//! boundaries (`latch = 1`) disable the relations that do not apply. The
//! hash relation between `left`, `right` and `output` is not checked here;
//! it belongs to the hash primitive's own subcircuit.

use ark_bls12_381::Fr;
use ark_ff::{AdditiveGroup, Field, Zero};
use ark_poly::univariate::DensePolynomial;
use ark_poly::{EvaluationDomain, Evaluations, GeneralEvaluationDomain};

use crate::trace::MerkleRow;

/// Type alias for single-row constraint evaluation function
type RowEvaluator = Box<dyn Fn(&MerkleRow) -> Fr>;

/// Type alias for consecutive-row constraint evaluation function
type TransitionEvaluator = Box<dyn Fn(&MerkleRow, &MerkleRow) -> Fr>;

/// Constraint on a single trace row.
pub struct RowConstraint {
    /// Constraint name for debugging
    pub name: String,
    /// Function evaluating constraint
    pub evaluate: RowEvaluator,
}

/// Constraint between consecutive trace rows.
pub struct TransitionConstraint {
    /// Constraint name for debugging
    pub name: String,
    /// Function evaluating constraint
    pub evaluate: TransitionEvaluator,
}

/// System holding all of the gadget's constraints.
#[derive(Default)]
pub struct ConstraintSystem {
    pub row_constraints: Vec<RowConstraint>,
    pub transition_constraints: Vec<TransitionConstraint>,
}

impl ConstraintSystem {
    pub fn add_row_constraint(&mut self, name: String, evaluate: RowEvaluator) {
        self.row_constraints.push(RowConstraint { name, evaluate });
    }

    pub fn add_transition_constraint(&mut self, name: String, evaluate: TransitionEvaluator) {
        self.transition_constraints.push(TransitionConstraint { name, evaluate });
    }

    /// Evaluates all constraints on the given rows.
    pub fn evaluate(&self, rows: &[MerkleRow]) -> Vec<Fr> {
        let mut evaluations = Vec::new();

        for row in rows {
            for constraint in &self.row_constraints {
                evaluations.push((constraint.evaluate)(row));
            }
        }

        for window in rows.windows(2) {
            for constraint in &self.transition_constraints {
                evaluations.push((constraint.evaluate)(&window[0], &window[1]));
            }
        }

        evaluations
    }

    /// Checks if all constraints vanish on the rows.
    pub fn is_satisfied(&self, rows: &[MerkleRow]) -> bool {
        self.evaluate(rows).iter().all(|&x| x == Fr::ZERO)
    }

    /// Names of constraints with a nonzero evaluation somewhere in the rows.
    pub fn failing_constraints(&self, rows: &[MerkleRow]) -> Vec<&str> {
        let mut failing = Vec::new();
        for constraint in &self.row_constraints {
            if rows.iter().any(|row| !(constraint.evaluate)(row).is_zero()) {
                failing.push(constraint.name.as_str());
            }
        }
        for constraint in &self.transition_constraints {
            if rows
                .windows(2)
                .any(|w| !(constraint.evaluate)(&w[0], &w[1]).is_zero())
            {
                failing.push(constraint.name.as_str());
            }
        }
        failing
    }

    /// Interpolates a row constraint's evaluations as a polynomial.
    pub fn interpolate_row_constraint(
        &self,
        rows: &[MerkleRow],
        constraint: &RowConstraint,
    ) -> DensePolynomial<Fr> {
        let domain = GeneralEvaluationDomain::<Fr>::new(rows.len())
            .expect("Trace height must be a power of 2");

        let evaluations: Vec<Fr> = rows.iter().map(|row| (constraint.evaluate)(row)).collect();
        Evaluations::from_vec_and_domain(evaluations, domain).interpolate()
    }

    /// Interpolates a transition constraint's evaluations as a polynomial.
    pub fn interpolate_transition_constraint(
        &self,
        rows: &[MerkleRow],
        constraint: &TransitionConstraint,
    ) -> DensePolynomial<Fr> {
        let domain = GeneralEvaluationDomain::<Fr>::new(rows.len())
            .expect("Trace height must be a power of 2");

        let mut evaluations = vec![Fr::zero(); rows.len()];
        for (i, window) in rows.windows(2).enumerate() {
            evaluations[i] = (constraint.evaluate)(&window[0], &window[1]);
        }
        Evaluations::from_vec_and_domain(evaluations, domain).interpolate()
    }

    /// Interpolates all constraints as polynomials.
    pub fn interpolate_all_constraints(&self, rows: &[MerkleRow]) -> Vec<DensePolynomial<Fr>> {
        let mut polys = Vec::new();

        for constraint in &self.row_constraints {
            polys.push(self.interpolate_row_constraint(rows, constraint));
        }

        for constraint in &self.transition_constraints {
            polys.push(self.interpolate_transition_constraint(rows, constraint));
        }

        polys
    }
}

/// Builds the constraint system verifying the Merkle gadget's rows.
pub fn merkle_gadget_constraints() -> ConstraintSystem {
    let mut system = ConstraintSystem::default();

    system.add_row_constraint(
        "sel_boolean".to_string(),
        Box::new(|r| r.sel * (r.sel - Fr::ONE)),
    );
    system.add_row_constraint(
        "parity_boolean".to_string(),
        Box::new(|r| r.sel * r.index_is_even * (r.index_is_even - Fr::ONE)),
    );
    system.add_row_constraint(
        "latch_boolean".to_string(),
        Box::new(|r| r.sel * r.latch * (r.latch - Fr::ONE)),
    );
    system.add_row_constraint(
        "tags_boolean".to_string(),
        Box::new(|r| {
            r.sel
                * (r.is_member * (r.is_member - Fr::ONE)
                    + r.sel_membership * (r.sel_membership - Fr::ONE)
                    + r.sel_update * (r.sel_update - Fr::ONE))
        }),
    );

    // Even index hashes the running value on the left, odd on the right
    system.add_row_constraint(
        "left_operand".to_string(),
        Box::new(|r| {
            r.sel
                * (r.index_is_even * (r.left - r.node_value)
                    + (Fr::ONE - r.index_is_even) * (r.left - r.sibling))
        }),
    );
    system.add_row_constraint(
        "right_operand".to_string(),
        Box::new(|r| {
            r.sel
                * (r.index_is_even * (r.right - r.sibling)
                    + (Fr::ONE - r.index_is_even) * (r.right - r.node_value))
        }),
    );

    // The latch fires exactly where remaining_len reaches zero
    system.add_row_constraint(
        "latch_from_remaining".to_string(),
        Box::new(|r| r.sel * (r.latch - (Fr::ONE - r.remaining_len * r.remaining_len_inv))),
    );
    system.add_row_constraint(
        "remaining_inverse_witness".to_string(),
        Box::new(|r| {
            r.sel * r.remaining_len * (Fr::ONE - r.remaining_len * r.remaining_len_inv)
        }),
    );
    system.add_row_constraint(
        "diff_inverse_witness".to_string(),
        Box::new(|r| {
            let diff = r.output - r.expected_root;
            r.sel * diff * (Fr::ONE - diff * r.diff_inv)
        }),
    );

    // Membership result is the zero test of output against the stored root
    system.add_row_constraint(
        "member_from_diff".to_string(),
        Box::new(|r| {
            let diff = r.output - r.expected_root;
            r.sel * r.latch * r.sel_membership * (r.is_member - (Fr::ONE - diff * r.diff_inv))
        }),
    );
    system.add_row_constraint(
        "tags_latched_only".to_string(),
        Box::new(|r| r.sel * (Fr::ONE - r.latch) * (r.is_member + r.sel_membership + r.sel_update)),
    );
    system.add_row_constraint(
        "tags_exclusive".to_string(),
        Box::new(|r| r.sel * r.latch * r.sel_membership * r.sel_update),
    );
    system.add_row_constraint(
        "update_root_agrees".to_string(),
        Box::new(|r| r.sel * r.latch * r.sel_update * (r.output - r.expected_root)),
    );
    system.add_row_constraint(
        "member_root_agrees".to_string(),
        Box::new(|r| r.sel * r.latch * r.is_member * (r.output - r.expected_root)),
    );

    // Transitions only bind inside an operation: the latch row ends it
    system.add_transition_constraint(
        "index_halving".to_string(),
        Box::new(|cur, next| {
            let gate = cur.sel * next.sel * (Fr::ONE - cur.latch);
            gate * (cur.node_index
                - (Fr::ONE - cur.index_is_even)
                - Fr::from(2u64) * next.node_index)
        }),
    );
    system.add_transition_constraint(
        "value_chains".to_string(),
        Box::new(|cur, next| {
            let gate = cur.sel * next.sel * (Fr::ONE - cur.latch);
            gate * (next.node_value - cur.output)
        }),
    );
    system.add_transition_constraint(
        "remaining_decrements".to_string(),
        Box::new(|cur, next| {
            let gate = cur.sel * next.sel * (Fr::ONE - cur.latch);
            gate * (next.remaining_len - cur.remaining_len + Fr::ONE)
        }),
    );
    system.add_transition_constraint(
        "root_constant".to_string(),
        Box::new(|cur, next| {
            let gate = cur.sel * next.sel * (Fr::ONE - cur.latch);
            gate * (next.expected_root - cur.expected_root)
        }),
    );
    system.add_transition_constraint(
        "clk_increments".to_string(),
        Box::new(|cur, next| {
            let gate = cur.sel * next.sel * (Fr::ONE - cur.latch);
            gate * (next.clk - cur.clk - Fr::ONE)
        }),
    );

    system
}
