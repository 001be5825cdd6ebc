//! # Samplers for QUBO Models
//!
//! Consumers of the QUBO matrices emitted by
//! [`Model::to_qubo`](crate::model::Model::to_qubo). Only an exhaustive
//! reference sampler is shipped; heuristic annealers plug in at the same
//! boundary by producing [`Sample`]s for
//! [`Model::decode_sample`](crate::model::Model::decode_sample).

use itertools::Itertools;
use thiserror::Error;

use crate::{
    model::Qubo,
    types::Sample,
};

/// The largest number of variables [`ExactSolver`] agrees to enumerate
pub const MAX_EXACT_VARS: usize = 24;

/// Errors from sampling
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The instance is too large for exhaustive enumeration
    #[error("exact enumeration over {n_vars} variables exceeds the limit of {limit}")]
    TooManyVariables {
        /// Number of variables of the rejected instance
        n_vars: usize,
        /// The enumeration limit
        limit: usize,
    },
}

/// A sampled assignment with its QUBO energy
#[derive(Clone, Debug)]
pub struct SolverSample {
    assignment: Sample,
    energy: f64,
}

impl SolverSample {
    /// Gets the assignment.
    pub fn assignment(&self) -> &Sample {
        &self.assignment
    }

    /// Gets the QUBO energy of the assignment, including the offset.
    pub fn energy(&self) -> f64 {
        self.energy
    }
}

/// A set of samples sorted by energy, lowest first
#[derive(Clone, Debug, Default)]
pub struct SampleSet {
    samples: Vec<SolverSample>,
}

impl SampleSet {
    /// Gets the lowest-energy sample.
    pub fn best(&self) -> Option<&SolverSample> {
        self.samples.first()
    }

    /// Gets the highest-energy sample.
    pub fn worst(&self) -> Option<&SolverSample> {
        self.samples.last()
    }

    /// Iterates the samples in order of increasing energy.
    pub fn iter(&self) -> std::slice::Iter<'_, SolverSample> {
        self.samples.iter()
    }

    /// Gets the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Checks if there are any samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a SolverSample;
    type IntoIter = std::slice::Iter<'a, SolverSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Exhaustive QUBO minimization by enumerating all `2^n` assignments.
///
/// Exact and deterministic, for testing encodings and as a ground truth on
/// small instances. Refuses instances above [`MAX_EXACT_VARS`] variables.
pub struct ExactSolver;

impl ExactSolver {
    /// Samples every assignment of the QUBO, returning them sorted by
    /// energy.
    ///
    /// # Errors
    ///
    /// [`Error::TooManyVariables`] if the instance exceeds
    /// [`MAX_EXACT_VARS`].
    pub fn sample_qubo(qubo: &Qubo) -> Result<SampleSet, Error> {
        let vars = qubo.variables();
        if vars.len() > MAX_EXACT_VARS {
            return Err(Error::TooManyVariables {
                n_vars: vars.len(),
                limit: MAX_EXACT_VARS,
            });
        }
        let samples = (0..1u64 << vars.len())
            .map(|code| {
                let assignment: Sample = vars
                    .iter()
                    .enumerate()
                    .map(|(pos, name)| (name.to_string(), ((code >> pos) & 1) as u8))
                    .collect();
                let energy = qubo
                    .energy(&assignment)
                    .expect("enumeration assigns every variable");
                SolverSample { assignment, energy }
            })
            .sorted_by(|lhs, rhs| lhs.energy.total_cmp(&rhs.energy))
            .collect();
        Ok(SampleSet { samples })
    }
}

#[cfg(test)]
mod tests {
    use super::ExactSolver;
    use crate::{expr::Expr, feed};

    #[test]
    fn finds_the_minimum() {
        // (x + y - 1)^2 has two minima, x != y
        let h = (Expr::binary("x") + Expr::binary("y") - 1).pow(2);
        let qubo = h.compile().unwrap().to_qubo(&feed! {}).unwrap();
        let sampleset = ExactSolver::sample_qubo(&qubo).unwrap();
        assert_eq!(sampleset.len(), 4);
        let best = sampleset.best().unwrap();
        assert_eq!(best.energy(), 0.);
        let bits = best.assignment();
        assert_ne!(bits["x"], bits["y"]);
        assert_eq!(sampleset.worst().unwrap().energy(), 1.);
    }

    #[test]
    fn zero_coefficient_variable_still_assigned() {
        // x cancels out of the QUBO but stays a model variable, so decoding
        // solver output must still find an assignment for it
        let x = Expr::binary("x");
        let h = (x.clone() - x).subh("a") + Expr::binary("y");
        let model = h.compile().unwrap();
        let qubo = model.to_qubo(&feed! {}).unwrap();
        assert_eq!(qubo.variables(), vec!["x", "y"]);
        let sampleset = ExactSolver::sample_qubo(&qubo).unwrap();
        assert_eq!(sampleset.len(), 4);
        let decoded = model.decode_sampleset(&sampleset, &feed! {}).unwrap();
        assert_eq!(decoded[0].subh("a"), Some(0.));
    }

    #[test]
    fn energies_are_sorted() {
        let h = (3 * Expr::binary("x") + 2 * Expr::binary("y") + Expr::binary("z") - 2).pow(2);
        let qubo = h.compile().unwrap().to_qubo(&feed! {}).unwrap();
        let sampleset = ExactSolver::sample_qubo(&qubo).unwrap();
        let energies: Vec<f64> = sampleset.iter().map(super::SolverSample::energy).collect();
        let mut sorted = energies.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(energies, sorted);
    }
}
