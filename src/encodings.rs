//! # Integer-to-Binary Encodings
//!
//! Encodings of bounded integer variables into named binary decision
//! variables, for embedding integers into QUBO objectives. Each encoding
//! allocates its bits, builds a symbolic reconstruction expression equal to
//! the integer's value, and, where the encoding admits invalid bit patterns,
//! a penalty expression that is zero iff the assignment encodes exactly one
//! integer.
//!
//! ## Example Usage
//!
//! ```
//! use qubo_rs::{
//!     encodings::{Integer, OneHot},
//!     expr::Expr,
//!     feed,
//!     solvers::ExactSolver,
//! };
//!
//! let a = OneHot::new("a", (0, 4), Expr::placeholder("s")).unwrap();
//! let model = (a.expr() - 3).pow(2).compile().unwrap();
//! let qubo = model.to_qubo(&feed! { "s" => 10.0 }).unwrap();
//! let sampleset = ExactSolver::sample_qubo(&qubo).unwrap();
//! let decoded = model.decode_sampleset(&sampleset, &feed! { "s" => 10.0 }).unwrap();
//! let best = decoded.first().unwrap();
//! assert_eq!(best.value(&a).unwrap(), 3);
//! ```

use thiserror::Error;

use crate::expr::Expr;

pub mod gray;
pub mod log;
pub mod one_hot;
pub mod order;
pub mod unary;

pub use gray::Gray;
pub use log::Log;
pub use one_hot::OneHot;
pub use order::Order;
pub use unary::Unary;

/// Errors from constructing and querying integer encodings
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The value range is empty or degenerate
    #[error("upper bound {upper} must be strictly greater than lower bound {lower}")]
    InvalidRange {
        /// Lower bound of the rejected range
        lower: i64,
        /// Upper bound of the rejected range
        upper: i64,
    },
    /// A comparison value lies outside of the encodable range
    #[error("value {value} is outside of the range [{lower}, {upper}]")]
    OutOfRange {
        /// The rejected value
        value: i64,
        /// Lower bound of the encoding
        lower: i64,
        /// Upper bound of the encoding
        upper: i64,
    },
}

/// Trait for all integer encodings: a labeled, bounded, immutable integer
/// variable backed by binary decision variables.
///
/// The reconstruction expression returned by [`Integer::expr`] is tagged as a
/// sub-expression under the integer's label, so a decoded value is
/// retrievable by label alone via
/// [`DecodedSample::value`](crate::model::DecodedSample::value). Encodings
/// whose bit patterns can be inconsistent additionally carry a validity
/// constraint under [`Integer::constraint_label`]; decoding a value from an
/// assignment breaking that constraint fails rather than guessing.
pub trait Integer {
    /// Gets the label of the integer.
    fn label(&self) -> &str;
    /// Gets the inclusive `(lower, upper)` value range.
    fn value_range(&self) -> (i64, i64);
    /// Gets the labeled reconstruction expression, for embedding the integer
    /// into a larger objective.
    fn expr(&self) -> Expr;
    /// Gets the label of the validity constraint, for encodings that carry
    /// one.
    fn constraint_label(&self) -> Option<&str> {
        None
    }
}

/// Validates an inclusive integer range. Bounds are `i64` by construction,
/// so only the ordering can be invalid.
pub(crate) fn check_range(lower: i64, upper: i64) -> Result<(), Error> {
    if upper <= lower {
        return Err(Error::InvalidRange { lower, upper });
    }
    Ok(())
}

/// Derives the name of the bit at `idx`. Deterministic in label and
/// position, so distinct labels never collide.
pub(crate) fn bit_name(label: &str, idx: usize) -> String {
    format!("{label}[{idx}]")
}

/// The number of bits of the minimum binary representation of `val`
pub(crate) fn bit_length(val: i64) -> usize {
    debug_assert!(val >= 0);
    (64 - val.leading_zeros()) as usize
}

/// Σ over expressions, the zero constant for an empty sum
pub(crate) fn sum(exprs: impl IntoIterator<Item = Expr>) -> Expr {
    exprs
        .into_iter()
        .reduce(|acc, expr| acc + expr)
        .unwrap_or_else(|| Expr::num(0.))
}
