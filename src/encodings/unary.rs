//! # Unary Encoded Integers
//!
//! One weight-1 bit per unit of the range; the value is the plain sum of the
//! bits. Assignments with the same number of ones are interchangeable, and
//! since only the sum matters no validity penalty is needed, unlike one-hot
//! where bit identity carries meaning.

use crate::expr::Expr;

use super::{bit_name, check_range, sum, Error, Integer};

/// A unary encoded integer in `[lower, upper]`.
///
/// Allocates `upper - lower` bits named `"{label}[{i}]"`, each with weight 1.
/// The reconstruction expression is `lower + Σ bit_i`.
#[derive(Debug)]
pub struct Unary {
    label: String,
    lower: i64,
    upper: i64,
    expr: Expr,
}

impl Unary {
    /// Creates a unary encoded integer over the inclusive `value_range`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] if `upper <= lower`.
    pub fn new(label: impl Into<String>, value_range: (i64, i64)) -> Result<Unary, Error> {
        let (lower, upper) = value_range;
        check_range(lower, upper)?;
        let label = label.into();
        let recon = lower
            + sum((0..(upper - lower) as usize).map(|idx| Expr::binary(bit_name(&label, idx))));
        let expr = recon.subh(label.clone());
        Ok(Unary {
            label,
            lower,
            upper,
            expr,
        })
    }
}

impl Integer for Unary {
    fn label(&self) -> &str {
        &self.label
    }

    fn value_range(&self) -> (i64, i64) {
        (self.lower, self.upper)
    }

    fn expr(&self) -> Expr {
        self.expr.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::Unary;
    use crate::{
        encodings::{Error, Integer},
        feed,
        types::Sample,
    };

    #[test]
    fn rejects_empty_range() {
        assert_eq!(
            Unary::new("a", (0, -1)).unwrap_err(),
            Error::InvalidRange { lower: 0, upper: -1 }
        );
    }

    #[test]
    fn value_is_the_popcount() {
        let a = Unary::new("a", (-1, 2)).unwrap();
        assert_eq!(a.value_range(), (-1, 2));
        for code in 0..8usize {
            let sample: Sample = (0..3)
                .map(|idx| (format!("a[{idx}]"), ((code >> idx) & 1) as u8))
                .collect();
            let val = a.expr().eval(&sample, &feed! {}).unwrap();
            // any assignment with the same number of ones is equivalent
            assert_eq!(val, -1. + code.count_ones() as f64);
        }
    }
}
