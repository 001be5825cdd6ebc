//! # Order Encoded Integers
//!
//! Threshold (cumulative unary) encoding: bit `i` means "the integer is
//! greater than `lower + i`". A valid assignment is monotone, a block of
//! ones followed by zeros; the value is the count of ones. Because the bits
//! are threshold indicators, order comparisons against constants come for
//! free.

use itertools::Itertools;

use crate::expr::Expr;

use super::{bit_name, check_range, sum, Error, Integer};

/// An order encoded integer in `[lower, upper]`.
///
/// Allocates `upper - lower` threshold bits named `"{label}[{i}]"`. The
/// reconstruction expression is `lower + Σ bit_i`; monotonicity is enforced
/// by the penalty `strength * Σ bit_i * (1 - bit_{i-1})`, registered as the
/// constraint `"{label}_const"`. Decoding an assignment with a hole (a one
/// above a zero) fails with
/// [`ConstraintViolated`](crate::model::Error::ConstraintViolated).
#[derive(Debug)]
pub struct Order {
    label: String,
    const_label: String,
    lower: i64,
    upper: i64,
    bits: Vec<Expr>,
    expr: Expr,
}

impl Order {
    /// Creates an order encoded integer over the inclusive `value_range`.
    /// `strength` scales the monotonicity penalty and may be a number or a
    /// [placeholder](Expr::placeholder).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] if `upper <= lower`.
    pub fn new(
        label: impl Into<String>,
        value_range: (i64, i64),
        strength: impl Into<Expr>,
    ) -> Result<Order, Error> {
        let (lower, upper) = value_range;
        check_range(lower, upper)?;
        let label = label.into();
        let const_label = format!("{label}_const");
        let bits: Vec<Expr> = (0..(upper - lower) as usize)
            .map(|idx| Expr::binary(bit_name(&label, idx)))
            .collect();
        let recon = lower + sum(bits.iter().cloned());
        let inversions = sum(
            bits.iter()
                .tuple_windows()
                .map(|(below, above)| above.clone() * (1 - below.clone())),
        );
        let penalty = (strength.into() * inversions).constraint(const_label.clone());
        let expr = recon
            .subh(label.clone())
            .with_penalty(penalty, const_label.clone());
        Ok(Order {
            label,
            const_label,
            lower,
            upper,
            bits,
            expr,
        })
    }

    /// Gets an expression that equals 1 iff the integer is greater than
    /// `value`: the threshold bit for `value` itself, no extra variables
    /// needed.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `value` is not in `[lower, upper - 1]` (for
    /// other values the comparison is constant).
    pub fn more_than(&self, value: i64) -> Result<Expr, Error> {
        if value < self.lower || value >= self.upper {
            return Err(Error::OutOfRange {
                value,
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(self.bits[(value - self.lower) as usize].clone())
    }

    /// Gets an expression that equals 1 iff the integer is less than
    /// `value`: the negation of the threshold bit for `value - 1`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `value` is not in `[lower + 1, upper]` (for
    /// other values the comparison is constant).
    pub fn less_than(&self, value: i64) -> Result<Expr, Error> {
        if value <= self.lower || value > self.upper {
            return Err(Error::OutOfRange {
                value,
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(1 - self.bits[(value - 1 - self.lower) as usize].clone())
    }
}

impl Integer for Order {
    fn label(&self) -> &str {
        &self.label
    }

    fn value_range(&self) -> (i64, i64) {
        (self.lower, self.upper)
    }

    fn expr(&self) -> Expr {
        self.expr.clone()
    }

    fn constraint_label(&self) -> Option<&str> {
        Some(&self.const_label)
    }
}

#[cfg(test)]
mod tests {
    use super::Order;
    use crate::{
        encodings::{Error, Integer},
        feed,
        types::Sample,
    };

    fn threshold_sample(label: &str, n_bits: usize, bits: &[u8]) -> Sample {
        assert_eq!(bits.len(), n_bits);
        bits.iter()
            .enumerate()
            .map(|(idx, bit)| (format!("{label}[{idx}]"), *bit))
            .collect()
    }

    #[test]
    fn rejects_empty_range() {
        assert_eq!(
            Order::new("a", (1, 1), 1.0).unwrap_err(),
            Error::InvalidRange { lower: 1, upper: 1 }
        );
    }

    #[test]
    fn monotone_assignments_decode() {
        let a = Order::new("a", (2, 6), 1.0).unwrap();
        let model = a.expr().compile().unwrap();
        for n_ones in 0..=4usize {
            let bits: Vec<u8> = (0..4).map(|idx| u8::from(idx < n_ones)).collect();
            let sample = threshold_sample("a", 4, &bits);
            let decoded = model.decode_sample(&sample, &feed! {}).unwrap();
            assert!(decoded.broken_constraints().is_empty());
            assert_eq!(decoded.value(&a).unwrap(), 2 + n_ones as i64);
        }
    }

    #[test]
    fn inversions_are_penalized() {
        let a = Order::new("a", (0, 4), 3.0).unwrap();
        let model = a.expr().compile().unwrap();
        // a one above a zero breaks the threshold semantics
        let sample = threshold_sample("a", 4, &[1, 0, 1, 0]);
        let decoded = model.decode_sample(&sample, &feed! {}).unwrap();
        assert_eq!(decoded.broken_constraints(), vec![("a_const", 3.)]);
        assert!(decoded.value(&a).is_err());
        // two inversions, twice the penalty
        let sample = threshold_sample("a", 4, &[0, 1, 0, 1]);
        let decoded = model.decode_sample(&sample, &feed! {}).unwrap();
        assert_eq!(decoded.broken_constraints(), vec![("a_const", 6.)]);
    }

    #[test]
    fn comparisons_reference_threshold_bits() {
        let a = Order::new("a", (0, 4), 1.0).unwrap();
        let sample = threshold_sample("a", 4, &[1, 1, 0, 0]); // a == 2
        assert_eq!(
            a.more_than(1).unwrap().eval(&sample, &feed! {}).unwrap(),
            1.
        );
        assert_eq!(
            a.more_than(2).unwrap().eval(&sample, &feed! {}).unwrap(),
            0.
        );
        assert_eq!(
            a.less_than(3).unwrap().eval(&sample, &feed! {}).unwrap(),
            1.
        );
        assert_eq!(
            a.less_than(2).unwrap().eval(&sample, &feed! {}).unwrap(),
            0.
        );
        assert!(a.more_than(4).is_err());
        assert!(a.less_than(0).is_err());
    }
}
