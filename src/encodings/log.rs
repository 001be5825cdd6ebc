//! # Log (Binary) Encoded Integers
//!
//! Positional binary encoding with a capped top weight. The most
//! bit-efficient encoding, logarithmic in the range width, and the only one
//! here where every bit pattern decodes to an in-range value, so no penalty
//! is needed.

use crate::expr::Expr;

use super::{bit_length, bit_name, check_range, sum, Error, Integer};

/// A binary encoded integer in `[lower, upper]`.
///
/// Allocates `ceil(log2(upper - lower + 1))` bits named `"{label}[{i}]"`
/// with positional weights `2^i`, except that the most significant weight is
/// capped to `(upper - lower) - (2^(n-1) - 1)` so the maximum representable
/// sum is exactly `upper - lower`. The cap is what makes every one of the
/// `2^n` bit patterns decode in-range; naive powers of two would reach
/// values above the upper bound.
#[derive(Debug)]
pub struct Log {
    label: String,
    lower: i64,
    upper: i64,
    expr: Expr,
}

impl Log {
    /// Creates a binary encoded integer over the inclusive `value_range`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] if `upper <= lower`.
    pub fn new(label: impl Into<String>, value_range: (i64, i64)) -> Result<Log, Error> {
        let (lower, upper) = value_range;
        check_range(lower, upper)?;
        let label = label.into();
        let span = upper - lower;
        let n_bits = bit_length(span);
        let recon = lower
            + sum((0..n_bits).map(|idx| {
                let weight = if idx + 1 == n_bits {
                    span - ((1i64 << (n_bits - 1)) - 1)
                } else {
                    1i64 << idx
                };
                weight * Expr::binary(bit_name(&label, idx))
            }));
        let expr = recon.subh(label.clone());
        Ok(Log {
            label,
            lower,
            upper,
            expr,
        })
    }
}

impl Integer for Log {
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
    use super::Log;
    use crate::{
        encodings::{Error, Integer},
        feed,
        types::Sample,
    };

    fn bit_sample(label: &str, n_bits: usize, code: usize) -> Sample {
        (0..n_bits)
            .map(|idx| (format!("{label}[{idx}]"), ((code >> idx) & 1) as u8))
            .collect()
    }

    #[test]
    fn rejects_empty_range() {
        assert_eq!(
            Log::new("a", (0, 0)).unwrap_err(),
            Error::InvalidRange { lower: 0, upper: 0 }
        );
    }

    #[test]
    fn every_pattern_is_in_range() {
        // 0..=4 is not a power-of-two range, the capped weight must keep all
        // 8 patterns of the 3 bits within bounds
        let a = Log::new("a", (0, 4)).unwrap();
        for code in 0..8 {
            let sample = bit_sample("a", 3, code);
            let val = a.expr().eval(&sample, &feed! {}).unwrap();
            assert!((0. ..=4.).contains(&val), "pattern {code} decodes to {val}");
        }
    }

    #[test]
    fn every_value_is_reachable() {
        for (lower, upper) in [(0i64, 4i64), (-3, 3), (1, 8), (0, 1)] {
            let a = Log::new("x", (lower, upper)).unwrap();
            let n_bits = super::bit_length(upper - lower);
            let mut reached = vec![false; (upper - lower + 1) as usize];
            for code in 0..1usize << n_bits {
                let sample = bit_sample("x", n_bits, code);
                let val = a.expr().eval(&sample, &feed! {}).unwrap() as i64;
                reached[(val - lower) as usize] = true;
            }
            assert!(reached.iter().all(|r| *r), "range ({lower}, {upper})");
        }
    }

    #[test]
    fn power_of_two_range_uses_plain_weights() {
        // span 7, so the top weight cap is a no-op: weights 1, 2, 4
        let a = Log::new("a", (1, 8)).unwrap();
        let sample = bit_sample("a", 3, 0b111);
        assert_eq!(a.expr().eval(&sample, &feed! {}).unwrap(), 8.);
        let sample = bit_sample("a", 3, 0b100);
        assert_eq!(a.expr().eval(&sample, &feed! {}).unwrap(), 5.);
    }
}
