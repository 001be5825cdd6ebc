//! # One-Hot Encoded Integers
//!
//! One bit per representable value; bit `i` means "the integer equals
//! `lower + i`". An exactly-one-hot penalty keeps the assignment consistent
//! during optimization.

use crate::expr::Expr;

use super::{bit_name, check_range, sum, Error, Integer};

/// A one-hot encoded integer in `[lower, upper]`.
///
/// Allocates `upper - lower + 1` bits named `"{label}[{i}]"`. The
/// reconstruction expression is `Σ (lower + i) * bit_i`; the validity
/// penalty `strength * (Σ bit_i - 1)^2` is registered as the constraint
/// `"{label}_const"` and added once to any objective the integer is
/// compiled into. Decoding an assignment where the bits do not sum to
/// exactly one fails with
/// [`ConstraintViolated`](crate::model::Error::ConstraintViolated).
#[derive(Debug)]
pub struct OneHot {
    label: String,
    const_label: String,
    lower: i64,
    upper: i64,
    bits: Vec<Expr>,
    expr: Expr,
}

impl OneHot {
    /// Creates a one-hot encoded integer over the inclusive `value_range`.
    /// `strength` scales the exactly-one-hot penalty and may be a number or
    /// a [placeholder](Expr::placeholder).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] if `upper <= lower`.
    pub fn new(
        label: impl Into<String>,
        value_range: (i64, i64),
        strength: impl Into<Expr>,
    ) -> Result<OneHot, Error> {
        let (lower, upper) = value_range;
        check_range(lower, upper)?;
        let label = label.into();
        let const_label = format!("{label}_const");
        let bits: Vec<Expr> = (0..=(upper - lower) as usize)
            .map(|idx| Expr::binary(bit_name(&label, idx)))
            .collect();
        let recon = sum(
            bits.iter()
                .enumerate()
                .map(|(idx, bit)| (lower + idx as i64) * bit.clone()),
        );
        let penalty = (strength.into() * (sum(bits.iter().cloned()) - 1).pow(2))
            .constraint(const_label.clone());
        let expr = recon
            .subh(label.clone())
            .with_penalty(penalty, const_label.clone());
        Ok(OneHot {
            label,
            const_label,
            lower,
            upper,
            bits,
            expr,
        })
    }

    /// Gets an expression that equals 1 iff the integer equals `value`. This
    /// is simply the bit representing `value`, no extra variables needed.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `value` is not in the value range.
    pub fn equal_to(&self, value: i64) -> Result<Expr, Error> {
        if value < self.lower || value > self.upper {
            return Err(Error::OutOfRange {
                value,
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(self.bits[(value - self.lower) as usize].clone())
    }
}

impl Integer for OneHot {
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
    use super::OneHot;
    use crate::{
        encodings::{Error, Integer},
        feed,
        types::Sample,
    };

    fn one_hot_sample(label: &str, n_bits: usize, hot: Option<usize>) -> Sample {
        (0..n_bits)
            .map(|idx| {
                (
                    format!("{label}[{idx}]"),
                    u8::from(hot == Some(idx)),
                )
            })
            .collect()
    }

    #[test]
    fn rejects_empty_range() {
        assert_eq!(
            OneHot::new("a", (4, 4), 1.0).unwrap_err(),
            Error::InvalidRange { lower: 4, upper: 4 }
        );
        assert_eq!(
            OneHot::new("a", (4, 0), 1.0).unwrap_err(),
            Error::InvalidRange { lower: 4, upper: 0 }
        );
    }

    #[test]
    fn reconstruction_per_hot_bit() {
        let a = OneHot::new("a", (-2, 2), 1.0).unwrap();
        assert_eq!(a.value_range(), (-2, 2));
        for idx in 0..5 {
            let sample = one_hot_sample("a", 5, Some(idx));
            let val = a.expr().eval(&sample, &feed! {}).unwrap();
            assert_eq!(val, -2. + idx as f64);
        }
    }

    #[test]
    fn penalty_zero_iff_exactly_one_hot() {
        let a = OneHot::new("a", (0, 2), 2.0).unwrap();
        let model = a.expr().compile().unwrap();
        for code in 0..8u8 {
            let sample: Sample = (0..3)
                .map(|idx| (format!("a[{idx}]"), (code >> idx) & 1))
                .collect();
            let decoded = model.decode_sample(&sample, &feed! {}).unwrap();
            let n_hot = code.count_ones();
            if n_hot == 1 {
                assert!(decoded.broken_constraints().is_empty());
            } else {
                let expected = 2. * (f64::from(n_hot) - 1.).powi(2);
                assert_eq!(decoded.broken_constraints(), vec![("a_const", expected)]);
                assert!(decoded.value(&a).is_err());
            }
        }
    }

    #[test]
    fn equal_to_is_the_hot_bit() {
        let a = OneHot::new("a", (0, 4), 1.0).unwrap();
        let eq3 = a.equal_to(3).unwrap();
        let sample = one_hot_sample("a", 5, Some(3));
        assert_eq!(eq3.eval(&sample, &feed! {}).unwrap(), 1.);
        let sample = one_hot_sample("a", 5, Some(2));
        assert_eq!(eq3.eval(&sample, &feed! {}).unwrap(), 0.);
        assert_eq!(
            a.equal_to(5).unwrap_err(),
            Error::OutOfRange {
                value: 5,
                lower: 0,
                upper: 4
            }
        );
    }
}
