//! # Gray Code Encoded Integers
//!
//! Reflected binary code: consecutive integers differ in exactly one bit, so
//! single bit flips move the encoded value by one. The decode recurrence is
//! expressed symbolically over the gray bits, since at modelling time they
//! are decision variables rather than concrete bits.

use crate::expr::Expr;

use super::{bit_length, check_range, sum, Error, Integer};

/// A gray code encoded integer in `[lower, upper]`.
///
/// Allocates `bit_length(upper - lower)` gray bits named
/// `"{label}_gray[{i}]"`, least significant first. The binary-code bits are
/// recovered by the standard reflected-code recurrence, `b[n-1] = g[n-1]`
/// and `b[i] = g[i] XOR b[i+1]`, with XOR of 0/1-valued terms expressed
/// algebraically as `A + B - 2*A*B`; the reconstruction expression is then
/// `lower + Σ 2^i * b[i]`.
///
/// No validity penalty is carried: every gray pattern decodes to a distinct
/// offset, but when `upper - lower + 1` is not a power of two some patterns
/// decode to offsets above `upper - lower`. Keeping such out-of-range
/// assignments out of the optimum is the caller's responsibility, e.g. by
/// the objective itself penalizing values above `upper`.
#[derive(Debug)]
pub struct Gray {
    label: String,
    lower: i64,
    upper: i64,
    expr: Expr,
}

impl Gray {
    /// Creates a gray code encoded integer over the inclusive `value_range`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] if `upper <= lower`.
    pub fn new(label: impl Into<String>, value_range: (i64, i64)) -> Result<Gray, Error> {
        let (lower, upper) = value_range;
        check_range(lower, upper)?;
        let label = label.into();
        let n_bits = bit_length(upper - lower);
        let gray: Vec<Expr> = (0..n_bits)
            .map(|idx| Expr::binary(format!("{label}_gray[{idx}]")))
            .collect();
        // binary-code bits from most significant down; b[i] = g[i] XOR b[i+1]
        let mut binary: Vec<Expr> = Vec::with_capacity(n_bits);
        for gray_bit in gray.iter().rev() {
            let bit = match binary.last() {
                None => gray_bit.clone(),
                Some(above) => {
                    gray_bit.clone() + above.clone()
                        - 2 * gray_bit.clone() * above.clone()
                }
            };
            binary.push(bit);
        }
        binary.reverse();
        let recon = lower
            + sum(
                binary
                    .iter()
                    .enumerate()
                    .map(|(idx, bit)| (1i64 << idx) * bit.clone()),
            );
        let expr = recon.subh(label.clone());
        Ok(Gray {
            label,
            lower,
            upper,
            expr,
        })
    }
}

impl Integer for Gray {
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
    use super::Gray;
    use crate::{
        encodings::{Error, Integer},
        feed,
        types::Sample,
    };

    /// Concrete gray code of an offset
    fn to_gray(offset: i64) -> i64 {
        offset ^ (offset >> 1)
    }

    fn gray_sample(label: &str, n_bits: usize, gray_code: i64) -> Sample {
        (0..n_bits)
            .map(|idx| {
                (
                    format!("{label}_gray[{idx}]"),
                    ((gray_code >> idx) & 1) as u8,
                )
            })
            .collect()
    }

    #[test]
    fn rejects_equal_bounds() {
        assert_eq!(
            Gray::new("a", (3, 3)).unwrap_err(),
            Error::InvalidRange { lower: 3, upper: 3 }
        );
    }

    #[test]
    fn round_trip_over_full_ranges() {
        // symbolic decode must invert the concrete gray encoding for every
        // value of the range
        for (lower, upper) in [(1i64, 8i64), (0, 3), (-2, 2), (0, 1), (-7, 0)] {
            let a = Gray::new("a", (lower, upper)).unwrap();
            let n_bits = super::bit_length(upper - lower);
            for val in lower..=upper {
                let sample = gray_sample("a", n_bits, to_gray(val - lower));
                let decoded = a.expr().eval(&sample, &feed! {}).unwrap();
                assert_eq!(decoded, val as f64, "value {val} in ({lower}, {upper})");
            }
        }
    }

    #[test]
    fn known_bit_pattern() {
        // offset 4 of (1, 8) is binary 100, gray 110: g0=0, g1=1, g2=1
        let a = Gray::new("a", (1, 8)).unwrap();
        let sample = crate::sample! {
            "a_gray[0]" => 0,
            "a_gray[1]" => 1,
            "a_gray[2]" => 1,
        };
        assert_eq!(a.expr().eval(&sample, &feed! {}).unwrap(), 5.);
    }

    #[test]
    fn out_of_range_patterns_reachable_for_non_power_of_two() {
        // span 4 needs 3 bits; patterns decoding to offsets 5..=7 exist and
        // are deliberately not penalized
        let a = Gray::new("a", (0, 4)).unwrap();
        let mut above = 0;
        for code in 0..8 {
            let sample = gray_sample("a", 3, code);
            if a.expr().eval(&sample, &feed! {}).unwrap() > 4. {
                above += 1;
            }
        }
        assert_eq!(above, 3);
        assert!(a.constraint_label().is_none());
    }
}
