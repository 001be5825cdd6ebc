//! # Symbolic Expressions over Binary Variables
//!
//! The expression substrate that the integer encodings and the QUBO compiler
//! are built on. An [`Expr`] is a cheaply clonable handle to an immutable
//! expression tree; combining expressions shares sub-trees instead of copying
//! them, so an encoding can be embedded into arbitrarily many objectives.
//!
//! ## Example Usage
//!
//! ```
//! use qubo_rs::expr::Expr;
//!
//! let x = Expr::binary("x");
//! let y = Expr::binary("y");
//! let objective = (x + y - 1).pow(2);
//! let model = objective.compile().unwrap();
//! ```

use std::{ops, rc::Rc};

use thiserror::Error;

use crate::types::{FeedDict, Sample};

/// A symbolic arithmetic expression over named binary variables and
/// placeholders.
///
/// Expressions are immutable and reference counted; `clone` is cheap and the
/// underlying tree is structurally shared.
#[derive(Clone, Debug)]
pub struct Expr {
    pub(crate) node: Rc<Node>,
}

#[derive(Debug)]
pub(crate) enum Node {
    /// A numeric constant
    Num(f64),
    /// A named binary decision variable with domain {0, 1}
    Binary(String),
    /// A named coefficient bound via a [`FeedDict`] at QUBO-generation time
    Placeholder(String),
    Add(Expr, Expr),
    Sub(Expr, Expr),
    Mul(Expr, Expr),
    Pow(Expr, u32),
    /// A named sub-expression, retrievable by label after decoding
    SubH(String, Expr),
    /// A named penalty sub-expression, satisfied iff it evaluates to zero
    Constraint(String, Expr),
    /// An expression carrying a side penalty that the compiler adds once per
    /// label to the objective. Arithmetic on the expression only sees `expr`;
    /// the penalty is never squared or duplicated by the embedding context.
    WithPenalty {
        expr: Expr,
        penalty: Expr,
        label: String,
    },
}

/// Errors from evaluating an expression against a concrete assignment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// A binary variable of the expression is missing from the sample
    #[error("binary variable `{0}` is not assigned in the sample")]
    UnboundBinary(String),
    /// A placeholder of the expression is missing from the feed dict
    #[error("placeholder `{0}` has no value in the feed dict")]
    UnboundPlaceholder(String),
}

impl Expr {
    pub(crate) fn new(node: Node) -> Expr {
        Expr {
            node: Rc::new(node),
        }
    }

    /// Creates a numeric constant expression.
    pub fn num(c: f64) -> Expr {
        Expr::new(Node::Num(c))
    }

    /// Creates an expression referencing the named binary variable.
    pub fn binary(name: impl Into<String>) -> Expr {
        Expr::new(Node::Binary(name.into()))
    }

    /// Creates a placeholder expression. Placeholders keep a coefficient
    /// symbolic through compilation and are bound via a
    /// [`FeedDict`] when generating the QUBO.
    pub fn placeholder(name: impl Into<String>) -> Expr {
        Expr::new(Node::Placeholder(name.into()))
    }

    /// Raises the expression to a non-negative integer power.
    #[must_use]
    pub fn pow(self, exp: u32) -> Expr {
        Expr::new(Node::Pow(self, exp))
    }

    /// Tags the expression as a named sub-expression. After decoding, its
    /// value can be retrieved by label via
    /// [`DecodedSample::subh`](crate::model::DecodedSample::subh) without
    /// re-deriving it from individual bits.
    #[must_use]
    pub fn subh(self, label: impl Into<String>) -> Expr {
        Expr::new(Node::SubH(label.into(), self))
    }

    /// Tags the expression as a named constraint. The constraint is
    /// satisfied iff the expression evaluates to zero; decoding reports the
    /// violation magnitude per label.
    #[must_use]
    pub fn constraint(self, label: impl Into<String>) -> Expr {
        Expr::new(Node::Constraint(label.into(), self))
    }

    /// Attaches a side penalty to the expression. The compiler adds each
    /// penalty label once to the objective, regardless of how often or in
    /// what arithmetic context the carrying expression is embedded.
    #[must_use]
    pub fn with_penalty(self, penalty: Expr, label: impl Into<String>) -> Expr {
        Expr::new(Node::WithPenalty {
            expr: self,
            penalty,
            label: label.into(),
        })
    }

    /// Evaluates the expression against a concrete binary assignment and
    /// placeholder values.
    ///
    /// [`WithPenalty`](Node::WithPenalty) nodes evaluate to their value
    /// expression; penalties are part of the compiled objective, not of the
    /// expression's value.
    pub fn eval(&self, sample: &Sample, feed: &FeedDict) -> Result<f64, EvalError> {
        match &*self.node {
            Node::Num(c) => Ok(*c),
            Node::Binary(name) => sample
                .get(name)
                .map(|b| f64::from(*b))
                .ok_or_else(|| EvalError::UnboundBinary(name.clone())),
            Node::Placeholder(name) => feed
                .get(name)
                .copied()
                .ok_or_else(|| EvalError::UnboundPlaceholder(name.clone())),
            Node::Add(lhs, rhs) => Ok(lhs.eval(sample, feed)? + rhs.eval(sample, feed)?),
            Node::Sub(lhs, rhs) => Ok(lhs.eval(sample, feed)? - rhs.eval(sample, feed)?),
            Node::Mul(lhs, rhs) => Ok(lhs.eval(sample, feed)? * rhs.eval(sample, feed)?),
            Node::Pow(base, exp) => Ok(base.eval(sample, feed)?.powi(*exp as i32)),
            Node::SubH(_, inner) | Node::Constraint(_, inner) => inner.eval(sample, feed),
            Node::WithPenalty { expr, .. } => expr.eval(sample, feed),
        }
    }
}

impl From<f64> for Expr {
    fn from(c: f64) -> Expr {
        Expr::num(c)
    }
}

impl From<i64> for Expr {
    fn from(c: i64) -> Expr {
        Expr::num(c as f64)
    }
}

impl From<i32> for Expr {
    fn from(c: i32) -> Expr {
        Expr::num(f64::from(c))
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Expr {
        expr.clone()
    }
}

impl<T: Into<Expr>> ops::Add<T> for Expr {
    type Output = Expr;

    fn add(self, rhs: T) -> Expr {
        Expr::new(Node::Add(self, rhs.into()))
    }
}

impl<T: Into<Expr>> ops::Sub<T> for Expr {
    type Output = Expr;

    fn sub(self, rhs: T) -> Expr {
        Expr::new(Node::Sub(self, rhs.into()))
    }
}

impl<T: Into<Expr>> ops::Mul<T> for Expr {
    type Output = Expr;

    fn mul(self, rhs: T) -> Expr {
        Expr::new(Node::Mul(self, rhs.into()))
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::new(Node::Sub(Expr::num(0.), self))
    }
}

macro_rules! scalar_lhs_ops {
    ($($scalar:ty),*) => {
        $(
            impl ops::Add<Expr> for $scalar {
                type Output = Expr;

                fn add(self, rhs: Expr) -> Expr {
                    Expr::from(self) + rhs
                }
            }

            impl ops::Sub<Expr> for $scalar {
                type Output = Expr;

                fn sub(self, rhs: Expr) -> Expr {
                    Expr::from(self) - rhs
                }
            }

            impl ops::Mul<Expr> for $scalar {
                type Output = Expr;

                fn mul(self, rhs: Expr) -> Expr {
                    Expr::from(self) * rhs
                }
            }
        )*
    };
}

// No `i32` here: a second integer impl makes unsuffixed literals on the
// left of an operator ambiguous, e.g. `(2 * x).pow(2)`.
scalar_lhs_ops!(f64, i64);

#[cfg(test)]
mod tests {
    use super::Expr;
    use crate::{feed, sample};

    #[test]
    fn eval_arithmetic() {
        let x = Expr::binary("x");
        let y = Expr::binary("y");
        let expr = (x * 3 + y - 1).pow(2);
        let sample = sample!["x" => 1, "y" => 0];
        assert_eq!(expr.eval(&sample, &feed! {}).unwrap(), 4.);
    }

    #[test]
    fn eval_placeholder() {
        let x = Expr::binary("x");
        let expr = Expr::placeholder("s") * x;
        let sample = sample!["x" => 1];
        assert_eq!(expr.eval(&sample, &feed! { "s" => 2.5 }).unwrap(), 2.5);
        assert_eq!(
            expr.eval(&sample, &feed! {}),
            Err(super::EvalError::UnboundPlaceholder("s".to_string()))
        );
    }

    #[test]
    fn eval_unbound_binary() {
        let expr = Expr::binary("x") + Expr::binary("y");
        let sample = sample!["x" => 1];
        assert_eq!(
            expr.eval(&sample, &feed! {}),
            Err(super::EvalError::UnboundBinary("y".to_string()))
        );
    }

    #[test]
    fn penalty_transparent_in_eval() {
        let x = Expr::binary("x");
        let penalized = x.clone().with_penalty((x - 1).pow(2), "c");
        let sample = sample!["x" => 0];
        // the penalty is 1 here but must not leak into the value
        assert_eq!(penalized.eval(&sample, &feed! {}).unwrap(), 0.);
    }

    #[test]
    fn scalar_on_either_side() {
        let x = Expr::binary("x");
        let expr = 2 * x.clone() - 1 + (1.5 - x);
        let sample = sample!["x" => 1];
        assert_eq!(expr.eval(&sample, &feed! {}).unwrap(), 1.5);
    }

    #[test]
    fn scalar_left_literal_infers_through_method_call() {
        let x = Expr::binary("x");
        // an unsuffixed literal on the left must not need a type annotation
        let expr = (2 * x.clone() - 1).pow(2) + 0.5 * x;
        let sample = sample!["x" => 0];
        assert_eq!(expr.eval(&sample, &feed! {}).unwrap(), 1.);
    }
}
