//! # Compiling Expressions to QUBO Models
//!
//! Compilation expands an [`Expr`] into a multilinear polynomial over interned
//! binary variables (powers of a binary variable collapse, `x^2 = x`), keeping
//! placeholder coefficients symbolic. Binding a [`FeedDict`] then yields a
//! [`Qubo`]; terms of degree greater than two are reduced to quadratic by
//! Rosenberg substitution with product variables.
//!
//! Decoding goes the other way: given a concrete assignment, a [`Model`]
//! evaluates the objective energy, every labeled sub-expression, and every
//! constraint, producing a [`DecodedSample`].

use itertools::Itertools;
use thiserror::Error;

use crate::{
    encodings::Integer,
    expr::{EvalError, Expr, Node},
    solvers::SampleSet,
    types::{FeedDict, RsHashMap, Sample},
};

/// Default penalty strength for the product-variable substitution in
/// [`Model::to_qubo`]
pub const DEFAULT_REDUCTION_STRENGTH: f64 = 5.0;

/// Tolerance below which a constraint value counts as satisfied
const CONSTRAINT_TOL: f64 = 1e-9;

/// Errors from compiling, QUBO generation, and decoding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A placeholder of the model has no value in the feed dict
    #[error("placeholder `{0}` has no value in the feed dict")]
    UnboundPlaceholder(String),
    /// A binary variable of the model is missing from the sample
    #[error("binary variable `{0}` is not assigned in the sample")]
    UnboundBinary(String),
    /// The same sub-expression label is declared for two different expressions
    #[error("label `{0}` is declared twice with different expressions")]
    DuplicateLabel(String),
    /// A label was requested that the compiled model does not contain
    #[error("label `{0}` is not part of this model")]
    UnknownLabel(String),
    /// The decoded assignment violates the named validity constraint
    #[error("constraint `{label}` is violated with penalty {magnitude}")]
    ConstraintViolated {
        /// Label of the violated constraint
        label: String,
        /// Evaluated penalty of the constraint under the assignment
        magnitude: f64,
    },
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Error {
        match err {
            EvalError::UnboundBinary(name) => Error::UnboundBinary(name),
            EvalError::UnboundPlaceholder(name) => Error::UnboundPlaceholder(name),
        }
    }
}

/// A monomial over placeholder names, sorted, with repetition for powers
type PhMono = Vec<String>;

/// A polynomial in the placeholders, the coefficient domain of [`Poly`]
#[derive(Clone, Debug, Default)]
struct Coeff {
    monos: RsHashMap<PhMono, f64>,
}

impl Coeff {
    fn constant(c: f64) -> Coeff {
        let mut monos = RsHashMap::default();
        monos.insert(vec![], c);
        Coeff { monos }
    }

    fn placeholder(name: &str) -> Coeff {
        let mut monos = RsHashMap::default();
        monos.insert(vec![name.to_string()], 1.);
        Coeff { monos }
    }

    fn add_assign(&mut self, other: &Coeff) {
        for (mono, c) in &other.monos {
            let entry = self.monos.entry(mono.clone()).or_insert(0.);
            *entry += c;
            if *entry == 0. {
                self.monos.remove(mono);
            }
        }
    }

    fn mul(&self, other: &Coeff) -> Coeff {
        let mut out = Coeff::default();
        for (lm, lc) in &self.monos {
            for (rm, rc) in &other.monos {
                let mono: PhMono = lm.iter().chain(rm.iter()).cloned().sorted().collect();
                let entry = out.monos.entry(mono).or_insert(0.);
                *entry += lc * rc;
            }
        }
        out.monos.retain(|_, c| *c != 0.);
        out
    }

    fn scaled(&self, factor: f64) -> Coeff {
        let monos = self
            .monos
            .iter()
            .map(|(mono, c)| (mono.clone(), c * factor))
            .collect();
        Coeff { monos }
    }

    fn substitute(&self, feed: &FeedDict) -> Result<f64, Error> {
        let mut val = 0.;
        for (mono, c) in &self.monos {
            let mut prod = *c;
            for name in mono {
                prod *= feed
                    .get(name)
                    .copied()
                    .ok_or_else(|| Error::UnboundPlaceholder(name.clone()))?;
            }
            val += prod;
        }
        Ok(val)
    }
}

/// A product of distinct binary variables, sorted by id
type TermKey = Vec<u32>;

/// A multilinear polynomial over interned binary variables
#[derive(Clone, Debug, Default)]
struct Poly {
    terms: RsHashMap<TermKey, Coeff>,
}

impl Poly {
    fn constant(coeff: Coeff) -> Poly {
        let mut terms = RsHashMap::default();
        terms.insert(vec![], coeff);
        Poly { terms }
    }

    fn var(id: u32) -> Poly {
        let mut terms = RsHashMap::default();
        terms.insert(vec![id], Coeff::constant(1.));
        Poly { terms }
    }

    fn add_assign(&mut self, other: &Poly) {
        for (key, coeff) in &other.terms {
            self.terms
                .entry(key.clone())
                .or_default()
                .add_assign(coeff);
        }
        self.terms.retain(|_, coeff| !coeff.monos.is_empty());
    }

    fn scaled(&self, factor: f64) -> Poly {
        let terms = self
            .terms
            .iter()
            .map(|(key, coeff)| (key.clone(), coeff.scaled(factor)))
            .collect();
        Poly { terms }
    }

    fn mul(&self, other: &Poly) -> Poly {
        let mut out = Poly::default();
        for (lk, lc) in &self.terms {
            for (rk, rc) in &other.terms {
                // x * x = x for binary variables, so keys merge as sets
                let key: TermKey = lk.iter().chain(rk.iter()).copied().sorted().dedup().collect();
                out.terms.entry(key).or_default().add_assign(&lc.mul(rc));
            }
        }
        out.terms.retain(|_, coeff| !coeff.monos.is_empty());
        out
    }

    fn pow(&self, exp: u32) -> Poly {
        let mut out = Poly::constant(Coeff::constant(1.));
        for _ in 0..exp {
            out = out.mul(self);
        }
        out
    }
}

/// Traversal state while expanding an expression tree
#[derive(Default)]
struct Compiler {
    vars: Vec<String>,
    var_ids: RsHashMap<String, u32>,
    subhs: RsHashMap<String, Expr>,
    constraints: RsHashMap<String, Expr>,
    penalties: Vec<(String, Expr)>,
}

impl Compiler {
    fn intern(&mut self, name: &str) -> u32 {
        if let Some(id) = self.var_ids.get(name) {
            return *id;
        }
        let id = u32::try_from(self.vars.len()).expect("more than u32::MAX binary variables");
        self.vars.push(name.to_string());
        self.var_ids.insert(name.to_string(), id);
        id
    }

    fn register(
        map: &mut RsHashMap<String, Expr>,
        label: &str,
        expr: &Expr,
    ) -> Result<(), Error> {
        if let Some(known) = map.get(label) {
            if !std::rc::Rc::ptr_eq(&known.node, &expr.node) {
                return Err(Error::DuplicateLabel(label.to_string()));
            }
            return Ok(());
        }
        map.insert(label.to_string(), expr.clone());
        Ok(())
    }

    fn expand(&mut self, expr: &Expr) -> Result<Poly, Error> {
        Ok(match &*expr.node {
            Node::Num(c) => Poly::constant(Coeff::constant(*c)),
            Node::Binary(name) => Poly::var(self.intern(name)),
            Node::Placeholder(name) => Poly::constant(Coeff::placeholder(name)),
            Node::Add(lhs, rhs) => {
                let mut poly = self.expand(lhs)?;
                poly.add_assign(&self.expand(rhs)?);
                poly
            }
            Node::Sub(lhs, rhs) => {
                let mut poly = self.expand(lhs)?;
                poly.add_assign(&self.expand(rhs)?.scaled(-1.));
                poly
            }
            Node::Mul(lhs, rhs) => {
                let lhs = self.expand(lhs)?;
                let rhs = self.expand(rhs)?;
                lhs.mul(&rhs)
            }
            Node::Pow(base, exp) => self.expand(base)?.pow(*exp),
            Node::SubH(label, inner) => {
                Self::register(&mut self.subhs, label, inner)?;
                self.expand(inner)?
            }
            Node::Constraint(label, inner) => {
                Self::register(&mut self.constraints, label, inner)?;
                self.expand(inner)?
            }
            Node::WithPenalty {
                expr,
                penalty,
                label,
            } => {
                if !self.penalties.iter().any(|(known, _)| known == label) {
                    self.penalties.push((label.clone(), penalty.clone()));
                }
                self.expand(expr)?
            }
        })
    }
}

impl Expr {
    /// Compiles the expression into a [`Model`].
    ///
    /// Penalties attached via [`Expr::with_penalty`] are added to the
    /// objective once per label, no matter how often the carrying expression
    /// occurs in the tree.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateLabel`] if two different sub-expressions share a
    /// label. Typically this means two integer encodings were constructed
    /// with the same label.
    pub fn compile(&self) -> Result<Model, Error> {
        let mut compiler = Compiler::default();
        let mut poly = compiler.expand(self)?;
        // penalties may carry penalties themselves, keep draining
        while !compiler.penalties.is_empty() {
            let pending = std::mem::take(&mut compiler.penalties);
            for (_, penalty) in pending {
                poly.add_assign(&compiler.expand(&penalty)?);
            }
        }
        Ok(Model {
            poly,
            vars: compiler.vars,
            subhs: compiler.subhs,
            constraints: compiler.constraints,
        })
    }
}

/// A compiled objective: a multilinear polynomial over binary variables with
/// placeholder coefficients, plus the labeled sub-expressions and constraints
/// collected during compilation.
#[derive(Clone, Debug)]
pub struct Model {
    poly: Poly,
    vars: Vec<String>,
    subhs: RsHashMap<String, Expr>,
    constraints: RsHashMap<String, Expr>,
}

impl Model {
    /// Gets the names of the binary variables of the model, in interning
    /// order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(String::as_str)
    }

    /// Generates the QUBO for the model with the default reduction strength
    /// ([`DEFAULT_REDUCTION_STRENGTH`]).
    ///
    /// # Errors
    ///
    /// [`Error::UnboundPlaceholder`] if the feed dict misses a placeholder.
    pub fn to_qubo(&self, feed: &FeedDict) -> Result<Qubo, Error> {
        self.to_qubo_with_strength(feed, DEFAULT_REDUCTION_STRENGTH)
    }

    /// Generates the QUBO for the model.
    ///
    /// Placeholders are substituted from `feed`. Any term of degree greater
    /// than two is reduced to quadratic by substituting a product variable
    /// `z = x*y` (named `"{x}*{y}"`) and adding the penalty
    /// `strength * (x*y - 2*x*z - 2*y*z + 3*z)`, which is zero iff `z`
    /// agrees with `x*y`. The strength only needs to dominate the
    /// coefficients moved onto product variables; violating assignments gain
    /// energy, consistent ones are unaffected.
    ///
    /// # Errors
    ///
    /// [`Error::UnboundPlaceholder`] if the feed dict misses a placeholder.
    pub fn to_qubo_with_strength(&self, feed: &FeedDict, strength: f64) -> Result<Qubo, Error> {
        let mut names = self.vars.clone();
        let mut terms: RsHashMap<TermKey, f64> = RsHashMap::default();
        for (key, coeff) in &self.poly.terms {
            let val = coeff.substitute(feed)?;
            if val != 0. {
                *terms.entry(key.clone()).or_insert(0.) += val;
            }
        }

        while let Some((first, second)) = most_common_pair(&terms) {
            let prod = u32::try_from(names.len()).expect("more than u32::MAX binary variables");
            names.push(format!(
                "{}*{}",
                names[first as usize], names[second as usize]
            ));
            let mut reduced: RsHashMap<TermKey, f64> = RsHashMap::default();
            for (key, val) in terms {
                let key = if key.len() > 2 && key.contains(&first) && key.contains(&second) {
                    key.iter()
                        .copied()
                        .filter(|&id| id != first && id != second)
                        .chain([prod])
                        .sorted()
                        .collect()
                } else {
                    key
                };
                *reduced.entry(key).or_insert(0.) += val;
            }
            terms = reduced;
            // z = x*y penalty per Rosenberg
            *terms.entry(vec![first, second]).or_insert(0.) += strength;
            *terms.entry(vec![first, prod]).or_insert(0.) -= 2. * strength;
            *terms.entry(vec![second, prod]).or_insert(0.) -= 2. * strength;
            *terms.entry(vec![prod]).or_insert(0.) += 3. * strength;
        }

        let mut qubo = Qubo {
            vars: names.clone(),
            ..Qubo::default()
        };
        for (key, val) in terms {
            match key.len() {
                0 => qubo.offset += val,
                1 => {
                    let name = names[key[0] as usize].clone();
                    *qubo.terms.entry((name.clone(), name)).or_insert(0.) += val;
                }
                2 => {
                    let fst = names[key[0] as usize].clone();
                    let snd = names[key[1] as usize].clone();
                    *qubo.terms.entry((fst, snd)).or_insert(0.) += val;
                }
                _ => unreachable!("reduction leaves no term above degree 2"),
            }
        }
        Ok(qubo)
    }

    /// Evaluates the objective energy of an assignment. This works directly
    /// on the (possibly higher-degree) polynomial, before any product
    /// variable substitution.
    ///
    /// # Errors
    ///
    /// [`Error::UnboundBinary`] / [`Error::UnboundPlaceholder`] on an
    /// incomplete sample or feed dict.
    pub fn energy(&self, sample: &Sample, feed: &FeedDict) -> Result<f64, Error> {
        let mut energy = 0.;
        'terms: for (key, coeff) in &self.poly.terms {
            for id in key {
                let name = &self.vars[*id as usize];
                let bit = sample
                    .get(name)
                    .ok_or_else(|| Error::UnboundBinary(name.clone()))?;
                if *bit == 0 {
                    continue 'terms;
                }
            }
            energy += coeff.substitute(feed)?;
        }
        Ok(energy)
    }

    /// Decodes a concrete assignment: evaluates the objective energy, all
    /// labeled sub-expressions, and all constraints.
    ///
    /// The sample may contain variables the model does not know, e.g.
    /// product variables introduced by [`Model::to_qubo`]; they are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::UnboundBinary`] / [`Error::UnboundPlaceholder`] on an
    /// incomplete sample or feed dict.
    pub fn decode_sample(&self, sample: &Sample, feed: &FeedDict) -> Result<DecodedSample, Error> {
        let energy = self.energy(sample, feed)?;
        let mut subh = RsHashMap::default();
        for (label, expr) in &self.subhs {
            subh.insert(label.clone(), expr.eval(sample, feed)?);
        }
        let mut constraints = RsHashMap::default();
        for (label, expr) in &self.constraints {
            constraints.insert(label.clone(), expr.eval(sample, feed)?);
        }
        Ok(DecodedSample {
            sample: sample.clone(),
            energy,
            subh,
            constraints,
        })
    }

    /// Decodes every sample of a [`SampleSet`], preserving its order.
    ///
    /// # Errors
    ///
    /// As for [`Model::decode_sample`].
    pub fn decode_sampleset(
        &self,
        sampleset: &SampleSet,
        feed: &FeedDict,
    ) -> Result<Vec<DecodedSample>, Error> {
        sampleset
            .iter()
            .map(|solver_sample| self.decode_sample(solver_sample.assignment(), feed))
            .collect()
    }
}

/// Finds the variable pair occurring in the most terms of degree greater than
/// two. Ties break towards the smallest ids so reduction is deterministic.
fn most_common_pair(terms: &RsHashMap<TermKey, f64>) -> Option<(u32, u32)> {
    let mut counts: RsHashMap<(u32, u32), usize> = RsHashMap::default();
    for key in terms.keys().filter(|key| key.len() > 2) {
        for pair in key.iter().copied().combinations(2) {
            *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|(lp, lc), (rp, rc)| lc.cmp(rc).then_with(|| rp.cmp(lp)))
        .map(|(pair, _)| pair)
}

/// A QUBO: quadratic coefficients keyed by variable-name pairs (diagonal
/// entries keyed `(name, name)`) plus a constant offset.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Qubo {
    terms: RsHashMap<(String, String), f64>,
    offset: f64,
    vars: Vec<String>,
}

impl Qubo {
    /// Gets the quadratic coefficients.
    pub fn terms(&self) -> &RsHashMap<(String, String), f64> {
        &self.terms
    }

    /// Gets the constant offset.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Gets the variable names of the QUBO, sorted, without duplicates. This
    /// covers every variable of the model it was generated from plus the
    /// product variables of the reduction, including variables whose
    /// coefficients all canceled to zero.
    pub fn variables(&self) -> Vec<&str> {
        self.vars
            .iter()
            .map(String::as_str)
            .sorted()
            .dedup()
            .collect()
    }

    /// Evaluates the QUBO energy of an assignment, including the offset.
    ///
    /// # Errors
    ///
    /// [`Error::UnboundBinary`] if the sample misses a variable.
    pub fn energy(&self, sample: &Sample) -> Result<f64, Error> {
        let lookup = |name: &String| {
            sample
                .get(name)
                .map(|bit| f64::from(*bit))
                .ok_or_else(|| Error::UnboundBinary(name.clone()))
        };
        let mut energy = self.offset;
        for ((fst, snd), val) in &self.terms {
            energy += val * lookup(fst)? * lookup(snd)?;
        }
        Ok(energy)
    }
}

/// A decoded assignment: objective energy plus the evaluated labeled
/// sub-expressions and constraints of the model it was decoded against.
#[derive(Clone, Debug)]
pub struct DecodedSample {
    sample: Sample,
    energy: f64,
    subh: RsHashMap<String, f64>,
    constraints: RsHashMap<String, f64>,
}

impl DecodedSample {
    /// Gets the underlying assignment.
    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    /// Gets the objective energy of the assignment.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Gets the value of a labeled sub-expression, or [`None`] if the model
    /// has no such label.
    pub fn subh(&self, label: &str) -> Option<f64> {
        self.subh.get(label).copied()
    }

    /// Gets the evaluated constraints by label.
    pub fn constraints(&self) -> &RsHashMap<String, f64> {
        &self.constraints
    }

    /// Gets the constraints violated by this assignment with their penalty
    /// magnitudes, sorted by label.
    pub fn broken_constraints(&self) -> Vec<(&str, f64)> {
        self.constraints
            .iter()
            .filter(|(_, magnitude)| magnitude.abs() > CONSTRAINT_TOL)
            .map(|(label, magnitude)| (label.as_str(), *magnitude))
            .sorted_by(|(ll, _), (rl, _)| ll.cmp(rl))
            .collect()
    }

    /// Gets the decoded value of an integer encoding.
    ///
    /// # Errors
    ///
    /// - [`Error::ConstraintViolated`] if the encoding carries a validity
    ///   constraint and the assignment breaks it. The integer is not decoded
    ///   in that case; an inconsistent encoding has no trustworthy value.
    /// - [`Error::UnknownLabel`] if the integer was not part of the compiled
    ///   expression.
    pub fn value<I: Integer + ?Sized>(&self, int: &I) -> Result<i64, Error> {
        if let Some(label) = int.constraint_label() {
            let magnitude = *self
                .constraints
                .get(label)
                .ok_or_else(|| Error::UnknownLabel(label.to_string()))?;
            if magnitude.abs() > CONSTRAINT_TOL {
                return Err(Error::ConstraintViolated {
                    label: label.to_string(),
                    magnitude,
                });
            }
        }
        let raw = self
            .subh(int.label())
            .ok_or_else(|| Error::UnknownLabel(int.label().to_string()))?;
        Ok(raw.round() as i64)
    }
}
