//! # qubo-rs - Integer Encodings for QUBO Modelling
//!
//! `qubo-rs` provides integer-to-binary encodings and a small symbolic
//! expression compiler for formulating combinatorial optimization problems
//! as Quadratic Unconstrained Binary Optimization (QUBO) models.
//!
//! An integer variable in an inclusive range is encoded as a set of named
//! binary variables plus a symbolic reconstruction expression; the
//! expression is embedded into an objective, compiled to a QUBO, handed to a
//! sampler, and the returned assignment is decoded back into the integer's
//! value. Encodings that admit inconsistent bit patterns carry a validity
//! penalty and refuse to decode assignments that break it.
//!
//! ## Encodings
//!
//! | Encoding | Bits for range width `d` | Validity penalty |
//! | --- | --- | --- |
//! | [`encodings::OneHot`] | `d + 1` | exactly-one-hot |
//! | [`encodings::Order`] | `d` | threshold monotonicity |
//! | [`encodings::Log`] | `ceil(log2(d + 1))` | none, all patterns in range |
//! | [`encodings::Unary`] | `d` | none, redundant patterns allowed |
//! | [`encodings::Gray`] | `bit_length(d)` | none, see [`encodings::Gray`] |
//!
//! ## Features
//!
//! | Feature name | Description |
//! | --- | --- |
//! | `fxhash` (default) | Use the faster firefox hash function from `rustc-hash`. |
//! | `serde` | Serialization of emitted QUBO matrices. |

pub mod encodings;
pub mod expr;
pub mod model;
pub mod solvers;
pub mod types;
