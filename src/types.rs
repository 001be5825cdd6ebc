//! # Common Types for QUBO Modelling
//!
//! Common types and aliases used throughout the library.

/// The hash map to use throughout the library
#[cfg(feature = "fxhash")]
pub type RsHashMap<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fxhash"))]
pub type RsHashMap<K, V> = std::collections::HashMap<K, V>;

/// The hash set to use throughout the library
#[cfg(feature = "fxhash")]
pub type RsHashSet<V> = rustc_hash::FxHashSet<V>;
#[cfg(not(feature = "fxhash"))]
pub type RsHashSet<V> = std::collections::HashSet<V>;

/// A concrete 0/1 assignment to named binary variables, as produced by a
/// sampler and consumed when decoding.
pub type Sample = RsHashMap<String, u8>;

/// Concrete values for the [`placeholder`](crate::expr::Expr::placeholder)s
/// of an expression, bound at QUBO-generation time.
pub type FeedDict = RsHashMap<String, f64>;

/// Builds a [`FeedDict`] from `name => value` pairs.
///
/// ```
/// use qubo_rs::feed;
///
/// let feed = feed! { "s" => 10.0, "m" => 2.0 };
/// assert_eq!(feed["s"], 10.0);
/// ```
#[macro_export]
macro_rules! feed {
    () => {
        $crate::types::FeedDict::default()
    };
    ($($name:expr => $val:expr),+ $(,)?) => {{
        let mut feed = $crate::types::FeedDict::default();
        $(feed.insert(String::from($name), f64::from($val));)+
        feed
    }};
}

/// Builds a [`Sample`] from `name => bit` pairs. Mostly useful in tests and
/// when replaying externally obtained solver output.
#[macro_export]
macro_rules! sample {
    () => {
        $crate::types::Sample::default()
    };
    ($($name:expr => $val:expr),+ $(,)?) => {{
        let mut sample = $crate::types::Sample::default();
        $(sample.insert(String::from($name), $val as u8);)+
        sample
    }};
}
