//! Ties the compiler and evaluator together behind a single entry point.

mod compiler;
mod evaluator;

pub use compiler::Token;

use crate::dictionary::Dictionary;
use crate::error::IndexError;
use crate::normalize::Normalizer;

/// Compiles and evaluates `query`, returning its result's value string.
/// A query that fails validation or parenthesis matching resolves to an
/// empty string rather than an error; only I/O or on-disk corruption
/// surfaces as [`IndexError`].
pub fn resolve_query(
    query: &str,
    dictionary: &mut Dictionary,
    normalizer: &dyn Normalizer,
) -> Result<String, IndexError> {
    match compiler::compile(query, dictionary, normalizer) {
        Some(postfix) => evaluator::evaluate(&postfix, dictionary),
        None => Ok(String::new()),
    }
}
