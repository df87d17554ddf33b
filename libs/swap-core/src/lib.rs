//! Bounded token replacement over untyped JSON.
//!
//! This crate holds the part of json-swap that touches attacker-controlled
//! structure:
//! - **Safe parsing** ([`safe_parse`]): strict JSON decoding that drops
//!   prototype-pollution keys while the value is being built
//! - **Transformation** ([`Replacer`]): a depth- and budget-limited walk that
//!   swaps word-bounded occurrences of a source token for a target token
//!
//! Neither half performs I/O or touches shared state, so one [`Replacer`] can
//! serve any number of concurrent requests.
//!
//! ```rust
//! use json_swap_core::{safe_parse, Replacer, TokenPair};
//!
//! let replacer = Replacer::new(TokenPair::new("dog", "cat").unwrap());
//! let value = safe_parse(r#"{"pet": "dog", "__proto__": {"admin": true}}"#).unwrap();
//! let outcome = replacer.transform(&value, 10, 8).unwrap();
//!
//! assert_eq!(outcome.result, serde_json::json!({"pet": "cat"}));
//! assert_eq!(outcome.replacements, 1);
//! assert!(!outcome.limit_reached);
//! ```

use thiserror::Error;

pub mod context;
pub mod parser;
pub mod transform;

pub use context::{DepthGuard, TraversalContext};
pub use parser::{
    safe_parse, safe_parse_slice, safe_parse_slice_with_depth, safe_parse_with_depth,
};
pub use transform::{ReplacementResult, Replacer, TokenPair};

/// Hard ceiling on container nesting accepted by the parser, whatever limit
/// the caller asks for.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Object keys that are never allowed to survive parsing or transformation.
pub const DANGEROUS_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

/// Returns true when `key` is one of [`DANGEROUS_KEYS`].
pub fn is_dangerous_key(key: &str) -> bool {
    DANGEROUS_KEYS.contains(&key)
}

/// Errors surfaced by the parser and the transformer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    /// The input nests containers deeper than the configured limit
    #[error("JSON nesting exceeds the maximum depth of {max_depth}")]
    DepthLimitExceeded { max_depth: usize },

    /// The input text is not strict JSON
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// A token pair was rejected before any traversal ran
    #[error("invalid token configuration: {0}")]
    InvalidTokens(String),
}
