use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::TraversalContext;
use crate::{is_dangerous_key, SwapError};

/// The token to look for and the token that replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    source: String,
    target: String,
}

impl TokenPair {
    /// Builds a pair, rejecting an empty source token.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Result<Self, SwapError> {
        let source = source.into();
        if source.is_empty() {
            return Err(SwapError::InvalidTokens(
                "source token cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            source,
            target: target.into(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Outcome of one transform call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementResult {
    pub result: Value,
    pub replacements: u64,
    pub limit_reached: bool,
}

/// Swaps word-bounded occurrences of a source token inside JSON strings.
#[derive(Debug, Clone)]
pub struct Replacer {
    tokens: TokenPair,
}

impl Replacer {
    pub fn new(tokens: TokenPair) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    /// Produces a copy of `input` with at most `max_replacements` substitutions.
    ///
    /// Containers nested deeper than `max_depth` levels below the root abort
    /// the whole call with [`SwapError::DepthLimitExceeded`]. Keys listed in
    /// [`crate::DANGEROUS_KEYS`] are dropped together with their values.
    pub fn transform(
        &self,
        input: &Value,
        max_replacements: u64,
        max_depth: usize,
    ) -> Result<ReplacementResult, SwapError> {
        let mut ctx = TraversalContext::new(max_replacements, max_depth);
        let result = self.walk(input, &mut ctx)?;

        Ok(ReplacementResult {
            result,
            replacements: ctx.count(),
            limit_reached: ctx.count() >= ctx.limit(),
        })
    }

    fn walk(&self, value: &Value, ctx: &mut TraversalContext) -> Result<Value, SwapError> {
        match value {
            Value::String(text) => Ok(Value::String(self.replace_in_str(text, ctx))),
            Value::Array(items) => {
                let mut scope = ctx.enter()?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.walk(item, &mut scope)?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                let mut scope = ctx.enter()?;
                let mut out = Map::with_capacity(map.len());
                for (key, item) in map {
                    if is_dangerous_key(key) {
                        continue;
                    }
                    out.insert(key.clone(), self.walk(item, &mut scope)?);
                }
                Ok(Value::Object(out))
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
        }
    }

    /// Replaces matches left to right until the budget runs out, then copies
    /// the remainder untouched.
    fn replace_in_str(&self, input: &str, ctx: &mut TraversalContext) -> String {
        if ctx.budget_exhausted() {
            return input.to_owned();
        }

        let source = self.tokens.source();
        let bytes = input.as_bytes();
        let mut out = String::with_capacity(input.len());
        let mut copied = 0;
        let mut cursor = 0;

        while !ctx.budget_exhausted() {
            let Some(offset) = input[cursor..].find(source) else {
                break;
            };
            let start = cursor + offset;
            let end = start + source.len();

            if is_word_bounded(bytes, start, end) && ctx.try_consume() {
                out.push_str(&input[copied..start]);
                out.push_str(self.tokens.target());
                copied = end;
                cursor = end;
            } else {
                // Step one character so overlapping candidates are still seen.
                cursor = start + input[start..].chars().next().map_or(1, char::len_utf8);
            }
        }

        out.push_str(&input[copied..]);
        out
    }
}

/// A candidate at `start..end` matches only when neither neighbour is an
/// ASCII letter or digit. String edges and non-ASCII characters are boundaries.
fn is_word_bounded(bytes: &[u8], start: usize, end: usize) -> bool {
    let before = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
    let after = end >= bytes.len() || !bytes[end].is_ascii_alphanumeric();
    before && after
}
