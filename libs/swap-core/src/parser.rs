//! Strict JSON decoding that never materializes a dangerous key.
//!
//! The value is assembled by a [`Visitor`] rather than by `serde_json`'s own
//! `Value` deserializer. When an object key appears in
//! [`crate::DANGEROUS_KEYS`], its value is consumed as [`IgnoredAny`], which
//! still checks the syntax but builds nothing.
//!
//! `serde_json`'s own recursion limit is switched off; the visitor counts
//! container nesting itself and reports overflow as
//! [`SwapError::DepthLimitExceeded`]. Limits are capped at [`MAX_NESTING_DEPTH`].

use std::cell::Cell;
use std::fmt;

use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};

use crate::{is_dangerous_key, SwapError, MAX_NESTING_DEPTH};

/// Parses `text` as strict JSON, dropping dangerous keys at every level.
///
/// Nesting is bounded by [`MAX_NESTING_DEPTH`]; use [`safe_parse_with_depth`]
/// to apply a tighter limit while parsing.
pub fn safe_parse(text: &str) -> Result<Value, SwapError> {
    safe_parse_with_depth(text, MAX_NESTING_DEPTH)
}

/// Same as [`safe_parse`] for raw bytes. Invalid UTF-8 is malformed input.
pub fn safe_parse_slice(bytes: &[u8]) -> Result<Value, SwapError> {
    safe_parse_slice_with_depth(bytes, MAX_NESTING_DEPTH)
}

/// Parses `text`, failing with [`SwapError::DepthLimitExceeded`] once
/// containers nest more than `max_depth` levels below the root.
pub fn safe_parse_with_depth(text: &str, max_depth: usize) -> Result<Value, SwapError> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    finish(&mut deserializer, max_depth)
}

pub fn safe_parse_slice_with_depth(bytes: &[u8], max_depth: usize) -> Result<Value, SwapError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    finish(&mut deserializer, max_depth)
}

fn finish<'de, R>(
    deserializer: &mut serde_json::Deserializer<R>,
    max_depth: usize,
) -> Result<Value, SwapError>
where
    R: serde_json::de::Read<'de>,
{
    let max_depth = max_depth.min(MAX_NESTING_DEPTH);
    let exceeded = Cell::new(false);
    let seed = SafeValue {
        depth: 0,
        max_depth,
        exceeded: &exceeded,
    };

    deserializer.disable_recursion_limit();
    let value = seed.deserialize(&mut *deserializer).map_err(|err| {
        if exceeded.get() {
            SwapError::DepthLimitExceeded { max_depth }
        } else {
            malformed(err)
        }
    })?;
    // Rejects trailing characters after the document.
    deserializer.end().map_err(malformed)?;
    Ok(value)
}

fn malformed(err: serde_json::Error) -> SwapError {
    SwapError::MalformedJson(err.to_string())
}

/// Seed that builds a filtered [`Value`] nested `depth` containers deep.
#[derive(Clone, Copy)]
struct SafeValue<'a> {
    depth: usize,
    max_depth: usize,
    exceeded: &'a Cell<bool>,
}

impl SafeValue<'_> {
    /// Seed for the children of a container opened at this level.
    fn descend<E>(self) -> Result<Self, E>
    where
        E: serde::de::Error,
    {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            self.exceeded.set(true);
            return Err(E::custom(format_args!(
                "nesting exceeds {} levels",
                self.max_depth
            )));
        }
        Ok(Self { depth, ..self })
    }
}

impl<'de> DeserializeSeed<'de> for SafeValue<'_> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for SafeValue<'_> {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any valid JSON value")
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
        Ok(Value::Bool(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
        Ok(Value::Number(value.into()))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
        Ok(Value::Number(value.into()))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Value, E>
    where
        E: serde::de::Error,
    {
        Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| E::custom("number is not finite"))
    }

    fn visit_str<E>(self, value: &str) -> Result<Value, E> {
        Ok(Value::String(value.to_owned()))
    }

    fn visit_string<E>(self, value: String) -> Result<Value, E> {
        Ok(Value::String(value))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let child = self.descend()?;
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element_seed(child)? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let child = self.descend()?;
        let mut map = Map::new();
        while let Some(key) = access.next_key::<String>()? {
            if is_dangerous_key(&key) {
                access.next_value::<IgnoredAny>()?;
                continue;
            }
            let value = access.next_value_seed(child)?;
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }
}
