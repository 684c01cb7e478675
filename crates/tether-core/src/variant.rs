// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The dynamically typed value passed to callback targets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically typed argument value.
///
/// Bound arguments and the transient arguments forwarded by an event emission
/// are both carried as `Variant`s, so a single target signature
/// (`Fn(&[Variant])`) can receive either.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    /// The absence of a value.
    #[default]
    Nil,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// An owned string.
    Str(String),
    /// An ordered list of values.
    List(Vec<Variant>),
}

impl Variant {
    /// Returns `true` if this is [`Variant::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Variant::Nil)
    }

    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variant::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float payload. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Variant::Float(f) => Some(*f),
            Variant::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Nil => write!(f, "nil"),
            Variant::Bool(b) => write!(f, "{b}"),
            Variant::Int(i) => write!(f, "{i}"),
            Variant::Float(x) => write!(f, "{x}"),
            Variant::Str(s) => write!(f, "{s}"),
            Variant::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Int(value.into())
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Float(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::Str(value.to_owned())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::Str(value)
    }
}

impl<T: Into<Variant>> From<Vec<T>> for Variant {
    fn from(values: Vec<T>) -> Self {
        Variant::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_matching_variant() {
        assert_eq!(Variant::from(true), Variant::Bool(true));
        assert_eq!(Variant::from(3), Variant::Int(3));
        assert_eq!(Variant::from("hi"), Variant::Str("hi".to_string()));
        assert_eq!(
            Variant::from(vec![1, 2]),
            Variant::List(vec![Variant::Int(1), Variant::Int(2)])
        );
    }

    #[test]
    fn int_widens_to_float() {
        assert_eq!(Variant::Int(2).as_float(), Some(2.0));
        assert_eq!(Variant::Str("x".into()).as_float(), None);
    }

    #[test]
    fn display_formats_lists() {
        let v = Variant::from(vec![Variant::from("a"), Variant::Nil]);
        assert_eq!(v.to_string(), "[a, nil]");
    }

    #[test]
    fn serde_json_preserves_shape() {
        let v = Variant::List(vec![Variant::Int(1), Variant::Str("x".into())]);
        let text = serde_json::to_string(&v).unwrap();
        let back: Variant = serde_json::from_str(&text).unwrap();
        assert_eq!(back, v);
    }
}
