use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

use crate::{
    animation::animator::{AnimValue, AnimatorConfig},
    foundation::error::{ViewfxError, ViewfxResult},
};

/// Direction of an interactive parameter edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditDirection {
    Up,
    Down,
}

impl EditDirection {
    fn sign(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl FromStr for EditDirection {
    type Err = ViewfxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(ViewfxError::validation(format!(
                "edit direction must be 'up' or 'down', got '{other}'"
            ))),
        }
    }
}

/// A step parameter. The variant is fixed when the declaration is loaded.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<f64>),
    /// Governed by an animator built when the owning step is constructed.
    Animated(AnimatorConfig),
}

impl ParamValue {
    /// Classify a JSON value. Objects must be animator descriptors.
    pub fn from_json(value: serde_json::Value) -> ViewfxResult<Self> {
        use serde_json::Value;
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Text(s),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in &items {
                    let Some(v) = item.as_f64() else {
                        return Err(ViewfxError::validation(format!(
                            "list parameters must be numeric, got {item}"
                        )));
                    };
                    out.push(v);
                }
                Self::List(out)
            }
            Value::Object(_) => {
                let cfg = serde_json::from_value::<AnimatorConfig>(value)
                    .map_err(|e| ViewfxError::animation(format!("invalid animator descriptor: {e}")))?;
                Self::Animated(cfg)
            }
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
            Self::List(v) => Value::from(v.clone()),
            Self::Animated(cfg) => serde_json::to_value(cfg).unwrap_or(Value::Null),
        }
    }

    /// Bump in place: booleans toggle, integers move by `multiplier`, floats by
    /// `0.1 * multiplier`. Other kinds are left untouched and reported.
    pub fn edit(&mut self, direction: EditDirection, multiplier: u32) -> ViewfxResult<()> {
        match self {
            Self::Bool(b) => *b = !*b,
            Self::Int(i) => {
                *i = i.saturating_add(direction.sign() * i64::from(multiplier));
            }
            Self::Float(f) => *f += direction.sign() as f64 * 0.1 * f64::from(multiplier),
            other => {
                return Err(ViewfxError::validation(format!(
                    "cannot edit {} parameter",
                    other.kind()
                )));
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Animated(_) => "animated",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integers, and floats truncated toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[f64]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        Self::List(v)
    }
}

impl From<AnimatorConfig> for ParamValue {
    fn from(v: AnimatorConfig) -> Self {
        Self::Animated(v)
    }
}

impl From<AnimValue> for ParamValue {
    fn from(v: AnimValue) -> Self {
        match v {
            AnimValue::Scalar(s) => Self::Float(s),
            AnimValue::Vector(v) => Self::List(v),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(v) => v.serialize(serializer),
            Self::Animated(cfg) => cfg.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(raw).map_err(D::Error::custom)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v:.3}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(v) => write!(f, "{v:?}"),
            Self::Animated(cfg) => write!(f, "<{:?} animator>", cfg.mode),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/params/value.rs"]
mod tests;
