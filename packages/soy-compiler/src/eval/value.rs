//! Runtime value representation for the expression evaluator (spec.md §4.7).

use std::cmp::Ordering;

use crate::error::{CompilerError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Record(Vec<(String, Value)>),
    Map(Vec<(Value, Value)>),
    EnumValue { fqn: String, member: String },
    Proto { fqn: String, fields: Vec<(String, Value)> },
    TemplateRef(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Soy truthiness: `null`, `false`, `0`, and `""` are falsy; everything
    /// else (including empty lists/records/maps) is truthy (spec.md §4.7).
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn negate(&self) -> Result<Value> {
        match self {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(type_error("unary `-`", other)),
        }
    }

    /// `+` is overloaded for string concatenation when either side is a
    /// string (spec.md §4.7), otherwise numeric addition.
    pub fn add(&self, other: &Value) -> Result<Value> {
        if matches!(self, Value::Str(_)) || matches!(other, Value::Str(_)) {
            return Ok(Value::Str(format!("{}{}", self.display(), other.display())));
        }
        self.arith(other, |a, b| a + b, |a, b| a + b)
    }

    pub fn arith(&self, other: &Value, int_op: impl Fn(i64, i64) -> i64, float_op: impl Fn(f64, f64) -> f64) -> Result<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
            _ => {
                let a = self.as_f64().ok_or_else(|| type_error("arithmetic", self))?;
                let b = other.as_f64().ok_or_else(|| type_error("arithmetic", other))?;
                Ok(Value::Float(float_op(a, b)))
            }
        }
    }

    pub fn divide(&self, other: &Value) -> Result<Value> {
        let a = self.as_f64().ok_or_else(|| type_error("/", self))?;
        let b = other.as_f64().ok_or_else(|| type_error("/", other))?;
        Ok(Value::Float(a / b))
    }

    pub fn modulo(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) if *b != 0 => Ok(Value::Int(a % b)),
            (Value::Int(_), Value::Int(0)) => Err(CompilerError::AssertionFailure("modulo by zero".into())),
            _ => {
                let a = self.as_f64().ok_or_else(|| type_error("%", self))?;
                let b = other.as_f64().ok_or_else(|| type_error("%", other))?;
                Ok(Value::Float(a % b))
            }
        }
    }

    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        if let (Value::Str(a), Value::Str(b)) = (self, other) {
            return Ok(a.cmp(b));
        }
        let a = self.as_f64().ok_or_else(|| type_error("comparison", self))?;
        let b = other.as_f64().ok_or_else(|| type_error("comparison", other))?;
        a.partial_cmp(&b).ok_or_else(|| CompilerError::AssertionFailure("NaN is not comparable".into()))
    }

    /// Loose `==`: numbers and numeric strings compare by numeric value;
    /// otherwise structural equality (spec.md §4.7).
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (a, b) if a.as_f64().is_some() && b.as_f64().is_some() && !matches!((a, b), (Value::Str(_), Value::Str(_))) => {
                a.as_f64() == b.as_f64()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y)),
            _ => self == other,
        }
    }

    pub fn field(&self, name: &str) -> Result<Value> {
        match self {
            Value::Record(fields) | Value::Proto { fields, .. } => fields
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| CompilerError::AssertionFailure(format!("no field `{name}`"))),
            other => Err(type_error(&format!(".{name}"), other)),
        }
    }

    pub fn item(&self, index: &Value) -> Result<Value> {
        match (self, index) {
            (Value::List(items), Value::Int(i)) => {
                let idx = *i;
                if idx < 0 || idx as usize >= items.len() {
                    return Err(CompilerError::AssertionFailure(format!("index {idx} out of bounds")));
                }
                Ok(items[idx as usize].clone())
            }
            (Value::Map(entries), key) => entries
                .iter()
                .find(|(k, _)| k.loose_eq(key))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| CompilerError::AssertionFailure("map key not found".into())),
            _ => Err(type_error("[]", self)),
        }
    }

    pub fn call_method(&self, method: &str, args: &[Value]) -> Result<Value> {
        match (self, method, args) {
            (Value::Str(s), "length", []) => Ok(Value::Int(s.chars().count() as i64)),
            (Value::Str(s), "toUpperCase" | "upper", []) => Ok(Value::Str(s.to_uppercase())),
            (Value::Str(s), "toLowerCase" | "lower", []) => Ok(Value::Str(s.to_lowercase())),
            (Value::List(items), "length", []) => Ok(Value::Int(items.len() as i64)),
            _ => Err(CompilerError::AssertionFailure(format!("no method `.{method}()` on this value"))),
        }
    }

    fn display(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::EnumValue { fqn, member } => format!("{fqn}.{member}"),
            Value::TemplateRef(name) => name.clone(),
            Value::List(_) | Value::Record(_) | Value::Map(_) | Value::Proto { .. } => {
                "[object]".to_string()
            }
        }
    }
}

fn type_error(op: &str, value: &Value) -> CompilerError {
    CompilerError::AssertionFailure(format!("`{op}` is not defined for {value:?}"))
}
