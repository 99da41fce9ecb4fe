//! Host value model
//!
//! The JavaScript-shaped side of the bridge. Values arriving from the host
//! are read into this model before conversion, and values leaving the
//! interpreter are produced in it.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A value in the host's dynamic type system.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum HostValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<HostValue>),
    /// Key order carries no meaning.
    Object(BTreeMap<String, HostValue>),
    Function(HostFunction),
}

impl HostValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&HostFunction> {
        match self {
            HostValue::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Member lookup on objects and index lookup on arrays.
    pub fn get(&self, key: &str) -> Option<&HostValue> {
        match self {
            HostValue::Object(map) => map.get(key),
            HostValue::Array(items) => match key {
                "length" => None,
                _ => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            },
            _ => None,
        }
    }

    /// `typeof`-style name, used in argument errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "null",
            HostValue::Boolean(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::Object(_) => "object",
            HostValue::Function(_) => "function",
        }
    }

    /// JSON rendering for display. Functions and `undefined` have no JSON
    /// form and render as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            HostValue::Undefined | HostValue::Null | HostValue::Function(_) => {
                serde_json::Value::Null
            }
            HostValue::Boolean(b) => serde_json::Value::Bool(*b),
            HostValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            HostValue::String(s) => serde_json::Value::String(s.clone()),
            HostValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(HostValue::to_json).collect())
            }
            HostValue::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Number(n.into())
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_owned())
    }
}

impl<K: Into<String>> FromIterator<(K, HostValue)> for HostValue {
    fn from_iter<I: IntoIterator<Item = (K, HostValue)>>(iter: I) -> Self {
        HostValue::Object(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

type Callback = dyn Fn(&[HostValue]) -> HostValue;

/// Opaque host-callable reference.
///
/// Equality is identity: two handles are equal only if they share the same
/// callback.
#[derive(Clone)]
pub struct HostFunction {
    callback: Rc<Callback>,
}

impl HostFunction {
    pub fn new(callback: impl Fn(&[HostValue]) -> HostValue + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Stand-in for an interpreter function handed to the host. Invoking it
    /// never re-enters the interpreter and always yields `Undefined`.
    pub fn noop() -> Self {
        Self::new(|_| HostValue::Undefined)
    }

    pub fn invoke(&self, args: &[HostValue]) -> HostValue {
        (self.callback)(args)
    }
}

impl PartialEq for HostFunction {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("callback", &Rc::as_ptr(&self.callback))
            .finish()
    }
}
