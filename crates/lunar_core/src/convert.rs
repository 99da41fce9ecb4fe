//! Value conversion between Lua and the host
//!
//! `to_host` walks interpreter values outward with a depth counter;
//! `to_interpreter` builds fresh Lua values from host values.
//!
//! The two directions are not symmetric. Incoming arrays (and array-like
//! objects) become sequence tables, but outgoing tables always become host
//! objects keyed by the string form of each table key, so `{ "a", "b" }`
//! leaves Lua as `{"1": "a", "2": "b"}`.

use std::collections::BTreeMap;

use mlua::{Lua, Table, Value};

use crate::error::InterpreterError;
use crate::value::{HostFunction, HostValue};

/// Deepest nesting level converted outward. Anything past it reads as
/// `Undefined`. This bounds cyclic tables too; there is no visited set.
pub const MAX_DEPTH: usize = 5;

/// Convert an interpreter value to a host value.
///
/// Start at depth 0. Never fails: values with no faithful host form degrade
/// silently.
pub fn to_host(value: &Value, depth: usize) -> HostValue {
    if depth > MAX_DEPTH {
        return HostValue::Undefined;
    }

    match value {
        Value::Function(_) => HostValue::Function(HostFunction::noop()),
        Value::Nil => HostValue::Null,
        Value::Boolean(b) => HostValue::Boolean(*b),
        Value::Integer(i) => HostValue::Number(*i as f64),
        Value::Number(n) => HostValue::Number(*n),
        Value::String(s) => HostValue::String(s.to_string_lossy()),
        Value::Table(table) => table_to_host(table, depth),
        other => match display(other) {
            text if text == "nil" => HostValue::Null,
            text => HostValue::String(text),
        },
    }
}

fn table_to_host(table: &Table, depth: usize) -> HostValue {
    let mut object = BTreeMap::new();

    // Raw traversal: no __pairs or __index, so the source is left untouched.
    let walked = table.for_each::<Value, Value>(|key, value| {
        object.insert(key_string(&key), to_host(&value, depth + 1));
        Ok(())
    });
    if let Err(err) = walked {
        tracing::debug!("table traversal stopped early: {}", err);
    }

    HostValue::Object(object)
}

/// String form of a table key. Integral numbers render without a fraction
/// whether Lua stores them as integers or floats.
pub fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.to_string_lossy(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            (*n as i64).to_string()
        }
        Value::Number(n) => n.to_string(),
        Value::Boolean(b) => b.to_string(),
        other => display(other),
    }
}

/// Lua's own `tostring` rendering, falling back to `<type>: <pointer>` when a
/// `__tostring` metamethod faults.
fn display(value: &Value) -> String {
    value
        .to_string()
        .unwrap_or_else(|_| format!("{}: {:?}", value.type_name(), value.to_pointer()))
}

/// Convert a host value to an interpreter value.
///
/// Host functions have no interpreter form and become nil.
pub fn to_interpreter(lua: &Lua, value: &HostValue) -> Result<Value, InterpreterError> {
    let converted = match value {
        HostValue::Undefined | HostValue::Null => Value::Nil,
        HostValue::Boolean(b) => Value::Boolean(*b),
        HostValue::Number(n) => Value::Number(*n),
        HostValue::String(s) => Value::String(lua.create_string(s).map_err(conversion)?),
        HostValue::Array(items) => sequence_table(lua, items.iter().map(Some))?,
        HostValue::Object(map) => match value.get("length").and_then(HostValue::as_f64) {
            Some(length) => {
                let items = (0..array_length(length)).map(|i| map.get(&i.to_string()));
                sequence_table(lua, items)?
            }
            None => {
                let table = lua.create_table().map_err(conversion)?;
                for (key, member) in map {
                    table
                        .raw_set(key.as_str(), to_interpreter(lua, member)?)
                        .map_err(conversion)?;
                }
                Value::Table(table)
            }
        },
        HostValue::Function(_) => {
            tracing::debug!("host function has no Lua form; passing nil");
            Value::Nil
        }
    };

    Ok(converted)
}

/// Fresh table with the items appended in order. Missing items are nil, and
/// appending nil does not take a slot, so later items close the gap.
fn sequence_table<'a>(
    lua: &Lua,
    items: impl Iterator<Item = Option<&'a HostValue>>,
) -> Result<Value, InterpreterError> {
    let table = lua.create_table().map_err(conversion)?;
    for item in items {
        let value = match item {
            Some(item) => to_interpreter(lua, item)?,
            None => Value::Nil,
        };
        table.raw_push(value).map_err(conversion)?;
    }
    Ok(Value::Table(table))
}

/// A `length` member truncated the way a host integer read would be.
fn array_length(length: f64) -> usize {
    if length.is_finite() && length > 0.0 {
        length as usize
    } else {
        0
    }
}

fn conversion(err: mlua::Error) -> InterpreterError {
    InterpreterError::Conversion(err.to_string())
}
