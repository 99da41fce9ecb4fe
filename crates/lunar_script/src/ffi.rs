//! FFI layer between QuickJS and the host value model
//!
//! Reads JavaScript values into `HostValue` and writes them back.

use std::collections::BTreeMap;

use lunar_core::{HostFunction, HostValue};
use rquickjs::function::Rest;
use rquickjs::{Array, Ctx, Exception, Function, IntoJs, Object, Value};

use crate::error::BridgeError;

/// Nesting level past which incoming JavaScript values read as `undefined`.
/// JavaScript objects can be cyclic and are walked eagerly.
pub const HOST_NESTING_LIMIT: usize = 64;

/// Read a JavaScript value.
///
/// JavaScript functions cannot cross into Lua, so they come back as a
/// detached stub that converts to nil.
pub fn from_js(value: &Value<'_>) -> rquickjs::Result<HostValue> {
    read(value, 0)
}

fn read(value: &Value<'_>, depth: usize) -> rquickjs::Result<HostValue> {
    if depth > HOST_NESTING_LIMIT {
        return Ok(HostValue::Undefined);
    }

    if value.is_undefined() {
        return Ok(HostValue::Undefined);
    }
    if value.is_null() {
        return Ok(HostValue::Null);
    }
    if let Some(b) = value.as_bool() {
        return Ok(HostValue::Boolean(b));
    }
    if let Some(n) = value.as_number() {
        return Ok(HostValue::Number(n));
    }
    if let Some(s) = value.as_string() {
        return Ok(HostValue::String(s.to_string()?));
    }
    if value.is_function() {
        return Ok(HostValue::Function(HostFunction::noop()));
    }
    if let Some(array) = value.as_array() {
        let mut items = Vec::with_capacity(array.len());
        for item in array.iter::<Value>() {
            items.push(read(&item?, depth + 1)?);
        }
        return Ok(HostValue::Array(items));
    }
    if let Some(object) = value.as_object() {
        // Array-like: `length` may be inherited or non-enumerable, as on
        // `arguments`, typed arrays and getter-backed classes.
        let length: Value = object.get("length")?;
        if let Some(length) = length.as_number() {
            let mut items = Vec::new();
            for i in 0..array_length(length) {
                let item: Value = object.get(i.to_string().as_str())?;
                items.push(read(&item, depth + 1)?);
            }
            return Ok(HostValue::Array(items));
        }

        let mut members = BTreeMap::new();
        for key in object.keys::<String>() {
            let key = key?;
            let member: Value = object.get(key.as_str())?;
            let member = read(&member, depth + 1)?;
            members.insert(key, member);
        }
        return Ok(HostValue::Object(members));
    }

    // Symbols, BigInts and the like have no host value form.
    Ok(HostValue::Undefined)
}

/// A `length` truncated the way a host integer read would be.
fn array_length(length: f64) -> usize {
    if length.is_finite() && length > 0.0 {
        length as usize
    } else {
        0
    }
}

/// Build the JavaScript value for a host value.
pub fn into_js<'js>(ctx: &Ctx<'js>, value: &HostValue) -> rquickjs::Result<Value<'js>> {
    let js = match value {
        HostValue::Undefined => Value::new_undefined(ctx.clone()),
        HostValue::Null => Value::new_null(ctx.clone()),
        HostValue::Boolean(b) => Value::new_bool(ctx.clone(), *b),
        HostValue::Number(n) => Value::new_number(ctx.clone(), *n),
        HostValue::String(s) => rquickjs::String::from_str(ctx.clone(), s)?.into_js(ctx)?,
        HostValue::Array(items) => {
            let array = Array::new(ctx.clone())?;
            for (i, item) in items.iter().enumerate() {
                array.set(i, into_js(ctx, item)?)?;
            }
            array.into_js(ctx)?
        }
        HostValue::Object(members) => {
            let object = Object::new(ctx.clone())?;
            for (key, member) in members {
                object.set(key.as_str(), into_js(ctx, member)?)?;
            }
            object.into_js(ctx)?
        }
        HostValue::Function(function) => {
            let function = function.clone();
            Function::new(
                ctx.clone(),
                move |ctx: Ctx<'js>, args: Rest<Value<'js>>| -> rquickjs::Result<Value<'js>> {
                    let args = from_js_args(&args)?;
                    into_js(&ctx, &function.invoke(&args))
                },
            )?
            .into_js(ctx)?
        }
    };

    Ok(js)
}

/// Read a variadic argument list, preserving order.
pub fn from_js_args(args: &Rest<Value<'_>>) -> rquickjs::Result<Vec<HostValue>> {
    args.0.iter().map(from_js).collect()
}

/// A JavaScript `Error` carrying the bridge error's message, to be returned
/// rather than thrown.
pub fn error_value<'js>(ctx: &Ctx<'js>, err: &BridgeError) -> rquickjs::Result<Value<'js>> {
    Exception::from_message(ctx.clone(), &err.to_string())?.into_js(ctx)
}
