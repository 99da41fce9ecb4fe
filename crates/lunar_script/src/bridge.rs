//! Call bridge
//!
//! The entry points a host program invokes against the shared Lua state.
//! Each one composes handle operations with value conversion and turns every
//! per-call failure into a `BridgeError` value.

use std::collections::BTreeMap;
use std::fmt;

use lunar_core::convert::key_string;
use lunar_core::mlua::Value;
use lunar_core::{
    to_host, to_interpreter, HostValue, InterpreterError, InterpreterOptions, LuaHandle,
};

use crate::error::BridgeError;

/// Host-facing entry points, by the name they are installed under.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Entry {
    Execute,
    GetAllGlobals,
    GetGlobal,
    SetGlobal,
    CallFunction,
}

impl Entry {
    pub const ALL: [Entry; 5] = [
        Entry::Execute,
        Entry::GetAllGlobals,
        Entry::GetGlobal,
        Entry::SetGlobal,
        Entry::CallFunction,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Entry::Execute => "Execute",
            Entry::GetAllGlobals => "GetAllGlobals",
            Entry::GetGlobal => "GetGlobal",
            Entry::SetGlobal => "SetGlobal",
            Entry::CallFunction => "CallFunction",
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The Lua state plus the operations exposed to the host.
///
/// Not `Send`: every call runs to completion on the thread that owns it.
pub struct LuaBridge {
    handle: LuaHandle,
}

impl LuaBridge {
    pub fn new(options: &InterpreterOptions) -> Result<Self, BridgeError> {
        let handle = LuaHandle::new(options)?;
        Ok(Self { handle })
    }

    pub fn handle(&self) -> &LuaHandle {
        &self.handle
    }

    /// Run a snippet. Yields its last returned value, or `Null` if it
    /// returned nothing.
    pub fn execute(&self, source: &str) -> Result<HostValue, BridgeError> {
        tracing::debug!("execute: {} bytes", source.len());

        match self.handle.execute(source) {
            Ok(Some(value)) => Ok(to_host(&value, 0)),
            Ok(None) => Ok(HostValue::Null),
            Err(err) => {
                tracing::warn!("Error in Lua: {}\n{}", source, err);
                Err(err.into())
            }
        }
    }

    /// Every global binding as one host object.
    pub fn get_all_globals(&self) -> HostValue {
        let mut globals = BTreeMap::new();
        self.handle.for_each_global(|key, value| {
            globals.insert(key_string(&key), to_host(&value, 0));
        });
        HostValue::Object(globals)
    }

    /// A single global; unset names read as `Null`.
    pub fn get_global(&self, name: &str) -> HostValue {
        to_host(&self.handle.get_global(name), 0)
    }

    pub fn set_global(&self, name: &str, value: &HostValue) -> Result<HostValue, BridgeError> {
        let value = to_interpreter(self.handle.lua(), value)?;
        self.handle.set_global(name, value)?;
        Ok(HostValue::Null)
    }

    /// Call a global Lua function with host arguments, in order, keeping
    /// its first result.
    pub fn call_function(&self, name: &str, args: &[HostValue]) -> Result<HostValue, BridgeError> {
        let Value::Function(function) = self.handle.get_global(name) else {
            return Err(BridgeError::NotAFunction(name.to_owned()));
        };

        let args = args
            .iter()
            .map(|arg| to_interpreter(self.handle.lua(), arg))
            .collect::<Result<Vec<_>, InterpreterError>>()?;

        tracing::debug!("call: {}({} args)", name, args.len());
        match self.handle.call(&function, args) {
            Ok(value) => Ok(to_host(&value, 0)),
            Err(err) => {
                tracing::warn!("Error calling Lua function '{}': {}", name, err);
                Err(err.into())
            }
        }
    }

    /// Invoke an entry point with raw host arguments, as the host surface
    /// receives them. Arguments are checked before the interpreter is
    /// touched.
    pub fn dispatch(&self, entry: Entry, args: &[HostValue]) -> Result<HostValue, BridgeError> {
        match entry {
            Entry::Execute => self.execute(string_arg(args, BridgeError::MissingArgument)?),
            Entry::GetAllGlobals => Ok(self.get_all_globals()),
            Entry::GetGlobal => {
                let name = string_arg(args, BridgeError::MissingArgument)?;
                Ok(self.get_global(name))
            }
            Entry::SetGlobal => {
                let name = string_arg(args, BridgeError::MissingArgument)?;
                let value = args.get(1).cloned().unwrap_or_default();
                self.set_global(name, &value)
            }
            Entry::CallFunction => {
                let name = string_arg(args, BridgeError::MissingFunctionName)?;
                self.call_function(name, &args[1..])
            }
        }
    }
}

/// The leading string argument.
fn string_arg(args: &[HostValue], missing: BridgeError) -> Result<&str, BridgeError> {
    match args.first() {
        None => Err(missing),
        Some(HostValue::String(s)) => Ok(s),
        Some(other) => Err(BridgeError::InvalidArgument(other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> LuaBridge {
        LuaBridge::new(&InterpreterOptions::default()).unwrap()
    }

    #[test]
    fn execute_returns_residual_or_null() {
        let lua = bridge();

        assert_eq!(lua.execute("return 1+1").unwrap(), HostValue::Number(2.0));
        assert_eq!(lua.execute("x = 5").unwrap(), HostValue::Null);
        assert_eq!(lua.get_global("x"), HostValue::Number(5.0));
    }

    #[test]
    fn execute_failure_is_an_error_value() {
        let lua = bridge();

        let err = lua.execute("error('kaboom')").unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Interpreter(InterpreterError::Execution(_))
        ));
        assert!(err.to_string().contains("kaboom"));

        // The state is still usable afterwards.
        assert_eq!(lua.execute("return 'ok'").unwrap(), HostValue::from("ok"));
    }

    #[test]
    fn unset_global_is_null() {
        assert_eq!(bridge().get_global("undefinedName"), HostValue::Null);
    }

    #[test]
    fn all_globals_contain_script_bindings() {
        let lua = bridge();
        lua.execute("a = 1; b = 'x'").unwrap();

        let globals = lua.get_all_globals();
        assert_eq!(globals.get("a"), Some(&HostValue::Number(1.0)));
        assert_eq!(globals.get("b"), Some(&HostValue::from("x")));
        // Standard library tables are there too, converted like any table.
        assert!(matches!(globals.get("math"), Some(HostValue::Object(_))));
    }

    #[test]
    fn call_function_with_arguments() {
        let lua = bridge();
        lua.execute("function add(a, b) return a + b end").unwrap();

        let sum = lua.call_function("add", &[2.into(), 3.into()]).unwrap();
        assert_eq!(sum, HostValue::Number(5.0));
    }

    #[test]
    fn call_function_without_result_is_null() {
        let lua = bridge();
        lua.execute("function touch() touched = true end").unwrap();

        assert_eq!(lua.call_function("touch", &[]).unwrap(), HostValue::Null);
        assert_eq!(lua.get_global("touched"), HostValue::Boolean(true));
    }

    #[test]
    fn call_function_passes_tables() {
        let lua = bridge();
        lua.execute(
            "function describe(list, opts)
                 return #list .. ':' .. list[1] .. ':' .. opts.sep
             end",
        )
        .unwrap();

        let list = HostValue::Array(vec!["first".into(), "second".into()]);
        let opts: HostValue = [("sep", HostValue::from("-"))].into_iter().collect();
        let result = lua.call_function("describe", &[list, opts]).unwrap();
        assert_eq!(result, HostValue::from("2:first:-"));
    }

    #[test]
    fn call_non_function_is_rejected() {
        let lua = bridge();
        lua.execute("notAFunction = 42").unwrap();

        let err = lua.call_function("notAFunction", &[1.into()]).unwrap_err();
        assert!(matches!(err, BridgeError::NotAFunction(ref name) if name == "notAFunction"));
        assert_eq!(err.to_string(), "Error: 'notAFunction' is not a function");

        let err = lua.call_function("missing", &[]).unwrap_err();
        assert!(matches!(err, BridgeError::NotAFunction(_)));
    }

    #[test]
    fn runtime_fault_inside_call_is_an_error_value() {
        let lua = bridge();
        lua.execute("function explode() local t = nil; return t.field end").unwrap();

        let err = lua.call_function("explode", &[]).unwrap_err();
        assert!(matches!(err, BridgeError::Interpreter(InterpreterError::Call(_))));
        assert_eq!(lua.execute("return 3").unwrap(), HostValue::Number(3.0));
    }

    #[test]
    fn returned_functions_are_inert() {
        let lua = bridge();
        lua.execute("function make() return function() counter = 1 end end").unwrap();

        let stub = lua.call_function("make", &[]).unwrap();
        let stub = stub.as_function().expect("function stub");
        assert_eq!(stub.invoke(&[]), HostValue::Undefined);
        assert_eq!(lua.get_global("counter"), HostValue::Null);
    }

    #[test]
    fn set_global_then_read_back() {
        let lua = bridge();
        let inventory = HostValue::Array(vec!["lamp".into(), "key".into()]);

        assert_eq!(lua.set_global("inventory", &inventory).unwrap(), HostValue::Null);
        assert_eq!(lua.execute("return #inventory").unwrap(), HostValue::Number(2.0));

        // Outgoing tables are objects keyed by index, not arrays.
        let back: HostValue = [("1", HostValue::from("lamp")), ("2", HostValue::from("key"))]
            .into_iter()
            .collect();
        assert_eq!(lua.get_global("inventory"), back);
    }

    #[test]
    fn dispatch_validates_arguments_first() {
        let lua = bridge();

        assert!(matches!(
            lua.dispatch(Entry::Execute, &[]),
            Err(BridgeError::MissingArgument)
        ));
        assert!(matches!(
            lua.dispatch(Entry::GetGlobal, &[]),
            Err(BridgeError::MissingArgument)
        ));
        assert!(matches!(
            lua.dispatch(Entry::CallFunction, &[]),
            Err(BridgeError::MissingFunctionName)
        ));
        assert!(matches!(
            lua.dispatch(Entry::GetGlobal, &[7.into()]),
            Err(BridgeError::InvalidArgument("number"))
        ));
    }

    #[test]
    fn dispatch_routes_to_entry_points() {
        let lua = bridge();

        lua.dispatch(Entry::SetGlobal, &["n".into(), 4.into()]).unwrap();
        lua.dispatch(Entry::Execute, &["function twice(v) return v * 2 end".into()])
            .unwrap();

        let result = lua
            .dispatch(Entry::CallFunction, &["twice".into(), 21.into()])
            .unwrap();
        assert_eq!(result, HostValue::Number(42.0));

        let n = lua.dispatch(Entry::GetGlobal, &["n".into()]).unwrap();
        assert_eq!(n, HostValue::Number(4.0));

        let all = lua.dispatch(Entry::GetAllGlobals, &[]).unwrap();
        assert!(all.get("twice").and_then(HostValue::as_function).is_some());

        // SetGlobal without a value clears the binding.
        lua.dispatch(Entry::SetGlobal, &["n".into()]).unwrap();
        assert_eq!(lua.get_global("n"), HostValue::Null);
    }
}
