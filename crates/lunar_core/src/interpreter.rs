//! Interpreter handle
//!
//! Owns the embedded Lua state and exposes the handful of operations the
//! bridge needs: run a chunk, read and write globals, enumerate globals and
//! make a protected call. Every fallible operation returns a `Result`; a
//! runtime fault inside Lua never unwinds into the host.

use mlua::{Function, Lua, MultiValue, StdLib, Value};

use crate::error::InterpreterError;

/// Chunk name reported in Lua error messages.
const CHUNK_NAME: &str = "=bridge";

/// How the interpreter state is built.
#[derive(Debug, Clone)]
pub struct InterpreterOptions {
    /// Load the safe standard library (`string`, `table`, `math`, ...).
    /// `debug` is not part of it.
    pub open_std_libs: bool,
    /// Allocation ceiling in bytes.
    pub memory_limit: Option<usize>,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            open_std_libs: true,
            memory_limit: None,
        }
    }
}

/// The embedded Lua state.
pub struct LuaHandle {
    lua: Lua,
}

impl LuaHandle {
    pub fn new(options: &InterpreterOptions) -> Result<Self, InterpreterError> {
        let libs = if options.open_std_libs {
            StdLib::ALL_SAFE
        } else {
            StdLib::NONE
        };
        let lua = Lua::new_with(libs, mlua::LuaOptions::default())
            .map_err(|err| InterpreterError::Init(err.to_string()))?;

        if let Some(limit) = options.memory_limit {
            lua.set_memory_limit(limit)
                .map_err(|err| InterpreterError::Init(err.to_string()))?;
        }

        Ok(Self { lua })
    }

    /// Underlying state, for building tables and strings.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Run a chunk in the global namespace.
    ///
    /// Returns the residual value: the last value the chunk returned, if it
    /// returned anything. Taking it out of the result is the pop, so nothing
    /// lingers between calls.
    pub fn execute(&self, source: &str) -> Result<Option<Value>, InterpreterError> {
        let results = self
            .lua
            .load(source)
            .set_name(CHUNK_NAME)
            .eval::<MultiValue>()
            .map_err(|err| InterpreterError::Execution(err.to_string()))?;

        Ok(results.into_iter().last())
    }

    /// Global lookup. Unset names, and lookups that fault in a metamethod,
    /// read as nil.
    pub fn get_global(&self, name: &str) -> Value {
        match self.lua.globals().get::<Value>(name) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!("global lookup '{}' failed: {}", name, err);
                Value::Nil
            }
        }
    }

    pub fn set_global(&self, name: &str, value: Value) -> Result<(), InterpreterError> {
        self.lua
            .globals()
            .set(name, value)
            .map_err(|err| InterpreterError::Execution(err.to_string()))
    }

    /// Visit every global binding. Order is whatever the table yields.
    pub fn for_each_global<F>(&self, mut visit: F)
    where
        F: FnMut(Value, Value),
    {
        let walked = self.lua.globals().for_each::<Value, Value>(|key, value| {
            visit(key, value);
            Ok(())
        });

        if let Err(err) = walked {
            tracing::warn!("global enumeration stopped early: {}", err);
        }
    }

    /// Protected call expecting exactly one result. Missing results read as
    /// nil and extra results are dropped.
    pub fn call(&self, function: &Function, args: Vec<Value>) -> Result<Value, InterpreterError> {
        function
            .call::<Value>(MultiValue::from_vec(args))
            .map_err(|err| InterpreterError::Call(err.to_string()))
    }

    /// The interpreter's `_VERSION` string, if the base library set one.
    pub fn version(&self) -> Option<String> {
        match self.get_global("_VERSION") {
            Value::String(s) => Some(s.to_string_lossy()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> LuaHandle {
        LuaHandle::new(&InterpreterOptions::default()).unwrap()
    }

    #[test]
    fn execute_returns_last_residual_value() {
        let lua = handle();

        let value = lua.execute("return 1, 2, 3").unwrap();
        assert!(matches!(value, Some(Value::Integer(3))));

        let value = lua.execute("x = 5").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn execute_reports_syntax_and_runtime_errors() {
        let lua = handle();

        let err = lua.execute("this is not lua").unwrap_err();
        assert!(matches!(err, InterpreterError::Execution(_)));

        let err = lua.execute("error('boom')").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn globals_read_write_and_enumerate() {
        let lua = handle();
        assert!(lua.get_global("missing").is_nil());

        lua.set_global("answer", Value::Integer(42)).unwrap();
        assert!(matches!(lua.get_global("answer"), Value::Integer(42)));

        let mut seen = Vec::new();
        lua.for_each_global(|key, _| {
            if let Value::String(s) = key {
                seen.push(s.to_string_lossy());
            }
        });
        assert!(seen.iter().any(|k| k == "answer"));
        assert!(seen.iter().any(|k| k == "string"));
    }

    #[test]
    fn call_is_protected() {
        let lua = handle();
        lua.execute("function fail() error('inside') end").unwrap();

        let Value::Function(fail) = lua.get_global("fail") else {
            panic!("fail should be a function");
        };
        let err = lua.call(&fail, Vec::new()).unwrap_err();
        assert!(matches!(err, InterpreterError::Call(ref msg) if msg.contains("inside")));
    }

    #[test]
    fn call_keeps_only_first_result() {
        let lua = handle();
        lua.execute("function pair() return 'a', 'b' end").unwrap();
        lua.execute("function nothing() end").unwrap();

        let Value::Function(pair) = lua.get_global("pair") else {
            panic!("pair should be a function");
        };
        let Value::String(first) = lua.call(&pair, Vec::new()).unwrap() else {
            panic!("expected a string");
        };
        assert_eq!(first.to_string_lossy(), "a");

        let Value::Function(nothing) = lua.get_global("nothing") else {
            panic!("nothing should be a function");
        };
        assert!(lua.call(&nothing, Vec::new()).unwrap().is_nil());
    }

    #[test]
    fn bare_state_has_no_std_libs() {
        let lua = LuaHandle::new(&InterpreterOptions {
            open_std_libs: false,
            memory_limit: None,
        })
        .unwrap();
        assert!(lua.get_global("string").is_nil());
    }

    #[test]
    fn safe_std_libs_exclude_debug() {
        let lua = handle();
        assert!(matches!(lua.get_global("table"), Value::Table(_)));
        assert!(lua.get_global("debug").is_nil());
    }

    #[test]
    fn version_probe() {
        let version = handle().version().unwrap();
        assert!(version.starts_with("Lua 5."));
    }
}
