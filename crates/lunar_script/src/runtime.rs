//! Host runtime management
//!
//! A QuickJS context with the bridge installed as the global `lua`
//! namespace, so host scripts call `lua.Execute(...)`, `lua.GetGlobal(...)`
//! and friends. Every entry point returns its result; failures come back as
//! `Error` objects instead of being thrown.

use std::path::Path;
use std::rc::Rc;

use lunar_core::HostValue;
use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{Context, Ctx, Function, Object, Runtime, Value};

use crate::bridge::{Entry, LuaBridge};
use crate::error::BridgeError;
use crate::ffi;

/// Name of the global namespace object the entry points hang off.
pub const NAMESPACE: &str = "lua";

/// Host script execution context
pub struct HostRuntime {
    #[allow(dead_code)] // Kept alive for context lifetime
    runtime: Runtime,
    pub context: Context,
}

impl HostRuntime {
    pub fn new(bridge: Rc<LuaBridge>) -> Result<Self, BridgeError> {
        let runtime = Runtime::new()?;
        let context = Context::full(&runtime)?;

        context.with(|ctx| install(&ctx, bridge))?;

        Ok(Self { runtime, context })
    }

    pub fn execute_file(&self, path: &Path) -> Result<(), BridgeError> {
        let source = std::fs::read_to_string(path).map_err(|source| BridgeError::Script {
            path: path.to_path_buf(),
            source,
        })?;
        self.execute(&source)
    }

    pub fn execute(&self, source: &str) -> Result<(), BridgeError> {
        self.context.with(|ctx| {
            ctx.eval::<(), _>(source).map_err(|err| caught(&ctx, err))?;
            Ok(())
        })
    }

    /// Evaluate host script and read its completion value.
    pub fn evaluate(&self, source: &str) -> Result<HostValue, BridgeError> {
        self.context.with(|ctx| {
            let value: Value = ctx.eval(source).map_err(|err| caught(&ctx, err))?;
            Ok(ffi::from_js(&value)?)
        })
    }
}

/// Install the `lua` namespace and a `print` helper.
fn install<'js>(ctx: &Ctx<'js>, bridge: Rc<LuaBridge>) -> rquickjs::Result<()> {
    let namespace = Object::new(ctx.clone())?;

    for entry in Entry::ALL {
        let bridge = Rc::clone(&bridge);
        let function = Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, args: Rest<Value<'js>>| -> rquickjs::Result<Value<'js>> {
                let result = ffi::from_js_args(&args)
                    .map_err(BridgeError::from)
                    .and_then(|args| bridge.dispatch(entry, &args));

                match result {
                    Ok(value) => ffi::into_js(&ctx, &value),
                    Err(err) => {
                        tracing::debug!("{} returned an error: {}", entry, err);
                        ffi::error_value(&ctx, &err)
                    }
                }
            },
        )?;
        namespace.set(entry.name(), function)?;
    }
    ctx.globals().set(NAMESPACE, namespace)?;

    let print = Function::new(ctx.clone(), |parts: Rest<Coerced<String>>| {
        let line = parts
            .0
            .iter()
            .map(|part| part.0.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", line);
    })?;
    ctx.globals().set("print", print)?;

    Ok(())
}

/// Turn a failed evaluation into a bridge error, pulling the pending
/// exception out of the context when there is one.
fn caught(ctx: &Ctx<'_>, err: rquickjs::Error) -> BridgeError {
    if !matches!(err, rquickjs::Error::Exception) {
        return err.into();
    }

    let exception = ctx.catch();
    match exception.as_exception() {
        Some(exception) => BridgeError::Host(exception.to_string()),
        None => BridgeError::Host(format!("uncaught {:?}", exception)),
    }
}
