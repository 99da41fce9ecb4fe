//! Lunar Core
//!
//! The value layer shared by every part of the bridge:
//! - Host value model (the JavaScript-shaped side)
//! - Interpreter handle around the embedded Lua state
//! - Recursive conversion in both directions
//! - Interpreter error taxonomy

pub mod convert;
pub mod error;
pub mod interpreter;
pub mod value;

pub use convert::{to_host, to_interpreter, MAX_DEPTH};
pub use error::InterpreterError;
pub use interpreter::{InterpreterOptions, LuaHandle};
pub use value::{HostFunction, HostValue};

pub use mlua;

/// Bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
