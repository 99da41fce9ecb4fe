//! Lunar Scripting Bridge
//!
//! Lua execution driven from a JavaScript host
//!
//! ## Architecture
//!
//! - **Interpreter:** one shared Lua state per process (`state`)
//! - **Call bridge:** `Execute`, `GetAllGlobals`, `GetGlobal`, `SetGlobal`,
//!   `CallFunction` over host values (`bridge`)
//! - **Host:** QuickJS context exposing the bridge as the global `lua`
//!   object (`runtime`), marshaling through `ffi`

pub mod bridge;
pub mod error;
pub mod ffi;
pub mod runtime;
pub mod state;

pub use bridge::{Entry, LuaBridge};
pub use error::BridgeError;
pub use runtime::HostRuntime;

pub use rquickjs;
