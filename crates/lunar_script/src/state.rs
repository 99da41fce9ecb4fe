//! Process-wide bridge state
//!
//! One Lua state per process, created before any entry point is reachable
//! and dropped with the owning thread at exit. The host is single-threaded,
//! so the instance lives in a thread-local rather than behind a lock.

use std::rc::Rc;

use lunar_core::InterpreterOptions;
use once_cell::unsync::OnceCell;

use crate::bridge::LuaBridge;
use crate::error::BridgeError;

thread_local! {
    static SHARED: OnceCell<Rc<LuaBridge>> = const { OnceCell::new() };
}

/// Create the shared bridge. Fails if it already exists or if the Lua state
/// cannot be built.
pub fn init(options: &InterpreterOptions) -> Result<Rc<LuaBridge>, BridgeError> {
    SHARED.with(|cell| {
        if cell.get().is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }

        let bridge = Rc::new(LuaBridge::new(options)?);
        match bridge.handle().version() {
            Some(version) => tracing::info!("Lua VM initialized, version: {}", version),
            None => tracing::info!("Lua VM initialized"),
        }

        cell.set(Rc::clone(&bridge))
            .map_err(|_| BridgeError::AlreadyInitialized)?;
        Ok(bridge)
    })
}

/// The shared bridge, once `init` has run.
pub fn shared() -> Result<Rc<LuaBridge>, BridgeError> {
    SHARED.with(|cell| cell.get().cloned().ok_or(BridgeError::NotInitialized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lunar_core::HostValue;

    // Each test runs on its own thread, so each sees a fresh slot.
    #[test]
    fn lifecycle_gate() {
        assert!(matches!(shared(), Err(BridgeError::NotInitialized)));

        let bridge = init(&InterpreterOptions::default()).unwrap();
        bridge.execute("shared_marker = 'set'").unwrap();

        let again = shared().unwrap();
        assert!(Rc::ptr_eq(&bridge, &again));
        assert_eq!(again.get_global("shared_marker"), HostValue::from("set"));

        assert!(matches!(
            init(&InterpreterOptions::default()),
            Err(BridgeError::AlreadyInitialized)
        ));
    }
}
