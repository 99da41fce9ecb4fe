use std::path::PathBuf;

use lunar_core::InterpreterError;
use thiserror::Error;

/// Errors surfaced to the host by bridge entry points.
///
/// None of these are fatal. At the JavaScript boundary each one becomes an
/// `Error` object that is returned, not thrown.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Error: missing argument")]
    MissingArgument,

    #[error("Error: missing function name")]
    MissingFunctionName,

    #[error("Error: expected a string argument, got {0}")]
    InvalidArgument(&'static str),

    #[error("Error: '{0}' is not a function")]
    NotAFunction(String),

    #[error("Lua VM not initialized")]
    NotInitialized,

    #[error("Lua VM already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Interpreter(#[from] InterpreterError),

    /// The JavaScript side failed while marshaling or evaluating.
    #[error("host error: {0}")]
    Host(String),

    #[error("failed to read host script {}: {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<rquickjs::Error> for BridgeError {
    fn from(err: rquickjs::Error) -> Self {
        BridgeError::Host(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The binary lifts these into `anyhow::Error`, which needs both bounds.
    #[test]
    fn errors_convert_into_anyhow_bounds() {
        fn assert_send_sync<T: std::error::Error + Send + Sync + 'static>() {}
        assert_send_sync::<BridgeError>();

        let err = BridgeError::from(InterpreterError::Init("out of memory".into()));
        assert_eq!(err.to_string(), "failed to initialize Lua state: out of memory");
    }
}
