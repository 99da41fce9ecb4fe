use thiserror::Error;

/// Failures raised at the interpreter handle boundary.
///
/// Only `Init` is fatal; the others are per-call and carry the interpreter's
/// own message text.
#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("failed to initialize Lua state: {0}")]
    Init(String),

    #[error("{0}")]
    Execution(String),

    #[error("{0}")]
    Call(String),

    #[error("conversion failed: {0}")]
    Conversion(String),
}
