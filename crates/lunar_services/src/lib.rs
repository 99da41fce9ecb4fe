//! Lunar Services Layer
//!
//! Configuration loading for the bridge runtime

pub mod settings;

pub use settings::{InterpreterSettings, LoggingSettings, Settings, SettingsError};
