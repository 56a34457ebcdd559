//! System-level modules
//!
//! Logging setup lives here; lifecycle and execution modes live in `runtime`.

pub mod logging;
