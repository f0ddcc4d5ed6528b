//! Stepping debugger for WGSL shaders.
//!
//! [`WgslDebug`] adds breakpoints and run/step control to a
//! [`wgsl_exec::WgslExec`]; the [`server`] module exposes it to editors
//! over the Debug Adapter Protocol.

pub mod adapter;
pub mod controller;
pub mod launch;
pub mod server;

pub use controller::{StopReason, WgslDebug};
pub use launch::LaunchConfig;
