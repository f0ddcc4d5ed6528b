//! WGSL execution engine
//!
//! Runs WGSL shaders on the CPU. A module is parsed, reflected and lowered
//! into flat command streams that a frame stack executes one command at a
//! time, so execution can be suspended between any two commands.
//!
//! - [`WgslExec::execute`] runs module-scope declarations once
//! - [`WgslExec::dispatch_workgroups`] runs a compute entry point over a
//!   dispatch grid, sequentially, with GPU builtin inputs
//! - [`WgslExec::step_next`] and the inspection methods back the debugger
//!
//! Struct and array values live in byte buffers laid out exactly as on the
//! GPU, so host buffers can be bound directly and read back after a run.

pub mod builtins;
pub mod command;
pub mod compiler;
pub mod config;
pub mod context;
pub mod data;
pub mod dispatch;
pub mod error;
mod eval;
pub mod executor;
pub mod frame;
pub mod value;

pub use command::{Command, CommandBlock};
pub use config::{bind_groups, BindGroups, BindingResource, ExecConfig};
pub use data::{ByteBuffer, Data, Scalar, TextureData, TextureDescriptor};
pub use dispatch::{DispatchOrder, InvocationIds};
pub use error::{ErrorKind, ExecError, Result};
pub use executor::{ExecPosition, StackEntry, WgslExec};
pub use value::DecodedValue;
pub use wgsl_reflect::TexelFormat;
