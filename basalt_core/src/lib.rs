//! Core types for the Basalt virtual machine.
//!
//! This crate holds the leaf types shared by every layer of the VM:
//!
//! - [`Value`] - 64-bit tagged representation of script-level values
//! - [`Instruction`] / [`Opcode`] - 32-bit packed bytecode encoding
//! - [`VmError`] - the error taxonomy (load errors, bad calls, runtime faults)
//! - [`Config`] - resolved-once runtime configuration
//!
//! It deliberately has no dependencies: the object model lives in
//! `basalt_runtime` and the execution machinery in `basalt_vm`, both of
//! which build on these types.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod error;
pub mod instruction;
pub mod value;

pub use config::Config;
pub use error::{CodegenError, FaultKind, ModuleLoadError, VmError, VmResult};
pub use instruction::{Instruction, Opcode, MODULE_MAGIC};
pub use value::{RawValue, Tag, Value};
