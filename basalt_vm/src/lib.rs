//! The Basalt virtual machine.
//!
//! This crate assembles the execution engine on top of `basalt_core` (leaf
//! types) and `basalt_runtime` (heap + object model):
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                   VirtualMachine                    │
//! ├────────────────────────────────────────────────────┤
//! │  ┌───────────────┐   ┌───────────────────────────┐ │
//! │  │ Arc<Module>   │   │ CompiledCodeTable         │ │
//! │  │ fns, strings, │   │ one slot per function:    │ │
//! │  │ primitives    │   │ None → interpret          │ │
//! │  └───────────────┘   └───────────────────────────┘ │
//! │  ┌───────────────────────────────────────────────┐ │
//! │  │ ExecutionContext                              │ │
//! │  │ operand stack · pc · heap · slot caches       │ │
//! │  └───────────────────────────────────────────────┘ │
//! │  ┌───────────────────────────────────────────────┐ │
//! │  │ CodeGenerator (black box behind a trait)      │ │
//! │  └───────────────────────────────────────────────┘ │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Calls flow through the invocation [`bridge`]: it consults the
//! compiled-code table and either drives the interpreter or invokes a
//! compiled entry under the configured calling convention. Native code
//! re-enters through [`bridge::interpreter_trampoline`].

#![deny(unsafe_op_in_unsafe_fn)]

pub mod bridge;
pub mod cache;
pub mod codegen;
pub mod context;
pub mod disasm;
pub mod loader;
pub mod module;
pub mod primitives;
pub mod stack;
pub mod vm;

pub use bridge::{CompiledCodeTable, CompiledFunction, MAX_REGISTER_ARGS};
pub use codegen::{BaselineGenerator, CodeGenerator};
pub use context::ExecutionContext;
pub use loader::{load_module, serialize_module};
pub use module::{FunctionSpec, Module};
pub use primitives::{default_table, PrimitiveBinding, PrimitiveFn, PrimitiveTable};
pub use stack::{OperandStack, STACK_CAPACITY};
pub use vm::VirtualMachine;
