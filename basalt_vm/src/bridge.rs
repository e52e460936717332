//! The function-invocation bridge.
//!
//! Every call funnels through [`call_function`]: it consults the
//! compiled-code table and either drives the interpreter or invokes the
//! installed native entry. Two calling conventions are supported, selected
//! by which entry variant the code generator produced:
//!
//! - **Stack convention**: the entry receives `(context, index)` and
//!   manages the operand stack itself; the arguments stay where the caller
//!   pushed them.
//! - **Register convention**: the bridge pops `nargs` values (the
//!   last-pushed becomes the rightmost parameter) and passes them as
//!   positional raw words. At most [`MAX_REGISTER_ARGS`] parameters are
//!   supported; beyond that the call faults.
//!
//! In both native paths the returned raw word is reinterpreted as a
//! [`Value`]. Native code that needs to call back into the VM (a callee
//! that is not compiled, a primitive, a collection) goes through
//! [`interpreter_trampoline`], which runs the bridge again on the same
//! context.

use crate::context::ExecutionContext;
use basalt_core::{FaultKind, RawValue, Value, VmResult};
use parking_lot::RwLock;
use std::sync::Arc;

/// Maximum arity supported by the register calling convention.
pub const MAX_REGISTER_ARGS: usize = 7;

/// A compiled entry honoring the stack convention.
pub type StackFn = Box<dyn Fn(&mut ExecutionContext, usize) -> VmResult<RawValue> + Send + Sync>;

/// A compiled entry honoring the register convention.
pub type RegisterFn =
    Box<dyn Fn(&mut ExecutionContext, &[RawValue]) -> VmResult<RawValue> + Send + Sync>;

/// An opaque callable produced by the code generator.
pub enum CompiledFunction {
    /// `(context, index)`; arguments remain on the operand stack.
    Stack(StackFn),
    /// Positional raw-word parameters, popped by the bridge.
    Register(RegisterFn),
}

impl std::fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompiledFunction::Stack(_) => f.write_str("CompiledFunction::Stack"),
            CompiledFunction::Register(_) => f.write_str("CompiledFunction::Register"),
        }
    }
}

// =============================================================================
// Compiled-code table
// =============================================================================

/// One slot per module function: `None` means interpret.
///
/// The table is append-only while code generation runs and read-only
/// afterwards; a read lock is held only long enough to clone the entry.
pub struct CompiledCodeTable {
    entries: RwLock<Vec<Option<Arc<CompiledFunction>>>>,
}

impl CompiledCodeTable {
    /// A table sized for a module's function count, all-interpreted.
    pub fn new(function_count: usize) -> CompiledCodeTable {
        CompiledCodeTable {
            entries: RwLock::new(vec![None; function_count]),
        }
    }

    /// Number of slots (equals the module's function count).
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Install a compiled entry for a function.
    pub fn install(&self, index: usize, function: CompiledFunction) {
        let mut entries = self.entries.write();
        if index < entries.len() {
            entries[index] = Some(Arc::new(function));
        }
    }

    /// The entry for a function, if one was installed.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Arc<CompiledFunction>> {
        self.entries.read().get(index).and_then(Clone::clone)
    }

    /// Number of functions with installed entries.
    pub fn compiled_count(&self) -> usize {
        self.entries.read().iter().filter(|e| e.is_some()).count()
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Call function `index` with the caller's arguments on top of the operand
/// stack; returns the callee's result for the caller to push.
pub fn call_function(context: &mut ExecutionContext, index: usize) -> VmResult<Value> {
    match context.compiled_entry(index) {
        None => context.interpret(index),
        Some(entry) => invoke_compiled(context, index, &entry),
    }
}

/// Re-entry point for native code: runs the bridge again on the same
/// context.
pub fn interpreter_trampoline(context: &mut ExecutionContext, index: usize) -> VmResult<Value> {
    call_function(context, index)
}

fn invoke_compiled(
    context: &mut ExecutionContext,
    index: usize,
    entry: &CompiledFunction,
) -> VmResult<Value> {
    if context.config().verbose {
        eprintln!("basalt: transition to compiled code for function {}", index);
    }

    match entry {
        CompiledFunction::Stack(entry) => {
            let raw = entry(context, index)?;
            Ok(Value::from_raw(raw))
        }
        CompiledFunction::Register(entry) => {
            let nargs = context.function_nargs(index)? as usize;
            if nargs > MAX_REGISTER_ARGS {
                return Err(FaultKind::TooManyArguments {
                    nargs: nargs as u32,
                    limit: MAX_REGISTER_ARGS as u32,
                }
                .into());
            }

            // The last-pushed value is the rightmost parameter.
            let mut args = [0 as RawValue; MAX_REGISTER_ARGS];
            for slot in (0..nargs).rev() {
                args[slot] = context.pop()?.raw();
            }

            let raw = entry(context, &args[..nargs])?;
            Ok(Value::from_raw(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_starts_interpreted() {
        let table = CompiledCodeTable::new(3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.compiled_count(), 0);
        assert!(table.get(0).is_none());
        assert!(table.get(7).is_none());
    }

    #[test]
    fn test_install_and_get() {
        let table = CompiledCodeTable::new(2);
        table.install(1, CompiledFunction::Stack(Box::new(|_, _| Ok(0))));
        assert_eq!(table.compiled_count(), 1);
        assert!(table.get(0).is_none());
        assert!(matches!(
            table.get(1).as_deref(),
            Some(CompiledFunction::Stack(_))
        ));
    }

    #[test]
    fn test_install_out_of_range_is_ignored() {
        let table = CompiledCodeTable::new(1);
        table.install(5, CompiledFunction::Stack(Box::new(|_, _| Ok(0))));
        assert_eq!(table.compiled_count(), 0);
    }
}
