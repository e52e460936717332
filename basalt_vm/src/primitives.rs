//! Host primitives callable from bytecode.
//!
//! A primitive receives the execution context and manages its own stack
//! effect. The module's primitive table is bound at load time from a
//! host-supplied registry; `PRIMITIVE_CALL i` indexes it.

use crate::context::ExecutionContext;
use basalt_core::{FaultKind, Value, VmResult};
use rustc_hash::FxHashMap;

/// The primitive calling convention.
pub type PrimitiveFn = fn(&mut ExecutionContext) -> VmResult<()>;

/// A named primitive.
#[derive(Clone)]
pub struct PrimitiveBinding {
    pub name: String,
    pub func: PrimitiveFn,
}

impl std::fmt::Debug for PrimitiveBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitiveBinding")
            .field("name", &self.name)
            .finish()
    }
}

/// Host registry of primitives, resolved by name.
#[derive(Default)]
pub struct PrimitiveTable {
    bindings: Vec<PrimitiveBinding>,
    by_name: FxHashMap<String, usize>,
}

impl PrimitiveTable {
    pub fn new() -> PrimitiveTable {
        PrimitiveTable::default()
    }

    /// Register a primitive; returns its index (the wire-visible identity).
    pub fn register(&mut self, name: &str, func: PrimitiveFn) -> usize {
        let index = self.bindings.len();
        self.bindings.push(PrimitiveBinding { name: name.to_string(), func });
        self.by_name.insert(name.to_string(), index);
        index
    }

    /// Resolve a primitive index by name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn bindings(&self) -> &[PrimitiveBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The reference primitive set: `print_string`, `print_number`,
/// `print_stack`, bound at indexes 0, 1, 2.
pub fn default_table() -> PrimitiveTable {
    let mut table = PrimitiveTable::new();
    table.register("print_string", print_string);
    table.register("print_number", print_number);
    table.register("print_stack", print_stack);
    table
}

/// `( string -- 0 )` - write the string and a newline to the context output.
pub fn print_string(context: &mut ExecutionContext) -> VmResult<()> {
    let value = context.pop()?;
    let index = value.as_integer().ok_or(FaultKind::IntegerExpected)?;
    let text = context.string_at(index)?;
    context.write_output(&text);
    context.write_output("\n");
    context.push(Value::integer(0))
}

/// `( n -- 0 )` - write the integer and a trailing space to the context
/// output.
pub fn print_number(context: &mut ExecutionContext) -> VmResult<()> {
    let value = context.pop()?;
    let number = value.as_integer().ok_or(FaultKind::IntegerExpected)?;
    context.write_output(&format!("{} ", number));
    context.push(Value::integer(0))
}

/// `( -- )` - dump the operand stack to stderr. Leaves the stack untouched.
pub fn print_stack(context: &mut ExecutionContext) -> VmResult<()> {
    let live = context.stack().live();
    eprintln!("basalt stack (sp={}):", live.len());
    for (index, value) in live.iter().enumerate().rev() {
        eprintln!("  [{:4}] {:?}", index, value);
    }
    Ok(())
}
