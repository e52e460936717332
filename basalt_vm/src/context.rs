//! Execution context and the bytecode interpreter.
//!
//! A context is one logical thread of execution: it owns the operand
//! stack, the program counter, the script heap, and per-call-site slot
//! caches, and shares the module and compiled-code table with the VM.
//!
//! # Frame discipline
//!
//! On entry to a function, `args_base = sp - nargs` and `nregs` zero-filled
//! locals are reserved above the arguments; `PUSH_FROM_VAR` / `POP_INTO_VAR`
//! address that region with unsigned offsets. `FUNCTION_RETURN` takes the
//! top of stack as the result and restores `sp` to `args_base`; the caller
//! pushes the result.
//!
//! # Branch convention
//!
//! Branch offsets count whole instructions and are applied to the PC of the
//! branch itself; the loop's post-increment then advances, so a taken
//! branch resumes `offset + 1` instructions past the branch. A backward
//! offset of `-1` re-executes nothing but the branch.

use crate::bridge::{self, CompiledCodeTable, CompiledFunction};
use crate::cache::SlotCacheStore;
use crate::module::Module;
use crate::stack::OperandStack;
use basalt_core::{Config, FaultKind, Opcode, Value, VmError, VmResult};
use basalt_runtime::{CollectionResult, Heap, ObjectRef, SlotId};
use std::io::Write;
use std::sync::Arc;

/// A single-threaded VM execution state.
pub struct ExecutionContext {
    stack: OperandStack,
    /// PC of the instruction currently being dispatched, for diagnostics.
    pc: u32,
    heap: Heap,
    module: Arc<Module>,
    compiled: Arc<CompiledCodeTable>,
    config: Config,
    caches: SlotCacheStore,
    /// Destination of `print_*` primitives; swappable for capture.
    output: Box<dyn Write>,
}

impl ExecutionContext {
    pub fn new(
        module: Arc<Module>,
        compiled: Arc<CompiledCodeTable>,
        heap: Heap,
        config: Config,
    ) -> ExecutionContext {
        ExecutionContext {
            stack: OperandStack::new(),
            pc: 0,
            heap,
            module,
            compiled,
            config,
            caches: SlotCacheStore::new(),
            output: Box::new(std::io::stdout()),
        }
    }

    /// Reset the stack and program counter. Slot caches survive: shape
    /// identity keeps them valid across runs.
    pub fn reset(&mut self) {
        self.stack.reset();
        self.pc = 0;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn push(&mut self, value: Value) -> VmResult<()> {
        self.stack.push(value)
    }

    #[inline]
    pub fn pop(&mut self) -> VmResult<Value> {
        self.stack.pop()
    }

    #[inline]
    pub fn peek(&self) -> VmResult<Value> {
        self.stack.peek()
    }

    #[inline]
    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    #[inline]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    #[inline]
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// PC of the most recently dispatched instruction.
    #[inline]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// The compiled entry for a function, if installed.
    #[inline]
    pub fn compiled_entry(&self, index: usize) -> Option<Arc<CompiledFunction>> {
        self.compiled.get(index)
    }

    /// Arity of a module function, for the bridge's register marshaling.
    pub fn function_nargs(&self, index: usize) -> VmResult<u32> {
        self.module
            .function(index)
            .map(|f| f.nargs)
            .ok_or_else(|| VmError::UnknownFunction(format!("#{}", index)))
    }

    /// A string-pool entry, for primitives.
    pub fn string_at(&self, index: i64) -> VmResult<String> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.module.string(i))
            .map(str::to_string)
            .ok_or_else(|| FaultKind::StringIndexOutOfRange(index).into())
    }

    /// Write script output. Output errors are not script-visible.
    pub fn write_output(&mut self, text: &str) {
        let _ = self.output.write_all(text.as_bytes());
        let _ = self.output.flush();
    }

    /// Redirect script output (tests capture it through this).
    pub fn set_output(&mut self, output: Box<dyn Write>) {
        self.output = output;
    }

    /// Run a collection with the live operand stack as roots.
    pub fn collect_garbage(&mut self) -> CollectionResult {
        if self.config.verbose {
            eprintln!("basalt: collecting ({} cells live)", self.heap.live_cells());
        }
        let ExecutionContext { heap, stack, .. } = self;
        heap.collect(stack)
    }

    // =========================================================================
    // Interpreter loop
    // =========================================================================

    /// Interpret function `index` with its arguments on top of the stack.
    ///
    /// This is the raw interpreter entry: it does not consult the
    /// compiled-code table for `index` itself. Nested calls made by the
    /// bytecode go through the bridge and do.
    pub fn interpret(&mut self, index: usize) -> VmResult<Value> {
        let module = Arc::clone(&self.module);
        let function = module
            .function(index)
            .ok_or_else(|| VmError::UnknownFunction(format!("#{}", index)))?;

        let nargs = function.nargs as usize;
        let nregs = function.nregs as usize;
        if self.stack.sp() < nargs {
            return Err(FaultKind::StackUnderflow.into());
        }
        let args_base = self.stack.sp() - nargs;
        self.stack.push_n(nregs)?;

        let frame_limit = (nargs + nregs) as u32;
        let code = &function.bytecode;
        let function_index = index as u32;
        let mut pc: usize = 0;

        loop {
            let instruction = match code.get(pc) {
                Some(&instruction) => instruction,
                None => return Err(FaultKind::EndOfSection.into()),
            };
            self.pc = pc as u32;

            if self.config.debug {
                eprintln!("basalt: [{}:{:>4}] {}", function.name, pc, instruction);
            }

            let opcode = instruction
                .opcode()
                .ok_or(FaultKind::UnknownOpcode(instruction.opcode_byte()))?;
            let mut next = pc + 1;

            match opcode {
                Opcode::EndSection => return Err(FaultKind::EndOfSection.into()),

                Opcode::FunctionCall => {
                    let callee = instruction.immediate() as usize;
                    let result = bridge::call_function(self, callee)?;
                    self.stack.push(result)?;
                }

                Opcode::FunctionReturn => {
                    let result = self.stack.pop()?;
                    if self.stack.sp() < args_base {
                        return Err(FaultKind::StackUnderflow.into());
                    }
                    self.stack.restore(args_base);
                    return Ok(result);
                }

                Opcode::PrimitiveCall => {
                    let primitive = module
                        .primitive(instruction.immediate() as usize)
                        .expect("primitive index validated at load");
                    (primitive.func)(self)?;
                }

                Opcode::Duplicate => {
                    let top = self.stack.peek()?;
                    self.stack.push(top)?;
                }

                Opcode::Drop => {
                    self.stack.pop()?;
                }

                Opcode::PushFromVar => {
                    let offset = var_offset(instruction.immediate(), frame_limit)?;
                    let value = self.stack.get(args_base + offset);
                    self.stack.push(value)?;
                }

                Opcode::PopIntoVar => {
                    let offset = var_offset(instruction.immediate(), frame_limit)?;
                    let value = self.stack.pop()?;
                    self.stack.set(args_base + offset, value);
                }

                Opcode::Add => {
                    let (left, right) = self.pop_operands()?;
                    self.stack.push(Value::integer(left.wrapping_add(right)))?;
                }

                Opcode::Sub => {
                    let (left, right) = self.pop_operands()?;
                    self.stack.push(Value::integer(left.wrapping_sub(right)))?;
                }

                Opcode::Mul => {
                    let (left, right) = self.pop_operands()?;
                    self.stack.push(Value::integer(left.wrapping_mul(right)))?;
                }

                Opcode::Div => {
                    let (left, right) = self.pop_operands()?;
                    if right == 0 {
                        return Err(FaultKind::DivisionByZero.into());
                    }
                    self.stack.push(Value::integer(left.wrapping_div(right)))?;
                }

                Opcode::IntPushConstant => {
                    self.stack.push(Value::integer(instruction.immediate() as i64))?;
                }

                Opcode::Not => {
                    let value = self.pop_integer()?;
                    self.stack
                        .push(Value::integer(if value == 0 { 1 } else { 0 }))?;
                }

                Opcode::Jmp => {
                    next = branch_target(pc, instruction.immediate());
                }

                Opcode::JmpEq => {
                    let (left, right) = self.pop_operands()?;
                    if left == right {
                        next = branch_target(pc, instruction.immediate());
                    }
                }

                Opcode::JmpNeq => {
                    let (left, right) = self.pop_operands()?;
                    if left != right {
                        next = branch_target(pc, instruction.immediate());
                    }
                }

                Opcode::JmpGt => {
                    let (left, right) = self.pop_operands()?;
                    if left > right {
                        next = branch_target(pc, instruction.immediate());
                    }
                }

                Opcode::JmpGe => {
                    let (left, right) = self.pop_operands()?;
                    if left >= right {
                        next = branch_target(pc, instruction.immediate());
                    }
                }

                Opcode::JmpLt => {
                    let (left, right) = self.pop_operands()?;
                    if left < right {
                        next = branch_target(pc, instruction.immediate());
                    }
                }

                Opcode::JmpLe => {
                    let (left, right) = self.pop_operands()?;
                    if left <= right {
                        next = branch_target(pc, instruction.immediate());
                    }
                }

                Opcode::StrPushConstant => {
                    // The dialect does not box strings; the pool index rides
                    // in an integer value and primitives resolve it.
                    self.stack.push(Value::integer(instruction.immediate() as i64))?;
                }

                Opcode::NewObject => {
                    if self.heap.should_collect() {
                        self.collect_garbage();
                    }
                    let object = self.heap.alloc_object();
                    self.stack.push(object)?;
                }

                Opcode::PushFromObject => {
                    let receiver = self.stack.pop()?;
                    let slot = SlotId(instruction.immediate() as u32);
                    let value = self.object_read(function_index, pc as u32, receiver, slot)?;
                    self.stack.push(value)?;
                }

                Opcode::PopIntoObject => {
                    let value = self.stack.pop()?;
                    let receiver = self.stack.pop()?;
                    let slot = SlotId(instruction.immediate() as u32);
                    self.object_write(function_index, pc as u32, receiver, slot, value)?;
                }

                Opcode::CallIndirect => return Err(FaultKind::CallIndirect.into()),

                Opcode::SystemCollect => {
                    self.collect_garbage();
                }
            }

            pc = next;
        }
    }

    // =========================================================================
    // Operand helpers
    // =========================================================================

    fn pop_integer(&mut self) -> VmResult<i64> {
        self.stack
            .pop()?
            .as_integer()
            .ok_or_else(|| FaultKind::IntegerExpected.into())
    }

    /// `( left right -- )` for arithmetic and comparisons.
    fn pop_operands(&mut self) -> VmResult<(i64, i64)> {
        let right = self.pop_integer()?;
        let left = self.pop_integer()?;
        Ok((left, right))
    }

    // =========================================================================
    // Object access
    // =========================================================================

    fn object_read(
        &mut self,
        function: u32,
        pc: u32,
        receiver: Value,
        slot: SlotId,
    ) -> VmResult<Value> {
        let object = ObjectRef::from_value(receiver).ok_or(FaultKind::ObjectExpected)?;
        let map = object.with(|o| o.map_id());

        if let Some(offset) = self.caches.site(function, pc).check(map) {
            return Ok(object.with(|o| o.get_cached(offset)));
        }

        let descriptor = object
            .with(|o| o.lookup(slot))
            .ok_or(FaultKind::MissingSlot(slot.0))?;
        self.caches.site(function, pc).update(map, descriptor.offset);
        Ok(object.with(|o| o.get(descriptor)))
    }

    fn object_write(
        &mut self,
        function: u32,
        pc: u32,
        receiver: Value,
        slot: SlotId,
        value: Value,
    ) -> VmResult<()> {
        let object = ObjectRef::from_value(receiver).ok_or(FaultKind::ObjectExpected)?;
        let map = object.with(|o| o.map_id());

        if let Some(offset) = self.caches.site(function, pc).check(map) {
            object.with_mut(|o| o.set_cached(offset, value));
        } else {
            let (descriptor, _transitioned) = {
                let registry = self.heap.maps();
                object.with_mut(|o| o.write(slot, value, registry))
            };
            let current = object.with(|o| o.map_id());
            self.caches.site(function, pc).update(current, descriptor.offset);
        }

        self.heap.write_barrier(receiver);
        Ok(())
    }
}

/// Resolve a var immediate against the frame's args+locals region.
#[inline]
fn var_offset(immediate: i32, limit: u32) -> VmResult<usize> {
    if immediate < 0 || immediate as u32 >= limit {
        return Err(FaultKind::VarOffsetOutOfRange { offset: immediate, limit }.into());
    }
    Ok(immediate as usize)
}

/// Apply a branch offset to the PC of the branch instruction.
///
/// Targets were validated at load, so the arithmetic cannot leave the
/// function body.
#[inline]
fn branch_target(pc: usize, offset: i32) -> usize {
    (pc as i64 + 1 + offset as i64) as usize
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::FunctionSpec;
    use crate::primitives::default_table;
    use basalt_core::{Instruction as I, Opcode as Op};
    use basalt_runtime::GcConfig;

    fn context_for(functions: Vec<FunctionSpec>, strings: Vec<String>) -> ExecutionContext {
        let module = Arc::new(
            Module::new(functions, strings, default_table().bindings().to_vec()).unwrap(),
        );
        let compiled = Arc::new(CompiledCodeTable::new(module.function_count()));
        ExecutionContext::new(module, compiled, Heap::with_defaults(), Config::default())
    }

    fn run_body(body: Vec<I>) -> VmResult<Value> {
        let mut context = context_for(vec![FunctionSpec::new("test", 0, 0, body)], Vec::new());
        context.interpret(0)
    }

    #[test]
    fn test_push_constant_and_return() {
        let result = run_body(vec![
            I::new(Op::IntPushConstant, -9),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap();
        assert_eq!(result.as_integer(), Some(-9));
    }

    #[test]
    fn test_arithmetic() {
        let result = run_body(vec![
            I::new(Op::IntPushConstant, 6),
            I::new(Op::IntPushConstant, 7),
            I::bare(Op::Mul),
            I::new(Op::IntPushConstant, 2),
            I::bare(Op::Div),
            I::new(Op::IntPushConstant, 1),
            I::bare(Op::Sub),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap();
        assert_eq!(result.as_integer(), Some(20));
    }

    #[test]
    fn test_division_by_zero_faults() {
        let err = run_body(vec![
            I::new(Op::IntPushConstant, 1),
            I::new(Op::IntPushConstant, 0),
            I::bare(Op::Div),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap_err();
        assert_eq!(err, VmError::Fault(FaultKind::DivisionByZero));
    }

    #[test]
    fn test_arithmetic_on_undefined_faults() {
        // A zero-filled local is `undefined`, not integer 0.
        let body = vec![
            I::new(Op::PushFromVar, 0),
            I::new(Op::IntPushConstant, 1),
            I::bare(Op::Add),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ];
        let mut context =
            context_for(vec![FunctionSpec::new("test", 0, 1, body)], Vec::new());
        let err = context.interpret(0).unwrap_err();
        assert_eq!(err, VmError::Fault(FaultKind::IntegerExpected));
    }

    #[test]
    fn test_not() {
        let result = run_body(vec![
            I::new(Op::IntPushConstant, 5),
            I::bare(Op::Not),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap();
        assert_eq!(result.as_integer(), Some(0));

        let result = run_body(vec![
            I::new(Op::IntPushConstant, 0),
            I::bare(Op::Not),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap();
        assert_eq!(result.as_integer(), Some(1));
    }

    #[test]
    fn test_duplicate_and_drop() {
        let result = run_body(vec![
            I::new(Op::IntPushConstant, 3),
            I::bare(Op::Duplicate),
            I::bare(Op::Add),
            I::new(Op::IntPushConstant, 99),
            I::bare(Op::Drop),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap();
        assert_eq!(result.as_integer(), Some(6));
    }

    #[test]
    fn test_forward_jump_skips() {
        // jmp 1 skips the first push: result is 2.
        let result = run_body(vec![
            I::new(Op::Jmp, 1),
            I::new(Op::IntPushConstant, 1),
            I::new(Op::IntPushConstant, 2),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap();
        assert_eq!(result.as_integer(), Some(2));
    }

    #[test]
    fn test_conditional_branch_not_taken_falls_through() {
        let result = run_body(vec![
            I::new(Op::IntPushConstant, 1),
            I::new(Op::IntPushConstant, 2),
            I::new(Op::JmpEq, 1),
            I::new(Op::IntPushConstant, 10),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap();
        assert_eq!(result.as_integer(), Some(10));
    }

    #[test]
    fn test_comparison_on_non_integer_faults() {
        let body = vec![
            I::bare(Op::NewObject),
            I::new(Op::IntPushConstant, 1),
            I::new(Op::JmpEq, 0),
            I::new(Op::IntPushConstant, 0),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ];
        let err = run_body(body).unwrap_err();
        assert_eq!(err, VmError::Fault(FaultKind::IntegerExpected));
    }

    #[test]
    fn test_end_of_section_fallthrough_faults() {
        let err = run_body(vec![
            I::new(Op::IntPushConstant, 1),
            I::bare(Op::EndSection),
        ])
        .unwrap_err();
        assert_eq!(err, VmError::Fault(FaultKind::EndOfSection));
    }

    #[test]
    fn test_call_indirect_faults() {
        let err = run_body(vec![
            I::bare(Op::CallIndirect),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap_err();
        assert_eq!(err, VmError::Fault(FaultKind::CallIndirect));
    }

    #[test]
    fn test_locals_and_vars() {
        // f(a, b) with one local: local = a - b; return local * b.
        let body = vec![
            I::new(Op::PushFromVar, 0),
            I::new(Op::PushFromVar, 1),
            I::bare(Op::Sub),
            I::new(Op::PopIntoVar, 2),
            I::new(Op::PushFromVar, 2),
            I::new(Op::PushFromVar, 1),
            I::bare(Op::Mul),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ];
        let mut context =
            context_for(vec![FunctionSpec::new("f", 2, 1, body)], Vec::new());
        context.push(Value::integer(10)).unwrap();
        context.push(Value::integer(4)).unwrap();
        let result = context.interpret(0).unwrap();
        assert_eq!(result.as_integer(), Some(24));
        // Frame unwound: arguments consumed, nothing left behind.
        assert_eq!(context.stack().sp(), 0);
    }

    #[test]
    fn test_object_write_read() {
        let body = vec![
            I::bare(Op::NewObject),
            I::bare(Op::Duplicate),
            I::new(Op::IntPushConstant, 41),
            I::new(Op::PopIntoObject, 3),
            I::new(Op::PushFromObject, 3),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ];
        let result = run_body(body).unwrap();
        assert_eq!(result.as_integer(), Some(41));
    }

    #[test]
    fn test_object_missing_slot_read_faults() {
        let err = run_body(vec![
            I::bare(Op::NewObject),
            I::new(Op::PushFromObject, 7),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap_err();
        assert_eq!(err, VmError::Fault(FaultKind::MissingSlot(7)));
    }

    #[test]
    fn test_object_opcodes_on_non_object_fault() {
        let err = run_body(vec![
            I::new(Op::IntPushConstant, 1),
            I::new(Op::PushFromObject, 0),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap_err();
        assert_eq!(err, VmError::Fault(FaultKind::ObjectExpected));

        let err = run_body(vec![
            I::new(Op::IntPushConstant, 1),
            I::new(Op::IntPushConstant, 2),
            I::new(Op::PopIntoObject, 0),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ])
        .unwrap_err();
        assert_eq!(err, VmError::Fault(FaultKind::ObjectExpected));
    }

    #[test]
    fn test_slot_cache_warms_and_hits() {
        // A loop writing and reading the same slot shape exercises the
        // call-site caches; correctness is observable through the result.
        let body = vec![
            I::bare(Op::NewObject),
            I::bare(Op::Duplicate),
            I::new(Op::IntPushConstant, 5),
            I::new(Op::PopIntoObject, 0),
            I::bare(Op::Duplicate),
            I::new(Op::IntPushConstant, 6),
            I::new(Op::PopIntoObject, 0),
            I::new(Op::PushFromObject, 0),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ];
        let result = run_body(body).unwrap();
        assert_eq!(result.as_integer(), Some(6));
    }

    #[test]
    fn test_system_collect_preserves_stack_roots() {
        let body = vec![
            I::bare(Op::NewObject),
            I::bare(Op::Duplicate),
            I::new(Op::IntPushConstant, 12),
            I::new(Op::PopIntoObject, 1),
            I::bare(Op::SystemCollect),
            I::new(Op::PushFromObject, 1),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ];
        let result = run_body(body).unwrap();
        assert_eq!(result.as_integer(), Some(12));
    }

    #[test]
    fn test_collection_pressure_during_allocation_loop() {
        // Allocate-and-drop in a loop under a tiny threshold; dropped
        // objects must be reclaimed, the loop counter must survive.
        let body = vec![
            // local 0: countdown
            I::new(Op::IntPushConstant, 64),
            I::new(Op::PopIntoVar, 0),
            // loop: allocate, drop, decrement, repeat while > 0
            I::bare(Op::NewObject),
            I::bare(Op::Drop),
            I::new(Op::PushFromVar, 0),
            I::new(Op::IntPushConstant, 1),
            I::bare(Op::Sub),
            I::new(Op::PopIntoVar, 0),
            I::new(Op::PushFromVar, 0),
            I::new(Op::IntPushConstant, 0),
            I::new(Op::JmpGt, -9),
            I::new(Op::IntPushConstant, 1),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ];
        let module = Arc::new(
            Module::new(
                vec![FunctionSpec::new("churn", 0, 1, body)],
                Vec::new(),
                Vec::new(),
            )
            .unwrap(),
        );
        let compiled = Arc::new(CompiledCodeTable::new(1));
        let heap = Heap::new(GcConfig { collect_threshold: 8, ..GcConfig::default() });
        let mut context = ExecutionContext::new(module, compiled, heap, Config::default());

        let result = context.interpret(0).unwrap();
        assert_eq!(result.as_integer(), Some(1));
        assert!(context.heap().stats().collections > 0);
        assert!(context.heap().live_cells() < 64);
    }

    #[test]
    fn test_primitive_call_print_number() {
        let body = vec![
            I::new(Op::IntPushConstant, 42),
            I::new(Op::PrimitiveCall, 1),
            I::bare(Op::FunctionReturn),
            I::bare(Op::EndSection),
        ];
        let mut context = context_for(vec![FunctionSpec::new("p", 0, 0, body)], Vec::new());
        context.set_output(Box::new(std::io::sink()));
        // print_number pops 42 and pushes 0, which the return consumes.
        let result = context.interpret(0).unwrap();
        assert_eq!(result.as_integer(), Some(0));
    }
}
