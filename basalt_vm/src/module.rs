//! The loaded, immutable program.
//!
//! A [`Module`] owns the ordered function table (a function's index is its
//! position), the string pool, and the primitive bindings. It is validated
//! on construction and never mutated afterwards; the VM shares it via
//! `Arc`.

use crate::primitives::PrimitiveBinding;
use crate::stack::STACK_CAPACITY;
use basalt_core::{Instruction, ModuleLoadError, Opcode};
use rustc_hash::FxHashMap;

/// Immutable description of one function.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    /// Name used for by-name invocation.
    pub name: String,
    /// Argument count.
    pub nargs: u32,
    /// Local-register count, reserved above the arguments on entry.
    pub nregs: u32,
    /// Bytecode, terminated by `END_SECTION`.
    pub bytecode: Vec<Instruction>,
}

impl FunctionSpec {
    pub fn new(
        name: impl Into<String>,
        nargs: u32,
        nregs: u32,
        bytecode: Vec<Instruction>,
    ) -> FunctionSpec {
        FunctionSpec { name: name.into(), nargs, nregs, bytecode }
    }
}

/// A loaded program: functions, interned strings, primitive bindings.
pub struct Module {
    functions: Vec<FunctionSpec>,
    strings: Vec<String>,
    primitives: Vec<PrimitiveBinding>,
    function_index: FxHashMap<String, usize>,
}

impl Module {
    /// Validate and assemble a module.
    ///
    /// Every cross-reference in the bytecode is checked here, so the
    /// interpreter can trust immediates at dispatch time: branch targets,
    /// function/primitive/string indexes, and var offsets against each
    /// function's args+locals region.
    pub fn new(
        functions: Vec<FunctionSpec>,
        strings: Vec<String>,
        primitives: Vec<PrimitiveBinding>,
    ) -> Result<Module, ModuleLoadError> {
        let mut function_index = FxHashMap::default();
        for (position, function) in functions.iter().enumerate() {
            if function_index.insert(function.name.clone(), position).is_some() {
                return Err(ModuleLoadError::DuplicateFunctionName(function.name.clone()));
            }
        }

        for function in &functions {
            validate_function(function, functions.len(), strings.len(), primitives.len())?;
        }

        Ok(Module { functions, strings, primitives, function_index })
    }

    /// A module with no functions, strings, or primitives.
    pub fn empty() -> Module {
        Module {
            functions: Vec::new(),
            strings: Vec::new(),
            primitives: Vec::new(),
            function_index: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn function(&self, index: usize) -> Option<&FunctionSpec> {
        self.functions.get(index)
    }

    /// Resolve a function index by name.
    #[inline]
    pub fn find_function(&self, name: &str) -> Option<usize> {
        self.function_index.get(name).copied()
    }

    #[inline]
    pub fn string(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    #[inline]
    pub fn primitive(&self, index: usize) -> Option<&PrimitiveBinding> {
        self.primitives.get(index)
    }

    #[inline]
    pub fn functions(&self) -> &[FunctionSpec] {
        &self.functions
    }

    #[inline]
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    #[inline]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("functions", &self.functions.len())
            .field("strings", &self.strings.len())
            .field("primitives", &self.primitives.len())
            .finish()
    }
}

fn validate_function(
    function: &FunctionSpec,
    function_count: usize,
    string_count: usize,
    primitive_count: usize,
) -> Result<(), ModuleLoadError> {
    let name = &function.name;

    // The wire type is u32; a value that is negative as i32, or a frame that
    // cannot fit the operand stack, is rejected outright.
    let frame = function.nargs as u64 + function.nregs as u64;
    if function.nargs > i32::MAX as u32
        || function.nregs > i32::MAX as u32
        || frame > STACK_CAPACITY as u64
    {
        return Err(ModuleLoadError::FunctionCounts {
            function: name.clone(),
            nargs: function.nargs,
            nregs: function.nregs,
        });
    }

    let code = &function.bytecode;
    match code.last() {
        Some(last) if last.is_end_section() => {}
        _ => return Err(ModuleLoadError::MissingEndSection(name.clone())),
    }

    let len = code.len();
    for (pc, &instruction) in code.iter().enumerate() {
        let opcode = instruction.opcode().ok_or(ModuleLoadError::UnknownOpcode {
            function: name.clone(),
            opcode: instruction.opcode_byte(),
        })?;

        // The sentinel may appear only as the terminator.
        if opcode == Opcode::EndSection {
            if pc + 1 != len {
                return Err(ModuleLoadError::MissingEndSection(name.clone()));
            }
            continue;
        }

        let imm = instruction.immediate() as i64;
        match opcode {
            op if op.is_branch() => {
                // Offsets are applied at the branch, then the loop's
                // post-increment advances; the resumed instruction is
                // pc + imm + 1.
                let target = pc as i64 + imm + 1;
                if target < 0 || target >= len as i64 {
                    return Err(ModuleLoadError::JumpOutOfRange {
                        function: name.clone(),
                        pc: pc as u32,
                        target,
                    });
                }
            }
            Opcode::FunctionCall => {
                if imm < 0 || imm >= function_count as i64 {
                    return Err(ModuleLoadError::FunctionIndexOutOfRange {
                        function: name.clone(),
                        index: imm,
                    });
                }
            }
            Opcode::PrimitiveCall => {
                if imm < 0 || imm >= primitive_count as i64 {
                    return Err(ModuleLoadError::PrimitiveIndexOutOfRange {
                        function: name.clone(),
                        index: imm,
                    });
                }
            }
            Opcode::StrPushConstant => {
                if imm < 0 || imm >= string_count as i64 {
                    return Err(ModuleLoadError::StringIndexOutOfRange {
                        function: name.clone(),
                        index: imm,
                    });
                }
            }
            Opcode::PushFromVar | Opcode::PopIntoVar => {
                if imm < 0 || imm >= frame as i64 {
                    return Err(ModuleLoadError::VarOffsetOutOfRange {
                        function: name.clone(),
                        offset: imm,
                        limit: frame as u32,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_core::Instruction as I;

    fn ret_42() -> Vec<Instruction> {
        vec![
            I::new(Opcode::IntPushConstant, 42),
            I::bare(Opcode::FunctionReturn),
            I::bare(Opcode::EndSection),
        ]
    }

    #[test]
    fn test_build_and_lookup() {
        let module = Module::new(
            vec![
                FunctionSpec::new("main", 0, 0, ret_42()),
                FunctionSpec::new("helper", 2, 1, ret_42()),
            ],
            vec!["hello".to_string()],
            Vec::new(),
        )
        .unwrap();

        assert_eq!(module.function_count(), 2);
        assert_eq!(module.find_function("helper"), Some(1));
        assert_eq!(module.find_function("missing"), None);
        assert_eq!(module.function(1).unwrap().nargs, 2);
        assert_eq!(module.string(0), Some("hello"));
        assert_eq!(module.string(1), None);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Module::new(
            vec![
                FunctionSpec::new("f", 0, 0, ret_42()),
                FunctionSpec::new("f", 0, 0, ret_42()),
            ],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, ModuleLoadError::DuplicateFunctionName("f".to_string()));
    }

    #[test]
    fn test_missing_end_section_rejected() {
        let err = Module::new(
            vec![FunctionSpec::new(
                "f",
                0,
                0,
                vec![I::new(Opcode::IntPushConstant, 1)],
            )],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, ModuleLoadError::MissingEndSection("f".to_string()));
    }

    #[test]
    fn test_mid_body_end_section_rejected() {
        let err = Module::new(
            vec![FunctionSpec::new(
                "f",
                0,
                0,
                vec![
                    I::bare(Opcode::EndSection),
                    I::bare(Opcode::FunctionReturn),
                    I::bare(Opcode::EndSection),
                ],
            )],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, ModuleLoadError::MissingEndSection("f".to_string()));
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        let err = Module::new(
            vec![FunctionSpec::new(
                "f",
                0,
                0,
                vec![I::from_raw(0x1f00_0000), I::bare(Opcode::EndSection)],
            )],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleLoadError::UnknownOpcode { opcode: 0x1f, .. }));
    }

    #[test]
    fn test_jump_targets_validated() {
        // Backward jump to before the function start.
        let err = Module::new(
            vec![FunctionSpec::new(
                "f",
                0,
                0,
                vec![
                    I::new(Opcode::Jmp, -2),
                    I::bare(Opcode::FunctionReturn),
                    I::bare(Opcode::EndSection),
                ],
            )],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleLoadError::JumpOutOfRange { target: -1, .. }));

        // Forward jump past the sentinel.
        let err = Module::new(
            vec![FunctionSpec::new(
                "f",
                0,
                0,
                vec![
                    I::new(Opcode::Jmp, 5),
                    I::bare(Opcode::FunctionReturn),
                    I::bare(Opcode::EndSection),
                ],
            )],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleLoadError::JumpOutOfRange { target: 6, .. }));
    }

    #[test]
    fn test_cross_references_validated() {
        let call_missing = vec![
            I::new(Opcode::FunctionCall, 3),
            I::bare(Opcode::FunctionReturn),
            I::bare(Opcode::EndSection),
        ];
        let err = Module::new(
            vec![FunctionSpec::new("f", 0, 0, call_missing)],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleLoadError::FunctionIndexOutOfRange { index: 3, .. }));

        let missing_string = vec![
            I::new(Opcode::StrPushConstant, 0),
            I::bare(Opcode::FunctionReturn),
            I::bare(Opcode::EndSection),
        ];
        let err = Module::new(
            vec![FunctionSpec::new("f", 0, 0, missing_string)],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleLoadError::StringIndexOutOfRange { index: 0, .. }));

        let missing_primitive = vec![
            I::new(Opcode::PrimitiveCall, 0),
            I::bare(Opcode::FunctionReturn),
            I::bare(Opcode::EndSection),
        ];
        let err = Module::new(
            vec![FunctionSpec::new("f", 0, 0, missing_primitive)],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleLoadError::PrimitiveIndexOutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_var_offsets_validated_against_frame() {
        let body = vec![
            I::new(Opcode::PushFromVar, 3),
            I::bare(Opcode::FunctionReturn),
            I::bare(Opcode::EndSection),
        ];
        // nargs + nregs = 3, so offset 3 is out of range.
        let err = Module::new(
            vec![FunctionSpec::new("f", 2, 1, body.clone())],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleLoadError::VarOffsetOutOfRange { offset: 3, limit: 3, .. }));

        // One more register makes it valid.
        assert!(Module::new(
            vec![FunctionSpec::new("f", 2, 2, body)],
            Vec::new(),
            Vec::new(),
        )
        .is_ok());
    }

    #[test]
    fn test_function_counts_rejected() {
        let err = Module::new(
            vec![FunctionSpec::new("f", u32::MAX, 0, ret_42())],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleLoadError::FunctionCounts { .. }));

        let err = Module::new(
            vec![FunctionSpec::new("f", 0, STACK_CAPACITY as u32 + 1, ret_42())],
            Vec::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleLoadError::FunctionCounts { .. }));
    }
}
