//! Error taxonomy for the VM.
//!
//! Three severities, with distinct recovery contracts:
//!
//! - [`ModuleLoadError`] and [`VmError::BadFunctionCall`] are recoverable:
//!   they are reported to the embedder and the VM remains usable.
//! - [`FaultKind`] runtime faults are fatal to the current `run` invocation;
//!   the execution context is reset before the error reaches the embedder,
//!   so the VM itself is not poisoned.
//! - [`VmError::JitInit`] is fatal to VM construction.

// =============================================================================
// Module loading
// =============================================================================

/// Rejection while parsing or validating a binary module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleLoadError {
    /// The file does not start with the `b9module` magic.
    BadMagic,
    /// The file ended before the indicated structure was complete.
    Truncated { offset: usize, needed: usize },
    /// A section code outside the known set.
    UnknownSection(u32),
    /// The same section appeared twice.
    DuplicateSection(u32),
    /// A function body contained a byte outside the opcode ABI.
    UnknownOpcode { function: String, opcode: u8 },
    /// A function body was not terminated by `END_SECTION`.
    MissingEndSection(String),
    /// A branch target fell outside the function body.
    JumpOutOfRange { function: String, pc: u32, target: i64 },
    /// A `FUNCTION_CALL` immediate named a nonexistent function.
    FunctionIndexOutOfRange { function: String, index: i64 },
    /// A `PRIMITIVE_CALL` immediate named a nonexistent primitive.
    PrimitiveIndexOutOfRange { function: String, index: i64 },
    /// A `STR_PUSH_CONSTANT` immediate named a nonexistent pool entry.
    StringIndexOutOfRange { function: String, index: i64 },
    /// A var access fell outside the function's args+locals region.
    VarOffsetOutOfRange { function: String, offset: i64, limit: u32 },
    /// A function record's stored index disagreed with its position.
    IndexMismatch { function: String, stored: u32, position: u32 },
    /// Two function records carried the same name.
    DuplicateFunctionName(String),
    /// `nargs`/`nregs` negative as a signed value, or too large for the
    /// operand stack.
    FunctionCounts { function: String, nargs: u32, nregs: u32 },
    /// A string-pool entry was not valid UTF-8.
    InvalidUtf8 { index: u32 },
}

impl std::fmt::Display for ModuleLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleLoadError::BadMagic => write!(f, "not a b9module file (bad magic)"),
            ModuleLoadError::Truncated { offset, needed } => {
                write!(f, "truncated module: needed {} bytes at offset {}", needed, offset)
            }
            ModuleLoadError::UnknownSection(code) => write!(f, "unknown section code {}", code),
            ModuleLoadError::DuplicateSection(code) => {
                write!(f, "section {} appears more than once", code)
            }
            ModuleLoadError::UnknownOpcode { function, opcode } => {
                write!(f, "function '{}': unknown opcode {:#04x}", function, opcode)
            }
            ModuleLoadError::MissingEndSection(function) => {
                write!(f, "function '{}': bytecode missing end_section", function)
            }
            ModuleLoadError::JumpOutOfRange { function, pc, target } => write!(
                f,
                "function '{}': jump at pc {} targets out-of-range instruction {}",
                function, pc, target
            ),
            ModuleLoadError::FunctionIndexOutOfRange { function, index } => {
                write!(f, "function '{}': call to nonexistent function {}", function, index)
            }
            ModuleLoadError::PrimitiveIndexOutOfRange { function, index } => {
                write!(f, "function '{}': call to nonexistent primitive {}", function, index)
            }
            ModuleLoadError::StringIndexOutOfRange { function, index } => {
                write!(f, "function '{}': nonexistent string constant {}", function, index)
            }
            ModuleLoadError::VarOffsetOutOfRange { function, offset, limit } => write!(
                f,
                "function '{}': variable offset {} outside args+locals region of {}",
                function, offset, limit
            ),
            ModuleLoadError::IndexMismatch { function, stored, position } => write!(
                f,
                "function '{}': stored index {} does not match position {}",
                function, stored, position
            ),
            ModuleLoadError::DuplicateFunctionName(name) => {
                write!(f, "duplicate function name '{}'", name)
            }
            ModuleLoadError::FunctionCounts { function, nargs, nregs } => write!(
                f,
                "function '{}': invalid argument/register counts ({}, {})",
                function, nargs, nregs
            ),
            ModuleLoadError::InvalidUtf8 { index } => {
                write!(f, "string constant {} is not valid UTF-8", index)
            }
        }
    }
}

impl std::error::Error for ModuleLoadError {}

// =============================================================================
// Runtime faults
// =============================================================================

/// Fatal conditions inside a `run` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// `DIV` with a zero divisor.
    DivisionByZero,
    /// Pop or peek below the frame's base.
    StackUnderflow,
    /// Push beyond the operand stack's capacity.
    StackOverflow,
    /// Arithmetic, comparison, or `NOT` on a non-integer value.
    IntegerExpected,
    /// An object opcode applied to a non-object value.
    ObjectExpected,
    /// Read of a slot the object does not have.
    MissingSlot(u32),
    /// Var access outside the args+locals region.
    VarOffsetOutOfRange { offset: i32, limit: u32 },
    /// Dispatch reached a byte outside the opcode ABI.
    UnknownOpcode(u8),
    /// Execution fell through to the `END_SECTION` sentinel.
    EndOfSection,
    /// `CALL_INDIRECT` has no defined semantics yet.
    CallIndirect,
    /// Register calling convention invoked beyond the supported arity.
    TooManyArguments { nargs: u32, limit: u32 },
    /// A primitive received a string index outside the module pool.
    StringIndexOutOfRange(i64),
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultKind::DivisionByZero => write!(f, "division by zero"),
            FaultKind::StackUnderflow => write!(f, "operand stack underflow"),
            FaultKind::StackOverflow => write!(f, "operand stack overflow"),
            FaultKind::IntegerExpected => write!(f, "integer value expected"),
            FaultKind::ObjectExpected => write!(f, "accessing a non-object value as an object"),
            FaultKind::MissingSlot(id) => {
                write!(f, "accessing object slot {} that doesn't exist", id)
            }
            FaultKind::VarOffsetOutOfRange { offset, limit } => {
                write!(f, "variable offset {} outside args+locals region of {}", offset, limit)
            }
            FaultKind::UnknownOpcode(byte) => write!(f, "unknown opcode {:#04x}", byte),
            FaultKind::EndOfSection => write!(f, "reached end of function without a return"),
            FaultKind::CallIndirect => write!(f, "call_indirect is not supported"),
            FaultKind::TooManyArguments { nargs, limit } => write!(
                f,
                "too many arguments for register convention: {} (limit {})",
                nargs, limit
            ),
            FaultKind::StringIndexOutOfRange(index) => {
                write!(f, "string index {} outside the module pool", index)
            }
        }
    }
}

// =============================================================================
// Code generation
// =============================================================================

/// Failure inside the code-generator seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// Code generation requested while `Config::jit` is off.
    JitDisabled,
    /// The requested function index does not exist.
    NoSuchFunction(usize),
    /// The backend refused the function.
    Backend(String),
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::JitDisabled => write!(f, "code generation requested with jit disabled"),
            CodegenError::NoSuchFunction(index) => {
                write!(f, "cannot generate code for nonexistent function {}", index)
            }
            CodegenError::Backend(message) => write!(f, "code generator: {}", message),
        }
    }
}

impl std::error::Error for CodegenError {}

// =============================================================================
// Top-level error
// =============================================================================

/// Any error surfaced to the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Module parsing or validation failed; the VM remains usable.
    ModuleLoad(ModuleLoadError),
    /// The named function does not exist in the loaded module.
    UnknownFunction(String),
    /// The caller supplied the wrong number of arguments.
    BadFunctionCall { function: String, expected: u32, got: u32 },
    /// A fatal runtime fault; the execution context has been reset.
    Fault(FaultKind),
    /// Code generation failed.
    Codegen(CodegenError),
    /// The code-generation backend failed to initialize.
    JitInit(String),
}

impl VmError {
    /// Shorthand for a runtime fault.
    #[inline]
    pub fn fault(kind: FaultKind) -> VmError {
        VmError::Fault(kind)
    }

    /// Whether the VM remains usable after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, VmError::JitInit(_))
    }
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmError::ModuleLoad(err) => write!(f, "module load error: {}", err),
            VmError::UnknownFunction(name) => write!(f, "no function named '{}'", name),
            VmError::BadFunctionCall { function, expected, got } => write!(
                f,
                "{} - got {} arguments, expected {}",
                function, got, expected
            ),
            VmError::Fault(kind) => write!(f, "runtime fault: {}", kind),
            VmError::Codegen(err) => write!(f, "{}", err),
            VmError::JitInit(message) => write!(f, "jit initialization failed: {}", message),
        }
    }
}

impl std::error::Error for VmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VmError::ModuleLoad(err) => Some(err),
            VmError::Codegen(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModuleLoadError> for VmError {
    fn from(err: ModuleLoadError) -> VmError {
        VmError::ModuleLoad(err)
    }
}

impl From<CodegenError> for VmError {
    fn from(err: CodegenError) -> VmError {
        VmError::Codegen(err)
    }
}

impl From<FaultKind> for VmError {
    fn from(kind: FaultKind) -> VmError {
        VmError::Fault(kind)
    }
}

/// Result alias used across the VM crates.
pub type VmResult<T> = Result<T, VmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = VmError::BadFunctionCall {
            function: "sumto".to_string(),
            expected: 1,
            got: 2,
        };
        assert_eq!(err.to_string(), "sumto - got 2 arguments, expected 1");

        let err = VmError::fault(FaultKind::DivisionByZero);
        assert_eq!(err.to_string(), "runtime fault: division by zero");

        let err: VmError = ModuleLoadError::BadMagic.into();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_recoverability() {
        assert!(VmError::fault(FaultKind::EndOfSection).is_recoverable());
        assert!(VmError::ModuleLoad(ModuleLoadError::BadMagic).is_recoverable());
        assert!(!VmError::JitInit("backend".to_string()).is_recoverable());
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let err: VmError = ModuleLoadError::UnknownSection(9).into();
        assert!(err.source().is_some());
        assert!(VmError::fault(FaultKind::CallIndirect).source().is_none());
    }
}
