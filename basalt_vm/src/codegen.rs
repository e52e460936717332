//! The code-generator seam.
//!
//! The native-code generator is a black box behind [`CodeGenerator`]: given
//! a function index it returns an opaque [`CompiledFunction`] honoring one
//! of the two bridge ABIs. The VM only ever talks to the trait, so real
//! backends (template JITs, AOT caches) plug in without touching the
//! interpreter or the bridge.
//!
//! [`BaselineGenerator`] is the default backend. Its entries marshal
//! per-ABI and then drive the interpreter over the function body: under the
//! register convention the entry pushes its positional parameters back onto
//! the operand stack first, exactly the job of an interpreter re-entry
//! shim. This keeps both calling conventions executable (and testable)
//! everywhere, with identical observable semantics.

use crate::bridge::CompiledFunction;
use crate::module::Module;
use basalt_core::{CodegenError, Config, Value, VmError, VmResult};
use std::sync::Arc;

/// A pluggable native-code backend.
pub trait CodeGenerator {
    /// Produce a compiled entry for one function.
    fn generate(
        &self,
        module: &Arc<Module>,
        index: usize,
        config: &Config,
    ) -> Result<CompiledFunction, CodegenError>;

    /// Backend name, for progress reporting.
    fn name(&self) -> &'static str {
        "unnamed"
    }
}

/// The default backend: interpreter-driven entries behind both ABIs.
pub struct BaselineGenerator;

impl BaselineGenerator {
    /// Acquire the backend. The baseline has no external resources, so
    /// this cannot fail; real backends surface `VmError::JitInit` here.
    pub fn initialize(config: &Config) -> VmResult<BaselineGenerator> {
        if config.verbose {
            eprintln!(
                "basalt: baseline code generator ready (inline depth {})",
                config.max_inline_depth
            );
        }
        Ok(BaselineGenerator)
    }
}

impl CodeGenerator for BaselineGenerator {
    fn generate(
        &self,
        module: &Arc<Module>,
        index: usize,
        config: &Config,
    ) -> Result<CompiledFunction, CodegenError> {
        if module.function(index).is_none() {
            return Err(CodegenError::NoSuchFunction(index));
        }

        if config.pass_param {
            // Register convention: parameters arrive positionally and are
            // replayed onto the operand stack before the body runs.
            Ok(CompiledFunction::Register(Box::new(move |context, args| {
                for &arg in args {
                    context.push(Value::from_raw(arg))?;
                }
                context.interpret(index).map(Value::raw)
            })))
        } else {
            // Stack convention: arguments are already in place.
            Ok(CompiledFunction::Stack(Box::new(|context, index| {
                context.interpret(index).map(Value::raw)
            })))
        }
    }

    fn name(&self) -> &'static str {
        "baseline"
    }
}

/// A backend that always fails to initialize; exercises the `JitInit`
/// path from construction through teardown.
#[derive(Debug)]
pub struct FailingGenerator;

impl FailingGenerator {
    pub fn initialize(_config: &Config) -> VmResult<FailingGenerator> {
        Err(VmError::JitInit("backend unavailable".to_string()))
    }
}

impl CodeGenerator for FailingGenerator {
    fn generate(
        &self,
        _module: &Arc<Module>,
        _index: usize,
        _config: &Config,
    ) -> Result<CompiledFunction, CodegenError> {
        Err(CodegenError::Backend("backend unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_initializes() {
        let generator = BaselineGenerator::initialize(&Config::default()).unwrap();
        assert_eq!(generator.name(), "baseline");
    }

    #[test]
    fn test_generate_unknown_function() {
        let generator = BaselineGenerator::initialize(&Config::default()).unwrap();
        let module = Arc::new(Module::empty());
        let err = generator
            .generate(&module, 0, &Config::default())
            .unwrap_err();
        assert_eq!(err, CodegenError::NoSuchFunction(0));
    }

    #[test]
    fn test_convention_follows_config() {
        use crate::module::FunctionSpec;
        use basalt_core::{Instruction as I, Opcode as Op};

        let module = Arc::new(
            Module::new(
                vec![FunctionSpec::new(
                    "f",
                    0,
                    0,
                    vec![
                        I::new(Op::IntPushConstant, 1),
                        I::bare(Op::FunctionReturn),
                        I::bare(Op::EndSection),
                    ],
                )],
                Vec::new(),
                Vec::new(),
            )
            .unwrap(),
        );
        let generator = BaselineGenerator::initialize(&Config::default()).unwrap();

        let stack_entry = generator
            .generate(&module, 0, &Config::default())
            .unwrap();
        assert!(matches!(stack_entry, CompiledFunction::Stack(_)));

        let register_entry = generator
            .generate(&module, 0, &Config { pass_param: true, ..Config::default() })
            .unwrap();
        assert!(matches!(register_entry, CompiledFunction::Register(_)));
    }

    #[test]
    fn test_failing_backend() {
        let err = FailingGenerator::initialize(&Config::default()).unwrap_err();
        assert!(matches!(err, VmError::JitInit(_)));
        assert!(!err.is_recoverable());

        let module = Arc::new(Module::empty());
        let err = FailingGenerator
            .generate(&module, 0, &Config::default())
            .unwrap_err();
        assert!(matches!(err, CodegenError::Backend(_)));
    }
}
