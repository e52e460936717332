//! The virtual-machine facade.
//!
//! Owns the configuration, the loaded module, the execution context, the
//! compiled-code table, and the optional code generator. `run` is the
//! embedder's entry point: it validates the argument count, pushes the
//! arguments, dispatches through the bridge, and resets the execution
//! context on every exit path - fault or not - so the VM stays usable.

use crate::bridge::{self, CompiledCodeTable};
use crate::codegen::{BaselineGenerator, CodeGenerator};
use crate::context::ExecutionContext;
use crate::module::Module;
use basalt_core::{CodegenError, Config, Value, VmError, VmResult};
use basalt_runtime::Heap;
use std::sync::Arc;

/// A single-threaded virtual machine instance.
pub struct VirtualMachine {
    config: Config,
    module: Arc<Module>,
    compiled: Arc<CompiledCodeTable>,
    context: ExecutionContext,
    generator: Option<Box<dyn CodeGenerator>>,
}

impl VirtualMachine {
    /// Construct a VM; acquires the code-generation backend when `jit` is
    /// enabled. Backend acquisition failure is fatal to construction.
    pub fn new(config: Config) -> VmResult<VirtualMachine> {
        let generator: Option<Box<dyn CodeGenerator>> = if config.jit {
            Some(Box::new(BaselineGenerator::initialize(&config)?))
        } else {
            None
        };
        Ok(VirtualMachine::assemble(config, generator))
    }

    /// Construct a VM around a custom backend (the backend must already be
    /// initialized; failures surface from its own constructor).
    pub fn with_generator(config: Config, generator: Box<dyn CodeGenerator>) -> VirtualMachine {
        VirtualMachine::assemble(config, Some(generator))
    }

    fn assemble(config: Config, generator: Option<Box<dyn CodeGenerator>>) -> VirtualMachine {
        if config.verbose {
            eprintln!("basalt: VM initializing");
            eprintln!("{}", config);
        }
        let module = Arc::new(Module::empty());
        let compiled = Arc::new(CompiledCodeTable::new(0));
        let context = ExecutionContext::new(
            Arc::clone(&module),
            Arc::clone(&compiled),
            Heap::with_defaults(),
            config.clone(),
        );
        VirtualMachine { config, module, compiled, context, generator }
    }

    /// Install a loaded module. Replaces any previous module, its compiled
    /// code, and the execution context (including its heap).
    pub fn load(&mut self, module: Arc<Module>) {
        if self.config.verbose {
            eprintln!(
                "basalt: loaded module with {} functions",
                module.function_count()
            );
        }
        self.compiled = Arc::new(CompiledCodeTable::new(module.function_count()));
        self.context = ExecutionContext::new(
            Arc::clone(&module),
            Arc::clone(&self.compiled),
            Heap::with_defaults(),
            self.config.clone(),
        );
        self.module = module;
    }

    /// Run a function by name.
    pub fn run(&mut self, name: &str, args: &[Value]) -> VmResult<Value> {
        let index = self
            .module
            .find_function(name)
            .ok_or_else(|| VmError::UnknownFunction(name.to_string()))?;
        self.run_function(index, args)
    }

    /// Run a function by index.
    pub fn run_function(&mut self, index: usize, args: &[Value]) -> VmResult<Value> {
        let (name, nargs) = match self.module.function(index) {
            Some(function) => (function.name.clone(), function.nargs),
            None => return Err(VmError::UnknownFunction(format!("#{}", index))),
        };

        if self.config.verbose {
            eprintln!("basalt: running {} with {} args", name, args.len());
        }

        if nargs as usize != args.len() {
            self.context.reset();
            return Err(VmError::BadFunctionCall {
                function: name,
                expected: nargs,
                got: args.len() as u32,
            });
        }

        self.context.reset();
        // Left to right: the last-pushed value is the rightmost parameter.
        for &arg in args {
            self.context.push(arg)?;
        }

        let result = bridge::call_function(&mut self.context, index);
        self.context.reset();
        result
    }

    /// Generate and install compiled code for one function.
    pub fn generate_code(&mut self, index: usize) -> VmResult<()> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(VmError::Codegen(CodegenError::JitDisabled))?;
        if self.config.debug {
            eprintln!(
                "basalt: generating code for function {} via {}",
                index,
                generator.name()
            );
        }
        let entry = generator.generate(&self.module, index, &self.config)?;
        self.compiled.install(index, entry);
        Ok(())
    }

    /// Generate compiled code for every function in the module.
    pub fn generate_all_code(&mut self) -> VmResult<()> {
        for index in 0..self.module.function_count() {
            self.generate_code(index)?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// The execution context; primitives and tests reach the heap and the
    /// output stream through it.
    #[inline]
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// Number of functions in the loaded module.
    #[inline]
    pub fn function_count(&self) -> usize {
        self.module.function_count()
    }

    /// A string-pool entry from the loaded module.
    #[inline]
    pub fn string(&self, index: usize) -> Option<&str> {
        self.module.string(index)
    }

    /// Number of functions with compiled entries installed.
    pub fn compiled_count(&self) -> usize {
        self.compiled.compiled_count()
    }
}

impl Drop for VirtualMachine {
    fn drop(&mut self) {
        // The backend (if any) and the context's heap release with the VM,
        // on every exit path.
        if self.config.verbose {
            eprintln!("basalt: VM shutting down");
        }
    }
}
