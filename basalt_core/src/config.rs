//! Runtime configuration.
//!
//! A single struct resolved once at startup; the VM and execution context
//! read from it without any per-operation cost.

/// VM configuration.
///
/// The code-generation knobs (`direct_call`, `pass_param`, `lazy_vm_state`,
/// `max_inline_depth`) are forwarded to whichever backend sits behind the
/// code-generator seam; `pass_param` additionally selects the calling
/// convention used at the invocation bridge.
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable native-code generation.
    pub jit: bool,
    /// Permit native-to-native direct dispatch.
    pub direct_call: bool,
    /// Use the register calling convention at the bridge.
    pub pass_param: bool,
    /// Allow the code generator to defer VM-state materialization.
    pub lazy_vm_state: bool,
    /// Verbose tracing of every executed instruction.
    pub debug: bool,
    /// Concise progress reporting.
    pub verbose: bool,
    /// Inlining depth budget for the code generator.
    pub max_inline_depth: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            jit: false,
            direct_call: false,
            pass_param: false,
            lazy_vm_state: false,
            debug: false,
            verbose: false,
            max_inline_depth: 1,
        }
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mode:         {}", if self.jit { "JIT" } else { "Interpreter" })?;
        writeln!(f, "Inline depth: {}", self.max_inline_depth)?;
        writeln!(f, "directcall:   {}", self.direct_call)?;
        writeln!(f, "passparam:    {}", self.pass_param)?;
        writeln!(f, "lazyvmstate:  {}", self.lazy_vm_state)?;
        write!(f, "debug:        {}", self.debug)
    }
}
