//! Command-line argument parser.
//!
//! Hand-rolled for zero-overhead startup. Usage:
//!
//! ```text
//! basalt [options] <module-path> <function-name> [int-args...]
//!
//! -jit           enable native-code generation
//! -directcall    permit native-to-native direct dispatch
//! -passparam     use the register calling convention at the bridge
//! -lazyvmstate   let the code generator defer VM-state materialization
//! -inline <n>    inlining depth budget (default 1)
//! -debug         trace every executed instruction
//! -verbose       concise progress reporting
//! -disasm        print the module disassembly and exit
//! -help          print usage and exit
//! ```

use basalt_core::Config;

/// Parsed command line.
#[derive(Debug, Clone)]
pub struct Args {
    pub config: Config,
    /// Print the disassembly instead of running.
    pub disasm: bool,
    /// Print usage and exit.
    pub help: bool,
    /// Path to the module file.
    pub module_path: String,
    /// Function to invoke.
    pub function: String,
    /// Integer arguments for the function.
    pub function_args: Vec<i64>,
}

/// Error during argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    /// A flag that needs a value did not get one.
    MissingValue(&'static str),
    /// An option outside the known set.
    UnknownFlag(String),
    /// The module path or function name is absent.
    MissingPositional(&'static str),
    /// A function argument was not an integer.
    BadFunctionArg(String),
}

impl std::fmt::Display for ArgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgError::MissingValue(flag) => write!(f, "argument expected for {}", flag),
            ArgError::UnknownFlag(flag) => write!(f, "unknown option: {}", flag),
            ArgError::MissingPositional(what) => write!(f, "missing {}", what),
            ArgError::BadFunctionArg(arg) => {
                write!(f, "function arguments must be integers, got '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgError {}

/// Parse arguments (without the program name).
pub fn parse_args(args: &[String]) -> Result<Args, ArgError> {
    let mut config = Config::default();
    let mut disasm = false;
    let mut iter = args.iter().peekable();

    // Options first, then positionals.
    while let Some(arg) = iter.peek() {
        match arg.as_str() {
            "-help" | "--help" | "-h" => {
                return Ok(Args {
                    config,
                    disasm,
                    help: true,
                    module_path: String::new(),
                    function: String::new(),
                    function_args: Vec::new(),
                });
            }
            "-jit" => config.jit = true,
            "-directcall" => config.direct_call = true,
            "-passparam" => config.pass_param = true,
            "-lazyvmstate" => config.lazy_vm_state = true,
            "-debug" => config.debug = true,
            "-verbose" => config.verbose = true,
            "-disasm" => disasm = true,
            "-inline" => {
                iter.next();
                let depth = iter
                    .peek()
                    .and_then(|v| v.parse::<usize>().ok())
                    .ok_or(ArgError::MissingValue("-inline"))?;
                config.max_inline_depth = depth;
            }
            other if other.starts_with('-') => {
                return Err(ArgError::UnknownFlag(other.to_string()));
            }
            _ => break,
        }
        iter.next();
    }

    let module_path = iter
        .next()
        .ok_or(ArgError::MissingPositional("module path"))?
        .clone();
    let function = iter
        .next()
        .ok_or(ArgError::MissingPositional("function name"))?
        .clone();

    let mut function_args = Vec::new();
    for arg in iter {
        let value = arg
            .parse::<i64>()
            .map_err(|_| ArgError::BadFunctionArg(arg.clone()))?;
        function_args.push(value);
    }

    Ok(Args { config, disasm, help: false, module_path, function, function_args })
}

/// Usage text for `-help` and usage errors.
pub const USAGE: &str = "\
usage: basalt [options] <module-path> <function-name> [int-args...]

options:
  -jit           enable native-code generation
  -directcall    permit native-to-native direct dispatch
  -passparam     use the register calling convention
  -lazyvmstate   defer VM-state materialization in generated code
  -inline <n>    inlining depth budget (default 1)
  -debug         trace every executed instruction
  -verbose       concise progress reporting
  -disasm        print the module disassembly and exit
  -help          print this message
";
