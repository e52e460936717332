//! Basalt module runner.
//!
//! `basalt [options] <module-path> <function-name> [int-args...]` loads a
//! `b9module` binary and runs the named function. Exit code 0 on success,
//! 1 on load failure or unhandled runtime error, 2 on usage errors.

mod args;

use args::{parse_args, ArgError, USAGE};
use basalt_core::Value;
use basalt_vm::{default_table, disasm, load_module, VirtualMachine};
use std::process::ExitCode;
use std::sync::Arc;

const EXIT_ERROR: u8 = 1;
const EXIT_USAGE_ERROR: u8 = 2;

fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(err) => return usage_error(err),
    };

    if args.help {
        print!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let bytes = match std::fs::read(&args.module_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("basalt: cannot read {}: {}", args.module_path, err);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let module = match load_module(&bytes, &default_table()) {
        Ok(module) => module,
        Err(err) => {
            eprintln!("basalt: {}: {}", args.module_path, err);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if args.disasm {
        print!("{}", disasm::disassemble_module(&module));
        return ExitCode::SUCCESS;
    }

    let mut vm = match VirtualMachine::new(args.config.clone()) {
        Ok(vm) => vm,
        Err(err) => {
            eprintln!("basalt: {}", err);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    vm.load(Arc::new(module));

    if args.config.jit {
        if let Err(err) = vm.generate_all_code() {
            eprintln!("basalt: {}", err);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    let call_args: Vec<Value> = args.function_args.iter().map(|&v| Value::integer(v)).collect();
    match vm.run(&args.function, &call_args) {
        Ok(result) => {
            match result.as_integer() {
                Some(value) => println!("=> {}", value),
                None => println!("=> {:?}", result),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("basalt: {}", err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn usage_error(err: ArgError) -> ExitCode {
    eprintln!("basalt: {}", err);
    eprint!("{}", USAGE);
    ExitCode::from(EXIT_USAGE_ERROR)
}
