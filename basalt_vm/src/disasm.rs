//! Textual rendering of functions and modules.

use crate::module::{FunctionSpec, Module};
use std::fmt::Write;

/// Render one function as text.
pub fn disassemble_function(function: &FunctionSpec) -> String {
    let mut out = String::new();

    writeln!(
        out,
        "{} (nargs {}, nregs {}):",
        function.name, function.nargs, function.nregs
    )
    .unwrap();
    for (pc, instruction) in function.bytecode.iter().enumerate() {
        writeln!(out, "  {:4}: {}", pc, instruction).unwrap();
    }

    out
}

/// Render a whole module: every function, then the string pool.
pub fn disassemble_module(module: &Module) -> String {
    let mut out = String::new();

    for (index, function) in module.functions().iter().enumerate() {
        writeln!(out, "[{}] {}", index, disassemble_function(function).trim_end()).unwrap();
        out.push('\n');
    }

    if !module.strings().is_empty() {
        writeln!(out, "strings:").unwrap();
        for (index, string) in module.strings().iter().enumerate() {
            writeln!(out, "  {:4}: {:?}", index, string).unwrap();
        }
    }

    out
}
