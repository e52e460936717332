//! Binary module reader and writer.
//!
//! The wire format is little-endian throughout:
//!
//! ```text
//! magic    8 bytes  "b9module"
//! section  u32 code, then payload; repeated to end of file
//!   code 1 - function table:
//!     count u32
//!     per function: name_len u32, name bytes, index u32, nargs u32,
//!                   nregs u32, u32 instructions until END_SECTION
//!   code 2 - string pool:
//!     count u32, then per string: len u32, bytes
//! ```
//!
//! All structural problems (bad magic, truncation, unknown or duplicate
//! sections, unknown opcodes, missing `END_SECTION`) and every out-of-range
//! cross-reference are rejected at load; see [`Module::new`] for the
//! cross-reference checks. The writer emits the canonical section order
//! (functions, then strings), so `serialize(deserialize(bytes))` reproduces
//! canonical input byte for byte.

use crate::module::{FunctionSpec, Module};
use crate::primitives::PrimitiveTable;
use basalt_core::{Instruction, ModuleLoadError, MODULE_MAGIC};
use bitflags::bitflags;

const SECTION_FUNCTIONS: u32 = 1;
const SECTION_STRINGS: u32 = 2;

bitflags! {
    /// Sections already parsed, for duplicate rejection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct SectionsSeen: u32 {
        const FUNCTIONS = 1 << 0;
        const STRINGS = 1 << 1;
    }
}

// =============================================================================
// Reader
// =============================================================================

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Reader<'a> {
        Reader { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ModuleLoadError> {
        if self.pos + n > self.bytes.len() {
            return Err(ModuleLoadError::Truncated { offset: self.pos, needed: n });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, ModuleLoadError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parse a binary module and bind the host's primitive table.
pub fn load_module(bytes: &[u8], primitives: &PrimitiveTable) -> Result<Module, ModuleLoadError> {
    let mut reader = Reader::new(bytes);

    if reader.take(MODULE_MAGIC.len()).map_err(|_| ModuleLoadError::BadMagic)? != MODULE_MAGIC {
        return Err(ModuleLoadError::BadMagic);
    }

    let mut seen = SectionsSeen::empty();
    let mut functions: Vec<FunctionSpec> = Vec::new();
    let mut strings: Vec<String> = Vec::new();

    while !reader.at_end() {
        let code = reader.read_u32()?;
        match code {
            SECTION_FUNCTIONS => {
                if seen.contains(SectionsSeen::FUNCTIONS) {
                    return Err(ModuleLoadError::DuplicateSection(code));
                }
                seen |= SectionsSeen::FUNCTIONS;
                functions = read_function_section(&mut reader)?;
            }
            SECTION_STRINGS => {
                if seen.contains(SectionsSeen::STRINGS) {
                    return Err(ModuleLoadError::DuplicateSection(code));
                }
                seen |= SectionsSeen::STRINGS;
                strings = read_string_section(&mut reader)?;
            }
            other => return Err(ModuleLoadError::UnknownSection(other)),
        }
    }

    Module::new(functions, strings, primitives.bindings().to_vec())
}

fn read_function_section(reader: &mut Reader<'_>) -> Result<Vec<FunctionSpec>, ModuleLoadError> {
    let count = reader.read_u32()?;
    let mut functions = Vec::with_capacity(count as usize);

    for position in 0..count {
        let name_len = reader.read_u32()? as usize;
        let name_bytes = reader.take(name_len)?;
        let name = std::str::from_utf8(name_bytes)
            .map_err(|_| ModuleLoadError::InvalidUtf8 { index: position })?
            .to_string();

        let stored = reader.read_u32()?;
        if stored != position {
            return Err(ModuleLoadError::IndexMismatch { function: name, stored, position });
        }

        let nargs = reader.read_u32()?;
        let nregs = reader.read_u32()?;

        let mut bytecode = Vec::new();
        loop {
            let instruction = Instruction::from_raw(reader.read_u32()?);
            if instruction.opcode().is_none() {
                return Err(ModuleLoadError::UnknownOpcode {
                    function: name,
                    opcode: instruction.opcode_byte(),
                });
            }
            let done = instruction.is_end_section();
            bytecode.push(instruction);
            if done {
                break;
            }
        }

        functions.push(FunctionSpec::new(name, nargs, nregs, bytecode));
    }

    Ok(functions)
}

fn read_string_section(reader: &mut Reader<'_>) -> Result<Vec<String>, ModuleLoadError> {
    let count = reader.read_u32()?;
    let mut strings = Vec::with_capacity(count as usize);
    for index in 0..count {
        let len = reader.read_u32()? as usize;
        let bytes = reader.take(len)?;
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ModuleLoadError::InvalidUtf8 { index })?
            .to_string();
        strings.push(text);
    }
    Ok(strings)
}

// =============================================================================
// Writing
// =============================================================================

/// Serialize a module in the canonical section order.
pub fn serialize_module(module: &Module) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MODULE_MAGIC);

    out.extend_from_slice(&SECTION_FUNCTIONS.to_le_bytes());
    out.extend_from_slice(&(module.function_count() as u32).to_le_bytes());
    for (index, function) in module.functions().iter().enumerate() {
        out.extend_from_slice(&(function.name.len() as u32).to_le_bytes());
        out.extend_from_slice(function.name.as_bytes());
        out.extend_from_slice(&(index as u32).to_le_bytes());
        out.extend_from_slice(&function.nargs.to_le_bytes());
        out.extend_from_slice(&function.nregs.to_le_bytes());
        for instruction in &function.bytecode {
            out.extend_from_slice(&instruction.raw().to_le_bytes());
        }
    }

    out.extend_from_slice(&SECTION_STRINGS.to_le_bytes());
    out.extend_from_slice(&(module.strings().len() as u32).to_le_bytes());
    for string in module.strings() {
        out.extend_from_slice(&(string.len() as u32).to_le_bytes());
        out.extend_from_slice(string.as_bytes());
    }

    out
}

// =============================================================================
// Tests
// =============================================================================
