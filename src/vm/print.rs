//! The pretty print implementation written for the [`machine`](super::Vm)
//! and the loaded program: a memory panel, a disassembler and a hex
//! dump of the framed binary.

use std::fmt::{self, Write as _};

use super::Vm;
use crate::{
    definitions::program as framing,
    error::DecodeError,
    memory,
    opcode::{read_instruction, Instruction},
    operand::{MemoryType, RegisterType},
    program::Program,
};

/// Will append one tab separated area row to the panel.
fn area_row(out: &mut String, label: &str, area: &[u8]) -> fmt::Result {
    out.push_str(label);
    for value in area {
        write!(out, "\t{}", value)?;
    }
    out.push('\n');
    Ok(())
}

impl fmt::Display for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut panel = String::new();

        // index ruler over the widest area
        let columns = self
            .inputs()
            .len()
            .max(self.outputs().len())
            .max(self.memories().len());
        for index in 0..columns {
            write!(panel, "\t{}", index)?;
        }
        panel.push('\n');

        area_row(&mut panel, "I:", self.inputs())?;
        area_row(&mut panel, "M:", self.memories())?;
        area_row(&mut panel, "Q:", self.outputs())?;
        write!(panel, "Accumulator = {}", self.accumulator() as u8)?;

        write!(f, "{}", panel)
    }
}

/// Renders one decoded instruction back to its source form, reading
/// constant operands out of the program image.
fn format_instruction(out: &mut String, instruction: &Instruction, image: &[u8]) {
    out.push_str(instruction.opcode.mnemonic());

    for operand in instruction.operands.iter() {
        out.push(' ');
        if operand.register != RegisterType::K {
            let _ = write!(out, "{}", operand);
            continue;
        }

        let at = operand.address as usize;
        let _ = match operand.memory {
            MemoryType::X => write!(out, "KX{}", (image[at] != 0) as u8),
            MemoryType::B => write!(out, "KB{}", image[at]),
            MemoryType::W => write!(out, "KW{}", memory::get_word(image, at)),
            MemoryType::D => write!(out, "KD{}", memory::get_dword(image, at)),
            MemoryType::L => write!(out, "KL{}", memory::get_qword(image, at)),
            MemoryType::R => write!(out, "KR{}", memory::get_float(image, at)),
        };
    }
}

/// Will decode the whole program body and render one instruction per
/// line, the inverse of what the compiler consumed.
pub fn disassemble(program: &Program) -> Result<String, DecodeError> {
    let image = program.image();
    let mut listing = String::new();

    let mut position = framing::HEADER_SIZE;
    while position < image.len() {
        let (instruction, next) = read_instruction(image, position)?;
        format_instruction(&mut listing, &instruction, image);
        listing.push('\n');
        position = next;
    }

    // drop the trailing newline for symmetric round trips
    if listing.ends_with('\n') {
        listing.truncate(listing.len() - 1);
    }
    Ok(listing)
}

/// Renders the raw artifact the way the reference tooling dumps it.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 5 + 2);
    out.push('{');
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        let _ = write!(out, "{:#04X}", byte);
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler;

    const SOURCE: &str = "\
LD IX0.0
AND( IX0.3
OR IX0.4
)
MOV KW21 MW2
ST QX0.0";

    fn program() -> Program {
        let output = compiler::compile(SOURCE).unwrap();
        Program::new("print", output.binary).unwrap()
    }

    #[test]
    /// the disassembly matches the compiled source line for line
    fn test_disassemble_round_trip() {
        let listing = disassemble(&program()).unwrap();
        assert_eq!(listing, SOURCE);
    }

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[0x00, 0x1F, 0xFF]), "{0x00,0x1F,0xFF}");
    }

    #[test]
    fn test_memory_panel() {
        let mut vm = Vm::new(program());
        vm.set_inputs(&[0b0001_1001]);
        vm.scan().unwrap();

        let panel = format!("{}", vm);
        let mut lines = panel.lines();
        assert_eq!(
            lines.next(),
            Some("\t0\t1\t2\t3\t4\t5\t6\t7\t8\t9")
        );
        assert_eq!(lines.next(), Some("I:\t25\t0\t0\t0\t0\t0\t0\t0\t0\t0"));
        // MOV wrote 21 into the word at MW2
        assert_eq!(lines.next(), Some("M:\t0\t0\t0\t21\t0\t0\t0\t0\t0\t0"));
        assert_eq!(lines.next(), Some("Q:\t1\t0\t0\t0\t0\t0\t0\t0\t0\t0"));
        assert_eq!(lines.next(), Some("Accumulator = 1"));
    }
}
