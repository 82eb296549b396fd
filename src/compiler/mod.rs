//! The instruction list compiler: lexing, parsing, semantic checks and
//! binary emission.
//!
//! Fatal findings stop the compilation with the offending source line;
//! width mismatches only warn and the binary is still emitted.

mod encode;
mod lexer;
mod parse;

pub use lexer::{Lexer, Token};
pub use parse::{OperandSpec, OperandSpecs, Statement};

use crate::{
    definitions::{blocks, image},
    error::{CompileError, CompileErrorKind, Warning, WarningKind},
    opcode::Opcode,
    operand::{MemoryType, Operand, RegisterType},
};

/// The result of a successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    /// the framed binary artifact, ready for the verifier
    pub binary: Vec<u8>,
    /// non fatal findings, in source order
    pub warnings: Vec<Warning>,
}

/// Will compile the given source text down to a framed binary.
pub fn compile(source: &str) -> Result<CompileOutput, CompileError> {
    let statements = parse::parse(source)?;

    let mut warnings = Vec::new();
    for statement in &statements {
        check(statement, &mut warnings)?;
    }
    for warning in &warnings {
        log::warn!("{}", warning);
    }

    let binary = encode::encode(&statements)?;
    Ok(CompileOutput { binary, warnings })
}

/// The operand positions an instruction writes to.
fn destinations(opcode: Opcode) -> &'static [usize] {
    use Opcode::*;
    match opcode {
        St | Stn | S | R => &[0],
        Mov => &[1],
        Add | Sub | Mul | Div | Mod => &[2],
        RTrigger | FTrigger => &[2],
        Ctu | Ctd | Ton | Tof | Tp => &[4, 5],
        _ => &[],
    }
}

/// The area size a location operand is bounded by.
fn area_size(register: RegisterType) -> usize {
    match register {
        RegisterType::I => image::INPUT_SIZE,
        RegisterType::Q => image::OUTPUT_SIZE,
        RegisterType::M => image::MEMORY_SIZE,
        // constants live in the program image itself
        RegisterType::K => usize::MAX,
    }
}

fn check_location(line: usize, operand: &Operand) -> Result<(), CompileError> {
    let address = operand.address as usize;
    // the full declared width has to fit, a word at the last byte
    // would already spill over
    if address + operand.memory.image_size() > area_size(operand.register) {
        return Err(CompileError::new(
            line,
            CompileErrorKind::AddressOutOfRange {
                register: operand.register.letter(),
                address: operand.address,
            },
        ));
    }
    Ok(())
}

/// Checks a function block index operand where it is a compile time
/// constant; anything else is re-checked at runtime.
fn check_block_index(statement: &Statement) -> Result<(), CompileError> {
    let (block, limit) = match statement.opcode {
        Opcode::Ton | Opcode::Tof | Opcode::Tp => ("timer", blocks::MAX_TIMERS),
        Opcode::Ctu | Opcode::Ctd => ("counter", blocks::MAX_COUNTERS),
        Opcode::RTrigger | Opcode::FTrigger => ("trigger", blocks::MAX_TRIGGERS),
        _ => return Ok(()),
    };

    if let Some(OperandSpec::Constant { bits, .. }) = statement.operands.first() {
        if *bits as usize >= limit {
            return Err(CompileError::new(
                statement.line,
                CompileErrorKind::BlockIndex {
                    block,
                    index: *bits,
                },
            ));
        }
    }
    Ok(())
}

/// The semantic pass over one statement.
fn check(statement: &Statement, warnings: &mut Vec<Warning>) -> Result<(), CompileError> {
    use Opcode::*;

    let line = statement.line;
    for operand in statement.operands.iter() {
        if let OperandSpec::Location(operand) = operand {
            check_location(line, operand)?;
        }
    }

    for &index in destinations(statement.opcode) {
        match &statement.operands[index] {
            OperandSpec::Constant { .. } => {
                return Err(CompileError::new(line, CompileErrorKind::ConstantDestination));
            }
            OperandSpec::Location(operand) if operand.register == RegisterType::I => {
                warnings.push(Warning {
                    line,
                    kind: WarningKind::InputDestination,
                });
            }
            OperandSpec::Location(_) => {}
        }
    }

    match statement.opcode {
        // stores are bit only, a wider destination is refused here
        St | Stn => {
            if statement.operands[0].memory() != MemoryType::X {
                return Err(CompileError::new(line, CompileErrorKind::StoreWidth));
            }
        }
        Mod => {
            if statement.operands.iter().any(|op| op.memory() == MemoryType::R) {
                return Err(CompileError::new(line, CompileErrorKind::FloatModulo));
            }
        }
        _ => {}
    }

    check_block_index(statement)?;

    // width agreement is advisory only
    let mismatch = match statement.opcode {
        Mov | Gt | Ge | Eq | Ne | Lt | Le => {
            statement.operands[0].memory() != statement.operands[1].memory()
        }
        Add | Sub | Mul | Div | Mod => {
            let widths: Vec<_> = statement.operands.iter().map(|op| op.memory()).collect();
            widths.windows(2).any(|pair| pair[0] != pair[1])
        }
        _ => false,
    };
    if mismatch {
        warnings.push(Warning {
            line,
            kind: WarningKind::WidthMismatch,
        });
    }

    Ok(())
}
