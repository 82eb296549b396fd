//! Binary emission: instruction encoding, size patching and the
//! trailing checksum.

use crate::{
    definitions::program as framing,
    error::{CompileError, CompileErrorKind},
    operand::{MemoryType, RegisterType},
    program,
};

use super::parse::{OperandSpec, Statement};

/// Will emit the framed artifact for a checked statement list: a
/// placeholder size, every instruction, the patched size and the
/// checksum.
pub(super) fn encode(statements: &[Statement]) -> Result<Vec<u8>, CompileError> {
    let mut buffer = vec![0u8; framing::HEADER_SIZE];

    for statement in statements {
        encode_statement(&mut buffer, statement);
        if buffer.len() > u16::MAX as usize {
            let line = statement.line;
            return Err(CompileError::new(line, CompileErrorKind::ProgramTooLarge));
        }
    }

    let size = buffer.len() as u16;
    buffer[..framing::HEADER_SIZE].copy_from_slice(&size.to_be_bytes());

    let checksum = program::checksum(&buffer);
    buffer.extend_from_slice(&checksum.to_be_bytes());
    Ok(buffer)
}

fn encode_statement(buffer: &mut Vec<u8>, statement: &Statement) {
    buffer.push(statement.opcode as u8);

    for operand in statement.operands.iter() {
        match operand {
            OperandSpec::Location(operand) => {
                buffer.push(operand.type_byte());
                buffer.extend_from_slice(&operand.address.to_be_bytes());
            }
            OperandSpec::Constant { memory, bits } => {
                let type_byte = (*memory as u8) << 5 | (RegisterType::K as u8) << 3;
                buffer.push(type_byte);
                // immediates are truncated to their declared width
                match memory {
                    MemoryType::X | MemoryType::B => buffer.push(*bits as u8),
                    MemoryType::W => buffer.extend_from_slice(&(*bits as u16).to_be_bytes()),
                    MemoryType::D | MemoryType::R => {
                        buffer.extend_from_slice(&(*bits as u32).to_be_bytes())
                    }
                    MemoryType::L => buffer.extend_from_slice(&bits.to_be_bytes()),
                }
            }
        }
    }
}
