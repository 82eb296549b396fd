//! Token level parsing of mnemonics, operand tokens and constant
//! literals.
//!
//! An operand token is `<register><memory><address>[.bit]` for the
//! `I`/`Q`/`M` areas and `K<memory><literal>` for inline constants.
//! Constants accept decimal, `0x` prefixed hexadecimal and, for the
//! `R` width only, float literals. A bare `K<number>` is a byte
//! constant, the shorthand used for block indexes and prescalers.

use tinyvec::ArrayVec;

use crate::{
    definitions::instruction::MAX_OPERANDS,
    error::{CompileError, CompileErrorKind},
    opcode::Opcode,
    operand::{MemoryType, Operand, RegisterType},
};

use super::lexer::{Lexer, Token};

/// An operand as the compiler sees it: either a direct location or an
/// inline constant carrying its encoding ready bit pattern.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum OperandSpec {
    Location(Operand),
    Constant { memory: MemoryType, bits: u64 },
}

impl OperandSpec {
    /// The declared width, used by the semantic checks.
    pub fn memory(&self) -> MemoryType {
        match self {
            OperandSpec::Location(operand) => operand.memory,
            OperandSpec::Constant { memory, .. } => *memory,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, OperandSpec::Constant { .. })
    }
}

impl Default for OperandSpec {
    fn default() -> Self {
        OperandSpec::Location(Operand::default())
    }
}

pub type OperandSpecs = ArrayVec<[OperandSpec; MAX_OPERANDS]>;

/// One parsed source instruction with the line it started on.
#[derive(Debug, PartialEq, Clone)]
pub struct Statement {
    pub line: usize,
    pub opcode: Opcode,
    pub operands: OperandSpecs,
}

/// Will run the token stream down to a statement list.
pub fn parse(source: &str) -> Result<Vec<Statement>, CompileError> {
    let mut lexer = Lexer::new(source);
    let mut statements = Vec::new();

    while let Some(token) = lexer.next_token() {
        let opcode = Opcode::from_mnemonic(token.text).ok_or_else(|| {
            CompileError::new(
                token.line,
                CompileErrorKind::UnknownMnemonic(token.text.to_string()),
            )
        })?;

        let mut operands = OperandSpecs::new();
        for _ in 0..opcode.num_operands() {
            let operand_token = lexer.next_token().ok_or_else(|| {
                CompileError::new(
                    token.line,
                    CompileErrorKind::MissingOperand(opcode.mnemonic()),
                )
            })?;
            operands.push(parse_operand(operand_token)?);
        }

        statements.push(Statement {
            line: token.line,
            opcode,
            operands,
        });
    }

    Ok(statements)
}

fn parse_operand(token: Token) -> Result<OperandSpec, CompileError> {
    let err = |kind| CompileError::new(token.line, kind);
    let bytes = token.text.as_bytes();

    let register = match bytes.first() {
        Some(b'I') => RegisterType::I,
        Some(b'Q') => RegisterType::Q,
        Some(b'M') => RegisterType::M,
        Some(b'K') => RegisterType::K,
        Some(&other) => {
            return Err(err(CompileErrorKind::InvalidRegisterType(other as char)))
        }
        None => return Err(err(CompileErrorKind::InvalidOperand(String::new()))),
    };

    if register == RegisterType::K {
        return parse_constant(token);
    }

    let memory = match bytes.get(1) {
        Some(b'X') => MemoryType::X,
        Some(b'B') => MemoryType::B,
        Some(b'W') => MemoryType::W,
        Some(b'D') => MemoryType::D,
        Some(b'L') => MemoryType::L,
        Some(b'R') => MemoryType::R,
        Some(&other) => return Err(err(CompileErrorKind::InvalidMemoryType(other as char))),
        None => return Err(err(CompileErrorKind::InvalidOperand(token.text.to_string()))),
    };

    let rest = &token.text[2..];
    let (address_text, bit_text) = match rest.find('.') {
        Some(dot) => (&rest[..dot], Some(&rest[dot + 1..])),
        None => (rest, None),
    };

    let address: u16 = address_text
        .parse()
        .map_err(|_| err(CompileErrorKind::InvalidNumber(token.text.to_string())))?;

    let bit = match (memory, bit_text) {
        (MemoryType::X, Some(bit_text)) => {
            let bit: u16 = bit_text
                .parse()
                .map_err(|_| err(CompileErrorKind::InvalidNumber(token.text.to_string())))?;
            if bit > 7 {
                return Err(err(CompileErrorKind::InvalidBitNumber(bit)));
            }
            bit as u8
        }
        // a bit site needs its bit, everything else refuses one
        (MemoryType::X, None) => {
            return Err(err(CompileErrorKind::InvalidOperand(token.text.to_string())))
        }
        (_, Some(_)) => {
            return Err(err(CompileErrorKind::InvalidOperand(token.text.to_string())))
        }
        (_, None) => 0,
    };

    Ok(OperandSpec::Location(Operand {
        memory,
        register,
        bit,
        address,
    }))
}

fn parse_constant(token: Token) -> Result<OperandSpec, CompileError> {
    let err = |kind| CompileError::new(token.line, kind);
    let bytes = token.text.as_bytes();

    // the width letter is optional, bare K constants are bytes
    let (memory, literal) = match bytes.get(1) {
        Some(b'X') => (MemoryType::X, &token.text[2..]),
        Some(b'B') => (MemoryType::B, &token.text[2..]),
        Some(b'W') => (MemoryType::W, &token.text[2..]),
        Some(b'D') => (MemoryType::D, &token.text[2..]),
        Some(b'L') => (MemoryType::L, &token.text[2..]),
        Some(b'R') => (MemoryType::R, &token.text[2..]),
        Some(byte) if byte.is_ascii_digit() || *byte == b'-' => {
            (MemoryType::B, &token.text[1..])
        }
        Some(&other) => return Err(err(CompileErrorKind::InvalidMemoryType(other as char))),
        None => return Err(err(CompileErrorKind::InvalidOperand(token.text.to_string()))),
    };

    let bits = parse_literal(literal, memory, token)?;
    Ok(OperandSpec::Constant { memory, bits })
}

/// Parses a constant literal into the raw bit pattern the encoder
/// truncates to the declared width.
fn parse_literal(literal: &str, memory: MemoryType, token: Token) -> Result<u64, CompileError> {
    let err = |kind| CompileError::new(token.line, kind);
    let invalid = || err(CompileErrorKind::InvalidNumber(token.text.to_string()));

    if memory == MemoryType::R {
        let value: f32 = literal.parse().map_err(|_| invalid())?;
        return Ok(value.to_bits() as u64);
    }

    if literal.contains('.') {
        return Err(err(CompileErrorKind::FloatWidth));
    }

    if let Some(hex) = literal.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16).map_err(|_| invalid());
    }
    if let Some(negative) = literal.strip_prefix('-') {
        let value: i64 = negative.parse().map(|v: i64| -v).map_err(|_| invalid())?;
        return Ok(value as u64);
    }
    literal.parse().map_err(|_| invalid())
}
