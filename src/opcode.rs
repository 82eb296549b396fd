//! Opcode abstractions, functionality and constants.
//!
//! The numeric opcode values are part of the wire format and stable
//! across versions; the operand count of every instruction is a fixed
//! property of its opcode.

use std::convert::TryFrom;

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use tinyvec::ArrayVec;

use crate::{
    definitions::instruction::MAX_OPERANDS,
    error::DecodeError,
    operand::{MemoryType, Operand, RegisterType},
};

/// implTryFrom is a macro responsible for creating the boilerplate code
/// needed for the numeric opcode conversion.
macro_rules! implTryFrom {
    ($type_name:ty : $type_from:ty : $( $key:literal => $val:expr ),+ $(,)? ) => {
        impl TryFrom<$type_from> for $type_name {
            type Error = DecodeError;

            fn try_from(value: $type_from) -> Result<Self, Self::Error> {
                match value {
                    $(
                        $key => Ok($val),
                    )+
                    _ => Err(DecodeError::InvalidOpcode(value)),
                }
            }
        }
    };
}

/// The instruction set of the machine.
///
/// Opening variants of the logic combinators (`AND(` and friends)
/// suspend their combinator on the nesting stack until the matching
/// [`Close`](Opcode::Close) re-applies it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum Opcode {
    Ld = 0,
    Ldn = 1,
    St = 2,
    Stn = 3,
    S = 4,
    R = 5,
    Mov = 6,
    And = 7,
    AndOpen = 8,
    Andn = 9,
    AndnOpen = 10,
    Or = 11,
    OrOpen = 12,
    Orn = 13,
    OrnOpen = 14,
    Xor = 15,
    XorOpen = 16,
    Xorn = 17,
    XornOpen = 18,
    Not = 19,
    Add = 20,
    Sub = 21,
    Mul = 22,
    Div = 23,
    Mod = 24,
    Gt = 25,
    Ge = 26,
    Eq = 27,
    Ne = 28,
    Lt = 29,
    Le = 30,
    Ctu = 31,
    Ctd = 32,
    Ton = 33,
    Tof = 34,
    Close = 35,
    Tp = 36,
    RTrigger = 37,
    FTrigger = 38,
}

implTryFrom!(Opcode : u8 :
    0 => Opcode::Ld,
    1 => Opcode::Ldn,
    2 => Opcode::St,
    3 => Opcode::Stn,
    4 => Opcode::S,
    5 => Opcode::R,
    6 => Opcode::Mov,
    7 => Opcode::And,
    8 => Opcode::AndOpen,
    9 => Opcode::Andn,
    10 => Opcode::AndnOpen,
    11 => Opcode::Or,
    12 => Opcode::OrOpen,
    13 => Opcode::Orn,
    14 => Opcode::OrnOpen,
    15 => Opcode::Xor,
    16 => Opcode::XorOpen,
    17 => Opcode::Xorn,
    18 => Opcode::XornOpen,
    19 => Opcode::Not,
    20 => Opcode::Add,
    21 => Opcode::Sub,
    22 => Opcode::Mul,
    23 => Opcode::Div,
    24 => Opcode::Mod,
    25 => Opcode::Gt,
    26 => Opcode::Ge,
    27 => Opcode::Eq,
    28 => Opcode::Ne,
    29 => Opcode::Lt,
    30 => Opcode::Le,
    31 => Opcode::Ctu,
    32 => Opcode::Ctd,
    33 => Opcode::Ton,
    34 => Opcode::Tof,
    35 => Opcode::Close,
    36 => Opcode::Tp,
    37 => Opcode::RTrigger,
    38 => Opcode::FTrigger,
);

/// Every opcode of the set in numeric order.
pub const ALL: [Opcode; 39] = [
    Opcode::Ld,
    Opcode::Ldn,
    Opcode::St,
    Opcode::Stn,
    Opcode::S,
    Opcode::R,
    Opcode::Mov,
    Opcode::And,
    Opcode::AndOpen,
    Opcode::Andn,
    Opcode::AndnOpen,
    Opcode::Or,
    Opcode::OrOpen,
    Opcode::Orn,
    Opcode::OrnOpen,
    Opcode::Xor,
    Opcode::XorOpen,
    Opcode::Xorn,
    Opcode::XornOpen,
    Opcode::Not,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Gt,
    Opcode::Ge,
    Opcode::Eq,
    Opcode::Ne,
    Opcode::Lt,
    Opcode::Le,
    Opcode::Ctu,
    Opcode::Ctd,
    Opcode::Ton,
    Opcode::Tof,
    Opcode::Close,
    Opcode::Tp,
    Opcode::RTrigger,
    Opcode::FTrigger,
];

/// Lazily built lookup from mnemonic text to opcode.
static MNEMONICS: Lazy<HashMap<&'static str, Opcode>> =
    Lazy::new(|| ALL.iter().map(|op| (op.mnemonic(), *op)).collect());

impl Opcode {
    /// The operand count of the instruction, fixed per opcode.
    pub fn num_operands(self) -> usize {
        use Opcode::*;
        match self {
            Not | Close => 0,
            Ld | Ldn | St | Stn | S | R => 1,
            And | AndOpen | Andn | AndnOpen => 1,
            Or | OrOpen | Orn | OrnOpen => 1,
            Xor | XorOpen | Xorn | XornOpen => 1,
            Mov | Gt | Ge | Eq | Ne | Lt | Le => 2,
            Add | Sub | Mul | Div | Mod => 3,
            RTrigger | FTrigger => 3,
            Ctu | Ctd | Ton | Tof | Tp => 6,
        }
    }

    /// The textual source form of the instruction.
    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Ld => "LD",
            Ldn => "LDN",
            St => "ST",
            Stn => "STN",
            S => "S",
            R => "R",
            Mov => "MOV",
            And => "AND",
            AndOpen => "AND(",
            Andn => "ANDN",
            AndnOpen => "ANDN(",
            Or => "OR",
            OrOpen => "OR(",
            Orn => "ORN",
            OrnOpen => "ORN(",
            Xor => "XOR",
            XorOpen => "XOR(",
            Xorn => "XORN",
            XornOpen => "XORN(",
            Not => "NOT",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Gt => "GT",
            Ge => "GE",
            Eq => "EQ",
            Ne => "NE",
            Lt => "LT",
            Le => "LE",
            Ctu => "CTU",
            Ctd => "CTD",
            Ton => "TON",
            Tof => "TOF",
            Close => ")",
            Tp => "TP",
            RTrigger => "R_TRIGGER",
            FTrigger => "F_TRIGGER",
        }
    }

    /// Will look an opcode up by its textual source form.
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        MNEMONICS.get(text).copied()
    }

    /// The combinator a group opening opcode suspends on the nesting
    /// stack, `None` for every other opcode.
    pub fn deferred(self) -> Option<Opcode> {
        use Opcode::*;
        match self {
            AndOpen => Some(And),
            AndnOpen => Some(Andn),
            OrOpen => Some(Or),
            OrnOpen => Some(Orn),
            XorOpen => Some(Xor),
            XornOpen => Some(Xorn),
            _ => None,
        }
    }
}

/// The operand list of a single instruction. The capacity covers the
/// widest instructions of the set, no instruction allocates.
pub type Operands = ArrayVec<[Operand; MAX_OPERANDS]>;

/// A decoded instruction as the executor consumes it.
#[derive(Debug, PartialEq, Clone)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Operands,
}

/// Reads one instruction at `position` out of the program image.
///
/// Returns the decoded instruction together with the position of the
/// next one, which is always `position + 1` plus the encoded size of
/// every operand.
///
/// # Example
/// ```rust
/// # use plc::opcode::{read_instruction, Opcode};
/// // LD IX0.0 followed by NOT
/// let program = [0x00, 0b000_00_000, 0x00, 0x00, 0x13];
/// let (instruction, next) = read_instruction(&program, 0).expect("This will work.");
/// assert_eq!(instruction.opcode, Opcode::Ld);
/// assert_eq!(next, 4);
/// let (instruction, next) = read_instruction(&program, next).expect("This will work.");
/// assert_eq!(instruction.opcode, Opcode::Not);
/// assert_eq!(next, 5);
/// ```
pub fn read_instruction(
    buffer: &[u8],
    position: usize,
) -> Result<(Instruction, usize), DecodeError> {
    let invalid = |pointer| DecodeError::MemoryInvalid {
        pointer,
        len: buffer.len(),
    };

    let mut pos = position;
    let raw = *buffer.get(pos).ok_or_else(|| invalid(pos))?;
    let opcode = Opcode::try_from(raw)?;
    pos += 1;

    let mut operands = Operands::new();
    for _ in 0..opcode.num_operands() {
        let type_byte = *buffer.get(pos).ok_or_else(|| invalid(pos))?;
        let memory = MemoryType::from_bits(type_byte >> 5)?;
        let register = RegisterType::from_bits(type_byte >> 3);
        let bit = type_byte & 0x07;
        pos += 1;

        let address = if register != RegisterType::K {
            if pos + 2 > buffer.len() {
                return Err(invalid(pos));
            }
            let address = u16::from_be_bytes([buffer[pos], buffer[pos + 1]]);
            pos += 2;
            address
        } else {
            // constants stay inside the program image, the operand
            // keeps the offset of the immediate
            let at = pos;
            pos += memory.immediate_size();
            if pos > buffer.len() {
                return Err(invalid(at));
            }
            at as u16
        };

        operands.push(Operand {
            memory,
            register,
            bit,
            address,
        });
    }

    Ok((Instruction { opcode, operands }, pos))
}
