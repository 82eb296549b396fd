use thiserror::Error;

use crate::operand::RegisterType;

/// Everything that can stop a running scan cycle.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ProcessError {
    #[error("Invalid instruction '{0}'.")]
    Decode(#[from] DecodeError),
    #[error("Invalid stack state '{0}'.")]
    Stack(#[from] StackError),
    #[error("Division by zero at program offset {offset}.")]
    DivisionByZero { offset: usize },
    #[error("Modulo is not defined for float operands (program offset {offset}).")]
    FloatModulo { offset: usize },
    #[error("Operand address {address} is out of range for the {register} area.")]
    AddressOutOfRange {
        register: RegisterType,
        address: u16,
    },
    #[error("{block} index {index} is out of range.")]
    BlockIndex { block: &'static str, index: i64 },
    #[error("There is no valid program loaded.")]
    Uninitialized,
}

/// Raised while reading an instruction out of the program image.
#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum DecodeError {
    #[error("An unsupported opcode was used {0:#04X?}.")]
    InvalidOpcode(u8),
    #[error("An unsupported memory type was used {0:#05b}.")]
    InvalidMemoryType(u8),
    #[error("Pointer location invalid there can not be an instruction at {pointer}, if data len is {len}")]
    MemoryInvalid { pointer: usize, len: usize },
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Full,
    #[error("Stack is empty!")]
    Empty,
}

/// Raised by the loader before any instruction is looked at.
#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum VerifyError {
    #[error("Program header is missing, got {0} bytes.")]
    MissingHeader(usize),
    #[error("Declared program size {0} is below the header size.")]
    HeaderRange(usize),
    #[error("Declared program size {declared} does not fit the {actual} bytes provided.")]
    Truncated { declared: usize, actual: usize },
    #[error("Checksum mismatch, expected {expected:#010X} but calculated {calculated:#010X}.")]
    Checksum { expected: u32, calculated: u32 },
}

/// A fatal compilation failure together with the source line it
/// was detected on.
#[derive(Error, Debug, PartialEq, Clone)]
#[error("line {line}: {kind}")]
pub struct CompileError {
    pub line: usize,
    pub kind: CompileErrorKind,
}

impl CompileError {
    pub(crate) fn new(line: usize, kind: CompileErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Error, Debug, PartialEq, Clone)]
pub enum CompileErrorKind {
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),
    #[error("missing operand for '{0}'")]
    MissingOperand(&'static str),
    #[error("invalid operand '{0}'")]
    InvalidOperand(String),
    #[error("invalid register type '{0}'")]
    InvalidRegisterType(char),
    #[error("invalid memory type '{0}'")]
    InvalidMemoryType(char),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("invalid bit number {0}")]
    InvalidBitNumber(u16),
    #[error("invalid {register} address {address}")]
    AddressOutOfRange { register: char, address: u16 },
    #[error("float literals require a KR constant")]
    FloatWidth,
    #[error("constants can not be written to")]
    ConstantDestination,
    #[error("store is only defined for bit destinations")]
    StoreWidth,
    #[error("modulo is not defined for float operands")]
    FloatModulo,
    #[error("{block} index {index} is out of range")]
    BlockIndex { block: &'static str, index: u64 },
    #[error("program does not fit the 16 bit size header")]
    ProgramTooLarge,
}

/// A non fatal finding; compilation continues and the binary is
/// still emitted.
#[derive(Debug, PartialEq, Clone)]
pub struct Warning {
    pub line: usize,
    pub kind: WarningKind,
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum WarningKind {
    #[error("operands with different memory types")]
    WidthMismatch,
    #[error("inputs can not be written to, the write will be dropped")]
    InputDestination,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}
