//! The full implementation of the virtual machine, from the scan loop
//! to an option to pretty print its state.
mod machine;
mod opcodes;
mod print;

/// reexport machine structs and data for simpler usage
pub use machine::*;
pub use print::{disassemble, hex_dump};

/// split up tests into an other file for simpler implementation
#[cfg(test)]
mod tests;
