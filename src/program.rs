//! The framed binary artifact and its verifier.
//!
//! A compiled program is a contiguous byte stream: a 16 bit big endian
//! size (header plus instruction body), the instruction body, and a
//! trailing 32 bit big endian checksum over everything before it.

use crate::{definitions::program as definitions, error::VerifyError};

/// Represents a verified program with its information.
///
/// The raw bytes are immutable after load; decoded constants alias
/// them for as long as the program lives.
#[derive(Clone)]
pub struct Program {
    /// The program name
    name: String,
    /// The verified raw artifact, size header, body and checksum
    data: Box<[u8]>,
}

impl Program {
    /// Will run the verifier and take ownership of the raw artifact.
    pub fn new(name: &str, data: Vec<u8>) -> Result<Self, VerifyError> {
        verify(&data)?;
        Ok(Self {
            name: name.to_string(),
            data: data.into_boxed_slice(),
        })
    }

    /// Will return the name of the program.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared size: header plus instruction body, checksum
    /// excluded.
    pub fn size(&self) -> usize {
        declared_size(&self.data)
    }

    /// The program image the machine executes against: header and
    /// body, without the trailing checksum.
    pub fn image(&self) -> &[u8] {
        &self.data[..self.size()]
    }

    /// The full raw artifact including the checksum.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Reads the declared program size out of the header.
pub fn declared_size(buffer: &[u8]) -> usize {
    u16::from_be_bytes([buffer[0], buffer[1]]) as usize
}

/// The unsigned byte sum modulo 2^32 the framing appends.
pub fn checksum(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |sum, &byte| sum.wrapping_add(byte as u32))
}

/// Runs the integrity checks of the loader: header present, declared
/// size plausible, every byte of body and checksum present, checksum
/// matching.
pub fn verify(buffer: &[u8]) -> Result<(), VerifyError> {
    if buffer.len() < definitions::HEADER_SIZE {
        return Err(VerifyError::MissingHeader(buffer.len()));
    }

    let size = declared_size(buffer);
    if size < definitions::HEADER_SIZE {
        return Err(VerifyError::HeaderRange(size));
    }
    if buffer.len() < size + definitions::CHECKSUM_SIZE {
        return Err(VerifyError::Truncated {
            declared: size,
            actual: buffer.len(),
        });
    }

    let calculated = checksum(&buffer[..size]);
    let expected = u32::from_be_bytes([
        buffer[size],
        buffer[size + 1],
        buffer[size + 2],
        buffer[size + 3],
    ]);
    if calculated != expected {
        return Err(VerifyError::Checksum {
            expected,
            calculated,
        });
    }

    Ok(())
}
