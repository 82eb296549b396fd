/// The definitions

/// The process image definitions.
pub mod image {
    /// The number of input bytes available to a program.
    pub const INPUT_SIZE: usize = 10;
    /// The number of output bytes available to a program.
    pub const OUTPUT_SIZE: usize = 10;
    /// The size of the retentive memory area in bytes.
    pub const MEMORY_SIZE: usize = 10;
}

/// The framed binary program definitions.
pub mod program {
    /// The length of the size header (a big endian `u16`).
    pub const HEADER_SIZE: usize = 2;
    /// The length of the trailing checksum (a big endian `u32`).
    pub const CHECKSUM_SIZE: usize = 4;
}

/// The definitions needed for the instruction set.
pub mod instruction {
    /// The widest instructions of the set are the timer and
    /// counter function blocks.
    pub const MAX_OPERANDS: usize = 6;
}

/// The nesting stack definitions.
pub mod stack {
    /// The count of nesting entries
    pub const SIZE: usize = 16;
}

/// The function block instance limits.
pub mod blocks {
    /// Maximum timers available
    pub const MAX_TIMERS: usize = 10;
    /// Maximum counters available
    pub const MAX_COUNTERS: usize = 10;
    /// Maximum triggers available
    pub const MAX_TRIGGERS: usize = 10;
}
