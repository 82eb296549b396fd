//! The machine state and the scan loop.

use hashbrown::HashMap;

use crate::{
    counter::Counter,
    definitions::{blocks, program as framing},
    error::{DecodeError, ProcessError},
    memory::Image,
    opcode::{self, Instruction},
    program::Program,
    stack::ParenStack,
    timer::{Ticks, Timer},
    trigger::Trigger,
};

/// The Vm struct represents the complete state of one loaded program:
/// the process image, the function block instances, the nesting stack
/// and the decode cache.
///
/// Everything is created zeroed when a program is loaded and reused
/// for every scan cycle; only the function blocks and the image
/// persist across scans, accumulator and stack are reset at every
/// scan start.
pub struct Vm {
    /// the loaded, verified program; immutable for the life of the machine
    program: Program,
    /// the process image the instructions work against
    pub(super) image: Image,
    /// Contains the precalculated instruction data, keyed by program
    /// offset. A scan decodes every site exactly once.
    cache: HashMap<usize, (Instruction, usize)>,
    pub(super) timers: [Timer; blocks::MAX_TIMERS],
    pub(super) counters: [Counter; blocks::MAX_COUNTERS],
    pub(super) triggers: [Trigger; blocks::MAX_TRIGGERS],
    pub(super) stack: ParenStack,
    /// the shared monotonic tick source driving the timers
    pub(super) ticks: Ticks,
    /// offset of the next instruction for single stepping
    position: usize,
}

impl Vm {
    /// Creates a new machine around a verified program.
    pub fn new(program: Program) -> Self {
        Self {
            program,
            image: Image::new(),
            cache: HashMap::new(),
            timers: [Timer::default(); blocks::MAX_TIMERS],
            counters: [Counter::default(); blocks::MAX_COUNTERS],
            triggers: [Trigger::default(); blocks::MAX_TRIGGERS],
            stack: ParenStack::new(),
            ticks: Ticks::new(),
            position: framing::HEADER_SIZE,
        }
    }

    /// Will verify the raw artifact and reveal a fresh machine.
    pub fn load(name: &str, data: Vec<u8>) -> Result<Self, crate::VerifyError> {
        let program = Program::new(name, data)?;
        Ok(Self::new(program))
    }

    /// Get a reference to the loaded program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Will copy the given bytes into the input area. To be called
    /// between scans only.
    pub fn set_inputs(&mut self, data: &[u8]) {
        self.image.set_inputs(data);
    }

    /// Will advance the tick counter by `n` quanta.
    pub fn tick(&self, n: u32) {
        self.ticks.advance(n);
    }

    /// Will return a clonable handle onto the tick counter, so the
    /// host may advance it from outside.
    pub fn ticks(&self) -> Ticks {
        self.ticks.clone()
    }

    /// Snapshot of the output area, to be read between scans.
    pub fn outputs(&self) -> &[u8] {
        self.image.outputs()
    }

    /// Snapshot of the memory area, to be read between scans.
    pub fn memories(&self) -> &[u8] {
        self.image.memories()
    }

    pub fn inputs(&self) -> &[u8] {
        self.image.inputs()
    }

    pub fn accumulator(&self) -> bool {
        self.image.accumulator()
    }

    /// Get a reference to the machine's image.
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Get a mutable reference to the machine's image.
    /// This function is only used in the context of tests as there
    /// never is a need to expose the internal image otherwise.
    #[cfg(test)]
    pub(super) fn image_mut(&mut self) -> &mut Image {
        &mut self.image
    }

    /// Will fetch the instruction at the given offset, decoding it at
    /// most once per machine.
    fn fetch(&mut self, position: usize) -> Result<(Instruction, usize), DecodeError> {
        let instruction = match self.cache.get(&position) {
            None => {
                let decoded = opcode::read_instruction(self.program.image(), position)?;
                self.cache.insert(position, decoded.clone());
                decoded
            }
            Some(value) => value.clone(),
        };

        Ok(instruction)
    }

    /// Executes the single instruction at `position` and returns the
    /// offset of the next one.
    fn step_at(&mut self, position: usize) -> Result<usize, ProcessError> {
        let (instruction, next) = self.fetch(position)?;
        log::trace!("{:5}: {}", position, instruction.opcode.mnemonic());
        self.execute(instruction, position)?;
        Ok(next)
    }

    /// Runs one full scan cycle: accumulator and nesting stack are
    /// reset, then the whole body executes front to back.
    ///
    /// On an error the cycle stops at the faulting instruction; all
    /// completed writes stay in the image.
    pub fn scan(&mut self) -> Result<(), ProcessError> {
        self.image.accumulator = false;
        self.stack.clear();
        self.position = framing::HEADER_SIZE;

        while self.position < self.program.size() {
            self.position = self.step_at(self.position)?;
        }
        Ok(())
    }

    /// Executes exactly one instruction of the current cycle and
    /// reports whether the cycle is over. A new cycle begins with the
    /// same reset a full [`scan`](Self::scan) performs.
    pub fn step(&mut self) -> Result<bool, ProcessError> {
        if self.position >= self.program.size() {
            self.image.accumulator = false;
            self.stack.clear();
            self.position = framing::HEADER_SIZE;
        }

        self.position = self.step_at(self.position)?;
        Ok(self.position >= self.program.size())
    }
}
