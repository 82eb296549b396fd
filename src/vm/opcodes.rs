//! The instruction implementation written for this [`machine`](super::Vm).
//! This implementation was split up into this file for smaller file sizes
//! and higher cohesion.

use num_traits::{CheckedDiv, CheckedRem, PrimInt, WrappingAdd, WrappingMul, WrappingSub};

use crate::{
    definitions::blocks,
    error::ProcessError,
    memory,
    opcode::{Instruction, Opcode, Operands},
    operand::{MemoryType, Operand},
    stack::Entry,
};

use super::Vm;

/// The arithmetic group, width dispatched over the destination.
#[derive(Debug, Clone, Copy)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// The comparison group, width dispatched over the right operand.
#[derive(Debug, Clone, Copy)]
enum CmpOp {
    Gt,
    Ge,
    Eq,
    Ne,
    Lt,
    Le,
}

/// Re-applies a suspended combinator: `saved` is the accumulator the
/// group opening closed over, `group` the result of the group body.
fn combine(opcode: Opcode, saved: bool, group: bool) -> bool {
    match opcode {
        Opcode::And => saved && group,
        Opcode::Andn => saved && !group,
        Opcode::Or => saved || group,
        Opcode::Orn => saved || !group,
        Opcode::Xor => saved ^ group,
        Opcode::Xorn => saved ^ !group,
        // only the six combinators above are ever suspended
        _ => group,
    }
}

/// The width generic integer combinator; all arithmetic wraps, a zero
/// divisor stops the scan.
fn eval_int<T>(op: ArithOp, a: T, b: T, offset: usize) -> Result<T, ProcessError>
where
    T: PrimInt + WrappingAdd + WrappingSub + WrappingMul + CheckedDiv + CheckedRem,
{
    let result = match op {
        ArithOp::Add => a.wrapping_add(&b),
        ArithOp::Sub => a.wrapping_sub(&b),
        ArithOp::Mul => a.wrapping_mul(&b),
        ArithOp::Div => {
            if b.is_zero() {
                return Err(ProcessError::DivisionByZero { offset });
            }
            // MIN / -1 wraps like the other operators do
            a.checked_div(&b).unwrap_or_else(T::min_value)
        }
        ArithOp::Mod => {
            if b.is_zero() {
                return Err(ProcessError::DivisionByZero { offset });
            }
            a.checked_rem(&b).unwrap_or_else(T::zero)
        }
    };
    Ok(result)
}

impl Vm {
    /// Single step dispatch over the opcode. `offset` is the program
    /// offset of the instruction, used for diagnostics only.
    pub(super) fn execute(
        &mut self,
        instruction: Instruction,
        offset: usize,
    ) -> Result<(), ProcessError> {
        use Opcode::*;

        let ops = instruction.operands;
        match instruction.opcode {
            Ld => {
                let value = self.read_bool(ops[0])?;
                self.image.accumulator = value;
            }
            Ldn => {
                let value = self.read_bool(ops[0])?;
                self.image.accumulator = !value;
            }
            St => {
                let value = self.image.accumulator;
                self.store_bit(ops[0], value)?;
            }
            Stn => {
                let value = !self.image.accumulator;
                self.store_bit(ops[0], value)?;
            }
            S => {
                if self.image.accumulator {
                    self.store_bit(ops[0], true)?;
                }
            }
            R => {
                if self.image.accumulator {
                    self.store_bit(ops[0], false)?;
                }
            }
            Mov => {
                if self.image.accumulator {
                    // the destination width decides how the source is read
                    let destination = ops[1];
                    if destination.memory == MemoryType::R {
                        let value = self.read_f32(ops[0])?;
                        self.write_f32(destination, value)?;
                    } else {
                        let value = self.read_int(ops[0])?;
                        self.write_int(destination, value)?;
                    }
                }
            }
            And => {
                let value = self.read_bool(ops[0])?;
                self.image.accumulator &= value;
            }
            Andn => {
                let value = self.read_bool(ops[0])?;
                self.image.accumulator &= !value;
            }
            Or => {
                let value = self.read_bool(ops[0])?;
                self.image.accumulator |= value;
            }
            Orn => {
                let value = self.read_bool(ops[0])?;
                self.image.accumulator |= !value;
            }
            Xor => {
                let value = self.read_bool(ops[0])?;
                self.image.accumulator ^= value;
            }
            Xorn => {
                let value = self.read_bool(ops[0])?;
                self.image.accumulator ^= !value;
            }
            Not => self.image.accumulator = !self.image.accumulator,
            AndOpen | AndnOpen | OrOpen | OrnOpen | XorOpen | XornOpen => {
                if let Some(deferred) = instruction.opcode.deferred() {
                    self.stack.push(Entry {
                        opcode: deferred,
                        accumulator: self.image.accumulator,
                    })?;
                    // the follow operand starts the group like a fresh LD
                    if let Some(&first) = ops.first() {
                        self.image.accumulator = self.read_bool(first)?;
                    }
                }
            }
            Close => {
                let entry = self.stack.pop()?;
                self.image.accumulator =
                    combine(entry.opcode, entry.accumulator, self.image.accumulator);
            }
            Add => self.arithmetic(ArithOp::Add, &ops, offset)?,
            Sub => self.arithmetic(ArithOp::Sub, &ops, offset)?,
            Mul => self.arithmetic(ArithOp::Mul, &ops, offset)?,
            Div => self.arithmetic(ArithOp::Div, &ops, offset)?,
            Mod => self.arithmetic(ArithOp::Mod, &ops, offset)?,
            Gt => self.compare(CmpOp::Gt, &ops)?,
            Ge => self.compare(CmpOp::Ge, &ops)?,
            Eq => self.compare(CmpOp::Eq, &ops)?,
            Ne => self.compare(CmpOp::Ne, &ops)?,
            Lt => self.compare(CmpOp::Lt, &ops)?,
            Le => self.compare(CmpOp::Le, &ops)?,
            Ctu | Ctd => self.run_counter(instruction.opcode, &ops)?,
            Ton | Tof | Tp => self.run_timer(instruction.opcode, &ops)?,
            RTrigger | FTrigger => self.run_trigger(instruction.opcode, &ops)?,
        }

        Ok(())
    }

    /// Checks the declared width of the operand against its area.
    fn check(&self, operand: Operand) -> Result<(), ProcessError> {
        if operand.in_range(&self.image, self.program().image()) {
            Ok(())
        } else {
            Err(ProcessError::AddressOutOfRange {
                register: operand.register,
                address: operand.address,
            })
        }
    }

    fn read_bool(&self, operand: Operand) -> Result<bool, ProcessError> {
        self.check(operand)?;
        Ok(operand.as_bool(&self.image, self.program().image()))
    }

    fn read_int(&self, operand: Operand) -> Result<i64, ProcessError> {
        self.check(operand)?;
        Ok(operand.as_i64(&self.image, self.program().image()))
    }

    fn read_f32(&self, operand: Operand) -> Result<f32, ProcessError> {
        self.check(operand)?;
        Ok(operand.as_f32(&self.image, self.program().image()))
    }

    /// Writes a bit to the operand. Stores address bit sites only,
    /// wider destinations make the write a no-op.
    fn store_bit(&mut self, operand: Operand, value: bool) -> Result<(), ProcessError> {
        if operand.memory != MemoryType::X {
            return Ok(());
        }
        self.check(operand)?;

        let address = operand.address as usize;
        let bit = operand.bit;
        if let Some(area) = operand.area_mut(&mut self.image) {
            memory::set_bit(area, address, bit, value);
        }
        Ok(())
    }

    /// Writes an integer truncated to the destination width. Bit
    /// destinations take the low bit, inputs and constants drop the
    /// write.
    fn write_int(&mut self, operand: Operand, value: i64) -> Result<(), ProcessError> {
        self.check(operand)?;

        let address = operand.address as usize;
        let bit = operand.bit;
        let width = operand.memory;
        let area = match operand.area_mut(&mut self.image) {
            Some(area) => area,
            None => return Ok(()),
        };
        match width {
            MemoryType::X => memory::set_bit(area, address, bit, value & 1 != 0),
            MemoryType::B => memory::set_byte(area, address, value as i8),
            MemoryType::W => memory::set_word(area, address, value as i16),
            MemoryType::D => memory::set_dword(area, address, value as i32),
            MemoryType::L => memory::set_qword(area, address, value),
            MemoryType::R => memory::set_float(area, address, value as f32),
        }
        Ok(())
    }

    fn write_f32(&mut self, operand: Operand, value: f32) -> Result<(), ProcessError> {
        match operand.memory {
            MemoryType::R => {
                self.check(operand)?;
                let address = operand.address as usize;
                if let Some(area) = operand.area_mut(&mut self.image) {
                    memory::set_float(area, address, value);
                }
                Ok(())
            }
            _ => self.write_int(operand, value as i64),
        }
    }

    /// Three operand arithmetic, computed in the width of the
    /// destination operand. Does nothing unless the accumulator is set.
    fn arithmetic(
        &mut self,
        op: ArithOp,
        ops: &Operands,
        offset: usize,
    ) -> Result<(), ProcessError> {
        if !self.image.accumulator {
            return Ok(());
        }

        let destination = ops[2];
        match destination.memory {
            MemoryType::R => {
                let a = self.read_f32(ops[0])?;
                let b = self.read_f32(ops[1])?;
                let result = match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    // IEEE division, a zero divisor yields an infinity
                    ArithOp::Div => a / b,
                    ArithOp::Mod => return Err(ProcessError::FloatModulo { offset }),
                };
                self.write_f32(destination, result)
            }
            MemoryType::B => {
                let a = self.read_int(ops[0])? as i8;
                let b = self.read_int(ops[1])? as i8;
                let result = eval_int(op, a, b, offset)?;
                self.write_int(destination, result as i64)
            }
            MemoryType::W => {
                let a = self.read_int(ops[0])? as i16;
                let b = self.read_int(ops[1])? as i16;
                let result = eval_int(op, a, b, offset)?;
                self.write_int(destination, result as i64)
            }
            MemoryType::D => {
                let a = self.read_int(ops[0])? as i32;
                let b = self.read_int(ops[1])? as i32;
                let result = eval_int(op, a, b, offset)?;
                self.write_int(destination, result as i64)
            }
            // bit destinations compute wide and keep the low bit
            MemoryType::X | MemoryType::L => {
                let a = self.read_int(ops[0])?;
                let b = self.read_int(ops[1])?;
                let result = eval_int(op, a, b, offset)?;
                self.write_int(destination, result)
            }
        }
    }

    /// Two operand comparison in the width of the right operand; float
    /// comparisons follow the IEEE ordering, so every ordered predicate
    /// on a NaN is false and `NE` is true.
    fn compare(&mut self, op: CmpOp, ops: &Operands) -> Result<(), ProcessError> {
        if !self.image.accumulator {
            return Ok(());
        }

        let result = if ops[1].memory == MemoryType::R {
            let a = self.read_f32(ops[0])?;
            let b = self.read_f32(ops[1])?;
            match op {
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
                CmpOp::Eq => a == b,
                CmpOp::Ne => a != b,
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
            }
        } else {
            let a = self.read_int(ops[0])?;
            let b = self.read_int(ops[1])?;
            match op {
                CmpOp::Gt => a > b,
                CmpOp::Ge => a >= b,
                CmpOp::Eq => a == b,
                CmpOp::Ne => a != b,
                CmpOp::Lt => a < b,
                CmpOp::Le => a <= b,
            }
        };

        self.image.accumulator = result;
        Ok(())
    }

    /// Resolves a function block index operand against its limit.
    fn block_index(
        &self,
        operand: Operand,
        limit: usize,
        block: &'static str,
    ) -> Result<usize, ProcessError> {
        let index = self.read_int(operand)?;
        if index < 0 || index as usize >= limit {
            return Err(ProcessError::BlockIndex { block, index });
        }
        Ok(index as usize)
    }

    /// Operands: index, IN, PT, prescaler, Q destination, ET slot.
    fn run_timer(&mut self, opcode: Opcode, ops: &Operands) -> Result<(), ProcessError> {
        let index = self.block_index(ops[0], blocks::MAX_TIMERS, "timer")?;
        let input = self.read_bool(ops[1])?;
        let preset = self.read_int(ops[2])? as u16;
        let prescaler = self.read_int(ops[3])? as u8;
        // the tick counter is observed exactly once per evaluation
        let ticks = self.ticks.get();

        let timer = &mut self.timers[index];
        timer.input = input;
        timer.preset = preset;
        timer.prescaler = prescaler.max(1);
        match opcode {
            Opcode::Ton => timer.run_ton(ticks),
            Opcode::Tof => timer.run_tof(ticks),
            _ => timer.run_tp(ticks),
        }
        let (output, elapsed) = (timer.output, timer.elapsed);

        self.store_bit(ops[4], output)?;
        self.write_int(ops[5], elapsed as i64)
    }

    /// Operands: index, CO, PV, R or LD, Q destination, CV slot.
    fn run_counter(&mut self, opcode: Opcode, ops: &Operands) -> Result<(), ProcessError> {
        let index = self.block_index(ops[0], blocks::MAX_COUNTERS, "counter")?;
        let clock = self.read_bool(ops[1])?;
        let preset = self.read_int(ops[2])? as u16;
        let reset_load = self.read_bool(ops[3])?;

        let counter = &mut self.counters[index];
        counter.clock = clock;
        counter.preset = preset;
        counter.reset_load = reset_load;
        match opcode {
            Opcode::Ctu => counter.run_up(),
            _ => counter.run_down(),
        }
        let (output, value) = (counter.output, counter.value);

        self.store_bit(ops[4], output)?;
        self.write_int(ops[5], value as i64)
    }

    /// Operands: index, CLK, Q destination.
    fn run_trigger(&mut self, opcode: Opcode, ops: &Operands) -> Result<(), ProcessError> {
        let index = self.block_index(ops[0], blocks::MAX_TRIGGERS, "trigger")?;
        let clock = self.read_bool(ops[1])?;

        let trigger = &mut self.triggers[index];
        trigger.clock = clock;
        match opcode {
            Opcode::RTrigger => trigger.run_rising(),
            _ => trigger.run_falling(),
        }
        let output = trigger.output;

        self.store_bit(ops[2], output)
    }
}
