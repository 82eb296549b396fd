//! The nesting stack holding logic combinators suspended by the group
//! opening instructions.

use tinyvec::ArrayVec;

use crate::{definitions::stack, error::StackError, opcode::Opcode};

/// A suspended combinator together with the accumulator value it
/// closed over.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Entry {
    pub opcode: Opcode,
    pub accumulator: bool,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            opcode: Opcode::And,
            accumulator: false,
        }
    }
}

/// A bounded LIFO of [`Entry`](Entry) values. Overflow and underflow
/// are fatal to the running scan.
#[derive(Debug, Clone, Default)]
pub struct ParenStack {
    entries: ArrayVec<[Entry; stack::SIZE]>,
}

impl ParenStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Will push the suspended combinator onto the stack.
    pub fn push(&mut self, entry: Entry) -> Result<(), StackError> {
        if self.is_full() {
            Err(StackError::Full)
        } else {
            self.entries.push(entry);
            Ok(())
        }
    }

    /// Will pop the most recently suspended combinator.
    pub fn pop(&mut self) -> Result<Entry, StackError> {
        self.entries.pop().ok_or(StackError::Empty)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.entries.capacity()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Will drop all entries, called at every scan start.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// testing internal functionality of popping and pushing into the stack
    fn test_push_pop_stack() {
        let mut stack = ParenStack::new();

        // check empty initial stack
        assert!(stack.is_empty());
        assert_eq!(Err(StackError::Empty), stack.pop());

        for i in 0..stack::SIZE {
            let entry = Entry {
                opcode: Opcode::Or,
                accumulator: i % 2 == 0,
            };
            assert_eq!(Ok(()), stack.push(entry));
        }
        assert!(stack.is_full());
        assert_eq!(stack::SIZE, stack.len());

        // check for the correct error on overflow
        let entry = Entry::default();
        assert_eq!(Err(StackError::Full), stack.push(entry));

        // pop the stack back down
        for i in (0..stack::SIZE).rev() {
            let entry = stack.pop().unwrap();
            assert_eq!(entry.opcode, Opcode::Or);
            assert_eq!(entry.accumulator, i % 2 == 0);
        }
        assert!(stack.is_empty());
        assert_eq!(Err(StackError::Empty), stack.pop());
    }

    #[test]
    fn test_clear() {
        let mut stack = ParenStack::new();
        stack.push(Entry::default()).unwrap();
        stack.push(Entry::default()).unwrap();
        stack.clear();
        assert!(stack.is_empty());
    }
}
