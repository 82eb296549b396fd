//! The edge trigger function blocks of the IEC 61131-3 standard
//! library.

/// A single trigger instance: one previous value register is all the
/// state edge detection needs.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct Trigger {
    pub clock: bool,
    memory: bool,
    pub output: bool,
}

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// R_TRIG: the output is high for exactly the evaluation whose
    /// clock just rose.
    pub fn run_rising(&mut self) {
        self.output = self.clock && !self.memory;
        self.memory = self.clock;
    }

    /// F_TRIG: the output is high for exactly the evaluation whose
    /// clock just fell.
    pub fn run_falling(&mut self) {
        self.output = !self.clock && !self.memory;
        self.memory = !self.clock;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_trigger_fires_once() {
        let mut trigger = Trigger::new();

        trigger.clock = true;
        trigger.run_rising();
        assert!(trigger.output);

        // held high, no further pulse
        trigger.run_rising();
        assert!(!trigger.output);

        trigger.clock = false;
        trigger.run_rising();
        assert!(!trigger.output);

        trigger.clock = true;
        trigger.run_rising();
        assert!(trigger.output);
    }

    #[test]
    fn test_falling_trigger_fires_once() {
        let mut trigger = Trigger::new();

        trigger.clock = true;
        trigger.run_falling();
        assert!(!trigger.output);

        trigger.clock = false;
        trigger.run_falling();
        assert!(trigger.output);

        // held low, no further pulse
        trigger.run_falling();
        assert!(!trigger.output);
    }
}
