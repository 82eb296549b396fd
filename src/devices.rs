//! Abstractions over the process I/O attached to the machine.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::definitions::image;

/// The trait responsible for producing the input image before a scan.
pub trait InputCommands {
    /// Will provide the input bytes for the next scan.
    fn read(&mut self) -> [u8; image::INPUT_SIZE];
}

/// The trait responsible for consuming the output image after a scan.
pub trait OutputCommands {
    /// Will receive the output bytes a finished scan produced.
    fn write(&mut self, outputs: &[u8]);
}

/// A simple latch holding the field side of the process: inputs set by
/// the host, outputs written back after every scan.
#[derive(Default, Debug)]
pub struct Panel {
    inputs: [u8; image::INPUT_SIZE],
    outputs: [u8; image::OUTPUT_SIZE],
}

impl Panel {
    /// Will initiate a new panel with everything off.
    pub fn new() -> Self {
        Panel::default()
    }

    /// Will set a single input bit.
    pub fn set_input(&mut self, address: usize, bit: u8, to: bool) {
        log::debug!("input {}.{} - state {}", address, bit, to);

        crate::memory::set_bit(&mut self.inputs, address, bit, to);
    }

    /// Will set a whole input byte.
    pub fn set_input_byte(&mut self, address: usize, value: u8) {
        self.inputs[address] = value;
    }

    pub fn inputs(&self) -> &[u8] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[u8] {
        &self.outputs
    }

    /// Will read back a single output bit.
    pub fn output(&self, address: usize, bit: u8) -> bool {
        crate::memory::get_bit(&self.outputs, address, bit)
    }
}

impl InputCommands for Panel {
    fn read(&mut self) -> [u8; image::INPUT_SIZE] {
        self.inputs
    }
}

impl OutputCommands for Panel {
    fn write(&mut self, outputs: &[u8]) {
        let len = outputs.len().min(self.outputs.len());
        self.outputs[..len].copy_from_slice(&outputs[..len]);
    }
}

/// A clonable panel handle, for hosts that feed inputs from one place
/// and read outputs from an other.
#[derive(Clone, Default)]
pub struct SharedPanel {
    panel: Arc<RwLock<Panel>>,
}

impl SharedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Will set a single input bit.
    pub fn set_input(&self, address: usize, bit: u8, to: bool) {
        self.panel.write().set_input(address, bit, to);
    }

    /// Will set a whole input byte.
    pub fn set_input_byte(&self, address: usize, value: u8) {
        self.panel.write().set_input_byte(address, value);
    }

    /// Will read back a single output bit.
    pub fn output(&self, address: usize, bit: u8) -> bool {
        self.panel.read().output(address, bit)
    }
}

impl InputCommands for SharedPanel {
    fn read(&mut self) -> [u8; image::INPUT_SIZE] {
        self.panel.write().read()
    }
}

impl OutputCommands for SharedPanel {
    fn write(&mut self, outputs: &[u8]) {
        self.panel.write().write(outputs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_latches() {
        let mut panel = Panel::new();
        panel.set_input(0, 3, true);
        assert_eq!(panel.inputs()[0], 0b0000_1000);
        panel.set_input(0, 3, false);
        assert_eq!(panel.inputs()[0], 0);

        panel.write(&[0b0000_0001]);
        assert!(panel.output(0, 0));
        assert!(!panel.output(0, 1));
    }

    #[test]
    fn test_shared_panel_is_shared() {
        let mut shared = SharedPanel::new();
        let handle = shared.clone();
        handle.set_input_byte(1, 0xAA);
        assert_eq!(shared.read()[1], 0xAA);
    }
}
