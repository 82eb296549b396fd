//! The tick source and the timer function blocks required by the
//! IEC 61131-3 standard library.
//!
//! Elapsed time is counted in prescaled ticks. The counter itself is a
//! `u32`, which at a one millisecond tick allows counting for 49 days;
//! the 16 bit elapsed value of a single timer covers 65 seconds.

use std::sync::Arc;

use parking_lot::RwLock;

/// The clonable handle onto the monotonic tick counter.
///
/// The host advances it between scans, the executor snapshots it once
/// per timer evaluation, so a concurrent advance costs at most one
/// scan of jitter.
#[derive(Clone, Debug, Default)]
pub struct Ticks {
    /// will store the value of the counter.
    value: Arc<RwLock<u32>>,
}

impl Ticks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Will advance the counter by the given quanta.
    pub fn advance(&self, nticks: u32) {
        let mut value = self.value.write();

        *value = value.wrapping_add(nticks);
    }

    /// Getter for the current counter value.
    pub fn get(&self) -> u32 {
        *self.value.read()
    }
}

/// The phases a pulse timer runs through.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TpState {
    /// output off, waiting for the input to rise
    Idle,
    /// output on, the pulse is being timed
    Running,
    /// pulse over, waiting for the input to fall
    Latched,
}

impl Default for TpState {
    fn default() -> Self {
        TpState::Idle
    }
}

/// A single timer instance.
///
/// `input`, `preset` and `prescaler` are written by the executor on
/// every evaluation, `output` and `elapsed` are the results, the rest
/// is internal latch state that persists across scans.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Timer {
    pub input: bool,
    pub preset: u16,
    pub prescaler: u8,
    enabled: bool,
    init_ticks: u32,
    state: TpState,
    pub output: bool,
    pub elapsed: u16,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            input: false,
            preset: 0,
            prescaler: 1,
            enabled: false,
            init_ticks: 0,
            state: TpState::Idle,
            output: false,
            elapsed: 0,
        }
    }
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prescaled tick count since the latch point.
    fn elapsed_since(&self, ticks: u32) -> u16 {
        // a zero prescaler would stall the division, clamp it
        let prescaler = self.prescaler.max(1) as u32;
        (ticks.wrapping_sub(self.init_ticks) / prescaler) as u16
    }

    /// On delay: the output rises once the input has been high for the
    /// preset time and falls with the input.
    pub fn run_ton(&mut self, ticks: u32) {
        if !self.input {
            self.output = false;
            self.elapsed = 0;
            self.enabled = false;
            self.init_ticks = 0;
        } else {
            if !self.enabled && !self.output {
                self.enabled = true;
                self.init_ticks = ticks;
            }
            if self.enabled {
                if self.elapsed < self.preset {
                    self.elapsed = self.elapsed_since(ticks);
                }
                if self.elapsed >= self.preset {
                    self.output = true;
                    self.elapsed = self.preset;
                } else {
                    self.output = false;
                }
            }
        }
    }

    /// Off delay: the output rises with the input and stays high for
    /// the preset time after the input fell.
    pub fn run_tof(&mut self, ticks: u32) {
        if self.input {
            self.output = true;
            self.elapsed = 0;
            self.enabled = false;
            self.init_ticks = 0;
        } else {
            if !self.enabled && self.output {
                self.enabled = true;
                self.init_ticks = ticks;
            }
            if self.enabled {
                self.elapsed = self.elapsed_since(ticks);
                if self.elapsed >= self.preset {
                    self.elapsed = 0;
                    self.output = false;
                    self.enabled = false;
                } else {
                    self.output = true;
                }
            }
        }
    }

    /// Pulse: a rising input emits one output pulse of exactly the
    /// preset length, further input changes are ignored until the
    /// pulse is over and the input fell.
    pub fn run_tp(&mut self, ticks: u32) {
        match self.state {
            TpState::Idle => {
                if self.input {
                    self.state = TpState::Running;
                    self.enabled = true;
                    self.init_ticks = ticks;
                    self.output = true;
                }
            }
            TpState::Running => {
                self.elapsed = self.elapsed_since(ticks);
                if self.elapsed >= self.preset {
                    self.output = false;
                    self.elapsed = 0;
                    self.enabled = false;
                    self.state = if self.input {
                        TpState::Latched
                    } else {
                        TpState::Idle
                    };
                } else {
                    self.output = true;
                }
            }
            TpState::Latched => {
                if !self.input {
                    self.state = TpState::Idle;
                }
            }
        }
    }
}
