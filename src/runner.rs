//! The main interface out of the crate.
//!
//! Handles the per scan interaction between the machine and the
//! attached process I/O.

use crate::{
    devices::{InputCommands, OutputCommands},
    error::ProcessError,
    program::Program,
    vm::Vm,
};

/// A collection of all the important interfaces.
/// Is primarily used to simplify the crate api.
pub struct Controller<I, O>
where
    I: InputCommands,
    O: OutputCommands,
{
    /// The input adapter, polled before every scan.
    inputs: I,
    /// The output adapter, fed after every scan.
    outputs: O,
    /// The all important machine implementation.
    vm: Option<Vm>,
}

impl<I, O> Controller<I, O>
where
    I: InputCommands,
    O: OutputCommands,
{
    /// Creates a new controller.
    pub fn new(inputs: I, outputs: O) -> Self {
        Controller {
            inputs,
            outputs,
            vm: None,
        }
    }

    /// Get a reference to the controller's machine.
    pub fn vm(&self) -> &Option<Vm> {
        &self.vm
    }

    /// Get a mutable reference to the controller's machine.
    pub fn vm_mut(&mut self) -> Option<&mut Vm> {
        self.vm.as_mut()
    }

    /// Set the controller's program, revealing a fresh machine.
    pub fn set_program(&mut self, program: Program) {
        self.vm = Some(Vm::new(program));
    }

    /// Remove the program and drop all machine state.
    pub fn remove_program(&mut self) {
        self.vm = None;
    }

    /// Get a mutable reference to the controller's input adapter.
    pub fn inputs(&mut self) -> &mut I {
        &mut self.inputs
    }

    /// Get a reference to the controller's output adapter.
    pub fn outputs(&self) -> &O {
        &self.outputs
    }
}

/// The main function that has to be called once per scan interval.
///
/// Polls the inputs, runs one full scan and hands the outputs to the
/// output adapter.
pub fn run<I, O>(
    Controller {
        inputs,
        outputs,
        vm,
    }: &mut Controller<I, O>,
) -> Result<(), ProcessError>
where
    I: InputCommands,
    O: OutputCommands,
{
    // Extract the machine from the controller option
    let vm = vm.as_mut().ok_or(ProcessError::Uninitialized)?;

    let input_image = inputs.read();
    vm.set_inputs(&input_image);

    // run the scan cycle
    vm.scan()?;

    outputs.write(vm.outputs());

    Ok(())
}
