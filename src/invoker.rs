//! Stage three of the pipeline: applying a command queue to the processor.
//!
//! The invoker is mechanical. Writes mutate the named target, cycle
//! terminators hand control back so a host scheduler can advance its
//! clock, and the remaining halts drive the processor mode.

use crate::command::{CommandQueue, MachineCommand};
use crate::error::CoreError;
use crate::processor::Processor;

/// Apply commands until the next cycle terminator.
///
/// Returns 1 when a terminator was consumed, 0 when the queue ran out on
/// trailing writes. Calling this on an already empty queue is a
/// `QueueUnderflow`.
pub fn run_cycle(processor: &mut Processor, queue: &mut CommandQueue) -> Result<u8, CoreError> {
    if queue.is_empty() {
        return Err(CoreError::QueueUnderflow);
    }
    while let Some(command) = queue.dequeue() {
        match command {
            MachineCommand::Write(write) => processor.apply_write(&write)?,
            MachineCommand::Halt(halt) if halt.is_cycle_terminator => return Ok(1),
            MachineCommand::Halt(halt) => processor.apply_halt_op(halt.halt_op),
        }
    }
    Ok(0)
}

/// Drain the whole queue and return the number of M-cycles it carried.
pub fn invoke(processor: &mut Processor, queue: &mut CommandQueue) -> Result<u8, CoreError> {
    let mut cycles = 0;
    while !queue.is_empty() {
        cycles += run_cycle(processor, queue)?;
    }
    Ok(cycles)
}
