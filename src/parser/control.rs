//! Expansion of the CPU-control family.
//!
//! These produce no writes beyond the preamble; HALT, STOP and EI drive
//! the processor mode through non-terminator halt commands, DI clears IME
//! on the spot.

use super::common::write_ime;
use crate::command::{CommandQueue, MachineCommand};
use crate::instruction::SystemOp;

pub(super) fn parse_control(queue: &mut CommandQueue, op: SystemOp) {
    match op {
        SystemOp::Nop => {}
        SystemOp::Halt | SystemOp::Stop => {
            queue.enqueue(MachineCommand::mode_halt(op));
        }
        // DI takes effect immediately.
        SystemOp::DisableInterrupts => write_ime(queue, false),
        // EI is promoted to IME after the next instruction completes.
        SystemOp::EnableInterrupts => {
            queue.enqueue(MachineCommand::mode_halt(op));
        }
    }
}
