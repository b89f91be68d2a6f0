//! Decoding for the five CPU-control opcodes.

use crate::instruction::{Instruction, InstructionKind, SystemOp};

pub(super) fn tokenize(machine_code: u32, byte_length: u8, opcode: u8) -> Option<Instruction> {
    let op = match opcode {
        0x00 => SystemOp::Nop,
        0x10 => SystemOp::Stop,
        0x76 => SystemOp::Halt,
        0xF3 => SystemOp::DisableInterrupts,
        0xFB => SystemOp::EnableInterrupts,
        _ => return None,
    };
    Some(Instruction {
        original_machine_code: machine_code,
        byte_length,
        duration_in_clock_cycles: 1,
        kind: InstructionKind::CpuControl(op),
    })
}
