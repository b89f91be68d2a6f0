//! Stage two of the pipeline: instruction plus processor snapshot to an
//! ordered command queue.
//!
//! The parser never mutates the processor; it reads the snapshot, computes
//! every intermediate value itself, and encodes all effects as write
//! commands separated by cycle terminators. Draining the queue against a
//! fresh copy of the snapshot yields the post-instruction state, and the
//! terminator count is the instruction's M-cycle cost.

mod arithmetic;
mod common;
mod control;
mod jump;
mod load;
mod rot_shift;

use crate::command::CommandQueue;
use crate::error::CoreError;
use crate::instruction::{Instruction, InstructionKind};
use crate::processor::Processor;

/// The universal fetch cycle: PC moves past the opcode byte, the opcode
/// lands in the instruction register, the cycle ends.
fn emit_m1(queue: &mut CommandQueue, processor: &Processor, instruction: &Instruction) {
    let pc = processor.registers().pc();
    common::write_pc(queue, pc.wrapping_add(1));
    common::write_ir(queue, instruction.opcode());
    common::halt_cycle(queue);
}

/// The extra decode cycle of the CB-prefixed page: the sub-opcode replaces
/// the prefix in the instruction register.
fn emit_m2_for_cb(queue: &mut CommandQueue, processor: &Processor, instruction: &Instruction) {
    let pc = processor.registers().pc();
    common::write_pc(queue, pc.wrapping_add(2));
    common::write_ir(queue, instruction.operand8());
    common::halt_cycle(queue);
}

/// Expand one instruction into its command queue.
pub fn parse(
    processor: &Processor,
    instruction: &Instruction,
) -> Result<CommandQueue, CoreError> {
    let mut queue = CommandQueue::new();
    emit_m1(&mut queue, processor, instruction);
    if instruction.is_cb_prefixed() {
        emit_m2_for_cb(&mut queue, processor, instruction);
    }

    match &instruction.kind {
        InstructionKind::Load(params) => {
            load::parse_load(&mut queue, processor, instruction, params)?
        }
        InstructionKind::Arithmetic(params) => {
            arithmetic::parse_arithmetic(&mut queue, processor, instruction, params)?
        }
        InstructionKind::RotShift(params) => {
            rot_shift::parse_rot_shift(&mut queue, processor, params)?
        }
        InstructionKind::Bitwise(params) => {
            rot_shift::parse_bitwise(&mut queue, processor, params)?
        }
        InstructionKind::Jump(params) => {
            jump::parse_jump(&mut queue, processor, instruction, params)?
        }
        InstructionKind::CpuControl(op) => control::parse_control(&mut queue, *op),
    }

    Ok(queue)
}
