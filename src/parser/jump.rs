//! Expansion of jumps, calls, returns and resets into machine commands.
//!
//! The condition is evaluated against the snapshot the parser was handed;
//! a failed condition produces a queue with the not-taken cycle count and
//! no control-flow writes at all.

use super::common::{
    emit_operand_decode, halt_cycle, write_ime, write_ir, write_memory, write_pc, write_reg16,
};
use crate::command::CommandQueue;
use crate::error::CoreError;
use crate::instruction::{Instruction, JumpCondition, JumpParams, JumpType, ParamValue};
use crate::processor::Processor;
use crate::registers::{Flag, Register16};

fn condition_met(processor: &Processor, condition: JumpCondition) -> bool {
    let registers = processor.registers();
    match condition {
        JumpCondition::None => true,
        JumpCondition::Zero => registers.flag_test(Flag::Z),
        JumpCondition::NotZero => !registers.flag_test(Flag::Z),
        JumpCondition::Carry => registers.flag_test(Flag::C),
        JumpCondition::NotCarry => !registers.flag_test(Flag::C),
    }
}

/// Two-byte stack push, SP stepping down once per cycle. High byte first so
/// a later pop reads the word back little-endian.
fn emit_stack_push(queue: &mut CommandQueue, processor: &Processor, value: u16) {
    let sp = processor.registers().sp();
    write_memory(queue, sp.wrapping_sub(1), (value >> 8) as u8);
    write_reg16(queue, Register16::SP, sp.wrapping_sub(1));
    halt_cycle(queue);
    write_memory(queue, sp.wrapping_sub(2), (value & 0xFF) as u8);
    write_reg16(queue, Register16::SP, sp.wrapping_sub(2));
    halt_cycle(queue);
}

/// Two-byte stack pop; returns the popped word. RETI folds its IME enable
/// into the second cycle.
fn emit_stack_pop(
    queue: &mut CommandQueue,
    processor: &Processor,
    enable_interrupts: bool,
) -> Result<u16, CoreError> {
    let sp = processor.registers().sp();
    let value = processor.memory().read16(sp)?;
    write_reg16(queue, Register16::SP, sp.wrapping_add(1));
    halt_cycle(queue);
    write_reg16(queue, Register16::SP, sp.wrapping_add(2));
    if enable_interrupts {
        write_ime(queue, true);
    }
    halt_cycle(queue);
    Ok(value)
}

pub(super) fn parse_jump(
    queue: &mut CommandQueue,
    processor: &Processor,
    instruction: &Instruction,
    params: &JumpParams,
) -> Result<(), CoreError> {
    let pc_after_decode = processor
        .registers()
        .pc()
        .wrapping_add(instruction.byte_length as u16);

    if instruction.byte_length > 1 {
        emit_operand_decode(queue, processor, instruction);
    }

    let met = condition_met(processor, params.condition);
    if params.is_conditional && instruction.byte_length == 1 {
        // The 1-byte conditional returns burn an internal cycle on the
        // check itself, taken or not.
        halt_cycle(queue);
    }
    if params.is_conditional && !met {
        return Ok(());
    }

    let target = match params.kind {
        JumpType::Call => {
            let ParamValue::U16(address) = params.param.value else {
                return Err(CoreError::ParamShapeMismatch);
            };
            // The return address is the instruction after the call.
            emit_stack_push(queue, processor, pc_after_decode);
            address
        }
        JumpType::Rst => {
            let ParamValue::U16(vector) = params.param.value else {
                return Err(CoreError::ParamShapeMismatch);
            };
            emit_stack_push(queue, processor, vector);
            vector
        }
        JumpType::Ret => emit_stack_pop(queue, processor, params.enable_interrupts)?,
        JumpType::Jump => match params.param.value {
            ParamValue::I8(offset) => pc_after_decode.wrapping_add(offset as i16 as u16),
            ParamValue::U16(address) => address,
            // JP HL reads the pair directly, no memory access.
            ParamValue::Reg16(register) if !params.param.pointer => {
                processor.registers().read16(register)
            }
            _ => return Err(CoreError::ParamShapeMismatch),
        },
    };

    // The jump cycle proper: PC moves, the target's opcode lands in IR.
    write_pc(queue, target);
    write_ir(queue, processor.memory().read(target));
    let is_jp_hl =
        params.kind == JumpType::Jump && matches!(params.param.value, ParamValue::Reg16(_));
    if !is_jp_hl {
        halt_cycle(queue);
    }
    Ok(())
}
