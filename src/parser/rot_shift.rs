//! Expansion of the rotate/shift and bitwise families.
//!
//! Both live on the CB page (plus the four 1-byte accumulator rotates) and
//! share their `[HL]` handling: dereference with a cycle, compute, write
//! back with a trailing cycle when the target is memory.

use super::common::{
    self, dereference_hl_with_halt, halt_cycle, write_flag, write_memory, write_reg8,
};
use crate::bits;
use crate::command::CommandQueue;
use crate::error::CoreError;
use crate::instruction::{
    BitwiseOp, BitwiseParams, Direction, Param, ParamValue, RotShiftOp, RotShiftParams,
};
use crate::processor::Processor;
use crate::registers::Flag;

/// Apply a rotate or shift to one byte. Returns the result and the bit
/// that fell out into the carry flag.
fn apply_rot_shift(value: u8, params: &RotShiftParams, old_carry: u8) -> (u8, bool) {
    match (params.op, params.direction) {
        (RotShiftOp::Rotate, Direction::Left) => {
            if params.through_carry {
                bits::rotate_left_through_carry(value, old_carry)
            } else {
                bits::rotate_left_circular(value)
            }
        }
        (RotShiftOp::Rotate, Direction::Right) => {
            if params.through_carry {
                bits::rotate_right_through_carry(value, old_carry)
            } else {
                bits::rotate_right_circular(value)
            }
        }
        (RotShiftOp::ShiftArithmetic, Direction::Left) => bits::shift_left_arithmetic(value),
        (RotShiftOp::ShiftArithmetic, Direction::Right) => bits::shift_right_arithmetic(value),
        (RotShiftOp::ShiftLogical, _) => bits::shift_right_logical(value),
        (RotShiftOp::Swap, _) => (bits::swap_nibbles(value), false),
    }
}

/// Fetch the target byte, spending the read cycle when it lives behind HL.
fn fetch_target(
    queue: &mut CommandQueue,
    processor: &Processor,
    target: &Param,
) -> Result<u8, CoreError> {
    if target.is_hl_pointer() {
        Ok(dereference_hl_with_halt(queue, processor))
    } else if let ParamValue::Reg8(register) = target.value {
        Ok(processor.registers().read8(register))
    } else {
        Err(CoreError::ParamShapeMismatch)
    }
}

/// Write the computed byte back, spending the write cycle for memory
/// targets.
fn write_back(
    queue: &mut CommandQueue,
    processor: &Processor,
    target: &Param,
    result: u8,
) -> Result<(), CoreError> {
    if target.is_hl_pointer() {
        let address = common::resolve_unsigned(target, processor, true)?;
        write_memory(queue, address, result);
        halt_cycle(queue);
        Ok(())
    } else if let ParamValue::Reg8(register) = target.value {
        write_reg8(queue, register, result);
        Ok(())
    } else {
        Err(CoreError::ParamShapeMismatch)
    }
}

pub(super) fn parse_rot_shift(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &RotShiftParams,
) -> Result<(), CoreError> {
    let value = fetch_target(queue, processor, &params.target)?;
    let old_carry = processor.registers().flag_get(Flag::C);
    let (result, carry_out) = apply_rot_shift(value, params, old_carry);

    write_back(queue, processor, &params.target, result)?;
    // The 1-byte accumulator rotates force Z low; the CB forms report on
    // the written result.
    let zero = if params.set_flags_to_zero {
        false
    } else {
        result == 0
    };
    write_flag(queue, Flag::Z, zero);
    write_flag(queue, Flag::N, false);
    write_flag(queue, Flag::H, false);
    write_flag(queue, Flag::C, carry_out);
    Ok(())
}

pub(super) fn parse_bitwise(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &BitwiseParams,
) -> Result<(), CoreError> {
    let value = fetch_target(queue, processor, &params.target)?;

    match params.op {
        BitwiseOp::Bit => {
            // Probe only: Z reports an unset bit, the target is untouched
            // and C survives.
            write_flag(queue, Flag::Z, !bits::bit_set(value, params.bit_index));
            write_flag(queue, Flag::N, false);
            write_flag(queue, Flag::H, true);
            Ok(())
        }
        BitwiseOp::Res => {
            let result = value & !(1 << params.bit_index);
            write_back(queue, processor, &params.target, result)
        }
        BitwiseOp::Set => {
            let result = value | (1 << params.bit_index);
            write_back(queue, processor, &params.target, result)
        }
    }
}
