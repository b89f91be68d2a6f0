//! Expansion of the arithmetic family into machine commands.
//!
//! Results are computed in a wider integer so carries fall out of a
//! comparison between the ideal and the width-truncated result. Half
//! carries always come from the nibble sums of the raw operands.

use super::common::{
    self, dereference_hl_with_halt, emit_operand_decode, halt_cycle, write_flag, write_reg8,
    write_reg16,
};
use crate::command::CommandQueue;
use crate::error::CoreError;
use crate::instruction::{
    ArithmeticOp, ArithmeticParams, Instruction, Param, ParamValue,
};
use crate::processor::Processor;
use crate::registers::{Flag, Register8, Register16};

/// Ideal result of `op` over the raw operands, wide enough that neither
/// overflow nor underflow can wrap.
fn ideal_result(first: u16, second: u16, op: ArithmeticOp, carry: u8) -> i32 {
    let first = first as i32;
    let second = second as i32;
    let carry = carry as i32;
    match op {
        ArithmeticOp::Add | ArithmeticOp::Inc => first + second,
        ArithmeticOp::Adc => first + second + carry,
        ArithmeticOp::Sub | ArithmeticOp::Dec | ArithmeticOp::Cp => first - second,
        ArithmeticOp::Sbc => first - second - carry,
        ArithmeticOp::And => first & second,
        ArithmeticOp::Or => first | second,
        ArithmeticOp::Xor => first ^ second,
        // DAA/CPL/SCF/CCF never reach the shared result path.
        _ => 0,
    }
}

/// Half-carry out of bit 3, or half-borrow into it.
fn half_carry(first: u16, second: u16, op: ArithmeticOp, carry: u8) -> bool {
    let low_first = (first & 0x0F) as i32;
    let low_second = (second & 0x0F) as i32;
    let carry = carry as i32;
    let nibble_sum = match op {
        ArithmeticOp::Add | ArithmeticOp::Inc => low_first + low_second,
        ArithmeticOp::Adc => low_first + low_second + carry,
        ArithmeticOp::Sub | ArithmeticOp::Dec | ArithmeticOp::Cp => low_first - low_second,
        ArithmeticOp::Sbc => low_first - low_second - carry,
        _ => return false,
    };
    nibble_sum & 0x10 == 0x10
}

/// Flag writes after a completed 8-bit operation. `skip_carry` keeps C
/// untouched for the increment and decrement forms.
fn write_result_flags(
    queue: &mut CommandQueue,
    ideal: i32,
    actual: u32,
    op: ArithmeticOp,
    half_carry: bool,
    skip_carry: bool,
) {
    write_flag(queue, Flag::Z, actual == 0);
    write_flag(queue, Flag::N, op.is_subtraction());
    match op {
        ArithmeticOp::Or | ArithmeticOp::Xor => {
            write_flag(queue, Flag::H, false);
            if !skip_carry {
                write_flag(queue, Flag::C, false);
            }
        }
        ArithmeticOp::And => {
            write_flag(queue, Flag::H, true);
            if !skip_carry {
                write_flag(queue, Flag::C, false);
            }
        }
        _ => {
            write_flag(queue, Flag::H, half_carry);
            if !skip_carry {
                write_flag(queue, Flag::C, ideal != actual as i32);
            }
        }
    }
}

/// Emit the write of a byte-sized result to its destination.
fn write_result_u8(
    queue: &mut CommandQueue,
    dest: &Param,
    result: u8,
    processor: &Processor,
) -> Result<(), CoreError> {
    if dest.pointer {
        let address = common::resolve_unsigned(dest, processor, true)?;
        common::write_memory(queue, address, result);
        Ok(())
    } else if let ParamValue::Reg8(register) = dest.value {
        write_reg8(queue, register, result);
        Ok(())
    } else {
        Err(CoreError::ParamShapeMismatch)
    }
}

/// `ADD HL, r16` runs as two byte-wide adds, one per M-cycle, the second
/// consuming the carry of the first. Z is never written; the flags left
/// behind derive from bits 11 and 15 of the full operation.
fn parse_add16(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &ArithmeticParams,
) -> Result<(), CoreError> {
    let dest_parts = common::explode_param(&params.dest_or_first, processor)?;
    let source_parts = common::explode_param(&params.source_or_second, processor)?;

    // Low byte first.
    let dest_low = common::resolve_unsigned(&dest_parts.lower, processor, true)?;
    let source_low = common::resolve_unsigned(&source_parts.lower, processor, true)?;
    let low_ideal = ideal_result(dest_low, source_low, ArithmeticOp::Add, 0);
    let low_actual = low_ideal as u8;
    let low_half = half_carry(dest_low, source_low, ArithmeticOp::Add, 0);
    write_result_u8(queue, &dest_parts.lower, low_actual, processor)?;
    write_flag(queue, Flag::N, false);
    write_flag(queue, Flag::H, low_half);
    write_flag(queue, Flag::C, low_ideal != low_actual as i32);
    halt_cycle(queue);

    // High byte plus the low carry on the next cycle. The carry rides in
    // as a carry-in so the bit-11 half carry comes out right.
    let low_carry = (low_ideal != low_actual as i32) as u8;
    let dest_high = common::resolve_unsigned(&dest_parts.higher, processor, true)?;
    let source_high = common::resolve_unsigned(&source_parts.higher, processor, true)?;
    let high_ideal = ideal_result(dest_high, source_high, ArithmeticOp::Adc, low_carry);
    let high_actual = high_ideal as u8;
    let high_half = half_carry(dest_high, source_high, ArithmeticOp::Adc, low_carry);
    write_result_u8(queue, &dest_parts.higher, high_actual, processor)?;
    write_flag(queue, Flag::N, false);
    write_flag(queue, Flag::H, high_half);
    write_flag(queue, Flag::C, high_ideal != high_actual as i32);
    Ok(())
}

/// `ADD SP, s8`: byte-style half-carry and carry from the low byte of SP
/// against the unsigned view of the offset, then the sign-extended sum.
fn parse_sp_signed_sum(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &ArithmeticParams,
) -> Result<(), CoreError> {
    let ParamValue::I8(offset) = params.source_or_second.value else {
        return Err(CoreError::ParamShapeMismatch);
    };
    let sp = processor.registers().sp();
    let unsigned = offset as u8 as u16;
    let half = (sp & 0x000F) + (unsigned & 0x000F) > 0x000F;
    let carry = (sp & 0x00FF) + (unsigned & 0x00FF) > 0x00FF;
    let result = sp.wrapping_add(offset as i16 as u16);

    // Two internal cycles for the byte-wide adds.
    halt_cycle(queue);
    write_reg16(queue, Register16::SP, result);
    write_flag(queue, Flag::Z, false);
    write_flag(queue, Flag::N, false);
    write_flag(queue, Flag::H, half);
    write_flag(queue, Flag::C, carry);
    halt_cycle(queue);
    Ok(())
}

fn parse_daa(queue: &mut CommandQueue, processor: &Processor) {
    let registers = processor.registers();
    let a = registers.read8(Register8::A);
    let negative = registers.flag_test(Flag::N);
    let half = registers.flag_test(Flag::H);
    let carry = registers.flag_test(Flag::C);

    let mut adjustment = 0u8;
    let mut set_carry = false;
    let result = if !negative {
        if carry || a > 0x99 {
            adjustment |= 0x60;
            set_carry = true;
        }
        if half || (a & 0x0F) > 0x09 {
            adjustment |= 0x06;
        }
        a.wrapping_add(adjustment)
    } else {
        if carry {
            adjustment |= 0x60;
            set_carry = true;
        }
        if half {
            adjustment |= 0x06;
        }
        a.wrapping_sub(adjustment)
    };

    write_reg8(queue, Register8::A, result);
    write_flag(queue, Flag::Z, result == 0);
    write_flag(queue, Flag::H, false);
    write_flag(queue, Flag::C, set_carry);
}

fn parse_cpl(queue: &mut CommandQueue, processor: &Processor) {
    let result = !processor.registers().read8(Register8::A);
    write_reg8(queue, Register8::A, result);
    write_flag(queue, Flag::N, true);
    write_flag(queue, Flag::H, true);
}

fn parse_scf(queue: &mut CommandQueue) {
    write_flag(queue, Flag::N, false);
    write_flag(queue, Flag::H, false);
    write_flag(queue, Flag::C, true);
}

fn parse_ccf(queue: &mut CommandQueue, processor: &Processor) {
    let carry = processor.registers().flag_test(Flag::C);
    write_flag(queue, Flag::N, false);
    write_flag(queue, Flag::H, false);
    write_flag(queue, Flag::C, !carry);
}

pub(super) fn parse_arithmetic(
    queue: &mut CommandQueue,
    processor: &Processor,
    instruction: &Instruction,
    params: &ArithmeticParams,
) -> Result<(), CoreError> {
    if instruction.byte_length > 1 {
        emit_operand_decode(queue, processor, instruction);
    }

    // The accumulator adjustments have their own flag rules.
    match params.op {
        ArithmeticOp::Daa => {
            parse_daa(queue, processor);
            return Ok(());
        }
        ArithmeticOp::Cpl => {
            parse_cpl(queue, processor);
            return Ok(());
        }
        ArithmeticOp::Scf => {
            parse_scf(queue);
            return Ok(());
        }
        ArithmeticOp::Ccf => {
            parse_ccf(queue, processor);
            return Ok(());
        }
        _ => {}
    }

    if params.dest_or_first.value == ParamValue::Reg16(Register16::SP)
        && matches!(params.source_or_second.value, ParamValue::I8(_))
    {
        return parse_sp_signed_sum(queue, processor, params);
    }

    let first = common::resolve_unsigned(&params.dest_or_first, processor, false)?;
    let second = common::resolve_unsigned(&params.source_or_second, processor, false)?;
    if params.dest_or_first.is_hl_pointer() || params.source_or_second.is_hl_pointer() {
        dereference_hl_with_halt(queue, processor);
    }

    let carry = processor.registers().flag_get(Flag::C);
    let ideal = ideal_result(first, second, params.op, carry);
    let half = half_carry(first, second, params.op, carry);
    let is_inc_dec = matches!(params.op, ArithmeticOp::Inc | ArithmeticOp::Dec);

    if params.dest_or_first.holds_byte() {
        let actual = ideal as u8;
        if params.op != ArithmeticOp::Cp {
            write_result_u8(queue, &params.dest_or_first, actual, processor)?;
        }
        write_result_flags(queue, ideal, actual as u32, params.op, half, is_inc_dec);
        // The [HL] read-modify-write forms close their write cycle here.
        if params.dest_or_first.pointer && is_inc_dec {
            halt_cycle(queue);
        }
        return Ok(());
    }

    // 16-bit destinations: the increment/decrement unit, or the two-cycle
    // HL accumulate. The IDU leaves flags alone.
    if is_inc_dec {
        let ParamValue::Reg16(register) = params.dest_or_first.value else {
            return Err(CoreError::ParamShapeMismatch);
        };
        write_reg16(queue, register, ideal as u16);
        halt_cycle(queue);
        return Ok(());
    }

    parse_add16(queue, processor, params)
}
