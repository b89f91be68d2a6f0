//! Expansion of the load family into machine commands.
//!
//! Modelled as the two-phase state machine the hardware implies: a fetch
//! phase that spends cycles acquiring operand bytes or memory values, and a
//! write phase that commits the transfer (with the post-load side effects
//! folded into the committing cycle so visible state matches hardware
//! ordering).

use super::common::{
    self, emit_operand_decode, halt_cycle, write_flag, write_memory, write_reg8, write_reg16,
};
use crate::command::CommandQueue;
use crate::error::CoreError;
use crate::instruction::{Instruction, LoadParams, ParamValue, PostLoad};
use crate::processor::Processor;
use crate::registers::{Flag, Register16};

pub(super) fn parse_load(
    queue: &mut CommandQueue,
    processor: &Processor,
    instruction: &Instruction,
    params: &LoadParams,
) -> Result<(), CoreError> {
    fetch_cycle_start(queue, processor, instruction, params)
}

// --- Fetch phase ---

fn fetch_cycle_start(
    queue: &mut CommandQueue,
    processor: &Processor,
    instruction: &Instruction,
    params: &LoadParams,
) -> Result<(), CoreError> {
    if instruction.byte_length > 1 {
        decode_operand(queue, processor, instruction, params)
    } else if params.source.pointer {
        fetch_memory(queue, processor, params)
    } else {
        write_cycle_start(queue, processor, params)
    }
}

fn decode_operand(
    queue: &mut CommandQueue,
    processor: &Processor,
    instruction: &Instruction,
    params: &LoadParams,
) -> Result<(), CoreError> {
    emit_operand_decode(queue, processor, instruction);
    if params.source.pointer {
        // The operand named a memory cell; reading it costs another cycle.
        fetch_memory(queue, processor, params)
    } else {
        write_cycle_start(queue, processor, params)
    }
}

fn fetch_memory(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
) -> Result<(), CoreError> {
    let from_stack = params.source.pointer
        && params.source.value == ParamValue::Reg16(Register16::SP);
    let source_post_load = matches!(
        params.post_load,
        PostLoad::IncrementIndirectSource | PostLoad::DecrementIndirectSource
    ) && params.source.is_hl_pointer();

    if from_stack {
        read_from_stack(queue, processor, params)
    } else if source_post_load {
        source_post_load_fetch(queue, processor, params)
    } else {
        halt_cycle(queue);
        write_cycle_start(queue, processor, params)
    }
}

/// POP walks SP upward one increment per M-cycle while the two stack bytes
/// are fetched.
fn read_from_stack(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
) -> Result<(), CoreError> {
    let sp = processor.registers().sp();
    write_reg16(queue, Register16::SP, sp.wrapping_add(1));
    halt_cycle(queue);
    write_reg16(queue, Register16::SP, sp.wrapping_add(2));
    halt_cycle(queue);
    write_cycle_start(queue, processor, params)
}

/// The HL post-increment and post-decrement loads spend their memory cycle
/// here; the register update itself lands in the write phase.
fn source_post_load_fetch(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
) -> Result<(), CoreError> {
    halt_cycle(queue);
    write_cycle_start(queue, processor, params)
}

// --- Write phase ---

fn write_cycle_start(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
) -> Result<(), CoreError> {
    let to_stack =
        params.dest.pointer && params.dest.value == ParamValue::Reg16(Register16::SP);
    if to_stack {
        write_to_stack(queue, processor, params)
    } else if params.dest.pointer {
        write_to_memory(queue, processor, params)
    } else {
        register_write(queue, processor, params)
    }
}

/// PUSH: an internal SP-adjust cycle, then one cycle per stack byte, SP
/// stepping down alongside each write.
fn write_to_stack(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
) -> Result<(), CoreError> {
    let value = common::resolve_unsigned(&params.source, processor, false)?;
    let sp = processor.registers().sp();
    let (high, low) = ((value >> 8) as u8, (value & 0xFF) as u8);

    halt_cycle(queue);
    write_memory(queue, sp.wrapping_sub(1), high);
    write_reg16(queue, Register16::SP, sp.wrapping_sub(1));
    halt_cycle(queue);
    write_memory(queue, sp.wrapping_sub(2), low);
    write_reg16(queue, Register16::SP, sp.wrapping_sub(2));
    halt_cycle(queue);
    Ok(())
}

fn write_to_memory(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
) -> Result<(), CoreError> {
    let address = common::resolve_unsigned(&params.dest, processor, true)?;

    if matches!(params.source.value, ParamValue::Reg16(_)) && !params.source.pointer {
        // A 16-bit source spreads over two little-endian byte writes, one
        // cycle each (the LD (a16),SP form).
        let value = common::resolve_unsigned(&params.source, processor, false)?;
        write_memory(queue, address, (value & 0xFF) as u8);
        halt_cycle(queue);
        write_memory(queue, address.wrapping_add(1), (value >> 8) as u8);
        halt_cycle(queue);
        return Ok(());
    }

    let value = common::resolve_unsigned(&params.source, processor, false)? as u8;
    write_memory(queue, address, value);
    commit_destination_post_load(queue, processor, params);
    halt_cycle(queue);
    Ok(())
}

fn register_write(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
) -> Result<(), CoreError> {
    match params.dest.value {
        ParamValue::Reg8(register) => {
            let value = common::resolve_unsigned(&params.source, processor, false)? as u8;
            write_reg8(queue, register, value);
            commit_source_post_load(queue, processor, params);
            Ok(())
        }
        ParamValue::Reg16(register) => {
            if params.post_load == PostLoad::SignedPayloadSum {
                return signed_payload_sum(queue, processor, params, register);
            }
            let value = if params.source.pointer {
                // A 16-bit register fed from memory reads a little-endian
                // word (POP; SP has not moved yet in the snapshot).
                let address = common::resolve_unsigned(&params.source, processor, true)?;
                processor.memory().read16(address)?
            } else {
                common::resolve_unsigned(&params.source, processor, false)?
            };
            write_reg16(queue, register, value);
            if matches!(params.source.value, ParamValue::Reg16(_)) && !params.source.pointer {
                // Register-pair transfers move a byte per cycle (LD SP,HL).
                halt_cycle(queue);
            }
            Ok(())
        }
        _ => Err(CoreError::ParamShapeMismatch),
    }
}

/// `LD HL, SP+s8`: an internal cycle for the byte-wise sum, then the HL
/// write with the byte-style flag pattern (Z and N forced low).
fn signed_payload_sum(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
    dest: Register16,
) -> Result<(), CoreError> {
    let offset = params.aux_offset.ok_or(CoreError::ParamShapeMismatch)?;
    let sp = processor.registers().sp();
    let unsigned = offset as u8 as u16;
    let half = (sp & 0x000F) + (unsigned & 0x000F) > 0x000F;
    let carry = (sp & 0x00FF) + (unsigned & 0x00FF) > 0x00FF;
    let result = sp.wrapping_add(offset as i16 as u16);

    halt_cycle(queue);
    write_reg16(queue, dest, result);
    write_flag(queue, Flag::Z, false);
    write_flag(queue, Flag::N, false);
    write_flag(queue, Flag::H, half);
    write_flag(queue, Flag::C, carry);
    Ok(())
}

/// HL steps once after an indirect load out of it, inside the committing
/// cycle.
fn commit_source_post_load(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
) {
    if !params.source.is_hl_pointer() {
        return;
    }
    let hl = processor.registers().read16(Register16::HL);
    match params.post_load {
        PostLoad::IncrementIndirectSource => {
            write_reg16(queue, Register16::HL, hl.wrapping_add(1));
        }
        PostLoad::DecrementIndirectSource => {
            write_reg16(queue, Register16::HL, hl.wrapping_sub(1));
        }
        _ => {}
    }
}

/// Same for an indirect store through HL.
fn commit_destination_post_load(
    queue: &mut CommandQueue,
    processor: &Processor,
    params: &LoadParams,
) {
    if !params.dest.is_hl_pointer() {
        return;
    }
    let hl = processor.registers().read16(Register16::HL);
    match params.post_load {
        PostLoad::IncrementIndirectDestination => {
            write_reg16(queue, Register16::HL, hl.wrapping_add(1));
        }
        PostLoad::DecrementIndirectDestination => {
            write_reg16(queue, Register16::HL, hl.wrapping_sub(1));
        }
        _ => {}
    }
}
