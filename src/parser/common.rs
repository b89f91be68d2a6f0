//! Emit helpers and operand resolution shared by the family parsers.
//!
//! All of these append to a command queue; none of them touch the
//! processor. Memory traffic is modelled the way the hardware does it: the
//! address lands on the address bus, the byte on the data bus, then the
//! cell itself is written.

use crate::command::{CommandQueue, InternalTarget, MachineCommand, WriteTarget, WriteValue};
use crate::error::CoreError;
use crate::instruction::{Instruction, Param, ParamValue};
use crate::processor::Processor;
use crate::registers::{Flag, Register8, Register16};

/// The high page LDH and the `(C)` forms address into.
pub(super) const HIGH_PAGE: u16 = 0xFF00;

pub(super) fn halt_cycle(queue: &mut CommandQueue) {
    queue.enqueue(MachineCommand::cycle_terminator());
}

pub(super) fn write_reg8(queue: &mut CommandQueue, register: Register8, value: u8) {
    queue.enqueue(MachineCommand::write(
        WriteTarget::Register8(register),
        WriteValue::U8(value),
    ));
}

pub(super) fn write_reg16(queue: &mut CommandQueue, register: Register16, value: u16) {
    queue.enqueue(MachineCommand::write(
        WriteTarget::Register16(register),
        WriteValue::U16(value),
    ));
}

pub(super) fn write_flag(queue: &mut CommandQueue, flag: Flag, value: bool) {
    queue.enqueue(MachineCommand::write(
        WriteTarget::Flag(flag),
        WriteValue::U8(value as u8),
    ));
}

pub(super) fn write_ime(queue: &mut CommandQueue, enabled: bool) {
    queue.enqueue(MachineCommand::write(
        WriteTarget::Ime,
        WriteValue::U8(enabled as u8),
    ));
}

/// The program counter moves through its internal write target.
pub(super) fn write_pc(queue: &mut CommandQueue, value: u16) {
    queue.enqueue(MachineCommand::write(
        WriteTarget::Internal(InternalTarget::ProgramCounter),
        WriteValue::U16(value),
    ));
}

pub(super) fn write_ir(queue: &mut CommandQueue, opcode: u8) {
    queue.enqueue(MachineCommand::write(
        WriteTarget::Internal(InternalTarget::InstructionRegister),
        WriteValue::U8(opcode),
    ));
}

fn write_address_bus(queue: &mut CommandQueue, value: u16) {
    queue.enqueue(MachineCommand::write(
        WriteTarget::Internal(InternalTarget::AddressBus),
        WriteValue::U16(value),
    ));
}

fn write_data_bus(queue: &mut CommandQueue, value: u8) {
    queue.enqueue(MachineCommand::write(
        WriteTarget::Internal(InternalTarget::DataBus),
        WriteValue::U8(value),
    ));
}

/// Emit one memory byte write, bus latches included.
pub(super) fn write_memory(queue: &mut CommandQueue, address: u16, value: u8) {
    write_address_bus(queue, address);
    write_data_bus(queue, value);
    queue.enqueue(MachineCommand::write(
        WriteTarget::MemoryAddress(address),
        WriteValue::U8(value),
    ));
}

/// Spend the M-cycle that fetches `[HL]` onto the data bus and return the
/// fetched byte.
pub(super) fn dereference_hl_with_halt(queue: &mut CommandQueue, processor: &Processor) -> u8 {
    let address = processor.registers().read16(Register16::HL);
    let value = processor.memory().read(address);
    write_address_bus(queue, address);
    write_data_bus(queue, value);
    halt_cycle(queue);
    value
}

/// One decode cycle per operand byte: PC moves past the byte, the byte
/// lands in the instruction register, the cycle ends.
pub(super) fn emit_operand_decode(
    queue: &mut CommandQueue,
    processor: &Processor,
    instruction: &Instruction,
) {
    let pc = processor.registers().pc();
    let (low, high) = instruction.operand_bytes();
    let operand_bytes = match instruction.byte_length {
        2 => vec![instruction.operand8()],
        3 => vec![low, high],
        _ => vec![],
    };
    for (index, byte) in operand_bytes.into_iter().enumerate() {
        write_pc(queue, pc.wrapping_add(2 + index as u16));
        write_ir(queue, byte);
        halt_cycle(queue);
    }
}

/// Resolve a param to its unsigned value.
///
/// With `skip_deref` a pointer param resolves to its effective address
/// instead of the byte behind it; this is how write paths obtain their
/// target address. 8-bit pointer bases address into the high page.
pub(super) fn resolve_unsigned(
    param: &Param,
    processor: &Processor,
    skip_deref: bool,
) -> Result<u16, CoreError> {
    let (base, is_byte_base) = match param.value {
        ParamValue::Reg8(register) => (processor.registers().read8(register) as u16, true),
        ParamValue::Reg16(register) => (processor.registers().read16(register), false),
        ParamValue::U8(value) => (value as u16, true),
        ParamValue::U16(value) => (value, false),
        // The unsigned view; callers doing signed sums read the param
        // directly instead.
        ParamValue::I8(value) => (value as u8 as u16, true),
    };
    if !param.pointer {
        return Ok(base);
    }
    let address = if is_byte_base { HIGH_PAGE | base } else { base };
    if skip_deref {
        Ok(address)
    } else {
        Ok(processor.memory().read(address) as u16)
    }
}

/// A 16-bit param split into its high and low byte-sized halves.
pub(super) struct ExplodedParam {
    pub higher: Param,
    pub lower: Param,
}

/// Split a compound param into two byte params. Register pairs split into
/// their component registers; SP and immediates split by value.
pub(super) fn explode_param(
    param: &Param,
    processor: &Processor,
) -> Result<ExplodedParam, CoreError> {
    match param.value {
        ParamValue::Reg16(Register16::BC) => Ok(ExplodedParam {
            higher: Param::reg8(Register8::B),
            lower: Param::reg8(Register8::C),
        }),
        ParamValue::Reg16(Register16::DE) => Ok(ExplodedParam {
            higher: Param::reg8(Register8::D),
            lower: Param::reg8(Register8::E),
        }),
        ParamValue::Reg16(Register16::HL) => Ok(ExplodedParam {
            higher: Param::reg8(Register8::H),
            lower: Param::reg8(Register8::L),
        }),
        ParamValue::Reg16(Register16::SP) => {
            let value = processor.registers().sp();
            Ok(ExplodedParam {
                higher: Param::u8((value >> 8) as u8),
                lower: Param::u8((value & 0xFF) as u8),
            })
        }
        ParamValue::U16(value) => Ok(ExplodedParam {
            higher: Param::u8((value >> 8) as u8),
            lower: Param::u8((value & 0xFF) as u8),
        }),
        _ => Err(CoreError::ParamShapeMismatch),
    }
}
