//! Decoding for the 0xCB-prefixed page and the four 1-byte accumulator
//! rotates that share its semantics.

use super::tables;
use crate::instruction::{
    BitwiseOp, BitwiseParams, Direction, Instruction, InstructionKind, RotShiftOp, RotShiftParams,
};

/// The 1-byte rotates RLCA, RRCA, RLA, RRA (0x07, 0x0F, 0x17, 0x1F). They
/// decode like their CB cousins but always target A, run in one cycle and
/// force Z to zero.
pub(super) fn tokenize_accumulator_rotate(
    machine_code: u32,
    byte_length: u8,
    opcode: u8,
) -> Option<Instruction> {
    if opcode & 0b1110_0111 != 0b0000_0111 {
        return None;
    }
    let params = RotShiftParams {
        op: RotShiftOp::Rotate,
        direction: if opcode & 0x0F == 0x0F {
            Direction::Right
        } else {
            Direction::Left
        },
        // RLA/RRA rotate through the carry flag, RLCA/RRCA around it.
        through_carry: opcode & 0xF0 == 0x10,
        set_flags_to_zero: true,
        target: tables::register8_param(7),
    };
    Some(Instruction {
        original_machine_code: machine_code,
        byte_length,
        duration_in_clock_cycles: 1,
        kind: InstructionKind::RotShift(params),
    })
}

fn rot_shift_params(cb_opcode: u8) -> RotShiftParams {
    let op = match cb_opcode >> 4 {
        0 | 1 => RotShiftOp::Rotate,
        2 => RotShiftOp::ShiftArithmetic,
        // 0x30..0x37 swaps, 0x38..0x3F is the logical right shift.
        _ => {
            if cb_opcode & 0b1000 != 0 {
                RotShiftOp::ShiftLogical
            } else {
                RotShiftOp::Swap
            }
        }
    };
    RotShiftParams {
        op,
        // Bit 3 splits every row into its left and right half.
        direction: if cb_opcode & 0b1000 != 0 {
            Direction::Right
        } else {
            Direction::Left
        },
        // Only the RL/RR row rotates through carry.
        through_carry: cb_opcode >> 4 == 1,
        set_flags_to_zero: false,
        target: tables::register8_param(cb_opcode & 0b111),
    }
}

fn bitwise_params(cb_opcode: u8) -> BitwiseParams {
    const OPS: [BitwiseOp; 3] = [BitwiseOp::Bit, BitwiseOp::Res, BitwiseOp::Set];
    BitwiseParams {
        op: OPS[((cb_opcode >> 6) - 1) as usize],
        bit_index: (cb_opcode >> 3) & 0b111,
        target: tables::register8_param(cb_opcode & 0b111),
    }
}

fn duration_of(cb_opcode: u8) -> u8 {
    if cb_opcode & 0b111 == 6 {
        // [HL] forms pay for the read, and all but BIT for the write back.
        if (0x40..0x80).contains(&cb_opcode) {
            3
        } else {
            4
        }
    } else {
        2
    }
}

/// Tokenize an already length-normalised CB-prefixed instruction.
pub(super) fn tokenize_cb_prefixed(machine_code: u32) -> Instruction {
    let cb_opcode = (machine_code & 0xFF) as u8;
    let kind = if cb_opcode < 0x40 {
        InstructionKind::RotShift(rot_shift_params(cb_opcode))
    } else {
        InstructionKind::Bitwise(bitwise_params(cb_opcode))
    };
    Instruction {
        original_machine_code: machine_code,
        byte_length: 2,
        duration_in_clock_cycles: duration_of(cb_opcode),
        kind,
    }
}
