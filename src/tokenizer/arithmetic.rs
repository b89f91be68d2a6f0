//! Decoding for the 8- and 16-bit arithmetic family.

use super::tables::{self, SubtypeTest};
use crate::bits;
use crate::instruction::{
    ArithmeticOp, ArithmeticParams, Instruction, InstructionKind, Param,
};
use crate::registers::Register16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithmeticSubtype {
    /// The 0x80..0xBF ALU block.
    Mainline,
    /// INC r / DEC r, `[HL]` included.
    IncDec8,
    /// ALU A, d8.
    Direct8,
    /// DAA, CPL, SCF, CCF.
    Accumulator,
    /// ADD HL, r16.
    Add16,
    /// INC r16 / DEC r16.
    IncDec16,
    /// ADD SP, s8.
    SpSignedSum,
}

const ARITHMETIC_TESTS: [SubtypeTest<ArithmeticSubtype>; 7] = [
    SubtypeTest {
        mask: 0b1100_0000,
        expected: 0b1000_0000,
        subtype: ArithmeticSubtype::Mainline,
    },
    SubtypeTest {
        mask: 0b1100_0110,
        expected: 0b0000_0100,
        subtype: ArithmeticSubtype::IncDec8,
    },
    SubtypeTest {
        mask: 0b1100_0111,
        expected: 0b1100_0110,
        subtype: ArithmeticSubtype::Direct8,
    },
    SubtypeTest {
        mask: 0b1110_0111,
        expected: 0b0010_0111,
        subtype: ArithmeticSubtype::Accumulator,
    },
    SubtypeTest {
        mask: 0b1100_1111,
        expected: 0b0000_1001,
        subtype: ArithmeticSubtype::Add16,
    },
    SubtypeTest {
        mask: 0b1100_0111,
        expected: 0b0000_0011,
        subtype: ArithmeticSubtype::IncDec16,
    },
    SubtypeTest {
        mask: 0b1111_1111,
        expected: 0b1110_1000,
        subtype: ArithmeticSubtype::SpSignedSum,
    },
];

/// The eight mainline ALU operations in opcode order, one per row of eight.
const MAINLINE_OPS: [ArithmeticOp; 8] = [
    ArithmeticOp::Add,
    ArithmeticOp::Adc,
    ArithmeticOp::Sub,
    ArithmeticOp::Sbc,
    ArithmeticOp::And,
    ArithmeticOp::Xor,
    ArithmeticOp::Or,
    ArithmeticOp::Cp,
];

fn mainline_params(opcode: u8) -> ArithmeticParams {
    ArithmeticParams {
        op: MAINLINE_OPS[((opcode >> 3) & 0b111) as usize],
        dest_or_first: tables::register8_param(7),
        source_or_second: tables::register8_param(opcode & 0b111),
    }
}

fn inc_dec8_params(opcode: u8) -> ArithmeticParams {
    let op = if opcode & 1 == 0 {
        ArithmeticOp::Inc
    } else {
        ArithmeticOp::Dec
    };
    ArithmeticParams {
        op,
        dest_or_first: tables::register8_param((opcode >> 3) & 0b111),
        source_or_second: Param::u8(1),
    }
}

fn direct8_params(opcode: u8, operand: u8) -> ArithmeticParams {
    ArithmeticParams {
        op: MAINLINE_OPS[((opcode >> 3) & 0b111) as usize],
        dest_or_first: tables::register8_param(7),
        source_or_second: Param::u8(operand),
    }
}

fn accumulator_params(opcode: u8) -> ArithmeticParams {
    const OPS: [ArithmeticOp; 4] = [
        ArithmeticOp::Daa,
        ArithmeticOp::Cpl,
        ArithmeticOp::Scf,
        ArithmeticOp::Ccf,
    ];
    ArithmeticParams {
        op: OPS[((opcode >> 3) & 0b11) as usize],
        dest_or_first: tables::register8_param(7),
        source_or_second: tables::register8_param(7),
    }
}

fn add16_params(opcode: u8) -> ArithmeticParams {
    ArithmeticParams {
        op: ArithmeticOp::Add,
        dest_or_first: tables::register16_param(2, false, Register16::SP),
        source_or_second: tables::register16_param((opcode >> 4) & 0b11, false, Register16::SP),
    }
}

fn inc_dec16_params(opcode: u8) -> ArithmeticParams {
    let op = if opcode & 0b1000 == 0 {
        ArithmeticOp::Inc
    } else {
        ArithmeticOp::Dec
    };
    ArithmeticParams {
        op,
        dest_or_first: tables::register16_param((opcode >> 4) & 0b11, false, Register16::SP),
        source_or_second: Param::u8(1),
    }
}

fn sp_signed_sum_params(operand: u8) -> ArithmeticParams {
    ArithmeticParams {
        op: ArithmeticOp::Add,
        dest_or_first: Param::reg16(Register16::SP),
        source_or_second: Param::i8(bits::signed8(operand)),
    }
}

fn duration_of(params: &ArithmeticParams, subtype: ArithmeticSubtype, byte_length: u8) -> u8 {
    let mut cycles = 1u8;
    if params.source_or_second.pointer {
        cycles += 1;
    }
    if params.dest_or_first.pointer && subtype == ArithmeticSubtype::IncDec8 {
        // A read-modify-write on [HL].
        cycles = 3;
    }
    if byte_length == 2 {
        cycles += 1;
    }
    if matches!(
        subtype,
        ArithmeticSubtype::Add16 | ArithmeticSubtype::IncDec16
    ) {
        cycles += 1;
    }
    if subtype == ArithmeticSubtype::SpSignedSum {
        cycles = 4;
    }
    cycles
}

/// Tokenize an arithmetic instruction, or report that the opcode is not one.
pub(super) fn tokenize(machine_code: u32, byte_length: u8, opcode: u8) -> Option<Instruction> {
    let subtype = tables::match_subtype(opcode, &ARITHMETIC_TESTS)?;
    let operand8 = (machine_code & 0xFF) as u8;

    let params = match subtype {
        ArithmeticSubtype::Mainline => mainline_params(opcode),
        ArithmeticSubtype::IncDec8 => inc_dec8_params(opcode),
        ArithmeticSubtype::Direct8 => direct8_params(opcode, operand8),
        ArithmeticSubtype::Accumulator => accumulator_params(opcode),
        ArithmeticSubtype::Add16 => add16_params(opcode),
        ArithmeticSubtype::IncDec16 => inc_dec16_params(opcode),
        ArithmeticSubtype::SpSignedSum => sp_signed_sum_params(operand8),
    };

    Some(Instruction {
        original_machine_code: machine_code,
        byte_length,
        duration_in_clock_cycles: duration_of(&params, subtype, byte_length),
        kind: InstructionKind::Arithmetic(params),
    })
}
