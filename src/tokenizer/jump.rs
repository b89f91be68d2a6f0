//! Decoding for jumps, calls, returns and resets.

use super::tables::{self, SubtypeTest};
use crate::bits;
use crate::instruction::{
    Instruction, InstructionKind, JumpCondition, JumpParams, JumpType, Param,
};
use crate::registers::Register16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JumpSubtype {
    JrUnconditional,
    JrConditional,
    JpUnconditional,
    JpConditional,
    CallUnconditional,
    CallConditional,
    RetUnconditional,
    RetConditional,
    Rst,
    JpHl,
}

const JUMP_TESTS: [SubtypeTest<JumpSubtype>; 10] = [
    SubtypeTest {
        mask: 0xFF,
        expected: 0x18,
        subtype: JumpSubtype::JrUnconditional,
    },
    SubtypeTest {
        mask: 0xE7,
        expected: 0x20,
        subtype: JumpSubtype::JrConditional,
    },
    SubtypeTest {
        mask: 0xFF,
        expected: 0xC3,
        subtype: JumpSubtype::JpUnconditional,
    },
    SubtypeTest {
        mask: 0xE7,
        expected: 0xC2,
        subtype: JumpSubtype::JpConditional,
    },
    SubtypeTest {
        mask: 0xFF,
        expected: 0xCD,
        subtype: JumpSubtype::CallUnconditional,
    },
    SubtypeTest {
        mask: 0xE7,
        expected: 0xC4,
        subtype: JumpSubtype::CallConditional,
    },
    SubtypeTest {
        mask: 0xEF,
        expected: 0xC9,
        subtype: JumpSubtype::RetUnconditional,
    },
    SubtypeTest {
        mask: 0xE7,
        expected: 0xC0,
        subtype: JumpSubtype::RetConditional,
    },
    SubtypeTest {
        mask: 0xC7,
        expected: 0xC7,
        subtype: JumpSubtype::Rst,
    },
    SubtypeTest {
        mask: 0xFF,
        expected: 0xE9,
        subtype: JumpSubtype::JpHl,
    },
];

/// Bits 4..3 of every conditional form select the condition.
fn condition_of(opcode: u8) -> JumpCondition {
    const CONDITIONS: [JumpCondition; 4] = [
        JumpCondition::NotZero,
        JumpCondition::Zero,
        JumpCondition::NotCarry,
        JumpCondition::Carry,
    ];
    CONDITIONS[((opcode >> 3) & 0b11) as usize]
}

/// Tokenize a jump, or report that the opcode is not one.
pub(super) fn tokenize(machine_code: u32, byte_length: u8, opcode: u8) -> Option<Instruction> {
    let subtype = tables::match_subtype(opcode, &JUMP_TESTS)?;

    let operand8 = (machine_code & 0xFF) as u8;
    let operand16 = u16::from_le_bytes([
        ((machine_code >> 8) & 0xFF) as u8,
        (machine_code & 0xFF) as u8,
    ]);

    let relative_target = Param::i8(bits::signed8(operand8));
    let absolute_target = Param::u16(operand16);

    let (kind, is_conditional, is_relative, param, duration) = match subtype {
        JumpSubtype::JrUnconditional => (JumpType::Jump, false, true, relative_target, 3),
        JumpSubtype::JrConditional => (JumpType::Jump, true, true, relative_target, 3),
        JumpSubtype::JpUnconditional => (JumpType::Jump, false, false, absolute_target, 4),
        JumpSubtype::JpConditional => (JumpType::Jump, true, false, absolute_target, 4),
        JumpSubtype::CallUnconditional => (JumpType::Call, false, false, absolute_target, 6),
        JumpSubtype::CallConditional => (JumpType::Call, true, false, absolute_target, 6),
        JumpSubtype::RetUnconditional => (
            JumpType::Ret,
            false,
            false,
            Param::reg16_pointer(Register16::SP),
            4,
        ),
        JumpSubtype::RetConditional => (
            JumpType::Ret,
            true,
            false,
            Param::reg16_pointer(Register16::SP),
            5,
        ),
        JumpSubtype::Rst => {
            // Bits 5..3 select one of the eight reset vectors.
            let vector = (((opcode >> 3) & 0b111) as u16) * 0x08;
            (JumpType::Rst, false, false, Param::u16(vector), 4)
        }
        JumpSubtype::JpHl => (
            JumpType::Jump,
            false,
            false,
            Param::reg16(Register16::HL),
            1,
        ),
    };

    let condition = if is_conditional {
        condition_of(opcode)
    } else {
        JumpCondition::None
    };

    let params = JumpParams {
        kind,
        condition,
        is_conditional,
        is_relative,
        // RETI is the only interrupt-enabling return.
        enable_interrupts: opcode == 0xD9,
        param,
    };

    Some(Instruction {
        original_machine_code: machine_code,
        byte_length,
        duration_in_clock_cycles: duration,
        kind: InstructionKind::Jump(params),
    })
}
