//! Decoding for the load family, the widest family in the opcode map.

use super::tables::{self, SubtypeTest};
use crate::bits;
use crate::instruction::{
    Instruction, InstructionKind, LoadParams, Param, ParamValue, PostLoad,
};
use crate::registers::{Register8, Register16};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadSubtype {
    /// LD r, r' for the 0x40..0x7F block.
    Mainline,
    /// LD r, d8.
    Direct8,
    /// LD (r16), A and LD A, (r16), post-increment forms included.
    Indirect16,
    /// The four high-page forms at 0xE0/0xE2/0xF0/0xF2.
    Ldh,
    /// LD (a16), A and LD A, (a16).
    Address16,
    /// LD (a16), SP.
    Address16Sp,
    /// LD r16, d16.
    Immediate16,
    /// PUSH r16 and POP r16.
    PushPop,
    /// LD HL, SP+s8 and LD SP, HL.
    SpHlBlock,
}

const LOAD_TESTS: [SubtypeTest<LoadSubtype>; 9] = [
    SubtypeTest {
        mask: 0b1100_0000,
        expected: 0b0100_0000,
        subtype: LoadSubtype::Mainline,
    },
    SubtypeTest {
        mask: 0b1100_0111,
        expected: 0b0000_0110,
        subtype: LoadSubtype::Direct8,
    },
    SubtypeTest {
        mask: 0b1100_0111,
        expected: 0b0000_0010,
        subtype: LoadSubtype::Indirect16,
    },
    SubtypeTest {
        mask: 0b1110_1101,
        expected: 0b1110_0000,
        subtype: LoadSubtype::Ldh,
    },
    SubtypeTest {
        mask: 0b1110_1111,
        expected: 0b1110_1010,
        subtype: LoadSubtype::Address16,
    },
    SubtypeTest {
        mask: 0b1111_1111,
        expected: 0b0000_1000,
        subtype: LoadSubtype::Address16Sp,
    },
    SubtypeTest {
        mask: 0b1100_1111,
        expected: 0b0000_0001,
        subtype: LoadSubtype::Immediate16,
    },
    SubtypeTest {
        mask: 0b1100_1011,
        expected: 0b1100_0001,
        subtype: LoadSubtype::PushPop,
    },
    SubtypeTest {
        mask: 0b1111_1110,
        expected: 0b1111_1000,
        subtype: LoadSubtype::SpHlBlock,
    },
];

/// Post-load side effects keyed directly by opcode.
fn post_load_of(opcode: u8) -> PostLoad {
    match opcode {
        0x22 => PostLoad::IncrementIndirectDestination,
        // The pushes walk the stack downward one byte per cycle.
        0x32 | 0xC5 | 0xD5 | 0xE5 | 0xF5 => PostLoad::DecrementIndirectDestination,
        // The pops walk it back up.
        0x2A | 0xC1 | 0xD1 | 0xE1 | 0xF1 => PostLoad::IncrementIndirectSource,
        0x3A => PostLoad::DecrementIndirectSource,
        0xF8 => PostLoad::SignedPayloadSum,
        _ => PostLoad::None,
    }
}

fn mainline_params(opcode: u8) -> (Param, Param) {
    // Bits 5..3 pick the destination, bits 2..0 the source.
    let dest = tables::register8_param((opcode >> 3) & 0b111);
    let source = tables::register8_param(opcode & 0b111);
    (source, dest)
}

fn direct8_params(opcode: u8, operand: u8) -> (Param, Param) {
    let dest = tables::register8_param((opcode >> 3) & 0b111);
    (Param::u8(operand), dest)
}

fn indirect16_params(opcode: u8) -> (Param, Param) {
    // 0xn2 stores A through the pair, 0xnA loads A from it. The fourth
    // slot is HL so the post-increment forms reuse the same decode.
    let pair = tables::register16_param((opcode >> 4) & 0b11, true, Register16::HL);
    let accumulator = Param::reg8(Register8::A);
    if (opcode & 0x0F) == 0x0A {
        (pair, accumulator)
    } else {
        (accumulator, pair)
    }
}

fn ldh_params(opcode: u8, operand: u8) -> (Param, Param) {
    let accumulator = Param::reg8(Register8::A);
    let c_pointer = Param::reg8(Register8::C).pointer();
    let high_page = Param::u8(operand).pointer();
    // Bit 4 picks the direction, bit 1 picks immediate vs C.
    let from_memory = opcode & 0x10 != 0;
    let through_c = opcode & 0x02 != 0;
    let memory_side = if through_c { c_pointer } else { high_page };
    if from_memory {
        (memory_side, accumulator)
    } else {
        (accumulator, memory_side)
    }
}

fn address16_params(opcode: u8, address: u16) -> (Param, Param) {
    let accumulator = Param::reg8(Register8::A);
    let pointer = Param::u16(address).pointer();
    if opcode == 0xFA {
        (pointer, accumulator)
    } else {
        (accumulator, pointer)
    }
}

fn address16_sp_params(address: u16) -> (Param, Param) {
    (
        Param::reg16(Register16::SP),
        Param::u16(address).pointer(),
    )
}

fn immediate16_params(opcode: u8, immediate: u16) -> (Param, Param) {
    let dest = tables::register16_param((opcode >> 4) & 0b11, false, Register16::SP);
    (Param::u16(immediate), dest)
}

fn push_pop_params(opcode: u8) -> (Param, Param) {
    let stack = Param::reg16_pointer(Register16::SP);
    let pair = tables::register16_param((opcode >> 4) & 0b11, false, Register16::AF);
    if opcode & 0b100 != 0 {
        // PUSH
        (pair, stack)
    } else {
        // POP
        (stack, pair)
    }
}

fn sp_hl_params(opcode: u8, operand: u8) -> (Param, Param, Option<i8>) {
    let stack_pointer = Param::reg16(Register16::SP);
    let hl = Param::reg16(Register16::HL);
    if opcode & 0x01 != 0 {
        // LD SP, HL
        (hl, stack_pointer, None)
    } else {
        // LD HL, SP+s8 carries the signed payload on the side.
        (stack_pointer, hl, Some(bits::signed8(operand)))
    }
}

/// Additive duration rule: one base cycle, one more per pointer operand,
/// one per immediate byte, with the stack and SP transfers special-cased.
fn duration_of(params: &LoadParams) -> u8 {
    let source = &params.source;
    let dest = &params.dest;
    let mut cycles = 1u8;

    if matches!(source.value, ParamValue::U8(_)) || matches!(dest.value, ParamValue::U8(_)) {
        cycles += 1;
    } else if matches!(source.value, ParamValue::U16(_)) || matches!(dest.value, ParamValue::U16(_))
    {
        cycles += 2;
    }
    if dest.pointer {
        cycles += 1;
    }
    if source.pointer {
        cycles += 1;
    }

    let source_is_pair = matches!(source.value, ParamValue::Reg16(_));
    let dest_is_pair = matches!(dest.value, ParamValue::Reg16(_));
    let has_post_load = params.post_load != PostLoad::None;

    if source.pointer && dest_is_pair && has_post_load {
        // POP walks SP one increment per cycle.
        cycles = 3;
    } else if dest.pointer && source_is_pair && has_post_load {
        // PUSH spends an internal cycle before the two stack writes.
        cycles = 4;
    }

    // Plain SP reads and writes cost an internal transfer cycle, unless the
    // value arrives as an immediate.
    let touches_bare_sp = (dest.value == ParamValue::Reg16(Register16::SP) && !dest.pointer)
        || (source.value == ParamValue::Reg16(Register16::SP) && !source.pointer);
    if touches_bare_sp
        && !matches!(source.value, ParamValue::U16(_))
        && !matches!(dest.value, ParamValue::U16(_))
    {
        cycles += 1;
    }

    if params.post_load == PostLoad::SignedPayloadSum {
        cycles += 1;
    }

    // LD (a16), SP performs two operand fetches and two memory writes.
    if dest.pointer
        && matches!(dest.value, ParamValue::U16(_))
        && source.value == ParamValue::Reg16(Register16::SP)
    {
        cycles = 5;
    }

    cycles
}

/// Tokenize a load, or report that the opcode is not one.
pub(super) fn tokenize(machine_code: u32, byte_length: u8, opcode: u8) -> Option<Instruction> {
    let subtype = tables::match_subtype(opcode, &LOAD_TESTS)?;

    let operand8 = (machine_code & 0xFF) as u8;
    let operand16 = u16::from_le_bytes([
        ((machine_code >> 8) & 0xFF) as u8,
        (machine_code & 0xFF) as u8,
    ]);

    let mut aux_offset = None;
    let (source, dest) = match subtype {
        LoadSubtype::Mainline => mainline_params(opcode),
        LoadSubtype::Direct8 => direct8_params(opcode, operand8),
        LoadSubtype::Indirect16 => indirect16_params(opcode),
        LoadSubtype::Ldh => ldh_params(opcode, operand8),
        LoadSubtype::Address16 => address16_params(opcode, operand16),
        LoadSubtype::Address16Sp => address16_sp_params(operand16),
        LoadSubtype::Immediate16 => immediate16_params(opcode, operand16),
        LoadSubtype::PushPop => push_pop_params(opcode),
        LoadSubtype::SpHlBlock => {
            let (source, dest, offset) = sp_hl_params(opcode, operand8);
            aux_offset = offset;
            (source, dest)
        }
    };

    let params = LoadParams {
        source,
        dest,
        post_load: post_load_of(opcode),
        aux_offset,
    };
    let duration = duration_of(&params);

    Some(Instruction {
        original_machine_code: machine_code,
        byte_length,
        duration_in_clock_cycles: duration,
        kind: InstructionKind::Load(params),
    })
}
