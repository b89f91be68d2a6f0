//! Lookup data driving the tokenizer.
//!
//! Byte lengths come from two 64-entry tables (everything between 0x40 and
//! 0xBF is a single byte). Family and sub-family detection is data too: a
//! list of mask/expected pairs walked in order, the first hit winning.

use lazy_static::lazy_static;

use crate::instruction::Param;
use crate::registers::{Register8, Register16};

lazy_static! {
    /// Byte lengths for opcodes 0x00..=0x3F.
    pub static ref PRE_0X40_BYTE_LENGTH: [u8; 0x40] = build_pre_0x40_table();
    /// Byte lengths for opcodes 0xC0..=0xFF, indexed by `opcode - 0xC0`.
    pub static ref POST_0XBF_BYTE_LENGTH: [u8; 0x40] = build_post_0xbf_table();
}

fn build_pre_0x40_table() -> [u8; 0x40] {
    let mut table = [1u8; 0x40];
    // LD r16,d16 and LD (a16),SP carry a 16-bit immediate.
    for opcode in [0x01usize, 0x11, 0x21, 0x31, 0x08] {
        table[opcode] = 3;
    }
    // LD r,d8 plus the relative jumps carry one operand byte.
    for opcode in [
        0x06usize, 0x0E, 0x16, 0x1E, 0x26, 0x2E, 0x36, 0x3E, 0x18, 0x20, 0x28, 0x30, 0x38,
    ] {
        table[opcode] = 2;
    }
    table
}

fn build_post_0xbf_table() -> [u8; 0x40] {
    let mut table = [1u8; 0x40];
    for opcode in [
        0xC2usize, 0xC3, 0xC4, 0xCA, 0xCC, 0xCD, 0xD2, 0xD4, 0xDA, 0xDC, 0xEA, 0xFA,
    ] {
        table[opcode - 0xC0] = 3;
    }
    for opcode in [
        0xC6usize, 0xCB, 0xCE, 0xD6, 0xDE, 0xE0, 0xE6, 0xE8, 0xEE, 0xF0, 0xF6, 0xF8, 0xFE,
    ] {
        table[opcode - 0xC0] = 2;
    }
    table
}

/// Byte length for an opcode, CB prefix excluded (the caller short-circuits
/// that to 2 before consulting the tables).
pub fn byte_length_of(opcode: u8) -> u8 {
    if opcode < 0x40 {
        PRE_0X40_BYTE_LENGTH[opcode as usize]
    } else if opcode >= 0xC0 {
        POST_0XBF_BYTE_LENGTH[(opcode - 0xC0) as usize]
    } else {
        1
    }
}

/// One sub-family detection rule: the sub-family matches when
/// `opcode & mask == expected`.
pub struct SubtypeTest<T> {
    pub mask: u8,
    pub expected: u8,
    pub subtype: T,
}

/// Walk a rule list in order and return the first matching sub-family.
pub fn match_subtype<T: Copy>(opcode: u8, tests: &[SubtypeTest<T>]) -> Option<T> {
    tests
        .iter()
        .find(|test| opcode & test.mask == test.expected)
        .map(|test| test.subtype)
}

/// The canonical 8-bit register sequence used by every three-bit register
/// slot in the opcode map. Index 6 is the `[HL]` pseudo-operand.
const ORDERED_REGISTERS_8: [Register8; 8] = [
    Register8::B,
    Register8::C,
    Register8::D,
    Register8::E,
    Register8::H,
    Register8::L,
    Register8::A, // placeholder, index 6 resolves to [HL] instead
    Register8::A,
];

/// Decode a three-bit register slot. Index 6 yields the dereferenced HL
/// pointer, everything else a plain 8-bit register.
pub fn register8_param(index: u8) -> Param {
    if index == 6 {
        Param::reg16_pointer(Register16::HL)
    } else {
        Param::reg8(ORDERED_REGISTERS_8[index as usize])
    }
}

/// Decode a two-bit 16-bit register slot. The fourth entry differs by
/// family: SP for arithmetic and immediate loads, AF for the stack pairs,
/// HL for the indirect load block.
pub fn register16_param(index: u8, pointer: bool, last: Register16) -> Param {
    debug_assert!(index <= 3);
    let register = match index {
        0 => Register16::BC,
        1 => Register16::DE,
        2 => Register16::HL,
        _ => last,
    };
    let param = Param::reg16(register);
    if pointer { param.pointer() } else { param }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::ParamValue;

    #[test]
    fn byte_lengths_cover_the_main_page() {
        assert_eq!(byte_length_of(0x00), 1); // NOP
        assert_eq!(byte_length_of(0x06), 2); // LD B, d8
        assert_eq!(byte_length_of(0x01), 3); // LD BC, d16
        assert_eq!(byte_length_of(0x08), 3); // LD (a16), SP
        assert_eq!(byte_length_of(0x20), 2); // JR NZ
        assert_eq!(byte_length_of(0x41), 1); // LD B, C
        assert_eq!(byte_length_of(0x80), 1); // ADD A, B
        assert_eq!(byte_length_of(0xC3), 3); // JP a16
        assert_eq!(byte_length_of(0xCD), 3); // CALL a16
        assert_eq!(byte_length_of(0xE0), 2); // LDH (a8), A
        assert_eq!(byte_length_of(0xE8), 2); // ADD SP, s8
        assert_eq!(byte_length_of(0xE9), 1); // JP HL
        assert_eq!(byte_length_of(0xFA), 3); // LD A, (a16)
        assert_eq!(byte_length_of(0xFE), 2); // CP d8
    }

    #[test]
    fn register_slot_six_is_the_hl_pointer() {
        assert!(register8_param(6).is_hl_pointer());
        assert_eq!(
            register8_param(7).value,
            ParamValue::Reg8(Register8::A)
        );
        assert_eq!(
            register8_param(0).value,
            ParamValue::Reg8(Register8::B)
        );
    }

    #[test]
    fn register16_slot_last_entry_is_family_dependent() {
        assert_eq!(
            register16_param(3, false, Register16::SP).value,
            ParamValue::Reg16(Register16::SP)
        );
        assert_eq!(
            register16_param(3, false, Register16::AF).value,
            ParamValue::Reg16(Register16::AF)
        );
        assert_eq!(
            register16_param(1, true, Register16::SP).value,
            ParamValue::Reg16(Register16::DE)
        );
        assert!(register16_param(1, true, Register16::SP).pointer);
    }

    #[test]
    fn subtype_matching_takes_the_first_hit() {
        #[derive(Clone, Copy, PartialEq, Debug)]
        enum Fam {
            A,
            B,
        }
        let tests = [
            SubtypeTest {
                mask: 0xF0,
                expected: 0x40,
                subtype: Fam::A,
            },
            SubtypeTest {
                mask: 0xC0,
                expected: 0x40,
                subtype: Fam::B,
            },
        ];
        assert_eq!(match_subtype(0x45, &tests), Some(Fam::A));
        assert_eq!(match_subtype(0x55, &tests), Some(Fam::B));
        assert_eq!(match_subtype(0xC5, &tests), None);
    }
}
