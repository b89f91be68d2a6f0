//! The structured instruction record produced by the tokenizer.
//!
//! Every decoded instruction carries its raw machine code (right-justified),
//! its byte length, its M-cycle duration for the taken path, and a params
//! variant keyed by the opcode family. The variants are exhaustive enums so
//! an ill-formed family/operand pairing cannot be built.

use std::fmt;

use crate::registers::{Register8, Register16};

/// A single operand. `pointer` means the operand names the memory cell (or
/// little-endian word, depending on the instruction) addressed by the value,
/// not the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub pointer: bool,
    pub value: ParamValue,
}

/// The value half of a `Param`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue {
    Reg8(Register8),
    Reg16(Register16),
    U8(u8),
    U16(u16),
    I8(i8),
}

impl Param {
    pub const fn reg8(register: Register8) -> Self {
        Param {
            pointer: false,
            value: ParamValue::Reg8(register),
        }
    }

    pub const fn reg16(register: Register16) -> Self {
        Param {
            pointer: false,
            value: ParamValue::Reg16(register),
        }
    }

    pub const fn reg16_pointer(register: Register16) -> Self {
        Param {
            pointer: true,
            value: ParamValue::Reg16(register),
        }
    }

    pub const fn u8(value: u8) -> Self {
        Param {
            pointer: false,
            value: ParamValue::U8(value),
        }
    }

    pub const fn u16(value: u16) -> Self {
        Param {
            pointer: false,
            value: ParamValue::U16(value),
        }
    }

    pub const fn i8(value: i8) -> Self {
        Param {
            pointer: false,
            value: ParamValue::I8(value),
        }
    }

    pub const fn pointer(mut self) -> Self {
        self.pointer = true;
        self
    }

    /// True for the `[HL]` pseudo-operand.
    pub fn is_hl_pointer(&self) -> bool {
        self.pointer && self.value == ParamValue::Reg16(Register16::HL)
    }

    /// True when the named location holds a byte: any pointer, or an 8-bit
    /// register.
    pub fn holds_byte(&self) -> bool {
        self.pointer || matches!(self.value, ParamValue::Reg8(_))
    }
}

// --- Load ---

/// Side effect some loads perform after the transfer proper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostLoad {
    #[default]
    None,
    IncrementIndirectSource,
    DecrementIndirectSource,
    IncrementIndirectDestination,
    DecrementIndirectDestination,
    /// The SP + signed payload sum of `LD HL, SP+s8`.
    SignedPayloadSum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadParams {
    pub source: Param,
    pub dest: Param,
    pub post_load: PostLoad,
    /// Signed payload, present only for the SP+s8 form.
    pub aux_offset: Option<i8>,
}

// --- Arithmetic ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Or,
    Xor,
    Cp,
    Inc,
    Dec,
    Daa,
    Cpl,
    Scf,
    Ccf,
}

impl ArithmeticOp {
    /// Operations that set the subtract flag.
    pub fn is_subtraction(self) -> bool {
        matches!(
            self,
            ArithmeticOp::Sub | ArithmeticOp::Sbc | ArithmeticOp::Cp | ArithmeticOp::Dec
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticParams {
    pub op: ArithmeticOp,
    /// First operand; also the destination for everything except `Cp`.
    pub dest_or_first: Param,
    pub source_or_second: Param,
}

// --- Rotate / shift ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotShiftOp {
    Rotate,
    ShiftArithmetic,
    Swap,
    ShiftLogical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotShiftParams {
    pub op: RotShiftOp,
    pub direction: Direction,
    /// Rotate through the carry flag (RL/RR and the 1-byte RLA/RRA).
    pub through_carry: bool,
    /// The 1-byte accumulator rotates force Z to zero.
    pub set_flags_to_zero: bool,
    pub target: Param,
}

// --- Bitwise ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitwiseOp {
    Bit,
    Set,
    Res,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitwiseParams {
    pub op: BitwiseOp,
    pub bit_index: u8,
    pub target: Param,
}

// --- Jump ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpType {
    Jump,
    Call,
    Ret,
    Rst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    None,
    Zero,
    NotZero,
    Carry,
    NotCarry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpParams {
    pub kind: JumpType,
    pub condition: JumpCondition,
    pub is_conditional: bool,
    pub is_relative: bool,
    /// RETI re-enables interrupts on the way out.
    pub enable_interrupts: bool,
    /// Target address, signed offset, or register, depending on the form.
    pub param: Param,
}

// --- CPU control ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemOp {
    Nop,
    Halt,
    Stop,
    DisableInterrupts,
    EnableInterrupts,
}

// --- The instruction record ---

/// Family tag plus the family's operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    Load(LoadParams),
    Arithmetic(ArithmeticParams),
    RotShift(RotShiftParams),
    Bitwise(BitwiseParams),
    Jump(JumpParams),
    CpuControl(SystemOp),
}

/// One decoded instruction. Lives for a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Raw opcode + operand bytes, right-justified. For a two byte
    /// instruction the opcode sits at bits 15..8, for three bytes at 23..16.
    pub original_machine_code: u32,
    pub byte_length: u8,
    /// M-cycles for the taken path; the parser gates the not-taken count.
    pub duration_in_clock_cycles: u8,
    pub kind: InstructionKind,
}

impl Instruction {
    /// The first opcode byte (0xCB for the prefixed page).
    pub fn opcode(&self) -> u8 {
        let shift = 8 * (self.byte_length as u32 - 1);
        ((self.original_machine_code >> shift) & 0xFF) as u8
    }

    pub fn is_cb_prefixed(&self) -> bool {
        self.byte_length == 2 && self.opcode() == 0xCB
    }

    /// Single operand byte of a two byte instruction.
    pub fn operand8(&self) -> u8 {
        (self.original_machine_code & 0xFF) as u8
    }

    /// Operand bytes of a three byte instruction in memory order.
    pub fn operand_bytes(&self) -> (u8, u8) {
        (
            ((self.original_machine_code >> 8) & 0xFF) as u8,
            (self.original_machine_code & 0xFF) as u8,
        )
    }

    /// Little-endian 16-bit immediate of a three byte instruction.
    pub fn operand16(&self) -> u16 {
        let (low, high) = self.operand_bytes();
        u16::from_le_bytes([low, high])
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = match &self.kind {
            InstructionKind::Load(_) => "LD",
            InstructionKind::Arithmetic(params) => match params.op {
                ArithmeticOp::Add => "ADD",
                ArithmeticOp::Adc => "ADC",
                ArithmeticOp::Sub => "SUB",
                ArithmeticOp::Sbc => "SBC",
                ArithmeticOp::And => "AND",
                ArithmeticOp::Or => "OR",
                ArithmeticOp::Xor => "XOR",
                ArithmeticOp::Cp => "CP",
                ArithmeticOp::Inc => "INC",
                ArithmeticOp::Dec => "DEC",
                ArithmeticOp::Daa => "DAA",
                ArithmeticOp::Cpl => "CPL",
                ArithmeticOp::Scf => "SCF",
                ArithmeticOp::Ccf => "CCF",
            },
            InstructionKind::RotShift(params) => match (params.op, params.direction) {
                (RotShiftOp::Swap, _) => "SWAP",
                (RotShiftOp::ShiftLogical, _) => "SRL",
                (RotShiftOp::ShiftArithmetic, Direction::Left) => "SLA",
                (RotShiftOp::ShiftArithmetic, Direction::Right) => "SRA",
                (RotShiftOp::Rotate, Direction::Left) if params.through_carry => "RL",
                (RotShiftOp::Rotate, Direction::Left) => "RLC",
                (RotShiftOp::Rotate, Direction::Right) if params.through_carry => "RR",
                (RotShiftOp::Rotate, Direction::Right) => "RRC",
            },
            InstructionKind::Bitwise(params) => match params.op {
                BitwiseOp::Bit => "BIT",
                BitwiseOp::Set => "SET",
                BitwiseOp::Res => "RES",
            },
            InstructionKind::Jump(params) => match params.kind {
                JumpType::Jump if params.is_relative => "JR",
                JumpType::Jump => "JP",
                JumpType::Call => "CALL",
                JumpType::Ret if params.enable_interrupts => "RETI",
                JumpType::Ret => "RET",
                JumpType::Rst => "RST",
            },
            InstructionKind::CpuControl(op) => match op {
                SystemOp::Nop => "NOP",
                SystemOp::Halt => "HALT",
                SystemOp::Stop => "STOP",
                SystemOp::DisableInterrupts => "DI",
                SystemOp::EnableInterrupts => "EI",
            },
        };
        write!(
            f,
            "{} ({:#08X}, {} bytes, {} cycles)",
            family, self.original_machine_code, self.byte_length, self.duration_in_clock_cycles
        )
    }
}
