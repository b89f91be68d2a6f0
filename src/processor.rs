//! The processor shell tying the pipeline together.
//!
//! Owns the register file, the memory, the execution mode and the internal
//! bus latches. `step` runs one instruction through tokenize, parse and
//! invoke, then settles any deferred interrupt-enable transition.

use crate::command::{InternalTarget, WriteCommand, WriteTarget, WriteValue};
use crate::error::CoreError;
use crate::instruction::{InstructionKind, SystemOp};
use crate::invoker;
use crate::memory::Memory;
use crate::parser;
use crate::registers::{Register16, Registers};
use crate::tokenizer;

/// Where execution begins after the boot handshake hands control to the
/// cartridge.
pub const ROM_ENTRY_POINT: u16 = 0x0100;

/// Execution mode. The pending variants carry an interrupt-enable
/// transition that settles between instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessorMode {
    #[default]
    Normal,
    Halt,
    Stop,
    PendingIMEDisable,
    PendingIMEEnable,
}

/// The CPU core: registers, memory, mode, IME, plus the address/data bus
/// and instruction register latches the command stream writes through.
pub struct Processor {
    registers: Registers,
    memory: Memory,
    mode: ProcessorMode,
    ime: bool,
    address_bus: u16,
    data_bus: u8,
    instruction_register: u8,
}

impl Processor {
    /// A fresh core: zeroed registers and memory, PC at the ROM entry,
    /// interrupts enabled.
    pub fn new() -> Self {
        let mut registers = Registers::new();
        registers.write16(Register16::PC, ROM_ENTRY_POINT);
        Processor {
            registers,
            memory: Memory::new(),
            mode: ProcessorMode::Normal,
            ime: true,
            address_bus: 0,
            data_bus: 0,
            instruction_register: 0,
        }
    }

    // --- Accessors ---

    #[inline(always)]
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    #[inline(always)]
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    #[inline(always)]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    #[inline(always)]
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    #[inline(always)]
    pub fn ime(&self) -> bool {
        self.ime
    }

    #[inline(always)]
    pub fn get_mode(&self) -> ProcessorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ProcessorMode) {
        self.mode = mode;
    }

    /// Load a ROM image at the bottom of the address space.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), CoreError> {
        self.memory.write_buffer(0x0000, rom)?;
        log::debug!("loaded {} ROM bytes", rom.len());
        Ok(())
    }

    /// Three instruction-stream bytes at PC, clamped at the memory edge.
    fn fetch_window(&self) -> u32 {
        let pc = self.registers.pc();
        tokenizer::pack_window(
            self.memory.read(pc),
            self.memory.read(pc.saturating_add(1)),
            self.memory.read(pc.saturating_add(2)),
        )
    }

    /// Execute one instruction and return the M-cycles it consumed.
    ///
    /// A halted or stopped core idles for one cycle per call; waking it is
    /// the interrupt scheduler's business, which lives outside this core.
    pub fn step(&mut self) -> Result<u8, CoreError> {
        if matches!(self.mode, ProcessorMode::Halt | ProcessorMode::Stop) {
            return Ok(1);
        }

        // A transition latched by the previous instruction settles after
        // this one completes.
        let pending = self.mode;

        let window = self.fetch_window();
        let instruction = tokenizer::tokenize(window).inspect_err(|error| {
            log::error!(
                "step failed at {:#06X}: {}",
                self.registers.pc(),
                error
            );
        })?;
        let mut queue = parser::parse(self, &instruction)?;
        let cycles = invoker::invoke(self, &mut queue)?;

        let executed_di = matches!(
            instruction.kind,
            InstructionKind::CpuControl(SystemOp::DisableInterrupts)
        );
        match pending {
            ProcessorMode::PendingIMEEnable => {
                // DI inside the deferral window wins over the enable.
                if !executed_di {
                    self.ime = true;
                }
                if self.mode == ProcessorMode::PendingIMEEnable {
                    self.mode = ProcessorMode::Normal;
                }
            }
            ProcessorMode::PendingIMEDisable => {
                self.ime = false;
                if self.mode == ProcessorMode::PendingIMEDisable {
                    self.mode = ProcessorMode::Normal;
                }
            }
            _ => {}
        }

        Ok(cycles)
    }

    // --- Command application (used by the invoker) ---

    /// Apply one write command. The value width must agree with the
    /// target; a mismatch means the parser emitted a malformed command.
    pub(crate) fn apply_write(&mut self, write: &WriteCommand) -> Result<(), CoreError> {
        match (write.target, write.value) {
            (WriteTarget::Register8(register), WriteValue::U8(value)) => {
                self.registers.write8(register, value);
            }
            (WriteTarget::Register16(register), WriteValue::U16(value)) => {
                self.registers.write16(register, value);
            }
            (WriteTarget::MemoryAddress(address), WriteValue::U8(value)) => {
                self.memory.write(address, value);
            }
            (WriteTarget::Flag(flag), WriteValue::U8(value)) => {
                self.registers.flag_set(flag, value != 0);
            }
            (WriteTarget::Ime, WriteValue::U8(value)) => {
                self.ime = value != 0;
            }
            (WriteTarget::Internal(InternalTarget::ProgramCounter), WriteValue::U16(value)) => {
                self.registers.write16(Register16::PC, value);
            }
            (WriteTarget::Internal(InternalTarget::InstructionRegister), WriteValue::U8(value)) => {
                self.instruction_register = value;
            }
            (WriteTarget::Internal(InternalTarget::AddressBus), WriteValue::U16(value)) => {
                self.address_bus = value;
            }
            (WriteTarget::Internal(InternalTarget::DataBus), WriteValue::U8(value)) => {
                self.data_bus = value;
            }
            _ => return Err(CoreError::ParamShapeMismatch),
        }
        Ok(())
    }

    /// Apply a mode-driving halt command.
    pub(crate) fn apply_halt_op(&mut self, op: SystemOp) {
        self.mode = match op {
            SystemOp::Nop => ProcessorMode::Normal,
            SystemOp::Halt => ProcessorMode::Halt,
            SystemOp::Stop => ProcessorMode::Stop,
            SystemOp::DisableInterrupts => ProcessorMode::PendingIMEDisable,
            SystemOp::EnableInterrupts => ProcessorMode::PendingIMEEnable,
        };
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}
