//! End-to-end tests: full steps through tokenize, parse and invoke,
//! checked against the reference behaviour of the real CPU.

use opal::processor::{Processor, ProcessorMode, ROM_ENTRY_POINT};
use opal::registers::{Flag, Register8, Register16};
use opal::CoreError;

/// A fresh core with `bytes` placed at the entry point.
fn with_program(bytes: &[u8]) -> Processor {
    let mut processor = Processor::new();
    processor
        .memory_mut()
        .write_buffer(ROM_ENTRY_POINT, bytes)
        .unwrap();
    processor
}

#[test]
fn add_with_half_carry_and_carry() {
    let mut processor = with_program(&[0x80]); // ADD A, B
    processor.registers_mut().write8(Register8::A, 0xFA);
    processor.registers_mut().write8(Register8::B, 0x08);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 1);
    assert_eq!(processor.registers().read8(Register8::A), 0x02);
    assert_eq!(processor.registers().flags(), 0x30); // H and C
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 1);
}

#[test]
fn store_through_hl_with_post_decrement() {
    let mut processor = with_program(&[0x32]); // LD (HL-), A
    processor.registers_mut().write8(Register8::A, 0x42);
    processor.registers_mut().write16(Register16::HL, 0xC000);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 2);
    assert_eq!(processor.memory().read(0xC000), 0x42);
    assert_eq!(processor.registers().read16(Register16::HL), 0xBFFF);
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 1);
}

#[test]
fn relative_jump_not_taken() {
    let mut processor = with_program(&[0x20, 0x05]); // JR NZ, +5
    processor.registers_mut().flag_set(Flag::Z, true);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 2);
    assert_eq!(processor.registers().pc(), 0x0102);
}

#[test]
fn relative_jump_taken_backward() {
    let mut processor = with_program(&[0x20, 0xFD]); // JR NZ, -3
    processor.registers_mut().flag_set(Flag::Z, false);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 3);
    assert_eq!(processor.registers().pc(), 0x00FF);
}

#[test]
fn call_then_return_round_trip() {
    let mut processor = Processor::new();
    processor.registers_mut().write16(Register16::PC, 0x0200);
    processor.registers_mut().write16(Register16::SP, 0xFFFE);
    processor
        .memory_mut()
        .write_buffer(0x0200, &[0xCD, 0x34, 0x12])
        .unwrap();
    processor.memory_mut().write(0x1234, 0xC9); // RET

    let call_cycles = processor.step().unwrap();
    assert_eq!(call_cycles, 6);
    assert_eq!(processor.registers().pc(), 0x1234);
    assert_eq!(processor.registers().sp(), 0xFFFC);
    // The return address 0x0203 sits on the stack little-endian.
    assert_eq!(processor.memory().read(0xFFFC), 0x03);
    assert_eq!(processor.memory().read(0xFFFD), 0x02);

    let ret_cycles = processor.step().unwrap();
    assert_eq!(ret_cycles, 4);
    assert_eq!(processor.registers().pc(), 0x0203);
    assert_eq!(processor.registers().sp(), 0xFFFE);
    assert_eq!(call_cycles + ret_cycles, 10);
}

#[test]
fn cb_swap_nibbles() {
    let mut processor = with_program(&[0xCB, 0x37]); // SWAP A
    processor.registers_mut().write8(Register8::A, 0xAB);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 2);
    assert_eq!(processor.registers().read8(Register8::A), 0xBA);
    assert_eq!(processor.registers().flags(), 0x00);
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 2);
}

#[test]
fn cb_bit_probe_of_a_set_bit() {
    let mut processor = with_program(&[0xCB, 0x7C]); // BIT 7, H
    processor.registers_mut().write8(Register8::H, 0x80);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 2);
    assert_eq!(processor.registers().read8(Register8::H), 0x80);
    assert_eq!(processor.registers().flag_get(Flag::Z), 0);
    assert_eq!(processor.registers().flag_get(Flag::N), 0);
    assert_eq!(processor.registers().flag_get(Flag::H), 1);
    assert_eq!(processor.registers().flag_get(Flag::C), 0);
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 2);
}

// --- Beyond the reference scenarios ---

#[test]
fn halt_parks_the_core() {
    let mut processor = with_program(&[0x76, 0x00]);
    assert_eq!(processor.step().unwrap(), 1);
    assert_eq!(processor.get_mode(), ProcessorMode::Halt);
    let pc = processor.registers().pc();

    // Halted steps idle without fetching.
    for _ in 0..4 {
        assert_eq!(processor.step().unwrap(), 1);
        assert_eq!(processor.registers().pc(), pc);
    }

    // An external wake resumes execution.
    processor.set_mode(ProcessorMode::Normal);
    processor.step().unwrap();
    assert_eq!(processor.registers().pc(), pc + 1);
}

#[test]
fn stop_parks_the_core_too() {
    let mut processor = with_program(&[0x10]);
    processor.step().unwrap();
    assert_eq!(processor.get_mode(), ProcessorMode::Stop);
}

#[test]
fn di_is_immediate_ei_lags_one_instruction() {
    // DI; NOP; EI; NOP
    let mut processor = with_program(&[0xF3, 0x00, 0xFB, 0x00]);
    assert!(processor.ime());

    processor.step().unwrap(); // DI
    assert!(!processor.ime());

    processor.step().unwrap(); // NOP
    assert!(!processor.ime());

    processor.step().unwrap(); // EI, deferred
    assert!(!processor.ime());

    processor.step().unwrap(); // NOP, deferral settles
    assert!(processor.ime());
    assert_eq!(processor.get_mode(), ProcessorMode::Normal);
}

#[test]
fn di_inside_the_ei_window_wins() {
    // EI; DI; NOP
    let mut processor = with_program(&[0xFB, 0xF3, 0x00]);
    processor.step().unwrap(); // EI, deferred
    processor.step().unwrap(); // DI
    assert!(!processor.ime());
    processor.step().unwrap(); // NOP
    assert!(!processor.ime());
}

#[test]
fn reti_restores_interrupts() {
    // Run a DI first so the returning enable is observable.
    let mut processor = with_program(&[0xF3]);
    processor.step().unwrap();
    assert!(!processor.ime());

    processor.registers_mut().write16(Register16::PC, 0x0040);
    processor.registers_mut().write16(Register16::SP, 0xFFFC);
    processor.memory_mut().write16(0xFFFC, 0x0203).unwrap();
    processor.memory_mut().write(0x0040, 0xD9); // RETI

    let cycles = processor.step().unwrap();
    assert_eq!(cycles, 4);
    assert_eq!(processor.registers().pc(), 0x0203);
    assert_eq!(processor.registers().sp(), 0xFFFE);
    assert!(processor.ime());
}

#[test]
fn rst_pushes_its_vector_and_jumps() {
    let mut processor = with_program(&[0xEF]); // RST 28
    processor.registers_mut().write16(Register16::SP, 0xFFFE);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 4);
    assert_eq!(processor.registers().pc(), 0x0028);
    assert_eq!(processor.registers().sp(), 0xFFFC);
    assert_eq!(processor.memory().read16(0xFFFC).unwrap(), 0x0028);
}

#[test]
fn jump_through_hl() {
    let mut processor = with_program(&[0xE9]); // JP HL
    processor.registers_mut().write16(Register16::HL, 0x0200);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 1);
    assert_eq!(processor.registers().pc(), 0x0200);
}

#[test]
fn push_then_pop_af_masks_the_flag_nibble() {
    // PUSH BC; POP AF
    let mut processor = with_program(&[0xC5, 0xF1]);
    processor.registers_mut().write16(Register16::SP, 0xFFFE);
    processor.registers_mut().write16(Register16::BC, 0x123F);

    assert_eq!(processor.step().unwrap(), 4);
    assert_eq!(processor.step().unwrap(), 3);

    assert_eq!(processor.registers().read8(Register8::A), 0x12);
    assert_eq!(processor.registers().flags(), 0x30);
    assert_eq!(processor.registers().read16(Register16::AF), 0x1230);
    assert_eq!(processor.registers().sp(), 0xFFFE);
}

#[test]
fn rotate_circular_round_trip() {
    // RLC B; RRC B
    let mut processor = with_program(&[0xCB, 0x00, 0xCB, 0x08]);
    processor.registers_mut().write8(Register8::B, 0x81);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::B), 0x03);
    assert_eq!(processor.registers().flag_get(Flag::C), 1);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::B), 0x81);
    assert_eq!(processor.registers().flag_get(Flag::C), 1);
}

#[test]
fn arithmetic_shifts_treat_bit_seven_differently() {
    // SRA A keeps the sign bit, SRL A clears it.
    let mut processor = with_program(&[0xCB, 0x2F]);
    processor.registers_mut().write8(Register8::A, 0x81);
    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0xC0);
    assert_eq!(processor.registers().flag_get(Flag::C), 1);

    let mut processor = with_program(&[0xCB, 0x3F]);
    processor.registers_mut().write8(Register8::A, 0x81);
    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0x40);
    assert_eq!(processor.registers().flag_get(Flag::C), 1);
}

#[test]
fn one_byte_rotate_forces_zero_flag_low() {
    let mut processor = with_program(&[0x07]); // RLCA
    processor.registers_mut().write8(Register8::A, 0x00);
    processor.registers_mut().flag_set(Flag::Z, true);
    processor.step().unwrap();
    // Result is zero but Z is forced low on the 1-byte form.
    assert_eq!(processor.registers().flag_get(Flag::Z), 0);
}

#[test]
fn decimal_adjust_after_bcd_addition() {
    // ADD A, B; DAA with BCD 09 + 08 = 17.
    let mut processor = with_program(&[0x80, 0x27]);
    processor.registers_mut().write8(Register8::A, 0x09);
    processor.registers_mut().write8(Register8::B, 0x08);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0x11);
    assert_eq!(processor.registers().flag_get(Flag::H), 1);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0x17);
    assert_eq!(processor.registers().flag_get(Flag::C), 0);
    assert_eq!(processor.registers().flag_get(Flag::H), 0);
}

#[test]
fn hl_accumulate_keeps_zero_flag_and_reports_bit_eleven() {
    let mut processor = with_program(&[0x09]); // ADD HL, BC
    processor.registers_mut().write16(Register16::HL, 0x0FFF);
    processor.registers_mut().write16(Register16::BC, 0x0001);
    processor.registers_mut().flag_set(Flag::Z, true);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 2);
    assert_eq!(processor.registers().read16(Register16::HL), 0x1000);
    assert_eq!(processor.registers().flag_get(Flag::Z), 1); // untouched
    assert_eq!(processor.registers().flag_get(Flag::N), 0);
    assert_eq!(processor.registers().flag_get(Flag::H), 1);
    assert_eq!(processor.registers().flag_get(Flag::C), 0);
}

#[test]
fn stack_pointer_signed_sum_flags_come_from_the_low_byte() {
    let mut processor = with_program(&[0xE8, 0x08]); // ADD SP, +8
    processor.registers_mut().write16(Register16::SP, 0xFFF8);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 4);
    assert_eq!(processor.registers().sp(), 0x0000);
    assert_eq!(processor.registers().flags(), 0x30); // H and C, Z forced low
}

#[test]
fn load_hl_from_stack_pointer_sum() {
    let mut processor = with_program(&[0xF8, 0x08]); // LD HL, SP+8
    processor.registers_mut().write16(Register16::SP, 0xFFF8);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 3);
    assert_eq!(processor.registers().read16(Register16::HL), 0x0000);
    assert_eq!(processor.registers().sp(), 0xFFF8);
    assert_eq!(processor.registers().flags(), 0x30);
}

#[test]
fn high_page_store() {
    let mut processor = with_program(&[0xE0, 0x44]); // LDH (44), A
    processor.registers_mut().write8(Register8::A, 0x5A);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 3);
    assert_eq!(processor.memory().read(0xFF44), 0x5A);
}

#[test]
fn store_stack_pointer_to_memory() {
    let mut processor = with_program(&[0x08, 0x00, 0xC1]); // LD (a16), SP
    processor.registers_mut().write16(Register16::SP, 0xFFFE);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 5);
    assert_eq!(processor.memory().read16(0xC100).unwrap(), 0xFFFE);
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 3);
}

#[test]
fn read_modify_write_through_hl() {
    let mut processor = with_program(&[0x34]); // INC (HL)
    processor.registers_mut().write16(Register16::HL, 0xC000);
    processor.memory_mut().write(0xC000, 0x0F);
    processor.registers_mut().flag_set(Flag::C, true);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 3);
    assert_eq!(processor.memory().read(0xC000), 0x10);
    assert_eq!(processor.registers().flag_get(Flag::H), 1);
    assert_eq!(processor.registers().flag_get(Flag::C), 1); // preserved
}

#[test]
fn invalid_opcode_surfaces_from_step() {
    let mut processor = with_program(&[0xD3]);
    assert_eq!(processor.step(), Err(CoreError::InvalidOpcode(0xD3)));
    // Nothing was committed.
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT);
}

#[test]
fn load_rom_places_the_image_at_the_bottom() {
    let mut rom = vec![0u8; 0x0200];
    rom[ROM_ENTRY_POINT as usize] = 0x3E; // LD A, d8
    rom[ROM_ENTRY_POINT as usize + 1] = 0x77;
    let mut processor = Processor::new();
    processor.load_rom(&rom).unwrap();

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0x77);
}

#[test]
fn subtraction_borrow_chain() {
    // SUB B with a borrow, then SBC B consuming the carry.
    let mut processor = with_program(&[0x90, 0x98]);
    processor.registers_mut().write8(Register8::A, 0x10);
    processor.registers_mut().write8(Register8::B, 0x20);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0xF0);
    assert_eq!(processor.registers().flag_get(Flag::N), 1);
    assert_eq!(processor.registers().flag_get(Flag::C), 1);

    processor.step().unwrap();
    // 0xF0 - 0x20 - 1 = 0xCF
    assert_eq!(processor.registers().read8(Register8::A), 0xCF);
}

#[test]
fn post_increment_load_reads_before_stepping() {
    let mut processor = with_program(&[0x2A]); // LD A, (HL+)
    processor.registers_mut().write16(Register16::HL, 0xC000);
    processor.memory_mut().write(0xC000, 0x99);

    let cycles = processor.step().unwrap();

    assert_eq!(cycles, 2);
    assert_eq!(processor.registers().read8(Register8::A), 0x99);
    assert_eq!(processor.registers().read16(Register16::HL), 0xC001);
}

#[test]
fn nop_only_advances_the_program_counter() {
    let mut processor = with_program(&[0x00]);
    let registers_before = processor.registers().clone();
    let cycles = processor.step().unwrap();
    assert_eq!(cycles, 1);
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 1);
    assert_eq!(processor.registers().flags(), registers_before.flags());
    assert_eq!(
        processor.registers().read8(Register8::A),
        registers_before.read8(Register8::A)
    );
}

#[test]
fn absolute_jump_gates_on_the_carry_flag() {
    let mut processor = with_program(&[0xDA, 0x00, 0x80]); // JP C, 0x8000
    processor.registers_mut().flag_set(Flag::C, false);
    assert_eq!(processor.step().unwrap(), 3);
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 3);

    let mut processor = with_program(&[0xDA, 0x00, 0x80]);
    processor.registers_mut().flag_set(Flag::C, true);
    assert_eq!(processor.step().unwrap(), 4);
    assert_eq!(processor.registers().pc(), 0x8000);
}

#[test]
fn conditional_call_skips_the_stack_when_not_taken() {
    let mut processor = with_program(&[0xC4, 0x00, 0x02]); // CALL NZ
    processor.registers_mut().write16(Register16::SP, 0xFFFE);
    processor.registers_mut().flag_set(Flag::Z, true);

    assert_eq!(processor.step().unwrap(), 3);
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 3);
    assert_eq!(processor.registers().sp(), 0xFFFE);
    assert_eq!(processor.memory().read(0xFFFD), 0x00);
}

#[test]
fn conditional_return_costs_the_check_cycle() {
    let mut processor = with_program(&[0xC8]); // RET Z
    processor.registers_mut().write16(Register16::SP, 0xFFFC);
    processor.memory_mut().write16(0xFFFC, 0x0203).unwrap();
    processor.registers_mut().flag_set(Flag::Z, true);

    assert_eq!(processor.step().unwrap(), 5);
    assert_eq!(processor.registers().pc(), 0x0203);
    assert_eq!(processor.registers().sp(), 0xFFFE);
}

#[test]
fn logic_operations_flag_patterns() {
    // AND sets H, OR and XOR clear everything but Z.
    let mut processor = with_program(&[0xA0]); // AND B
    processor.registers_mut().write8(Register8::A, 0xF0);
    processor.registers_mut().write8(Register8::B, 0x0F);
    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0x00);
    assert_eq!(processor.registers().flags(), 0b1010_0000); // Z and H

    let mut processor = with_program(&[0xA8]); // XOR B
    processor.registers_mut().write8(Register8::A, 0xFF);
    processor.registers_mut().write8(Register8::B, 0x0F);
    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0xF0);
    assert_eq!(processor.registers().flags(), 0x00);

    let mut processor = with_program(&[0xB0]); // OR B
    processor.registers_mut().write8(Register8::A, 0x00);
    processor.registers_mut().write8(Register8::B, 0x00);
    processor.step().unwrap();
    assert_eq!(processor.registers().flags(), 0b1000_0000); // Z only
}

#[test]
fn add_with_carry_consumes_the_carry_once() {
    // ADD A, B overflows, then ADC A, B folds the carry in.
    let mut processor = with_program(&[0x80, 0x88]);
    processor.registers_mut().write8(Register8::A, 0xFF);
    processor.registers_mut().write8(Register8::B, 0x02);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0x01);
    assert_eq!(processor.registers().flag_get(Flag::C), 1);

    processor.step().unwrap();
    // 0x01 + 0x02 + carry = 0x04, carry spent.
    assert_eq!(processor.registers().read8(Register8::A), 0x04);
    assert_eq!(processor.registers().flag_get(Flag::C), 0);
}

#[test]
fn compare_reports_without_touching_the_accumulator() {
    let mut processor = with_program(&[0xFE, 0x42]); // CP d8
    processor.registers_mut().write8(Register8::A, 0x42);
    assert_eq!(processor.step().unwrap(), 2);
    assert_eq!(processor.registers().read8(Register8::A), 0x42);
    assert_eq!(processor.registers().flag_get(Flag::Z), 1);
    assert_eq!(processor.registers().flag_get(Flag::N), 1);
}

#[test]
fn complement_and_carry_flag_controls() {
    let mut processor = with_program(&[0x2F, 0x37, 0x3F]); // CPL; SCF; CCF
    processor.registers_mut().write8(Register8::A, 0x35);
    processor.registers_mut().flag_set(Flag::Z, true);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0xCA);
    assert_eq!(processor.registers().flag_get(Flag::N), 1);
    assert_eq!(processor.registers().flag_get(Flag::H), 1);
    assert_eq!(processor.registers().flag_get(Flag::Z), 1); // untouched

    processor.step().unwrap(); // SCF
    assert_eq!(processor.registers().flag_get(Flag::C), 1);
    assert_eq!(processor.registers().flag_get(Flag::N), 0);
    assert_eq!(processor.registers().flag_get(Flag::H), 0);

    processor.step().unwrap(); // CCF
    assert_eq!(processor.registers().flag_get(Flag::C), 0);
}

#[test]
fn decimal_adjust_after_bcd_subtraction() {
    // BCD 0x42 - 0x09 = 0x33: SUB B then DAA.
    let mut processor = with_program(&[0x90, 0x27]);
    processor.registers_mut().write8(Register8::A, 0x42);
    processor.registers_mut().write8(Register8::B, 0x09);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0x39);
    assert_eq!(processor.registers().flag_get(Flag::H), 1);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::A), 0x33);
}

#[test]
fn cb_operations_through_memory() {
    // SWAP (HL); SET 5, (HL); RES 1, (HL)
    let mut processor = with_program(&[0xCB, 0x36, 0xCB, 0xEE, 0xCB, 0x8E]);
    processor.registers_mut().write16(Register16::HL, 0xC000);
    processor.memory_mut().write(0xC000, 0xA1);

    assert_eq!(processor.step().unwrap(), 4);
    assert_eq!(processor.memory().read(0xC000), 0x1A);

    assert_eq!(processor.step().unwrap(), 4);
    assert_eq!(processor.memory().read(0xC000), 0x3A);

    assert_eq!(processor.step().unwrap(), 4);
    assert_eq!(processor.memory().read(0xC000), 0x38);
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 6);
}

#[test]
fn set_then_res_restores_the_other_bits() {
    // SET 5, B; RES 5, B
    let mut processor = with_program(&[0xCB, 0xE8, 0xCB, 0xA8]);
    processor.registers_mut().write8(Register8::B, 0x4A);

    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::B), 0x6A);
    processor.step().unwrap();
    assert_eq!(processor.registers().read8(Register8::B), 0x4A);
}

#[test]
fn high_page_load_through_the_c_register() {
    let mut processor = with_program(&[0xF2]); // LD A, (C)
    processor.registers_mut().write8(Register8::C, 0x44);
    processor.memory_mut().write(0xFF44, 0x91);

    assert_eq!(processor.step().unwrap(), 2);
    assert_eq!(processor.registers().read8(Register8::A), 0x91);
}

#[test]
fn absolute_load_into_the_accumulator() {
    let mut processor = with_program(&[0xFA, 0x00, 0xC0]); // LD A, (a16)
    processor.memory_mut().write(0xC000, 0x7E);

    assert_eq!(processor.step().unwrap(), 4);
    assert_eq!(processor.registers().read8(Register8::A), 0x7E);
    assert_eq!(processor.registers().pc(), ROM_ENTRY_POINT + 3);
}

#[test]
fn immediate_store_through_hl() {
    let mut processor = with_program(&[0x36, 0x5C]); // LD (HL), d8
    processor.registers_mut().write16(Register16::HL, 0xC123);

    assert_eq!(processor.step().unwrap(), 3);
    assert_eq!(processor.memory().read(0xC123), 0x5C);
}

#[test]
fn sixteen_bit_steps_leave_the_flags_alone() {
    // INC BC; DEC DE
    let mut processor = with_program(&[0x03, 0x1B]);
    processor.registers_mut().write16(Register16::BC, 0x00FF);
    processor.registers_mut().write16(Register16::DE, 0x0000);
    processor.registers_mut().flag_set(Flag::Z, true);
    processor.registers_mut().flag_set(Flag::C, true);

    assert_eq!(processor.step().unwrap(), 2);
    assert_eq!(processor.registers().read16(Register16::BC), 0x0100);

    assert_eq!(processor.step().unwrap(), 2);
    assert_eq!(processor.registers().read16(Register16::DE), 0xFFFF);
    assert_eq!(processor.registers().flags(), 0b1001_0000);
}

#[test]
fn countdown_loop_runs_to_completion() {
    // DEC B; JR NZ, -3
    let mut processor = with_program(&[0x05, 0x20, 0xFD]);
    processor.registers_mut().write8(Register8::B, 3);

    let mut total_cycles = 0u32;
    let mut steps = 0;
    while processor.registers().pc() != ROM_ENTRY_POINT + 3 {
        total_cycles += processor.step().unwrap() as u32;
        steps += 1;
        assert!(steps < 32, "loop failed to terminate");
    }

    assert_eq!(processor.registers().read8(Register8::B), 0);
    assert_eq!(processor.registers().flag_get(Flag::Z), 1);
    // Two taken passes at 1+3 cycles, the final fall-through at 1+2.
    assert_eq!(total_cycles, 11);
}
