mod load;

use crate::bus::{BusInterface, DeviceBus, Ram, Rom};
use crate::operation::{AddressingMode, Instruction, Operation};
use crate::{BusConfig, ClockOutcome, CompletedInstruction, CpuConfig, CpuError, Mos6502};
use std::collections::HashMap;
use test_log::test;

const PROGRAM_START: u16 = 0x8000;
const IRQ_HANDLER: u16 = 0x9000;
const NMI_HANDLER: u16 = 0x9100;
const MAX_CYCLES: u32 = 100_000;

macro_rules! hash_map {
    ($($key:literal: $value:expr),* $(,)?) => {
        {
            let mut map = ::std::collections::HashMap::new();
            $(
                map.insert($key, $value);
            )*
            map
        }
    }
}

pub(crate) use hash_map;

#[derive(Default)]
struct ExpectedState {
    a: Option<u8>,
    x: Option<u8>,
    y: Option<u8>,
    p: Option<u8>,
    s: Option<u8>,
    pc: Option<u16>,
    memory: HashMap<u16, u8>,
    cycles: Option<u32>,
}

macro_rules! assert_state_eq {
    ($(($name:literal, $expected:expr, $actual:expr)),+$(,)?) => {
        {
            let mut errors: Vec<String> = Vec::new();

            $(
                if let Some(expected) = $expected {
                    let actual = $actual;
                    if expected != actual {
                        errors.push(format!("[{} mismatch: expected = {:02X}, actual = {:02X}]", $name, expected, actual));
                    }
                }
            )*

            errors
        }
    }
}

impl ExpectedState {
    fn assert_eq(&self, cpu: &Mos6502, bus: &DeviceBus, cycle_count: u32) {
        let registers = cpu.registers();
        let mut errors = assert_state_eq!(
            ("A", self.a, registers.accumulator),
            ("X", self.x, registers.x),
            ("Y", self.y, registers.y),
            ("P", self.p, registers.status.to_byte()),
            ("S", self.s, registers.sp),
            ("PC", self.pc, registers.pc),
            ("Cycles", self.cycles, cycle_count),
        );

        for (&address, &value) in &self.memory {
            let actual_value = bus.peek(address);
            if value != actual_value {
                errors.push(format!("[Mismatch at memory address {address:04X}: expected = {value:02X}, actual = {actual_value:02X}]"));
            }
        }

        assert!(errors.is_empty(), "Expected state mismatch: {}", errors.join(", "));
    }
}

fn parse_program(program: &str) -> Vec<u8> {
    let digits: String = program.split_whitespace().collect();
    digits
        .as_bytes()
        .chunks_exact(2)
        .map(|chunk| {
            let hex = std::str::from_utf8(chunk).unwrap();
            u8::from_str_radix(hex, 16).unwrap()
        })
        .collect()
}

/// 32KB of RAM at $0000 and 32KB of ROM at $8000 holding the program. RESET points at the
/// program, IRQ/BRK at $9000 and NMI at $9100.
fn new_bus(program: &[u8], memory: &[(u16, u8)]) -> DeviceBus {
    let mut rom = vec![0; 0x8000];
    rom[..program.len()].copy_from_slice(program);
    for (i, vector) in [NMI_HANDLER, PROGRAM_START, IRQ_HANDLER].into_iter().enumerate() {
        let offset = 0x7FFA + 2 * i;
        rom[offset..offset + 2].copy_from_slice(&vector.to_le_bytes());
    }

    let mut bus = DeviceBus::new(BusConfig::default());
    bus.register_device(Ram::new(0x0000, 0x8000), 0).unwrap();
    bus.register_device(Rom::new(0x8000, rom), 1).unwrap();

    for &(address, value) in memory {
        bus.write(address, value);
    }

    bus
}

struct TestRun {
    cpu: Mos6502,
    bus: DeviceBus,
    end: u16,
    cycles: u32,
    completed: Vec<CompletedInstruction>,
}

impl TestRun {
    fn new(program: &str, memory: &[(u16, u8)], config: CpuConfig) -> Self {
        let program = parse_program(program);
        let mut bus = new_bus(&program, memory);
        let cpu = Mos6502::new(&mut bus, config);

        Self {
            cpu,
            bus,
            end: PROGRAM_START + program.len() as u16,
            cycles: 0,
            completed: Vec::new(),
        }
    }

    fn clock(&mut self) -> Result<ClockOutcome, CpuError> {
        let outcome = self.cpu.clock(&mut self.bus)?;
        self.cycles += 1;
        assert!(self.cycles < MAX_CYCLES, "program did not finish within {MAX_CYCLES} cycles");

        if let ClockOutcome::Completed(completed) = outcome {
            assert!(completed.timing_matches(), "cycle bookkeeping mismatch: {completed:?}");
            self.completed.push(completed);
        }

        Ok(outcome)
    }

    fn run_to_end(&mut self) {
        while self.cpu.pc() < self.end || self.cpu.is_mid_instruction() {
            self.clock().unwrap();
        }
    }

    fn run_instructions(&mut self, count: usize) {
        let target = self.completed.len() + count;
        while self.completed.len() < target {
            self.clock().unwrap();
        }
    }

    fn last_completed(&self) -> CompletedInstruction {
        *self.completed.last().unwrap()
    }

    fn assert_state(&self, expected_state: &ExpectedState) {
        expected_state.assert_eq(&self.cpu, &self.bus, self.cycles);
    }
}

fn run_test(program: &str, expected_state: ExpectedState) {
    run_test_with_memory(program, &[], expected_state);
}

fn run_test_with_memory(program: &str, memory: &[(u16, u8)], expected_state: ExpectedState) {
    let mut run = TestRun::new(program, memory, CpuConfig::default());
    run.run_to_end();
    run.assert_state(&expected_state);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusCycle {
    Read(u16, u8),
    Write(u16, u8),
}

struct TracingBus {
    inner: DeviceBus,
    trace: Vec<BusCycle>,
}

impl BusInterface for TracingBus {
    fn read(&mut self, address: u16) -> u8 {
        let value = self.inner.read(address);
        self.trace.push(BusCycle::Read(address, value));
        value
    }

    fn write(&mut self, address: u16, value: u8) {
        self.inner.write(address, value);
        self.trace.push(BusCycle::Write(address, value));
    }
}

/// Run `skip` instructions untraced, then the next instruction with every bus cycle recorded.
fn trace_instruction(program: &str, memory: &[(u16, u8)], skip: usize) -> Vec<BusCycle> {
    let program = parse_program(program);
    let mut bus = TracingBus { inner: new_bus(&program, memory), trace: Vec::new() };
    let mut cpu = Mos6502::new(&mut bus, CpuConfig::default());

    let mut remaining = skip + 1;
    while remaining != 0 {
        if remaining == 1 && !cpu.is_mid_instruction() {
            bus.trace.clear();
        }

        if let ClockOutcome::Completed(_) = cpu.clock(&mut bus).unwrap() {
            remaining -= 1;
        }
    }

    bus.trace
}

#[test]
fn lda_immediate_timing() {
    let mut run = TestRun::new("A978", &[], CpuConfig::default());
    run.run_to_end();

    let completed = run.last_completed();
    assert_eq!(completed.operation, Operation::from_opcode(0xA9));
    assert_eq!(completed.addressing_cycles, 1);
    assert_eq!(completed.instruction_cycles, 1);
    assert_eq!(completed.total_cycles(), 2);
    assert_eq!(run.cpu.previous_addressing_cycles(), 1);
    assert_eq!(run.cpu.previous_instruction_cycles(), 1);
}

#[test]
fn lda_absolute_x_timing() {
    // No page crossing: $0210 + $20
    let mut run = TestRun::new("A220 BD1002", &[], CpuConfig::default());
    run.run_to_end();
    assert_eq!(run.last_completed().total_cycles(), 4);
    assert_eq!(run.last_completed().penalty_cycles, 0);

    // $02F0 + $20 crosses into page 3
    let mut run = TestRun::new("A220 BDF002", &[], CpuConfig::default());
    run.run_to_end();
    assert_eq!(run.last_completed().total_cycles(), 5);
    assert_eq!(run.last_completed().penalty_cycles, 1);
}

#[test]
fn every_stable_opcode_matches_declared_timing() {
    for opcode in 0..=0xFF_u8 {
        let operation = Operation::from_opcode(opcode);
        if operation.instruction == Instruction::Jam || operation.instruction.is_unstable() {
            continue;
        }

        let program = format!("{opcode:02X}1002");
        let mut run = TestRun::new(&program, &[], CpuConfig::default());
        run.run_instructions(1);

        let completed = run.last_completed();
        assert_eq!(completed.opcode, opcode);
        assert_eq!(
            completed.total_cycles(),
            operation.cycles + completed.penalty_cycles,
            "opcode {opcode:02X} ({operation})"
        );
    }
}

#[test]
fn indexed_reads_pay_for_page_crossing() {
    for opcode in 0..=0xFF_u8 {
        let operation = Operation::from_opcode(opcode);
        let indexed = matches!(
            operation.addressing_mode,
            AddressingMode::AbsoluteX | AddressingMode::AbsoluteY | AddressingMode::IndirectY
        );
        if !indexed || operation.instruction.is_unstable() {
            continue;
        }

        // X = Y = $FF; absolute base $02F0, indirect base $0280
        let program = format!("A2FF A0FF {opcode:02X}F002");
        let mut run = TestRun::new(&program, &[(0x00F0, 0x80), (0x00F1, 0x02)], CpuConfig::default());
        run.run_instructions(3);

        let completed = run.last_completed();
        assert_eq!(
            completed.penalty_cycles,
            operation.max_extra_cycles(),
            "opcode {opcode:02X} ({operation})"
        );
        assert_eq!(completed.total_cycles(), operation.max_potential_cycles());
    }
}

#[test]
fn reset_state() {
    let run = TestRun::new("EA", &[], CpuConfig::default());
    run.assert_state(&ExpectedState {
        a: Some(0x00),
        x: Some(0x00),
        y: Some(0x00),
        p: Some(0x24),
        s: Some(0xFD),
        pc: Some(PROGRAM_START),
        ..ExpectedState::default()
    });
    assert!(!run.cpu.is_mid_instruction());
}

#[test]
fn reset_mid_instruction() {
    // PHA; INC $10
    let mut run = TestRun::new("48 E610", &[], CpuConfig::default());
    run.run_instructions(1);
    run.clock().unwrap();
    run.clock().unwrap();
    assert!(run.cpu.is_mid_instruction());
    assert_eq!(run.cpu.registers().sp, 0xFC);

    run.cpu.reset(&mut run.bus);

    assert!(!run.cpu.is_mid_instruction());
    assert!(!run.cpu.addressing_mode_in_progress());
    assert!(!run.cpu.opcode_in_progress());
    assert_eq!(run.cpu.pc(), PROGRAM_START);
    assert_eq!(run.cpu.registers().sp, 0xFD);
    assert!(run.cpu.status().interrupt_disable);
    assert!(run.cpu.status().reserved);
}

#[test]
fn reset_vector_override_skips_vector_read() {
    let config = CpuConfig { reset_vector: Some(0x8002), ..CpuConfig::default() };
    let program = parse_program("EAEA E8");
    let mut bus = TracingBus { inner: new_bus(&program, &[]), trace: Vec::new() };

    let mut cpu = Mos6502::new(&mut bus, config);
    assert_eq!(cpu.pc(), 0x8002);
    assert!(bus.trace.is_empty());

    cpu.clock(&mut bus).unwrap();
    cpu.clock(&mut bus).unwrap();
    assert_eq!(cpu.registers().x, 0x01);

    cpu.reset_to(0xC000);
    assert_eq!(cpu.pc(), 0xC000);
}

#[test]
fn reset_points_address_bus_at_pc() {
    let mut run = TestRun::new("48 EA", &[], CpuConfig::default());
    assert_eq!(run.cpu.address_bus(), PROGRAM_START);
    assert_eq!(run.cpu.address_bus(), run.cpu.pc());
    assert!(run.cpu.pins().read);

    // Stop on the PHA write cycle
    run.clock().unwrap();
    run.clock().unwrap();
    run.clock().unwrap();
    assert!(!run.cpu.pins().read);

    run.cpu.reset(&mut run.bus);
    assert_eq!(run.cpu.address_bus(), PROGRAM_START);
    assert!(run.cpu.pins().read);

    run.cpu.reset_to(0xC000);
    assert_eq!(run.cpu.address_bus(), 0xC000);
    assert_eq!(run.cpu.pc(), 0xC000);

    let config = CpuConfig { reset_vector: Some(0x8001), ..CpuConfig::default() };
    let program = parse_program("48 EA");
    let mut bus = new_bus(&program, &[]);
    let cpu = Mos6502::new(&mut bus, config);
    assert_eq!(cpu.address_bus(), 0x8001);
    assert_eq!(cpu.pc(), 0x8001);
}

#[test]
fn clock_asserts_reserved_and_interrupt_disable() {
    // PHA; PLP with A = 0 clears every flag, including I and R
    let mut run = TestRun::new("A900 48 28 EA", &[], CpuConfig::default());
    run.run_instructions(3);
    assert_eq!(run.cpu.status().to_byte(), 0x20);

    run.clock().unwrap();
    assert_eq!(run.cpu.status().to_byte(), 0x24);
}

#[test]
fn pins_follow_bus_cycles() {
    let mut run = TestRun::new("8D0002", &[], CpuConfig::default());
    run.clock().unwrap();
    assert_eq!(run.cpu.address_bus(), 0x8000);
    assert_eq!(run.cpu.data_bus(), 0x8D);
    assert!(run.cpu.pins().read);

    run.run_to_end();
    assert_eq!(run.cpu.address_bus(), 0x0200);
    assert_eq!(run.cpu.data_bus(), 0x00);
    assert!(!run.cpu.pins().read);
}

#[test]
fn fetch_is_a_no_op_mid_instruction() {
    let mut run = TestRun::new("A9FF", &[], CpuConfig::default());
    assert_eq!(run.cpu.fetch(&mut run.bus), Ok(true));
    assert!(run.cpu.addressing_mode_in_progress());
    assert_eq!(run.cpu.fetch(&mut run.bus), Ok(false));
    assert_eq!(run.cpu.pc(), 0x8001);
}

#[test]
#[should_panic(expected = "no instruction in flight")]
fn execute_without_fetch_panics() {
    let mut run = TestRun::new("EA", &[], CpuConfig::default());
    let _ = run.cpu.execute(&mut run.bus);
}

#[test]
fn trace_read_modify_write() {
    // INC $10
    let trace = trace_instruction("E610", &[(0x0010, 0x41)], 0);
    assert_eq!(
        trace,
        vec![
            BusCycle::Read(0x8000, 0xE6),
            BusCycle::Read(0x8001, 0x10),
            BusCycle::Read(0x0010, 0x41),
            BusCycle::Write(0x0010, 0x41),
            BusCycle::Write(0x0010, 0x42),
        ]
    );
}

#[test]
fn trace_absolute_x_page_crossing() {
    // LDX #$20; LDA $02F0,X
    let trace = trace_instruction("A220 BDF002", &[(0x0210, 0x11), (0x0310, 0x99)], 1);
    assert_eq!(
        trace,
        vec![
            BusCycle::Read(0x8002, 0xBD),
            BusCycle::Read(0x8003, 0xF0),
            BusCycle::Read(0x8004, 0x02),
            BusCycle::Read(0x0210, 0x11),
            BusCycle::Read(0x0310, 0x99),
        ]
    );
}

#[test]
fn trace_zero_page_x() {
    // LDX #$05; STA $FE,X wraps to $03
    let trace = trace_instruction("A205 95FE", &[(0x00FE, 0x77)], 1);
    assert_eq!(
        trace,
        vec![
            BusCycle::Read(0x8002, 0x95),
            BusCycle::Read(0x8003, 0xFE),
            BusCycle::Read(0x00FE, 0x77),
            BusCycle::Write(0x0003, 0x00),
        ]
    );
}

#[test]
fn trace_jsr() {
    // JSR $8010
    let trace = trace_instruction("201080", &[], 0);
    assert_eq!(
        trace,
        vec![
            BusCycle::Read(0x8000, 0x20),
            BusCycle::Read(0x8001, 0x10),
            BusCycle::Read(0x01FD, 0x00),
            BusCycle::Write(0x01FD, 0x80),
            BusCycle::Write(0x01FC, 0x02),
            BusCycle::Read(0x8002, 0x80),
        ]
    );
}

#[test]
fn trace_implied_dummy_read() {
    // INX
    let trace = trace_instruction("E8EA", &[], 0);
    assert_eq!(trace, vec![BusCycle::Read(0x8000, 0xE8), BusCycle::Read(0x8001, 0xEA)]);
}

#[test]
fn save_state_mid_instruction() {
    // LDA #$42; STA $0200; INC $0200
    let mut run = TestRun::new("A942 8D0002 EE0002", &[], CpuConfig::default());
    run.run_instructions(1);
    run.clock().unwrap();
    run.clock().unwrap();
    assert!(run.cpu.is_mid_instruction());

    let bytes = bincode::encode_to_vec(&run.cpu, bincode::config::standard()).unwrap();
    let (restored, _): (Mos6502, usize) =
        bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
    run.cpu = restored;

    run.run_to_end();
    run.assert_state(&ExpectedState {
        a: Some(0x42),
        memory: hash_map! { 0x0200: 0x43 },
        cycles: Some(2 + 4 + 6),
        ..ExpectedState::default()
    });
}
