use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use nmos6502_config::{CpuConfig, DecimalMode};
use nmos6502_emu::bus::BusInterface;
use nmos6502_emu::status::StatusRegister;
use nmos6502_emu::{ClockOutcome, CompletedInstruction, CpuError, CpuRegisters, Mos6502};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::mem;
use std::path::{Path, PathBuf};

// The CPU never finishes an instruction in more cycles than this (RMW indirect forms take 8)
const MAX_INSTRUCTION_CYCLES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusCycle {
    Read(u16, u8),
    Write(u16, u8),
}

struct Bus {
    ram: Vec<u8>,
    addresses_written: Vec<u16>,
    cycles: Vec<BusCycle>,
}

impl Bus {
    fn new() -> Self {
        Self { ram: vec![0; 64 * 1024], addresses_written: Vec::new(), cycles: Vec::new() }
    }

    fn clear(&mut self) {
        for address in mem::take(&mut self.addresses_written) {
            self.ram[address as usize] = 0;
        }
        self.cycles.clear();
    }

    fn load(&mut self, ram: &[(u16, u8)]) {
        for &(address, value) in ram {
            self.ram[address as usize] = value;
            self.addresses_written.push(address);
        }
    }
}

impl BusInterface for Bus {
    #[inline]
    fn read(&mut self, address: u16) -> u8 {
        let value = self.ram[address as usize];
        self.cycles.push(BusCycle::Read(address, value));
        value
    }

    #[inline]
    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
        self.addresses_written.push(address);
        self.cycles.push(BusCycle::Write(address, value));
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SystemState {
    pc: u16,
    s: u8,
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    ram: Vec<(u16, u8)>,
}

impl SystemState {
    fn registers(&self) -> CpuRegisters {
        CpuRegisters {
            accumulator: self.a,
            x: self.x,
            y: self.y,
            status: StatusRegister::from_byte(self.p),
            pc: self.pc,
            sp: self.s,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Cycle(u16, u8, String);

impl Cycle {
    fn to_bus_cycle(&self) -> BusCycle {
        match self.2.as_str() {
            "read" => BusCycle::Read(self.0, self.1),
            "write" => BusCycle::Write(self.0, self.1),
            _ => panic!("Invalid bus cycle type, expected read/write: {}", self.2),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TestDescription {
    name: String,
    initial: SystemState,
    #[serde(rename = "final")]
    final_: SystemState,
    cycles: Vec<Cycle>,
}

/// Settings file layout; every field is optional and CLI flags take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RunnerConfig {
    cpu: CpuConfig,
    opcodes: Option<Vec<u8>>,
}

impl RunnerConfig {
    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config_str =
            fs::read_to_string(path).with_context(|| format!("Unable to read config file '{}'", path.display()))?;
        toml::from_str(&config_str).with_context(|| format!("Invalid config file '{}'", path.display()))
    }
}

#[derive(Debug, Parser)]
struct Args {
    /// Directory containing one JSON test file per opcode (00.json through ff.json)
    #[arg(long, short = 'd')]
    dir_path: PathBuf,

    /// TOML file with runner settings
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the decimal mode policy from the config file
    #[arg(long)]
    decimal_mode: Option<DecimalMode>,

    /// Run only this opcode (hex, e.g. 6d)
    #[arg(long, value_parser = parse_opcode)]
    opcode: Option<u8>,
}

fn parse_opcode(s: &str) -> Result<u8, String> {
    u8::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|err| format!("Invalid opcode '{s}': {err}"))
}

#[derive(Debug, Default)]
struct OpcodeSummary {
    passed: usize,
    failed: usize,
    skipped: usize,
}

enum TestResult {
    Passed,
    Failed,
    Skipped,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut runner_config = match &args.config {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(decimal_mode) = args.decimal_mode {
        runner_config.cpu.decimal_mode = decimal_mode;
    }
    // The suites start from arbitrary P values, so I cannot be pinned
    runner_config.cpu.force_interrupt_disable = false;

    let opcodes: Vec<u8> = match (args.opcode, &runner_config.opcodes) {
        (Some(opcode), _) => vec![opcode],
        (None, Some(opcodes)) => opcodes.clone(),
        (None, None) => (0x00..=0xFF).collect(),
    };

    log::info!("Running {} opcode(s) with config {:?}", opcodes.len(), runner_config.cpu);

    let mut bus = Bus::new();
    let mut total = OpcodeSummary::default();
    for opcode in opcodes {
        let summary = run_opcode(&args.dir_path, opcode, runner_config.cpu, &mut bus)?;

        if summary.failed != 0 {
            log::error!(
                "Failed {} out of {} tests for opcode {opcode:02X}",
                summary.failed,
                summary.passed + summary.failed
            );
        }
        if summary.skipped != 0 {
            log::debug!("Skipped {} tests for opcode {opcode:02X}", summary.skipped);
        }

        total.passed += summary.passed;
        total.failed += summary.failed;
        total.skipped += summary.skipped;
    }

    log::info!("Passed {}, failed {}, skipped {}", total.passed, total.failed, total.skipped);

    Ok(())
}

fn run_opcode(dir_path: &Path, opcode: u8, config: CpuConfig, bus: &mut Bus) -> anyhow::Result<OpcodeSummary> {
    let file_path = dir_path.join(format!("{opcode:02x}.json"));
    let file = File::open(&file_path).with_context(|| format!("Unable to open '{}'", file_path.display()))?;
    let tests: Vec<TestDescription> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Unable to parse '{}'", file_path.display()))?;

    let mut summary = OpcodeSummary::default();
    for test in &tests {
        match run_single_test(test, config, bus) {
            TestResult::Passed => summary.passed += 1,
            TestResult::Failed => {
                summary.failed += 1;
                log::debug!("Above failures in '{}'", test.name);
            }
            TestResult::Skipped => summary.skipped += 1,
        }
    }

    Ok(summary)
}

fn run_single_test(test: &TestDescription, config: CpuConfig, bus: &mut Bus) -> TestResult {
    bus.clear();
    bus.load(&test.initial.ram);

    let mut cpu = Mos6502::new(bus, CpuConfig { reset_vector: Some(test.initial.pc), ..config });
    cpu.set_registers(test.initial.registers());
    bus.cycles.clear();

    let completed = match run_one_instruction(&mut cpu, bus) {
        Ok(Some(completed)) => completed,
        // Don't bother testing JAM opcodes
        Ok(None) => return TestResult::Skipped,
        // Unstable opcodes, and decimal arithmetic under the reject policy
        Err(err) => {
            log::trace!("Skipping '{}': {err}", test.name);
            return TestResult::Skipped;
        }
    };

    if check_state(&cpu, bus, &test.final_, &test.cycles, completed) {
        TestResult::Failed
    } else {
        TestResult::Passed
    }
}

fn run_one_instruction(cpu: &mut Mos6502, bus: &mut Bus) -> Result<Option<CompletedInstruction>, CpuError> {
    for _ in 0..MAX_INSTRUCTION_CYCLES {
        match cpu.clock(bus)? {
            ClockOutcome::Completed(completed) => return Ok(Some(completed)),
            ClockOutcome::Jammed => return Ok(None),
            ClockOutcome::InProgress => {}
        }
    }

    panic!("Instruction did not complete within {MAX_INSTRUCTION_CYCLES} cycles");
}

fn check_state(
    cpu: &Mos6502,
    bus: &Bus,
    final_state: &SystemState,
    cycles: &[Cycle],
    completed: CompletedInstruction,
) -> bool {
    let mut errors = false;

    for &(address, expected_value) in &final_state.ram {
        let actual_value = bus.ram[address as usize];
        if expected_value != actual_value {
            errors = true;
            log::debug!("RAM[{address:04X}]: expected={expected_value:02X}, actual={actual_value:02X}");
        }
    }

    let registers = cpu.registers();
    errors |= check_register("A", final_state.a, registers.accumulator);
    errors |= check_register("X", final_state.x, registers.x);
    errors |= check_register("Y", final_state.y, registers.y);
    errors |= check_register("S", final_state.s, registers.sp);
    // B does not exist outside of pushed copies of P
    errors |= check_register("P", final_state.p | 0x10, registers.status.to_byte() | 0x10);

    if final_state.pc != registers.pc {
        log::debug!("PC: expected={:04X} actual={:04X}", final_state.pc, registers.pc);
        errors = true;
    }

    if cycles.len() != bus.cycles.len() {
        log::debug!("Cycle count does not match: expected={}, actual={}", cycles.len(), bus.cycles.len());
        log::debug!("  Expected: {cycles:?}");
        log::debug!("  Actual: {:?}", bus.cycles);
        errors = true;
    } else {
        for (i, (expected, &actual)) in cycles.iter().zip(&bus.cycles).enumerate() {
            let expected = expected.to_bus_cycle();
            if expected != actual {
                log::debug!("Cycle {i} mismatch: expected={expected:?}, actual={actual:?}");
                errors = true;
            }
        }
    }

    if usize::from(completed.total_cycles()) != bus.cycles.len() {
        log::debug!(
            "Reported cycles do not match the bus trace: reported={}, actual={}",
            completed.total_cycles(),
            bus.cycles.len()
        );
        errors = true;
    }

    if !completed.timing_matches() {
        log::debug!("Cycle bookkeeping mismatch: {completed:?}");
        errors = true;
    }

    errors
}

fn check_register(name: &str, expected: u8, actual: u8) -> bool {
    if expected != actual {
        log::debug!("{name}: expected={expected:02X}, actual={actual:02X}");
        true
    } else {
        false
    }
}
