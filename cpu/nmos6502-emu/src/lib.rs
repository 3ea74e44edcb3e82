//! Cycle-stepped NMOS 6502 core.
//!
//! Every call to [`Mos6502::clock`] performs exactly one bus cycle: either the opcode fetch, one
//! cycle of the addressing mode, or one cycle of the instruction proper. Dummy reads and dummy
//! writes are reproduced, so the sequence of bus accesses matches real hardware.

mod addressing;
pub mod bus;
pub mod error;
mod instructions;
mod num;
pub mod operation;
pub mod status;
pub mod system;

pub use error::{BusError, CpuError};
pub use nmos6502_config::{BusConfig, BusMode, CpuConfig, DecimalMode};

use crate::bus::BusInterface;
use crate::operation::{OPERATION_TABLE, Operation};
use crate::status::StatusRegister;
use bincode::{Decode, Encode};
use log::{Level, debug, error, log_enabled, trace};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

const STACK_PAGE: u8 = 0x01;
const POWER_ON_SP: u8 = 0xFD;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub x: u8,
    pub y: u8,
    pub status: StatusRegister,
    pub pc: u16,
    pub sp: u8,
}

impl CpuRegisters {
    fn new(pc: u16) -> Self {
        Self { accumulator: 0, x: 0, y: 0, status: StatusRegister::new(), pc, sp: POWER_ON_SP }
    }
}

/// The external bus lines as last driven by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct BusPins {
    pub address: u16,
    pub data: u8,
    /// R/W line; `true` for a read cycle
    pub read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum Interrupt {
    Irq,
    Nmi,
}

impl Interrupt {
    #[must_use]
    pub const fn vector(self) -> u16 {
        match self {
            Self::Irq => IRQ_VECTOR,
            Self::Nmi => NMI_VECTOR,
        }
    }
}

/// Cycle bookkeeping for one finished instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct CompletedInstruction {
    pub opcode: u8,
    pub operation: Operation,
    /// Set if this was a hardware interrupt sequence rather than a fetched opcode
    pub interrupt: Option<Interrupt>,
    /// Address-resolution bus cycles spent in the addressing mode
    pub addressing_cycles: u8,
    /// Bus cycles spent in the instruction itself, including the opcode fetch
    pub instruction_cycles: u8,
    /// Page-crossing and taken-branch cycles on top of the declared count
    pub penalty_cycles: u8,
}

impl CompletedInstruction {
    #[must_use]
    pub fn total_cycles(&self) -> u8 {
        self.addressing_cycles + self.instruction_cycles
    }

    /// Whether the consumed cycles add up to the declared count of the operation plus the
    /// recorded penalty, and the penalty is one the operation can actually incur.
    #[must_use]
    pub fn timing_matches(&self) -> bool {
        self.total_cycles() == self.operation.cycles + self.penalty_cycles
            && self.penalty_cycles <= self.operation.max_extra_cycles()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOutcome {
    /// The clock advanced an instruction that has not finished yet
    InProgress,
    /// The clock performed the final cycle of an instruction
    Completed(CompletedInstruction),
    /// The processor is locked up by a JAM opcode and did nothing
    Jammed,
}

#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct InstructionState {
    pub opcode: u8,
    pub operation: Operation,
    /// Address of the opcode byte
    pub instruction_pc: u16,
    pub interrupt: Option<Interrupt>,
    pub addressing_mode_in_progress: bool,
    pub opcode_in_progress: bool,
    pub addressing_cycle: u8,
    /// 0 while the instruction is beginning, then the index of the current bus cycle
    pub instruction_cycle: u8,
    pub low_byte: u8,
    pub high_byte: u8,
    pub temp_address: u16,
    pub effective_address: u16,
    pub relative_address: u16,
    pub operand: u8,
    pub page_crossed: bool,
    pub penalty_cycles: u8,
}

impl InstructionState {
    fn new(opcode: u8, operation: Operation, instruction_pc: u16) -> Self {
        Self {
            opcode,
            operation,
            instruction_pc,
            interrupt: None,
            addressing_mode_in_progress: false,
            opcode_in_progress: false,
            addressing_cycle: 0,
            instruction_cycle: 0,
            low_byte: 0,
            high_byte: 0,
            temp_address: 0,
            effective_address: 0,
            relative_address: 0,
            operand: 0,
            page_crossed: false,
            penalty_cycles: 0,
        }
    }
}

impl Default for InstructionState {
    fn default() -> Self {
        Self::new(0x00, OPERATION_TABLE[0], 0x0000)
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Mos6502 {
    registers: CpuRegisters,
    pins: BusPins,
    state: InstructionState,
    config: CpuConfig,
    previous: Option<CompletedInstruction>,
    fault: Option<CpuError>,
    jammed: bool,
}

impl Mos6502 {
    /// Create a processor and immediately reset it, reading the RESET vector through `bus` unless
    /// the config supplies one.
    pub fn new<B: BusInterface>(bus: &mut B, config: CpuConfig) -> Self {
        let mut cpu = Self {
            registers: CpuRegisters::new(0x0000),
            pins: BusPins { read: true, ..BusPins::default() },
            state: InstructionState::default(),
            config,
            previous: None,
            fault: None,
            jammed: false,
        };
        cpu.reset(bus);
        cpu
    }

    /// Reset the processor:
    /// * Abandon any in-flight instruction and clear a JAM lock-up or fault
    /// * Set SP to $FD and set the I and reserved flags
    /// * Load PC from $FFFC-$FFFD, or from the configured reset vector if there is one
    pub fn reset<B: BusInterface>(&mut self, bus: &mut B) {
        let pc = match self.config.reset_vector {
            Some(pc) => pc,
            None => {
                let lsb = self.read_bus(bus, RESET_VECTOR);
                let msb = self.read_bus(bus, RESET_VECTOR + 1);
                u16::from_le_bytes([lsb, msb])
            }
        };

        self.reset_to(pc);
    }

    /// Reset with an explicit PC, bypassing the vector read.
    pub fn reset_to(&mut self, pc: u16) {
        self.registers.pc = pc;
        self.registers.sp = POWER_ON_SP;
        self.registers.status.reserved = true;
        self.registers.status.interrupt_disable = true;
        self.pins.address = pc;
        self.pins.read = true;

        self.state = InstructionState::default();
        self.previous = None;
        self.fault = None;
        self.jammed = false;

        debug!("CPU reset, PC=${pc:04X}");
    }

    /// Run the CPU for 1 bus cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if this cycle fetched an unsupported opcode or hit unsupported decimal
    /// arithmetic. The processor is then faulted: every later call returns the same error without
    /// touching the bus, until [`Mos6502::reset`].
    pub fn clock<B: BusInterface>(&mut self, bus: &mut B) -> Result<ClockOutcome, CpuError> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }

        self.registers.status.reserved = true;
        if self.config.force_interrupt_disable {
            self.registers.status.interrupt_disable = true;
        }

        if self.fetch(bus)? {
            return Ok(ClockOutcome::InProgress);
        }

        self.execute(bus)
    }

    /// Fetch and decode the next opcode if no instruction is in flight. Returns whether a fetch
    /// happened; the fetch consumes the bus for this cycle.
    ///
    /// A pending NMI, or an IRQ while I is clear, replaces the fetched opcode with the interrupt
    /// sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::UnsupportedOpcode`] for the unstable undocumented opcodes.
    pub fn fetch<B: BusInterface>(&mut self, bus: &mut B) -> Result<bool, CpuError> {
        if self.is_mid_instruction() {
            return Ok(false);
        }

        let pc = self.registers.pc;
        let fetched = self.read_bus(bus, pc);
        let interrupt = self.poll_interrupt_lines(bus);

        let opcode = if interrupt.is_some() { 0x00 } else { fetched };
        let operation = Operation::from_opcode(opcode);
        if operation.instruction.is_unstable() {
            return Err(self.raise(CpuError::UnsupportedOpcode {
                opcode,
                instruction: operation.instruction,
                pc,
            }));
        }

        if interrupt.is_none() {
            self.registers.pc = pc.wrapping_add(1);
        }

        self.state = InstructionState::new(opcode, operation, pc);
        self.state.interrupt = interrupt;
        self.state.addressing_mode_in_progress = true;

        if log_enabled!(Level::Trace) {
            match interrupt {
                Some(interrupt) => trace!("${pc:04X}: {interrupt:?}"),
                None => trace!("${pc:04X}: ${opcode:02X} {operation}"),
            }
        }

        Ok(true)
    }

    /// Drive the in-flight instruction for 1 bus cycle: one addressing-mode cycle while the
    /// address is still resolving, otherwise one instruction cycle.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::DecimalModeUnsupported`] if the instruction needs the decimal adder and
    /// the configuration rejects it.
    ///
    /// # Panics
    ///
    /// Panics if no instruction is in flight.
    pub fn execute<B: BusInterface>(&mut self, bus: &mut B) -> Result<ClockOutcome, CpuError> {
        assert!(self.is_mid_instruction(), "execute() called with no instruction in flight");

        if self.jammed {
            return Ok(ClockOutcome::Jammed);
        }

        if self.state.addressing_mode_in_progress {
            addressing::step(self, bus);
            if self.state.addressing_mode_in_progress {
                return Ok(ClockOutcome::InProgress);
            }

            if let Err(err) = instructions::begin(self) {
                return Err(self.raise(err));
            }
        } else {
            self.state.instruction_cycle += 1;
            instructions::step(self, bus);
        }

        Ok(self.outcome())
    }

    fn outcome(&self) -> ClockOutcome {
        if self.jammed {
            ClockOutcome::Jammed
        } else if self.is_mid_instruction() {
            ClockOutcome::InProgress
        } else {
            self.previous.map_or(ClockOutcome::InProgress, ClockOutcome::Completed)
        }
    }

    fn raise(&mut self, err: CpuError) -> CpuError {
        error!("CPU faulted: {err}");
        self.fault = Some(err.clone());
        err
    }

    fn poll_interrupt_lines<B: BusInterface>(&self, bus: &mut B) -> Option<Interrupt> {
        if bus.nmi() {
            bus.acknowledge_nmi();
            Some(Interrupt::Nmi)
        } else if !self.registers.status.interrupt_disable && bus.irq() {
            Some(Interrupt::Irq)
        } else {
            None
        }
    }

    pub(crate) fn end_instruction(&mut self) {
        self.previous = Some(CompletedInstruction {
            opcode: self.state.opcode,
            operation: self.state.operation,
            interrupt: self.state.interrupt,
            addressing_cycles: self.state.addressing_cycle,
            instruction_cycles: self.state.instruction_cycle + 1,
            penalty_cycles: self.state.penalty_cycles,
        });

        self.state.addressing_mode_in_progress = false;
        self.state.opcode_in_progress = false;
        self.state.addressing_cycle = 0;
        self.state.instruction_cycle = 0;
    }

    #[inline]
    pub(crate) fn read_bus<B: BusInterface>(&mut self, bus: &mut B, address: u16) -> u8 {
        let value = bus.read(address);
        self.pins = BusPins { address, data: value, read: true };
        value
    }

    #[inline]
    pub(crate) fn write_bus<B: BusInterface>(&mut self, bus: &mut B, address: u16, value: u8) {
        bus.write(address, value);
        self.pins = BusPins { address, data: value, read: false };
    }

    #[inline]
    pub(crate) fn fetch_operand<B: BusInterface>(&mut self, bus: &mut B) -> u8 {
        let operand = self.read_bus(bus, self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        operand
    }

    #[inline]
    fn stack_address(&self) -> u16 {
        u16::from_be_bytes([STACK_PAGE, self.registers.sp])
    }

    #[inline]
    pub(crate) fn push<B: BusInterface>(&mut self, bus: &mut B, value: u8) {
        self.write_bus(bus, self.stack_address(), value);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
    }

    #[inline]
    pub(crate) fn pull<B: BusInterface>(&mut self, bus: &mut B) -> u8 {
        self.registers.sp = self.registers.sp.wrapping_add(1);
        self.read_bus(bus, self.stack_address())
    }

    /// Dummy read of the current stack slot.
    #[inline]
    pub(crate) fn peek_stack<B: BusInterface>(&mut self, bus: &mut B) {
        self.read_bus(bus, self.stack_address());
    }

    #[inline]
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.registers.pc
    }

    #[must_use]
    pub fn registers(&self) -> &CpuRegisters {
        &self.registers
    }

    pub fn set_registers(&mut self, registers: CpuRegisters) {
        self.registers = registers;
    }

    #[must_use]
    pub fn status(&self) -> StatusRegister {
        self.registers.status
    }

    #[must_use]
    pub fn pins(&self) -> BusPins {
        self.pins
    }

    #[must_use]
    pub fn address_bus(&self) -> u16 {
        self.pins.address
    }

    #[must_use]
    pub fn data_bus(&self) -> u8 {
        self.pins.data
    }

    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.state.opcode
    }

    /// The operation currently in flight, or the last one decoded.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.state.operation
    }

    #[must_use]
    pub fn addressing_mode_in_progress(&self) -> bool {
        self.state.addressing_mode_in_progress
    }

    #[must_use]
    pub fn opcode_in_progress(&self) -> bool {
        self.state.opcode_in_progress
    }

    #[must_use]
    pub fn is_mid_instruction(&self) -> bool {
        self.state.addressing_mode_in_progress || self.state.opcode_in_progress
    }

    #[must_use]
    pub fn previous_instruction(&self) -> Option<CompletedInstruction> {
        self.previous
    }

    #[must_use]
    pub fn previous_addressing_cycles(&self) -> u8 {
        self.previous.map_or(0, |completed| completed.addressing_cycles)
    }

    #[must_use]
    pub fn previous_instruction_cycles(&self) -> u8 {
        self.previous.map_or(0, |completed| completed.instruction_cycles)
    }

    /// Return whether the CPU has locked up on a JAM opcode.
    #[inline]
    #[must_use]
    pub fn jammed(&self) -> bool {
        self.jammed
    }

    #[must_use]
    pub fn fault(&self) -> Option<&CpuError> {
        self.fault.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    pub fn reload_config(&mut self, config: CpuConfig) {
        self.config = config;
    }
}
