//! A processor wired to a [`DeviceBus`], clocked together.

use crate::bus::DeviceBus;
use crate::{ClockOutcome, CompletedInstruction, CpuConfig, CpuError, Mos6502};

pub struct System {
    cpu: Mos6502,
    bus: DeviceBus,
}

impl System {
    /// Build a system from a populated bus. The processor is reset immediately, so the RESET
    /// vector must already be readable through the bus.
    #[must_use]
    pub fn new(mut bus: DeviceBus, config: CpuConfig) -> Self {
        let cpu = Mos6502::new(&mut bus, config);
        Self { cpu, bus }
    }

    /// Run one clock period. The processor drives the bus first, then every device is ticked in
    /// priority order so that devices observe the cycle the processor just performed.
    ///
    /// # Errors
    ///
    /// Propagates any [`CpuError`] from the processor. Devices are ticked either way.
    pub fn clock(&mut self) -> Result<ClockOutcome, CpuError> {
        let outcome = self.cpu.clock(&mut self.bus);
        self.bus.clock_devices();
        outcome
    }

    /// Clock until the current instruction completes. Returns `None` if the processor is locked
    /// up by a JAM opcode.
    ///
    /// # Errors
    ///
    /// Propagates any [`CpuError`] from the processor.
    pub fn run_instruction(&mut self) -> Result<Option<CompletedInstruction>, CpuError> {
        loop {
            match self.clock()? {
                ClockOutcome::Completed(completed) => return Ok(Some(completed)),
                ClockOutcome::Jammed => return Ok(None),
                ClockOutcome::InProgress => {}
            }
        }
    }

    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
    }

    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &DeviceBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut DeviceBus {
        &mut self.bus
    }
}
