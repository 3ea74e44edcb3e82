//! Instruction state machines.
//!
//! [`begin`] runs in the same clock that finished the addressing mode and does not use the bus.
//! Instructions that need no further bus cycles (immediate reads, accumulator shifts, register
//! operations, JMP, branches not taken) finish there. Every later clock calls [`step`] with
//! `instruction_cycle` advanced to the index of the bus cycle being performed, starting at 1.

mod alu;
mod flow;
mod memory;

#[cfg(test)]
mod tests;

use crate::Mos6502;
use crate::bus::BusInterface;
use crate::error::CpuError;
use crate::operation::{Access, Instruction};
use nmos6502_config::DecimalMode;

pub(crate) fn begin(cpu: &mut Mos6502) -> Result<(), CpuError> {
    cpu.state.opcode_in_progress = true;
    cpu.state.instruction_cycle = 0;

    let operation = cpu.state.operation;
    if alu::uses_decimal_adder(operation.instruction)
        && cpu.registers.status.decimal
        && cpu.config.decimal_mode == DecimalMode::Reject
    {
        return Err(CpuError::DecimalModeUnsupported {
            opcode: cpu.state.opcode,
            pc: cpu.state.instruction_pc,
        });
    }

    match operation.access() {
        Access::Read => memory::begin_read(cpu),
        Access::ReadModifyWrite => memory::begin_modify(cpu),
        Access::Jump => flow::jmp(cpu),
        Access::Branch => flow::begin_branch(cpu),
        Access::Write | Access::Subroutine => {}
        Access::None => match operation.instruction {
            Instruction::Pha
            | Instruction::Php
            | Instruction::Pla
            | Instruction::Plp
            | Instruction::Rts
            | Instruction::Rti => {}
            Instruction::Brk => flow::begin_brk(cpu),
            Instruction::Jam => flow::jam(cpu),
            instruction => {
                alu::execute_implied(instruction, &mut cpu.registers);
                cpu.end_instruction();
            }
        },
    }

    Ok(())
}

pub(crate) fn step<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    let operation = cpu.state.operation;
    match operation.access() {
        Access::Read => memory::read(cpu, bus),
        Access::Write => memory::store(cpu, bus),
        Access::ReadModifyWrite => memory::modify(cpu, bus),
        Access::Subroutine => flow::jsr(cpu, bus),
        Access::Branch => flow::branch(cpu, bus),
        Access::Jump => panic!("{operation} has no bus cycles after its addressing mode"),
        Access::None => match operation.instruction {
            Instruction::Pha | Instruction::Php => memory::push(cpu, bus),
            Instruction::Pla | Instruction::Plp => memory::pull(cpu, bus),
            Instruction::Rts => flow::rts(cpu, bus),
            Instruction::Rti => flow::rti(cpu, bus),
            Instruction::Brk => flow::brk(cpu, bus),
            _ => panic!("{operation} has no bus cycles after its addressing mode"),
        },
    }
}
