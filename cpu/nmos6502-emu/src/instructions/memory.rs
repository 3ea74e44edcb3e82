use crate::Mos6502;
use crate::bus::BusInterface;
use crate::instructions::alu;
use crate::operation::{AddressingMode, Instruction};
use crate::status::StatusFlag;

macro_rules! invalid_cycle {
    ($cpu:expr) => {
        panic!(
            "Invalid instruction cycle {} for {}",
            $cpu.state.instruction_cycle, $cpu.state.operation
        )
    };
}

pub(crate) fn begin_read(cpu: &mut Mos6502) {
    match cpu.state.operation.addressing_mode {
        AddressingMode::Immediate => {
            let operand = cpu.state.operand;
            alu::execute_read(cpu.state.operation.instruction, &mut cpu.registers, operand);
            cpu.end_instruction();
        }
        // Single-byte NOPs
        AddressingMode::Implied => cpu.end_instruction(),
        _ => {}
    }
}

pub(crate) fn read<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    match cpu.state.instruction_cycle {
        1 => {
            let operand = cpu.read_bus(bus, cpu.state.effective_address);
            alu::execute_read(cpu.state.operation.instruction, &mut cpu.registers, operand);
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

pub(crate) fn store<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    match cpu.state.instruction_cycle {
        1 => {
            let value = alu::store_value(cpu.state.operation.instruction, &cpu.registers);
            cpu.write_bus(bus, cpu.state.effective_address, value);
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

pub(crate) fn begin_modify(cpu: &mut Mos6502) {
    if cpu.state.operation.addressing_mode == AddressingMode::Accumulator {
        let value = cpu.registers.accumulator;
        cpu.registers.accumulator =
            alu::execute_modify(cpu.state.operation.instruction, &mut cpu.registers, value);
        cpu.end_instruction();
    }
}

pub(crate) fn modify<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    let address = cpu.state.effective_address;
    match cpu.state.instruction_cycle {
        1 => {
            cpu.state.operand = cpu.read_bus(bus, address);
        }
        2 => {
            // The unmodified value is written back while the ALU works
            cpu.write_bus(bus, address, cpu.state.operand);
            cpu.state.operand =
                alu::execute_modify(cpu.state.operation.instruction, &mut cpu.registers, cpu.state.operand);
        }
        3 => {
            cpu.write_bus(bus, address, cpu.state.operand);
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

// PHA, PHP
pub(crate) fn push<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    match cpu.state.instruction_cycle {
        1 => {
            let value = match cpu.state.operation.instruction {
                Instruction::Pha => cpu.registers.accumulator,
                // B only exists in the pushed copy
                Instruction::Php => cpu.registers.status.to_byte() | StatusFlag::Break.mask(),
                instruction => unreachable!("{instruction} is not a push"),
            };
            cpu.push(bus, value);
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

// PLA, PLP
pub(crate) fn pull<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    match cpu.state.instruction_cycle {
        1 => {
            // Spurious stack read while SP is incremented
            cpu.peek_stack(bus);
        }
        2 => {
            let value = cpu.pull(bus);
            match cpu.state.operation.instruction {
                Instruction::Pla => {
                    cpu.registers.accumulator = value;
                    cpu.registers.status.set_nz(value);
                }
                Instruction::Plp => restore_status(cpu, value),
                instruction => unreachable!("{instruction} is not a pull"),
            }
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

/// PLP and RTI restore every flag from the stack, but B does not exist in the register and the
/// reserved bit always reads back set.
pub(crate) fn restore_status(cpu: &mut Mos6502, value: u8) {
    cpu.registers.status.set_from_byte(value);
    cpu.registers.status.set_flag(StatusFlag::Break, false).set_flag(StatusFlag::Reserved, true);
}
