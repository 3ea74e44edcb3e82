use crate::bus::BusInterface;
use crate::instructions::memory;
use crate::num::U16Ext;
use crate::operation::Instruction;
use crate::status::StatusRegister;
use crate::{IRQ_VECTOR, Mos6502};
use log::warn;

macro_rules! invalid_cycle {
    ($cpu:expr) => {
        panic!(
            "Invalid instruction cycle {} for {}",
            $cpu.state.instruction_cycle, $cpu.state.operation
        )
    };
}

fn branch_taken(instruction: Instruction, status: StatusRegister) -> bool {
    match instruction {
        Instruction::Bcc => !status.carry,
        Instruction::Bcs => status.carry,
        Instruction::Beq => status.zero,
        Instruction::Bne => !status.zero,
        Instruction::Bmi => status.negative,
        Instruction::Bpl => !status.negative,
        Instruction::Bvc => !status.overflow,
        Instruction::Bvs => status.overflow,
        _ => unreachable!("{instruction} is not a branch"),
    }
}

pub(crate) fn begin_branch(cpu: &mut Mos6502) {
    if !branch_taken(cpu.state.operation.instruction, cpu.registers.status) {
        cpu.end_instruction();
    }
}

// BCC, BCS, BEQ, BNE, BMI, BPL, BVC, BVS
pub(crate) fn branch<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    match cpu.state.instruction_cycle {
        1 => {
            // Spurious read of the next opcode while the offset is added to PCL
            cpu.read_bus(bus, cpu.registers.pc);
            cpu.state.penalty_cycles += 1;

            let target = cpu.registers.pc.wrapping_add(cpu.state.relative_address);
            cpu.state.temp_address = target;

            if target.msb() == cpu.registers.pc.msb() {
                cpu.registers.pc = target;
                cpu.end_instruction();
            }
        }
        2 => {
            // Spurious read with the new PCL but the old PCH
            let target = cpu.state.temp_address;
            let unfixed = u16::from_le_bytes([target.lsb(), cpu.registers.pc.msb()]);
            cpu.read_bus(bus, unfixed);
            cpu.state.penalty_cycles += 1;

            cpu.registers.pc = target;
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

// JMP (absolute and indirect); the addressing mode already resolved the target
pub(crate) fn jmp(cpu: &mut Mos6502) {
    cpu.registers.pc = cpu.state.effective_address;
    cpu.end_instruction();
}

fn push_pc_msb<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    cpu.push(bus, cpu.registers.pc.msb());
}

fn push_pc_lsb<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    cpu.push(bus, cpu.registers.pc.lsb());
}

fn pull_pc_lsb<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    let lsb = cpu.pull(bus);
    cpu.registers.pc = (cpu.registers.pc & 0xFF00) | u16::from(lsb);
}

fn pull_pc_msb<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    let msb = cpu.pull(bus);
    cpu.registers.pc = (cpu.registers.pc & 0x00FF) | (u16::from(msb) << 8);
}

// JSR (jump to subroutine)
pub(crate) fn jsr<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    match cpu.state.instruction_cycle {
        1 => {
            // Spurious stack read
            cpu.peek_stack(bus);
        }
        2 => push_pc_msb(cpu, bus),
        3 => push_pc_lsb(cpu, bus),
        4 => {
            // PC still points at the high byte of the target, which is what was pushed
            let msb = cpu.read_bus(bus, cpu.registers.pc);
            cpu.registers.pc = u16::from_le_bytes([cpu.state.low_byte, msb]);
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

// RTS (return from subroutine)
pub(crate) fn rts<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    match cpu.state.instruction_cycle {
        1 => {
            // Spurious stack read
            cpu.peek_stack(bus);
        }
        2 => pull_pc_lsb(cpu, bus),
        3 => pull_pc_msb(cpu, bus),
        4 => {
            // Fetch and discard the last byte of the JSR, moving PC past it
            cpu.fetch_operand(bus);
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

// RTI (return from interrupt)
pub(crate) fn rti<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    match cpu.state.instruction_cycle {
        1 => {
            // Spurious stack read
            cpu.peek_stack(bus);
        }
        2 => {
            let value = cpu.pull(bus);
            memory::restore_status(cpu, value);
        }
        3 => pull_pc_lsb(cpu, bus),
        4 => {
            pull_pc_msb(cpu, bus);
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

pub(crate) fn begin_brk(cpu: &mut Mos6502) {
    // BRK skips its signature byte; a hardware interrupt returns to the interrupted opcode
    if cpu.state.interrupt.is_none() {
        cpu.registers.pc = cpu.registers.pc.wrapping_add(1);
    }
}

// BRK (force interrupt), and the IRQ/NMI sequences that share its bus cycles
pub(crate) fn brk<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    match cpu.state.instruction_cycle {
        1 => push_pc_msb(cpu, bus),
        2 => push_pc_lsb(cpu, bus),
        3 => {
            let status = match cpu.state.interrupt {
                Some(_) => cpu.registers.status.to_byte(),
                None => {
                    cpu.registers.status.break_flag = true;
                    let status = cpu.registers.status.to_byte();
                    cpu.registers.status.break_flag = false;
                    status
                }
            };
            cpu.push(bus, status);

            cpu.state.temp_address = cpu.state.interrupt.map_or(IRQ_VECTOR, |interrupt| interrupt.vector());
        }
        4 => {
            let lsb = cpu.read_bus(bus, cpu.state.temp_address);
            cpu.state.low_byte = lsb;
            cpu.registers.status.interrupt_disable = true;
        }
        5 => {
            let msb = cpu.read_bus(bus, cpu.state.temp_address.wrapping_add(1));
            cpu.registers.pc = u16::from_le_bytes([cpu.state.low_byte, msb]);
            cpu.end_instruction();
        }
        _ => invalid_cycle!(cpu),
    }
}

// JAM locks up the CPU; opcode_in_progress stays set until a reset
pub(crate) fn jam(cpu: &mut Mos6502) {
    cpu.jammed = true;
    warn!(
        "JAM opcode ${:02X} at ${:04X}, CPU halted until reset",
        cpu.state.opcode, cpu.state.instruction_pc
    );
}
