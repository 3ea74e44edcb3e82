//! Addressing-mode state machines.
//!
//! Each mode runs one bus cycle per call and clears `addressing_mode_in_progress` on its final
//! cycle. On completion the effective address is in `state.effective_address`, except for
//! immediate mode (operand in `state.operand`), relative mode (sign-extended offset in
//! `state.relative_address`), and JSR's absolute mode (target low byte in `state.low_byte`).

use crate::Mos6502;
use crate::bus::BusInterface;
use crate::num::U16Ext;
use crate::operation::{Access, AddressingMode};

macro_rules! invalid_cycle {
    ($cpu:expr, $cycle:expr) => {
        panic!(
            "Invalid addressing cycle {} for {:?}",
            $cycle, $cpu.state.operation.addressing_mode
        )
    };
}

pub(crate) fn step<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    let cycle = cpu.state.addressing_cycle;
    cpu.state.addressing_cycle += 1;

    let (x, y) = (cpu.registers.x, cpu.registers.y);

    match cpu.state.operation.addressing_mode {
        AddressingMode::Implied | AddressingMode::Accumulator => implied(cpu, bus, cycle),
        AddressingMode::Immediate => immediate(cpu, bus, cycle),
        AddressingMode::ZeroPage => zero_page(cpu, bus, cycle),
        AddressingMode::ZeroPageX => zero_page_indexed(cpu, bus, cycle, x),
        AddressingMode::ZeroPageY => zero_page_indexed(cpu, bus, cycle, y),
        AddressingMode::Absolute => absolute(cpu, bus, cycle),
        AddressingMode::AbsoluteX => absolute_indexed(cpu, bus, cycle, x),
        AddressingMode::AbsoluteY => absolute_indexed(cpu, bus, cycle, y),
        AddressingMode::Relative => relative(cpu, bus, cycle),
        AddressingMode::Indirect => indirect(cpu, bus, cycle),
        AddressingMode::IndirectX => indirect_x(cpu, bus, cycle),
        AddressingMode::IndirectY => indirect_y(cpu, bus, cycle),
    }
}

#[inline]
fn finish(cpu: &mut Mos6502) {
    cpu.state.addressing_mode_in_progress = false;
}

fn implied<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8) {
    match cycle {
        0 => {
            // Spurious read of the next byte; PC does not advance
            cpu.read_bus(bus, cpu.registers.pc);
            finish(cpu);
        }
        _ => invalid_cycle!(cpu, cycle),
    }
}

fn immediate<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8) {
    match cycle {
        0 => {
            cpu.state.effective_address = cpu.registers.pc;
            cpu.state.operand = cpu.fetch_operand(bus);
            finish(cpu);
        }
        _ => invalid_cycle!(cpu, cycle),
    }
}

fn zero_page<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8) {
    match cycle {
        0 => {
            cpu.state.effective_address = cpu.fetch_operand(bus).into();
            finish(cpu);
        }
        _ => invalid_cycle!(cpu, cycle),
    }
}

fn zero_page_indexed<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8, index: u8) {
    match cycle {
        0 => {
            cpu.state.low_byte = cpu.fetch_operand(bus);
        }
        1 => {
            // The unindexed address is read while the index is added; the sum never leaves page 0
            cpu.read_bus(bus, cpu.state.low_byte.into());
            cpu.state.effective_address = cpu.state.low_byte.wrapping_add(index).into();
            finish(cpu);
        }
        _ => invalid_cycle!(cpu, cycle),
    }
}

fn absolute<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8) {
    match cycle {
        0 => {
            cpu.state.low_byte = cpu.fetch_operand(bus);

            // JSR fetches the high byte only after pushing the return address
            if cpu.state.operation.access() == Access::Subroutine {
                finish(cpu);
            }
        }
        1 => {
            cpu.state.high_byte = cpu.fetch_operand(bus);
            cpu.state.effective_address =
                u16::from_le_bytes([cpu.state.low_byte, cpu.state.high_byte]);
            finish(cpu);
        }
        _ => invalid_cycle!(cpu, cycle),
    }
}

/// Add an index to a 16-bit base address. Reads finish immediately if the index does not carry
/// into the high byte; everything else needs the fix-up cycle in [`page_fix`].
fn index_base(cpu: &mut Mos6502, base: u16, index: u8) {
    let effective = base.wrapping_add(index.into());

    cpu.state.effective_address = effective;
    cpu.state.temp_address = u16::from_le_bytes([effective.lsb(), base.msb()]);
    cpu.state.page_crossed = base.msb() != effective.msb();

    if !cpu.state.page_crossed && cpu.state.operation.access() == Access::Read {
        finish(cpu);
    }
}

fn page_fix<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) {
    // Spurious read from the address before the carry was applied to the high byte
    cpu.read_bus(bus, cpu.state.temp_address);

    if cpu.state.page_crossed && cpu.state.operation.access() == Access::Read {
        cpu.state.penalty_cycles += 1;
    }
    finish(cpu);
}

fn absolute_indexed<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8, index: u8) {
    match cycle {
        0 => {
            cpu.state.low_byte = cpu.fetch_operand(bus);
        }
        1 => {
            cpu.state.high_byte = cpu.fetch_operand(bus);
            let base = u16::from_le_bytes([cpu.state.low_byte, cpu.state.high_byte]);
            index_base(cpu, base, index);
        }
        2 => page_fix(cpu, bus),
        _ => invalid_cycle!(cpu, cycle),
    }
}

fn relative<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8) {
    match cycle {
        0 => {
            let offset = cpu.fetch_operand(bus);
            cpu.state.operand = offset;
            cpu.state.relative_address =
                if offset & 0x80 != 0 { u16::from(offset) | 0xFF00 } else { offset.into() };
            finish(cpu);
        }
        _ => invalid_cycle!(cpu, cycle),
    }
}

fn indirect<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8) {
    match cycle {
        0 => {
            cpu.state.low_byte = cpu.fetch_operand(bus);
        }
        1 => {
            cpu.state.high_byte = cpu.fetch_operand(bus);
            cpu.state.temp_address = u16::from_le_bytes([cpu.state.low_byte, cpu.state.high_byte]);
        }
        2 => {
            cpu.state.low_byte = cpu.read_bus(bus, cpu.state.temp_address);
        }
        3 => {
            // The pointer increment does not carry: JMP ($10FF) reads its high byte from $1000
            let pointer = cpu.state.temp_address;
            let msb_address = u16::from_le_bytes([pointer.lsb().wrapping_add(1), pointer.msb()]);
            cpu.state.high_byte = cpu.read_bus(bus, msb_address);
            cpu.state.effective_address =
                u16::from_le_bytes([cpu.state.low_byte, cpu.state.high_byte]);
            finish(cpu);
        }
        _ => invalid_cycle!(cpu, cycle),
    }
}

fn indirect_x<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8) {
    match cycle {
        0 => {
            cpu.state.operand = cpu.fetch_operand(bus);
        }
        1 => {
            // Spurious read of the unindexed pointer
            cpu.read_bus(bus, cpu.state.operand.into());
            cpu.state.operand = cpu.state.operand.wrapping_add(cpu.registers.x);
        }
        2 => {
            cpu.state.low_byte = cpu.read_bus(bus, cpu.state.operand.into());
        }
        3 => {
            let pointer = cpu.state.operand.wrapping_add(1);
            cpu.state.high_byte = cpu.read_bus(bus, pointer.into());
            cpu.state.effective_address =
                u16::from_le_bytes([cpu.state.low_byte, cpu.state.high_byte]);
            finish(cpu);
        }
        _ => invalid_cycle!(cpu, cycle),
    }
}

fn indirect_y<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, cycle: u8) {
    match cycle {
        0 => {
            cpu.state.operand = cpu.fetch_operand(bus);
        }
        1 => {
            cpu.state.low_byte = cpu.read_bus(bus, cpu.state.operand.into());
        }
        2 => {
            let pointer = cpu.state.operand.wrapping_add(1);
            cpu.state.high_byte = cpu.read_bus(bus, pointer.into());

            let base = u16::from_le_bytes([cpu.state.low_byte, cpu.state.high_byte]);
            let index = cpu.registers.y;
            index_base(cpu, base, index);
        }
        3 => page_fix(cpu, bus),
        _ => invalid_cycle!(cpu, cycle),
    }
}
