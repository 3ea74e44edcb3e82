//! Register and flag semantics. Nothing in here touches the bus.

use crate::CpuRegisters;
use crate::num::GetBit;
use crate::operation::Instruction;
use crate::status::StatusRegister;

/// Instructions that go through the decimal adder when D is set.
pub(crate) fn uses_decimal_adder(instruction: Instruction) -> bool {
    matches!(instruction, Instruction::Adc | Instruction::Sbc | Instruction::Rra | Instruction::Isc)
}

pub(crate) fn add(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    let sum = u16::from(accumulator) + u16::from(value) + u16::from(flags.carry);
    let result = sum as u8;

    let overflow = (accumulator ^ result) & (value ^ result) & 0x80 != 0;
    flags.set_nz(result).set_overflow(overflow).set_carry(sum > 0xFF);

    result
}

// Binary subtraction is addition of the one's complement; carry is an inverted borrow
pub(crate) fn subtract(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    add(accumulator, !value, flags)
}

pub(crate) fn compare(register: u8, value: u8, flags: &mut StatusRegister) {
    flags.set_nz(register.wrapping_sub(value)).set_carry(register >= value);
}

fn and(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    let result = accumulator & value;
    flags.set_nz(result);
    result
}

fn or(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    let result = accumulator | value;
    flags.set_nz(result);
    result
}

fn xor(accumulator: u8, value: u8, flags: &mut StatusRegister) -> u8 {
    let result = accumulator ^ value;
    flags.set_nz(result);
    result
}

fn bit_test(accumulator: u8, value: u8, flags: &mut StatusRegister) {
    flags.set_negative(value.bit(7)).set_overflow(value.bit(6)).set_zero(accumulator & value == 0);
}

fn shift_left(value: u8, flags: &mut StatusRegister) -> u8 {
    let shifted = value << 1;
    flags.set_carry(value.bit(7)).set_nz(shifted);
    shifted
}

fn logical_shift_right(value: u8, flags: &mut StatusRegister) -> u8 {
    let shifted = value >> 1;
    flags.set_carry(value.bit(0)).set_nz(shifted);
    shifted
}

fn rotate_left(value: u8, flags: &mut StatusRegister) -> u8 {
    let rotated = (value << 1) | u8::from(flags.carry);
    flags.set_carry(value.bit(7)).set_nz(rotated);
    rotated
}

fn rotate_right(value: u8, flags: &mut StatusRegister) -> u8 {
    let rotated = (value >> 1) | (u8::from(flags.carry) << 7);
    flags.set_carry(value.bit(0)).set_nz(rotated);
    rotated
}

fn increment(value: u8, flags: &mut StatusRegister) -> u8 {
    let incremented = value.wrapping_add(1);
    flags.set_nz(incremented);
    incremented
}

fn decrement(value: u8, flags: &mut StatusRegister) -> u8 {
    let decremented = value.wrapping_sub(1);
    flags.set_nz(decremented);
    decremented
}

fn load(register: &mut u8, value: u8, flags: &mut StatusRegister) {
    *register = value;
    flags.set_nz(value);
}

// ARR: A = (A & #imm) rotated right through carry. N and Z come from the result, C from bit 6 of
// the result, and V from bit 6 XOR bit 5
fn and_rotate_right(registers: &mut CpuRegisters, value: u8) {
    let and_value = registers.accumulator & value;
    let result = (and_value >> 1) | (u8::from(registers.status.carry) << 7);
    registers.accumulator = result;

    registers
        .status
        .set_nz(result)
        .set_carry(result.bit(6))
        .set_overflow(result.bit(6) ^ result.bit(5));
}

// SBX: X = (A & X) - #imm without borrow, with flags set the way CMP sets them
fn and_x_subtract(registers: &mut CpuRegisters, value: u8) {
    let ax = registers.accumulator & registers.x;
    registers.x = ax.wrapping_sub(value);
    compare(ax, value, &mut registers.status);
}

/// Apply an instruction that reads one operand byte.
pub(crate) fn execute_read(instruction: Instruction, registers: &mut CpuRegisters, operand: u8) {
    let status = &mut registers.status;
    match instruction {
        Instruction::Lda => load(&mut registers.accumulator, operand, status),
        Instruction::Ldx => load(&mut registers.x, operand, status),
        Instruction::Ldy => load(&mut registers.y, operand, status),
        Instruction::Lax => {
            load(&mut registers.accumulator, operand, status);
            registers.x = operand;
        }
        Instruction::Adc => registers.accumulator = add(registers.accumulator, operand, status),
        Instruction::Sbc => registers.accumulator = subtract(registers.accumulator, operand, status),
        Instruction::And => registers.accumulator = and(registers.accumulator, operand, status),
        Instruction::Ora => registers.accumulator = or(registers.accumulator, operand, status),
        Instruction::Eor => registers.accumulator = xor(registers.accumulator, operand, status),
        Instruction::Bit => bit_test(registers.accumulator, operand, status),
        Instruction::Cmp => compare(registers.accumulator, operand, status),
        Instruction::Cpx => compare(registers.x, operand, status),
        Instruction::Cpy => compare(registers.y, operand, status),
        Instruction::Anc => {
            // AND, then C is copied from N the way ASL would set it
            registers.accumulator = and(registers.accumulator, operand, status);
            status.set_carry(registers.accumulator.bit(7));
        }
        Instruction::Alr => {
            let and_value = and(registers.accumulator, operand, status);
            registers.accumulator = logical_shift_right(and_value, status);
        }
        Instruction::Arr => and_rotate_right(registers, operand),
        Instruction::Sbx => and_x_subtract(registers, operand),
        Instruction::Nop => {}
        _ => unreachable!("{instruction} does not read an operand"),
    }
}

/// Value written by a store instruction.
pub(crate) fn store_value(instruction: Instruction, registers: &CpuRegisters) -> u8 {
    match instruction {
        Instruction::Sta => registers.accumulator,
        Instruction::Stx => registers.x,
        Instruction::Sty => registers.y,
        Instruction::Sax => registers.accumulator & registers.x,
        _ => unreachable!("{instruction} is not a store"),
    }
}

/// Apply a read-modify-write instruction to `value` and return the byte to write back. The
/// composite undocumented instructions also apply their second operation to the registers.
pub(crate) fn execute_modify(instruction: Instruction, registers: &mut CpuRegisters, value: u8) -> u8 {
    let status = &mut registers.status;
    match instruction {
        Instruction::Asl => shift_left(value, status),
        Instruction::Lsr => logical_shift_right(value, status),
        Instruction::Rol => rotate_left(value, status),
        Instruction::Ror => rotate_right(value, status),
        Instruction::Inc => increment(value, status),
        Instruction::Dec => decrement(value, status),
        // SLO: ASL, then ORA
        Instruction::Slo => {
            let shifted = shift_left(value, status);
            registers.accumulator = or(registers.accumulator, shifted, status);
            shifted
        }
        // RLA: ROL, then AND
        Instruction::Rla => {
            let rotated = rotate_left(value, status);
            registers.accumulator = and(registers.accumulator, rotated, status);
            rotated
        }
        // SRE: LSR, then EOR
        Instruction::Sre => {
            let shifted = logical_shift_right(value, status);
            registers.accumulator = xor(registers.accumulator, shifted, status);
            shifted
        }
        // RRA: ROR, then ADC using the carry the rotate produced
        Instruction::Rra => {
            let rotated = rotate_right(value, status);
            registers.accumulator = add(registers.accumulator, rotated, status);
            rotated
        }
        // DCP: DEC, then CMP
        Instruction::Dcp => {
            let decremented = value.wrapping_sub(1);
            compare(registers.accumulator, decremented, status);
            decremented
        }
        // ISC: INC, then SBC
        Instruction::Isc => {
            let incremented = value.wrapping_add(1);
            registers.accumulator = subtract(registers.accumulator, incremented, status);
            incremented
        }
        _ => unreachable!("{instruction} is not a read-modify-write instruction"),
    }
}

/// Single-byte instructions that only touch registers.
pub(crate) fn execute_implied(instruction: Instruction, registers: &mut CpuRegisters) {
    let status = &mut registers.status;
    match instruction {
        Instruction::Clc => status.carry = false,
        Instruction::Cld => status.decimal = false,
        Instruction::Cli => status.interrupt_disable = false,
        Instruction::Clv => status.overflow = false,
        Instruction::Sec => status.carry = true,
        Instruction::Sed => status.decimal = true,
        Instruction::Sei => status.interrupt_disable = true,
        Instruction::Inx => registers.x = increment(registers.x, status),
        Instruction::Iny => registers.y = increment(registers.y, status),
        Instruction::Dex => registers.x = decrement(registers.x, status),
        Instruction::Dey => registers.y = decrement(registers.y, status),
        Instruction::Tax => load(&mut registers.x, registers.accumulator, status),
        Instruction::Tay => load(&mut registers.y, registers.accumulator, status),
        Instruction::Txa => load(&mut registers.accumulator, registers.x, status),
        Instruction::Tya => load(&mut registers.accumulator, registers.y, status),
        Instruction::Tsx => load(&mut registers.x, registers.sp, status),
        // TXS is the only transfer that leaves the flags alone
        Instruction::Txs => registers.sp = registers.x,
        _ => unreachable!("{instruction} is not a register instruction"),
    }
}
