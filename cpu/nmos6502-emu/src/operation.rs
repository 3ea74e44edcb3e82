//! The opcode table.
//!
//! Every one of the 256 opcode bytes decodes to an [`Operation`]: an addressing mode, an
//! instruction, and the number of machine cycles the pair takes on an NMOS 6502 when no
//! page-crossing or branch penalty applies.

use bincode::{Decode, Encode};
use nmos6502_proc_macros::EnumDisplay;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, EnumDisplay)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Relative,
    Indirect,
    IndirectX,
    IndirectY,
}

/// How an instruction uses the bus once its addressing mode has resolved. This decides which
/// dummy cycles the addressing mode has to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum Access {
    /// No memory operand (register operations, stack operations, BRK/RTI/RTS)
    None,
    Read,
    Write,
    ReadModifyWrite,
    /// JMP; the resolved address becomes the new PC
    Jump,
    /// JSR; only the low byte of the target is fetched before the stack pushes
    Subroutine,
    Branch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum Instruction {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Undocumented
    Slo,
    Rla,
    Sre,
    Rra,
    Sax,
    Lax,
    Dcp,
    Isc,
    Anc,
    Alr,
    Arr,
    Sbx,
    Ane,
    Sha,
    Tas,
    Shy,
    Shx,
    Lxa,
    Las,
    Jam,
}

impl Instruction {
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Adc
            | Self::And
            | Self::Bit
            | Self::Cmp
            | Self::Cpx
            | Self::Cpy
            | Self::Eor
            | Self::Lda
            | Self::Ldx
            | Self::Ldy
            | Self::Nop
            | Self::Ora
            | Self::Sbc
            | Self::Lax
            | Self::Anc
            | Self::Alr
            | Self::Arr
            | Self::Sbx
            | Self::Ane
            | Self::Lxa
            | Self::Las => Access::Read,
            Self::Sta | Self::Stx | Self::Sty | Self::Sax | Self::Sha | Self::Tas | Self::Shy | Self::Shx => {
                Access::Write
            }
            Self::Asl
            | Self::Lsr
            | Self::Rol
            | Self::Ror
            | Self::Inc
            | Self::Dec
            | Self::Slo
            | Self::Rla
            | Self::Sre
            | Self::Rra
            | Self::Dcp
            | Self::Isc => Access::ReadModifyWrite,
            Self::Jmp => Access::Jump,
            Self::Jsr => Access::Subroutine,
            Self::Bcc
            | Self::Bcs
            | Self::Beq
            | Self::Bmi
            | Self::Bne
            | Self::Bpl
            | Self::Bvc
            | Self::Bvs => Access::Branch,
            Self::Brk
            | Self::Clc
            | Self::Cld
            | Self::Cli
            | Self::Clv
            | Self::Dex
            | Self::Dey
            | Self::Inx
            | Self::Iny
            | Self::Pha
            | Self::Php
            | Self::Pla
            | Self::Plp
            | Self::Rti
            | Self::Rts
            | Self::Sec
            | Self::Sed
            | Self::Sei
            | Self::Tax
            | Self::Tay
            | Self::Tsx
            | Self::Txa
            | Self::Txs
            | Self::Tya
            | Self::Jam => Access::None,
        }
    }

    /// Undocumented opcodes whose behavior depends on analog effects (bus capacitance,
    /// temperature, chip revision). These fault the CPU rather than guess.
    #[must_use]
    pub const fn is_unstable(self) -> bool {
        matches!(
            self,
            Self::Ane | Self::Lxa | Self::Sha | Self::Tas | Self::Shx | Self::Shy | Self::Las
        )
    }

    #[must_use]
    pub const fn is_undocumented(self) -> bool {
        matches!(
            self,
            Self::Slo
                | Self::Rla
                | Self::Sre
                | Self::Rra
                | Self::Sax
                | Self::Lax
                | Self::Dcp
                | Self::Isc
                | Self::Anc
                | Self::Alr
                | Self::Arr
                | Self::Sbx
                | Self::Ane
                | Self::Sha
                | Self::Tas
                | Self::Shy
                | Self::Shx
                | Self::Lxa
                | Self::Las
                | Self::Jam
        )
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Adc => "ADC",
            Self::And => "AND",
            Self::Asl => "ASL",
            Self::Bcc => "BCC",
            Self::Bcs => "BCS",
            Self::Beq => "BEQ",
            Self::Bit => "BIT",
            Self::Bmi => "BMI",
            Self::Bne => "BNE",
            Self::Bpl => "BPL",
            Self::Brk => "BRK",
            Self::Bvc => "BVC",
            Self::Bvs => "BVS",
            Self::Clc => "CLC",
            Self::Cld => "CLD",
            Self::Cli => "CLI",
            Self::Clv => "CLV",
            Self::Cmp => "CMP",
            Self::Cpx => "CPX",
            Self::Cpy => "CPY",
            Self::Dec => "DEC",
            Self::Dex => "DEX",
            Self::Dey => "DEY",
            Self::Eor => "EOR",
            Self::Inc => "INC",
            Self::Inx => "INX",
            Self::Iny => "INY",
            Self::Jmp => "JMP",
            Self::Jsr => "JSR",
            Self::Lda => "LDA",
            Self::Ldx => "LDX",
            Self::Ldy => "LDY",
            Self::Lsr => "LSR",
            Self::Nop => "NOP",
            Self::Ora => "ORA",
            Self::Pha => "PHA",
            Self::Php => "PHP",
            Self::Pla => "PLA",
            Self::Plp => "PLP",
            Self::Rol => "ROL",
            Self::Ror => "ROR",
            Self::Rti => "RTI",
            Self::Rts => "RTS",
            Self::Sbc => "SBC",
            Self::Sec => "SEC",
            Self::Sed => "SED",
            Self::Sei => "SEI",
            Self::Sta => "STA",
            Self::Stx => "STX",
            Self::Sty => "STY",
            Self::Tax => "TAX",
            Self::Tay => "TAY",
            Self::Tsx => "TSX",
            Self::Txa => "TXA",
            Self::Txs => "TXS",
            Self::Tya => "TYA",
            Self::Slo => "SLO",
            Self::Rla => "RLA",
            Self::Sre => "SRE",
            Self::Rra => "RRA",
            Self::Sax => "SAX",
            Self::Lax => "LAX",
            Self::Dcp => "DCP",
            Self::Isc => "ISC",
            Self::Anc => "ANC",
            Self::Alr => "ALR",
            Self::Arr => "ARR",
            Self::Sbx => "SBX",
            Self::Ane => "ANE",
            Self::Sha => "SHA",
            Self::Tas => "TAS",
            Self::Shy => "SHY",
            Self::Shx => "SHX",
            Self::Lxa => "LXA",
            Self::Las => "LAS",
            Self::Jam => "JAM",
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// An entry in the opcode table.
///
/// Two operations are equal if they pair the same instruction with the same addressing mode;
/// opcodes that alias each other (the many NOPs, the two SBC #imm, the twelve JAMs) compare equal.
#[derive(Debug, Clone, Copy, Eq, Hash, Encode, Decode)]
pub struct Operation {
    pub instruction: Instruction,
    pub addressing_mode: AddressingMode,
    /// Machine cycles including the opcode fetch, without any penalty cycles. 0 for JAM, which
    /// never completes
    pub cycles: u8,
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.instruction == other.instruction && self.addressing_mode == other.addressing_mode
    }
}

impl Operation {
    const fn new(instruction: Instruction, addressing_mode: AddressingMode, cycles: u8) -> Self {
        Self { instruction, addressing_mode, cycles }
    }

    #[inline]
    #[must_use]
    pub fn from_opcode(opcode: u8) -> Self {
        OPERATION_TABLE[opcode as usize]
    }

    #[inline]
    #[must_use]
    pub const fn access(self) -> Access {
        self.instruction.access()
    }

    /// The most cycles this operation may take on top of [`Operation::cycles`].
    ///
    /// Indexed reads pay 1 cycle when the index carries into the high byte. Branches pay 1 cycle
    /// when taken and 1 more when the target is on a different page. Writes and read-modify-writes
    /// always take the fix-up cycle, so it is already counted in their base cycles.
    #[must_use]
    pub const fn max_extra_cycles(self) -> u8 {
        match (self.instruction.access(), self.addressing_mode) {
            (Access::Branch, _) => 2,
            (Access::Read, AddressingMode::AbsoluteX | AddressingMode::AbsoluteY | AddressingMode::IndirectY) => 1,
            _ => 0,
        }
    }

    #[must_use]
    pub const fn max_potential_cycles(self) -> u8 {
        self.cycles + self.max_extra_cycles()
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.instruction, self.addressing_mode)
    }
}

macro_rules! op {
    ($instruction:ident, $mode:ident, $cycles:literal) => {
        Operation::new(Instruction::$instruction, AddressingMode::$mode, $cycles)
    };
}

#[rustfmt::skip]
pub static OPERATION_TABLE: [Operation; 256] = [
    // $00-$0F
    op!(Brk, Implied, 7), op!(Ora, IndirectX, 6), op!(Jam, Implied, 0), op!(Slo, IndirectX, 8),
    op!(Nop, ZeroPage, 3), op!(Ora, ZeroPage, 3), op!(Asl, ZeroPage, 5), op!(Slo, ZeroPage, 5),
    op!(Php, Implied, 3), op!(Ora, Immediate, 2), op!(Asl, Accumulator, 2), op!(Anc, Immediate, 2),
    op!(Nop, Absolute, 4), op!(Ora, Absolute, 4), op!(Asl, Absolute, 6), op!(Slo, Absolute, 6),
    // $10-$1F
    op!(Bpl, Relative, 2), op!(Ora, IndirectY, 5), op!(Jam, Implied, 0), op!(Slo, IndirectY, 8),
    op!(Nop, ZeroPageX, 4), op!(Ora, ZeroPageX, 4), op!(Asl, ZeroPageX, 6), op!(Slo, ZeroPageX, 6),
    op!(Clc, Implied, 2), op!(Ora, AbsoluteY, 4), op!(Nop, Implied, 2), op!(Slo, AbsoluteY, 7),
    op!(Nop, AbsoluteX, 4), op!(Ora, AbsoluteX, 4), op!(Asl, AbsoluteX, 7), op!(Slo, AbsoluteX, 7),
    // $20-$2F
    op!(Jsr, Absolute, 6), op!(And, IndirectX, 6), op!(Jam, Implied, 0), op!(Rla, IndirectX, 8),
    op!(Bit, ZeroPage, 3), op!(And, ZeroPage, 3), op!(Rol, ZeroPage, 5), op!(Rla, ZeroPage, 5),
    op!(Plp, Implied, 4), op!(And, Immediate, 2), op!(Rol, Accumulator, 2), op!(Anc, Immediate, 2),
    op!(Bit, Absolute, 4), op!(And, Absolute, 4), op!(Rol, Absolute, 6), op!(Rla, Absolute, 6),
    // $30-$3F
    op!(Bmi, Relative, 2), op!(And, IndirectY, 5), op!(Jam, Implied, 0), op!(Rla, IndirectY, 8),
    op!(Nop, ZeroPageX, 4), op!(And, ZeroPageX, 4), op!(Rol, ZeroPageX, 6), op!(Rla, ZeroPageX, 6),
    op!(Sec, Implied, 2), op!(And, AbsoluteY, 4), op!(Nop, Implied, 2), op!(Rla, AbsoluteY, 7),
    op!(Nop, AbsoluteX, 4), op!(And, AbsoluteX, 4), op!(Rol, AbsoluteX, 7), op!(Rla, AbsoluteX, 7),
    // $40-$4F
    op!(Rti, Implied, 6), op!(Eor, IndirectX, 6), op!(Jam, Implied, 0), op!(Sre, IndirectX, 8),
    op!(Nop, ZeroPage, 3), op!(Eor, ZeroPage, 3), op!(Lsr, ZeroPage, 5), op!(Sre, ZeroPage, 5),
    op!(Pha, Implied, 3), op!(Eor, Immediate, 2), op!(Lsr, Accumulator, 2), op!(Alr, Immediate, 2),
    op!(Jmp, Absolute, 3), op!(Eor, Absolute, 4), op!(Lsr, Absolute, 6), op!(Sre, Absolute, 6),
    // $50-$5F
    op!(Bvc, Relative, 2), op!(Eor, IndirectY, 5), op!(Jam, Implied, 0), op!(Sre, IndirectY, 8),
    op!(Nop, ZeroPageX, 4), op!(Eor, ZeroPageX, 4), op!(Lsr, ZeroPageX, 6), op!(Sre, ZeroPageX, 6),
    op!(Cli, Implied, 2), op!(Eor, AbsoluteY, 4), op!(Nop, Implied, 2), op!(Sre, AbsoluteY, 7),
    op!(Nop, AbsoluteX, 4), op!(Eor, AbsoluteX, 4), op!(Lsr, AbsoluteX, 7), op!(Sre, AbsoluteX, 7),
    // $60-$6F
    op!(Rts, Implied, 6), op!(Adc, IndirectX, 6), op!(Jam, Implied, 0), op!(Rra, IndirectX, 8),
    op!(Nop, ZeroPage, 3), op!(Adc, ZeroPage, 3), op!(Ror, ZeroPage, 5), op!(Rra, ZeroPage, 5),
    op!(Pla, Implied, 4), op!(Adc, Immediate, 2), op!(Ror, Accumulator, 2), op!(Arr, Immediate, 2),
    op!(Jmp, Indirect, 5), op!(Adc, Absolute, 4), op!(Ror, Absolute, 6), op!(Rra, Absolute, 6),
    // $70-$7F
    op!(Bvs, Relative, 2), op!(Adc, IndirectY, 5), op!(Jam, Implied, 0), op!(Rra, IndirectY, 8),
    op!(Nop, ZeroPageX, 4), op!(Adc, ZeroPageX, 4), op!(Ror, ZeroPageX, 6), op!(Rra, ZeroPageX, 6),
    op!(Sei, Implied, 2), op!(Adc, AbsoluteY, 4), op!(Nop, Implied, 2), op!(Rra, AbsoluteY, 7),
    op!(Nop, AbsoluteX, 4), op!(Adc, AbsoluteX, 4), op!(Ror, AbsoluteX, 7), op!(Rra, AbsoluteX, 7),
    // $80-$8F
    op!(Nop, Immediate, 2), op!(Sta, IndirectX, 6), op!(Nop, Immediate, 2), op!(Sax, IndirectX, 6),
    op!(Sty, ZeroPage, 3), op!(Sta, ZeroPage, 3), op!(Stx, ZeroPage, 3), op!(Sax, ZeroPage, 3),
    op!(Dey, Implied, 2), op!(Nop, Immediate, 2), op!(Txa, Implied, 2), op!(Ane, Immediate, 2),
    op!(Sty, Absolute, 4), op!(Sta, Absolute, 4), op!(Stx, Absolute, 4), op!(Sax, Absolute, 4),
    // $90-$9F
    op!(Bcc, Relative, 2), op!(Sta, IndirectY, 6), op!(Jam, Implied, 0), op!(Sha, IndirectY, 6),
    op!(Sty, ZeroPageX, 4), op!(Sta, ZeroPageX, 4), op!(Stx, ZeroPageY, 4), op!(Sax, ZeroPageY, 4),
    op!(Tya, Implied, 2), op!(Sta, AbsoluteY, 5), op!(Txs, Implied, 2), op!(Tas, AbsoluteY, 5),
    op!(Shy, AbsoluteX, 5), op!(Sta, AbsoluteX, 5), op!(Shx, AbsoluteY, 5), op!(Sha, AbsoluteY, 5),
    // $A0-$AF
    op!(Ldy, Immediate, 2), op!(Lda, IndirectX, 6), op!(Ldx, Immediate, 2), op!(Lax, IndirectX, 6),
    op!(Ldy, ZeroPage, 3), op!(Lda, ZeroPage, 3), op!(Ldx, ZeroPage, 3), op!(Lax, ZeroPage, 3),
    op!(Tay, Implied, 2), op!(Lda, Immediate, 2), op!(Tax, Implied, 2), op!(Lxa, Immediate, 2),
    op!(Ldy, Absolute, 4), op!(Lda, Absolute, 4), op!(Ldx, Absolute, 4), op!(Lax, Absolute, 4),
    // $B0-$BF
    op!(Bcs, Relative, 2), op!(Lda, IndirectY, 5), op!(Jam, Implied, 0), op!(Lax, IndirectY, 5),
    op!(Ldy, ZeroPageX, 4), op!(Lda, ZeroPageX, 4), op!(Ldx, ZeroPageY, 4), op!(Lax, ZeroPageY, 4),
    op!(Clv, Implied, 2), op!(Lda, AbsoluteY, 4), op!(Tsx, Implied, 2), op!(Las, AbsoluteY, 4),
    op!(Ldy, AbsoluteX, 4), op!(Lda, AbsoluteX, 4), op!(Ldx, AbsoluteY, 4), op!(Lax, AbsoluteY, 4),
    // $C0-$CF
    op!(Cpy, Immediate, 2), op!(Cmp, IndirectX, 6), op!(Nop, Immediate, 2), op!(Dcp, IndirectX, 8),
    op!(Cpy, ZeroPage, 3), op!(Cmp, ZeroPage, 3), op!(Dec, ZeroPage, 5), op!(Dcp, ZeroPage, 5),
    op!(Iny, Implied, 2), op!(Cmp, Immediate, 2), op!(Dex, Implied, 2), op!(Sbx, Immediate, 2),
    op!(Cpy, Absolute, 4), op!(Cmp, Absolute, 4), op!(Dec, Absolute, 6), op!(Dcp, Absolute, 6),
    // $D0-$DF
    op!(Bne, Relative, 2), op!(Cmp, IndirectY, 5), op!(Jam, Implied, 0), op!(Dcp, IndirectY, 8),
    op!(Nop, ZeroPageX, 4), op!(Cmp, ZeroPageX, 4), op!(Dec, ZeroPageX, 6), op!(Dcp, ZeroPageX, 6),
    op!(Cld, Implied, 2), op!(Cmp, AbsoluteY, 4), op!(Nop, Implied, 2), op!(Dcp, AbsoluteY, 7),
    op!(Nop, AbsoluteX, 4), op!(Cmp, AbsoluteX, 4), op!(Dec, AbsoluteX, 7), op!(Dcp, AbsoluteX, 7),
    // $E0-$EF
    op!(Cpx, Immediate, 2), op!(Sbc, IndirectX, 6), op!(Nop, Immediate, 2), op!(Isc, IndirectX, 8),
    op!(Cpx, ZeroPage, 3), op!(Sbc, ZeroPage, 3), op!(Inc, ZeroPage, 5), op!(Isc, ZeroPage, 5),
    op!(Inx, Implied, 2), op!(Sbc, Immediate, 2), op!(Nop, Implied, 2), op!(Sbc, Immediate, 2),
    op!(Cpx, Absolute, 4), op!(Sbc, Absolute, 4), op!(Inc, Absolute, 6), op!(Isc, Absolute, 6),
    // $F0-$FF
    op!(Beq, Relative, 2), op!(Sbc, IndirectY, 5), op!(Jam, Implied, 0), op!(Isc, IndirectY, 8),
    op!(Nop, ZeroPageX, 4), op!(Sbc, ZeroPageX, 4), op!(Inc, ZeroPageX, 6), op!(Isc, ZeroPageX, 6),
    op!(Sed, Implied, 2), op!(Sbc, AbsoluteY, 4), op!(Nop, Implied, 2), op!(Isc, AbsoluteY, 7),
    op!(Nop, AbsoluteX, 4), op!(Sbc, AbsoluteX, 4), op!(Inc, AbsoluteX, 7), op!(Isc, AbsoluteX, 7),
];
