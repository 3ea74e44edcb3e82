//! The processor status register (P).
//!
//! Bit layout, 7 to 0: `N V R B D I Z C`. R (bit 5) is not connected on real hardware and always
//! reads back as 1 once the driver has clocked, and B only exists in copies of P pushed to the
//! stack, but both are stored here so that a pushed byte can be restored exactly.

use crate::num::GetBit;
use bincode::{Decode, Encode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum StatusFlag {
    Carry,
    Zero,
    InterruptDisable,
    Decimal,
    Break,
    Reserved,
    Overflow,
    Negative,
}

impl StatusFlag {
    pub const ALL: [Self; 8] = [
        Self::Carry,
        Self::Zero,
        Self::InterruptDisable,
        Self::Decimal,
        Self::Break,
        Self::Reserved,
        Self::Overflow,
        Self::Negative,
    ];

    #[inline]
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Carry => 0,
            Self::Zero => 1,
            Self::InterruptDisable => 2,
            Self::Decimal => 3,
            Self::Break => 4,
            Self::Reserved => 5,
            Self::Overflow => 6,
            Self::Negative => 7,
        }
    }

    #[inline]
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << self.bit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct StatusRegister {
    pub carry: bool,
    pub zero: bool,
    pub interrupt_disable: bool,
    pub decimal: bool,
    pub break_flag: bool,
    pub reserved: bool,
    pub overflow: bool,
    pub negative: bool,
}

impl StatusRegister {
    /// Power-on state: I and R set, everything else clear.
    #[must_use]
    pub fn new() -> Self {
        Self { interrupt_disable: true, reserved: true, ..Self::default() }
    }

    #[inline]
    #[must_use]
    pub fn has_flag(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::Carry => self.carry,
            StatusFlag::Zero => self.zero,
            StatusFlag::InterruptDisable => self.interrupt_disable,
            StatusFlag::Decimal => self.decimal,
            StatusFlag::Break => self.break_flag,
            StatusFlag::Reserved => self.reserved,
            StatusFlag::Overflow => self.overflow,
            StatusFlag::Negative => self.negative,
        }
    }

    #[inline]
    pub fn set_flag(&mut self, flag: StatusFlag, value: bool) -> &mut Self {
        let field = match flag {
            StatusFlag::Carry => &mut self.carry,
            StatusFlag::Zero => &mut self.zero,
            StatusFlag::InterruptDisable => &mut self.interrupt_disable,
            StatusFlag::Decimal => &mut self.decimal,
            StatusFlag::Break => &mut self.break_flag,
            StatusFlag::Reserved => &mut self.reserved,
            StatusFlag::Overflow => &mut self.overflow,
            StatusFlag::Negative => &mut self.negative,
        };
        *field = value;
        self
    }

    /// Restore all 8 flags from a packed byte (PLP, RTI).
    pub fn set_from_byte(&mut self, byte: u8) {
        for flag in StatusFlag::ALL {
            self.set_flag(flag, byte.bit(flag.bit()));
        }
    }

    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        let mut status = Self::default();
        status.set_from_byte(byte);
        status
    }

    #[must_use]
    pub fn to_byte(self) -> u8 {
        StatusFlag::ALL
            .into_iter()
            .filter(|&flag| self.has_flag(flag))
            .fold(0, |byte, flag| byte | flag.mask())
    }

    pub fn set_negative(&mut self, negative: bool) -> &mut Self {
        self.negative = negative;
        self
    }

    pub fn set_overflow(&mut self, overflow: bool) -> &mut Self {
        self.overflow = overflow;
        self
    }

    pub fn set_zero(&mut self, zero: bool) -> &mut Self {
        self.zero = zero;
        self
    }

    pub fn set_carry(&mut self, carry: bool) -> &mut Self {
        self.carry = carry;
        self
    }

    /// Set N and Z from a result byte.
    pub fn set_nz(&mut self, value: u8) -> &mut Self {
        self.set_negative(value.bit(7)).set_zero(value == 0)
    }
}

impl From<u8> for StatusRegister {
    fn from(value: u8) -> Self {
        Self::from_byte(value)
    }
}

impl From<StatusRegister> for u8 {
    fn from(value: StatusRegister) -> Self {
        value.to_byte()
    }
}
