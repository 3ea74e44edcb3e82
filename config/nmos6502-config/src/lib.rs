//! Configuration for the NMOS 6502 core and the device bus it drives.

use bincode::{Decode, Encode};
use nmos6502_proc_macros::EnumDisplay;

/// How the device bus arbitrates a read cycle between registered devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, EnumDisplay)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BusMode {
    /// Devices are asked in priority order and the first device that decodes the address answers;
    /// devices after it never see the cycle
    Latched,
    /// Every cycle drives the R/W line and the address pins of every device, in priority order.
    /// The first claimant drives the data bus and any later claimant is reported as contention
    PinLevel,
}

impl Default for BusMode {
    fn default() -> Self {
        if cfg!(feature = "pin-level") { Self::PinLevel } else { Self::Latched }
    }
}

/// What ADC/SBC do when the D flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, EnumDisplay)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DecimalMode {
    /// BCD arithmetic is not emulated; executing ADC/SBC with D set faults the CPU
    #[default]
    Reject,
    /// Always perform binary arithmetic, same as the Ricoh 2A03
    IgnoreFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CpuConfig {
    pub decimal_mode: DecimalMode,
    /// Assert the I flag on every clock, as if the IRQ line were permanently masked. Disable this
    /// to allow CLI to unmask IRQs
    pub force_interrupt_disable: bool,
    /// If set, reset loads PC from this address instead of reading the vector at $FFFC-$FFFD
    pub reset_vector: Option<u16>,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self { decimal_mode: DecimalMode::default(), force_interrupt_disable: true, reset_vector: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BusConfig {
    pub mode: BusMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CpuConfig::default();
        assert_eq!(config.decimal_mode, DecimalMode::Reject);
        assert!(config.force_interrupt_disable);
        assert_eq!(config.reset_vector, None);

        let expected_mode =
            if cfg!(feature = "pin-level") { BusMode::PinLevel } else { BusMode::Latched };
        assert_eq!(BusConfig::default().mode, expected_mode);
    }

    #[test]
    fn bincode_round_trip() {
        let config = CpuConfig {
            decimal_mode: DecimalMode::IgnoreFlag,
            force_interrupt_disable: false,
            reset_vector: Some(0xC000),
        };

        let bytes = bincode::encode_to_vec(config, bincode::config::standard()).unwrap();
        let (decoded, _): (CpuConfig, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(config, decoded);
    }

    #[test]
    fn modes_display_as_variant_names() {
        assert_eq!(BusMode::Latched.to_string(), "Latched");
        assert_eq!(BusMode::PinLevel.to_string(), "PinLevel");
        assert_eq!(DecimalMode::Reject.to_string(), "Reject");
        assert_eq!(DecimalMode::IgnoreFlag.to_string(), "IgnoreFlag");
    }
}
