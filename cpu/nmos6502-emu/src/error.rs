use crate::operation::Instruction;
use bincode::{Decode, Encode};
use thiserror::Error;

/// Errors that fault the processor. Once a [`CpuError`] has been returned, every later clock
/// returns the same error until the processor is reset.
#[derive(Debug, Clone, PartialEq, Eq, Error, Encode, Decode)]
pub enum CpuError {
    #[error("unsupported opcode ${opcode:02X} ({instruction}) fetched at ${pc:04X}")]
    UnsupportedOpcode { opcode: u8, instruction: Instruction, pc: u16 },
    #[error("decimal mode arithmetic is not supported (opcode ${opcode:02X} at ${pc:04X})")]
    DecimalModeUnsupported { opcode: u8, pc: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("a device is already registered at priority {priority}")]
    PriorityTaken { priority: i32 },
}
