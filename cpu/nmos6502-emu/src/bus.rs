//! The processor's view of the address/data bus, plus the device layer that sits behind it.

pub mod device;
pub mod registry;

pub use device::{BusDevice, Ram, Rom};
pub use registry::{DeviceBus, DeviceId};

/// Everything the processor can do to the outside world in one bus cycle.
pub trait BusInterface {
    /// Drive a read cycle and return the value on the data bus.
    fn read(&mut self, address: u16) -> u8;

    fn write(&mut self, address: u16, value: u8);

    /// Whether an NMI edge is pending.
    #[must_use]
    fn nmi(&self) -> bool {
        false
    }

    fn acknowledge_nmi(&mut self) {}

    /// Current level of the IRQ line (true = asserted).
    #[must_use]
    fn irq(&self) -> bool {
        false
    }
}
