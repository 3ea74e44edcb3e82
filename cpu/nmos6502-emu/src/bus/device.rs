use std::ops::RangeInclusive;

/// A memory-mapped participant on the shared bus.
///
/// A device answers a read only for addresses it decodes to itself; for every other address it
/// returns `None` and the registry moves on to the next device. Writes are offered to every
/// device, and a device ignores writes outside its range.
pub trait BusDevice {
    /// Addresses this device decodes, inclusive on both ends so that a device can own $FFFF.
    fn address_range(&self) -> RangeInclusive<u16>;

    #[inline]
    fn owns(&self, address: u16) -> bool {
        self.address_range().contains(&address)
    }

    /// Drive a read cycle. Returns `None` if the device does not decode `address`.
    fn read(&mut self, address: u16) -> Option<u8>;

    /// Side-effect-free read for debuggers and tests.
    fn peek(&self, address: u16) -> Option<u8>;

    fn write(&mut self, address: u16, value: u8);

    /// Current direction of the R/W line; `true` means the processor is reading.
    fn set_rw(&mut self, _read: bool) {}

    /// Called once per bus cycle, after the processor has driven the bus.
    fn clock(&mut self) {}

    fn irq(&self) -> bool {
        false
    }

    fn nmi(&self) -> bool {
        false
    }

    fn acknowledge_nmi(&mut self) {}

    /// Devices that act as a secondary bus master can opt out of propagation overrides raised
    /// by other devices.
    fn ignores_propagation(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct Ram {
    base: u16,
    memory: Box<[u8]>,
}

impl Ram {
    /// # Panics
    ///
    /// Panics if `size` is 0 or the RAM would extend past $FFFF.
    #[must_use]
    pub fn new(base: u16, size: usize) -> Self {
        assert!(size != 0, "RAM size must be non-zero");
        assert!(
            usize::from(base) + size <= 0x10000,
            "RAM at ${base:04X} with size {size} extends past $FFFF"
        );

        Self { base, memory: vec![0; size].into_boxed_slice() }
    }

    #[must_use]
    pub fn with_contents(base: u16, contents: &[u8]) -> Self {
        let mut ram = Self::new(base, contents.len());
        ram.memory.copy_from_slice(contents);
        ram
    }

    #[inline]
    fn offset(&self, address: u16) -> Option<usize> {
        self.owns(address).then(|| usize::from(address - self.base))
    }
}

impl BusDevice for Ram {
    fn address_range(&self) -> RangeInclusive<u16> {
        self.base..=(usize::from(self.base) + self.memory.len() - 1) as u16
    }

    fn read(&mut self, address: u16) -> Option<u8> {
        self.peek(address)
    }

    fn peek(&self, address: u16) -> Option<u8> {
        self.offset(address).map(|offset| self.memory[offset])
    }

    fn write(&mut self, address: u16, value: u8) {
        if let Some(offset) = self.offset(address) {
            self.memory[offset] = value;
        }
    }
}

/// Read-only memory; writes are silently dropped.
#[derive(Debug, Clone)]
pub struct Rom {
    base: u16,
    image: Box<[u8]>,
}

impl Rom {
    /// # Panics
    ///
    /// Panics if the image is empty or would extend past $FFFF.
    #[must_use]
    pub fn new(base: u16, image: Vec<u8>) -> Self {
        assert!(!image.is_empty(), "ROM image must be non-empty");
        assert!(
            usize::from(base) + image.len() <= 0x10000,
            "ROM at ${base:04X} with size {} extends past $FFFF",
            image.len()
        );

        Self { base, image: image.into_boxed_slice() }
    }
}

impl BusDevice for Rom {
    fn address_range(&self) -> RangeInclusive<u16> {
        self.base..=(usize::from(self.base) + self.image.len() - 1) as u16
    }

    fn read(&mut self, address: u16) -> Option<u8> {
        self.peek(address)
    }

    fn peek(&self, address: u16) -> Option<u8> {
        self.owns(address).then(|| self.image[usize::from(address - self.base)])
    }

    fn write(&mut self, _address: u16, _value: u8) {}
}
