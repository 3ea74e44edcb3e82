//! Priority-ordered device registry.
//!
//! The registry owns every device on the bus and hands out [`DeviceId`] handles, so neither the
//! processor nor the devices hold references to each other. A read cycle is offered to devices in
//! ascending priority order and the first device that decodes the address drives the data bus.
//! If no device claims the address, the data bus keeps whatever value was last driven onto it.

use crate::bus::{BusDevice, BusInterface};
use crate::error::BusError;
use bincode::{Decode, Encode};
use log::{debug, warn};
use nmos6502_config::{BusConfig, BusMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct DeviceId(usize);

struct Slot {
    id: DeviceId,
    priority: i32,
    overridden: bool,
    device: Box<dyn BusDevice>,
}

pub struct DeviceBus {
    config: BusConfig,
    // Sorted by ascending priority
    slots: Vec<Slot>,
    next_id: usize,
    data_bus: u8,
}

impl DeviceBus {
    #[must_use]
    pub fn new(config: BusConfig) -> Self {
        Self { config, slots: Vec::new(), next_id: 0, data_bus: 0 }
    }

    /// Register a device. Lower priorities are asked first.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::PriorityTaken`] if another device already holds `priority`; the existing
    /// registration is left untouched.
    pub fn register_device<D: BusDevice + 'static>(
        &mut self,
        device: D,
        priority: i32,
    ) -> Result<DeviceId, BusError> {
        let index = match self.slots.binary_search_by_key(&priority, |slot| slot.priority) {
            Ok(_) => return Err(BusError::PriorityTaken { priority }),
            Err(index) => index,
        };

        let id = DeviceId(self.next_id);
        self.next_id += 1;

        let range = device.address_range();
        debug!(
            "Registered device {id:?} at priority {priority}, range ${:04X}-${:04X}",
            range.start(),
            range.end()
        );

        self.slots.insert(index, Slot { id, priority, overridden: false, device: Box::new(device) });

        Ok(id)
    }

    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&dyn BusDevice> {
        self.slots.iter().find(|slot| slot.id == id).map(|slot| slot.device.as_ref())
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn BusDevice> {
        match self.slots.iter_mut().find(|slot| slot.id == id) {
            Some(slot) => Some(slot.device.as_mut()),
            None => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> BusConfig {
        self.config
    }

    /// The last value driven onto the data bus.
    #[must_use]
    pub fn data_bus(&self) -> u8 {
        self.data_bus
    }

    /// Tell every device other than `invoker` that its answers should not be trusted until the
    /// override is lifted. Devices that ignore propagation are never overridden.
    pub fn set_propagation_override(&mut self, invoker: DeviceId, overridden: bool) {
        for slot in &mut self.slots {
            if slot.id != invoker && !slot.device.ignores_propagation() {
                slot.overridden = overridden;
            }
        }
    }

    #[must_use]
    pub fn is_overridden(&self, id: DeviceId) -> bool {
        self.slots.iter().any(|slot| slot.id == id && slot.overridden)
    }

    /// Read without side effects: devices are peeked, and the data bus is not updated.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.slots
            .iter()
            .filter(|slot| !slot.overridden)
            .find_map(|slot| slot.device.peek(address))
            .unwrap_or(self.data_bus)
    }

    /// Tick every device once, in priority order.
    pub fn clock_devices(&mut self) {
        for slot in &mut self.slots {
            slot.device.clock();
        }
    }

    fn read_latched(&mut self, address: u16) -> Option<u8> {
        self.slots
            .iter_mut()
            .filter(|slot| !slot.overridden)
            .find_map(|slot| slot.device.read(address))
    }

    fn read_pin_level(&mut self, address: u16) -> Option<u8> {
        for slot in &mut self.slots {
            slot.device.set_rw(true);
        }

        let mut driven: Option<(DeviceId, u8)> = None;
        for slot in self.slots.iter_mut().filter(|slot| !slot.overridden) {
            let Some(value) = slot.device.read(address) else { continue };

            match driven {
                None => driven = Some((slot.id, value)),
                Some((driver, driven_value)) => {
                    warn!(
                        "Bus contention at ${address:04X}: {:?} drove ${driven_value:02X}, {:?} also answered ${value:02X}",
                        driver, slot.id
                    );
                }
            }
        }

        driven.map(|(_, value)| value)
    }
}

impl BusInterface for DeviceBus {
    fn read(&mut self, address: u16) -> u8 {
        let value = match self.config.mode {
            BusMode::Latched => self.read_latched(address),
            BusMode::PinLevel => self.read_pin_level(address),
        };

        if let Some(value) = value {
            self.data_bus = value;
        }
        self.data_bus
    }

    fn write(&mut self, address: u16, value: u8) {
        self.data_bus = value;

        if self.config.mode == BusMode::PinLevel {
            for slot in &mut self.slots {
                slot.device.set_rw(false);
            }
        }

        for slot in self.slots.iter_mut().filter(|slot| !slot.overridden) {
            slot.device.write(address, value);
        }
    }

    fn nmi(&self) -> bool {
        self.slots.iter().any(|slot| slot.device.nmi())
    }

    fn acknowledge_nmi(&mut self) {
        for slot in &mut self.slots {
            slot.device.acknowledge_nmi();
        }
    }

    fn irq(&self) -> bool {
        self.slots.iter().any(|slot| slot.device.irq())
    }
}
