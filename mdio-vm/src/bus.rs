//! Bus binding (§4.E): locating an MDIO adapter and performing Clause 22 /
//! Clause 45 physical register access.

use std::collections::HashMap;
use std::sync::Mutex;

/// Marker bit that flags `arg0` as a Clause 45 compound address, and the
/// field layout once flagged — mirrors `MDIO_PHY_ID_C45` /
/// `MDIO_PHY_ID_PRTAD` / `MDIO_PHY_ID_DEVAD` from the kernel's
/// `linux/mdio.h`.
const C45_FLAG: u16 = 0x8000;
const C45_PRTAD_MASK: u16 = 0x03e0;
const C45_DEVAD_MASK: u16 = 0x001f;

/// The native Clause 45 register marker folded into a wider register
/// argument by the bus adapter, mirroring `MII_ADDR_C45` — used when
/// translating a compound address down to the adapter's combined-call
/// convention (§4.C "Physical I/O semantics").
const MII_ADDR_C45: u32 = 0x4000_0000;

/// A device address as carried in a `READ`/`WRITE` instruction's `arg0`:
/// either a bare Clause 22 physical address or a Clause 45 compound one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAddress {
    /// Clause 22: a 5-bit PHY address.
    Clause22 { phyad: u8 },
    /// Clause 45: a port address plus an MMD (device-type) address.
    Clause45 { port: u8, devad: u8 },
}

impl DeviceAddress {
    /// Decode the raw 16-bit device word carried on the wire.
    pub const fn from_raw(raw: u16) -> Self {
        if raw & C45_FLAG != 0 {
            DeviceAddress::Clause45 {
                port: ((raw & C45_PRTAD_MASK) >> 5) as u8,
                devad: (raw & C45_DEVAD_MASK) as u8,
            }
        } else {
            DeviceAddress::Clause22 {
                phyad: (raw & 0x1f) as u8,
            }
        }
    }

    /// Re-encode into the raw 16-bit wire form.
    pub const fn to_raw(self) -> u16 {
        match self {
            DeviceAddress::Clause22 { phyad } => (phyad & 0x1f) as u16,
            DeviceAddress::Clause45 { port, devad } => {
                C45_FLAG | (((port & 0x1f) as u16) << 5) | (devad & 0x1f) as u16
            }
        }
    }

    /// Translate to the adapter's native calling convention: a physical
    /// device id plus a (possibly devad-folded) register, the way
    /// `c45_compat_convert` does in the original kernel module.
    fn native_call(self, register: u16) -> (u8, u32) {
        match self {
            DeviceAddress::Clause22 { phyad } => (phyad, register as u32),
            DeviceAddress::Clause45 { port, devad } => {
                (port, MII_ADDR_C45 | ((devad as u32) << 16) | register as u32)
            }
        }
    }
}

/// The bus adapter interface the interpreter drives (§4.E).
///
/// Implementations own whatever exclusivity the real hardware requires;
/// `mdio-vm` layers its own lock on top (see [`BusHandle`]) so the
/// contract holds even for adapters that don't serialize themselves.
pub trait MdioBus {
    /// Read a 16-bit register. `Err` carries a negative errno.
    fn read(&mut self, device: DeviceAddress, register: u16) -> Result<u16, i32>;

    /// Write a 16-bit register. `Err` carries a negative errno.
    fn write(&mut self, device: DeviceAddress, register: u16, value: u16) -> Result<(), i32>;
}

/// An in-memory MDIO bus for tests and the simulated transport.
///
/// Registers default to `0xffff` when first touched, matching real
/// hardware's behavior for an absent device (spec scenario 3: "devices
/// whose ID words are both 0xFFFF").
#[derive(Debug, Default)]
pub struct SimulatedBus {
    registers: HashMap<(u8, u32), u16>,
}

impl SimulatedBus {
    /// An empty bus; every register reads back `0xffff` until written.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a register's value ahead of time (test fixture helper).
    pub fn set(&mut self, device: DeviceAddress, register: u16, value: u16) {
        let (kdev, kreg) = device.native_call(register);
        self.registers.insert((kdev, kreg), value);
    }

    /// Read back a previously-set value without going through the
    /// instruction interpreter (test fixture helper).
    pub fn get(&self, device: DeviceAddress, register: u16) -> u16 {
        let (kdev, kreg) = device.native_call(register);
        self.registers.get(&(kdev, kreg)).copied().unwrap_or(0xffff)
    }
}

impl MdioBus for SimulatedBus {
    fn read(&mut self, device: DeviceAddress, register: u16) -> Result<u16, i32> {
        Ok(self.get(device, register))
    }

    fn write(&mut self, device: DeviceAddress, register: u16, value: u16) -> Result<(), i32> {
        self.set(device, register, value);
        Ok(())
    }
}

/// Owns the bus adapter's exclusive lock, held for the full duration of a
/// program (invariant 5 and §5: "the bus lock is exclusive and held
/// across the whole program").
pub struct BusHandle<B> {
    name: String,
    bus: Mutex<B>,
}

impl<B: MdioBus> BusHandle<B> {
    /// Wrap a bus adapter, identified by the name callers will look it up
    /// by (spec's `BUS_ID`).
    pub fn new(name: impl Into<String>, bus: B) -> Self {
        Self {
            name: name.into(),
            bus: Mutex::new(bus),
        }
    }

    /// The bus identifier this handle was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquire the exclusive lock. The guard's `Drop` is what guarantees
    /// the lock is released on every exit path, including panics unwound
    /// through it — there is no branch in this crate that releases the
    /// lock explicitly.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, B> {
        self.bus
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Looks up bus adapters by name (the host's "bus registry", §4.E).
#[derive(Default)]
pub struct BusRegistry<B> {
    buses: HashMap<String, BusHandle<B>>,
}

impl<B: MdioBus> BusRegistry<B> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            buses: HashMap::new(),
        }
    }

    /// Register a bus adapter under `name`, replacing any prior adapter
    /// of the same name.
    pub fn register(&mut self, name: impl Into<String>, bus: B) {
        let name = name.into();
        self.buses.insert(name.clone(), BusHandle::new(name, bus));
    }

    /// Look up a bus by name.
    pub fn find(&self, name: &str) -> Option<&BusHandle<B>> {
        self.buses.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clause22_device_round_trips() {
        let addr = DeviceAddress::Clause22 { phyad: 17 };
        assert_eq!(DeviceAddress::from_raw(addr.to_raw()), addr);
    }

    #[test]
    fn clause45_device_round_trips() {
        let addr = DeviceAddress::Clause45 {
            port: 0x1b & 0x1f,
            devad: 3,
        };
        assert_eq!(DeviceAddress::from_raw(addr.to_raw()), addr);
    }

    #[test]
    fn clause45_and_clause22_addresses_occupy_disjoint_register_space() {
        let mut bus = SimulatedBus::new();
        let c22 = DeviceAddress::Clause22 { phyad: 3 };
        let c45 = DeviceAddress::Clause45 { port: 3, devad: 0 };
        bus.set(c22, 0, 0x1111);
        bus.set(c45, 0, 0x2222);
        assert_eq!(bus.get(c22, 0), 0x1111);
        assert_eq!(bus.get(c45, 0), 0x2222);
    }

    #[test]
    fn unset_register_reads_as_all_ones() {
        let bus = SimulatedBus::new();
        assert_eq!(bus.get(DeviceAddress::Clause22 { phyad: 5 }, 2), 0xffff);
    }

    #[test]
    fn registry_finds_registered_bus_by_name() {
        let mut registry: BusRegistry<SimulatedBus> = BusRegistry::new();
        registry.register("fixed-0", SimulatedBus::new());
        assert!(registry.find("fixed-0").is_some());
        assert!(registry.find("fixed-1").is_none());
    }
}
