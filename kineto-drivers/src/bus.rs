//! Shared SPI bus
//!
//! Storage and display hang off the same SPI peripheral with separate
//! chip-selects. The bus records which of them currently owns it; a device
//! handle refuses to run a transaction while the other side owns the bus.
//!
//! Only [`BusArbiter::hand_over`] changes ownership. A handover waits for
//! the bus to go idle and deasserts both chip-selects first, so no
//! transaction can straddle two owners.

use core::cell::RefCell;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{self, ErrorKind, ErrorType, Operation, SpiBus, SpiDevice};
use kineto_hal::{BusArbiter, BusError, BusOwner};

/// Errors from a [`BusDevice`] transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError<E> {
    /// Underlying SPI bus error
    Spi(E),
    /// Chip-select pin could not be driven
    ChipSelect,
    /// The bus is owned by the other device
    NotOwner,
    /// Delay operations inside a transaction are not supported
    DelayUnsupported,
}

impl<E: spi::Error> spi::Error for DeviceError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            DeviceError::Spi(e) => e.kind(),
            DeviceError::ChipSelect => ErrorKind::ChipSelectFault,
            DeviceError::NotOwner | DeviceError::DelayUnsupported => ErrorKind::Other,
        }
    }
}

struct BusState<BUS, SCS, DCS> {
    bus: BUS,
    storage_cs: SCS,
    display_cs: DCS,
    owner: BusOwner,
}

impl<BUS, SCS, DCS> BusState<BUS, SCS, DCS>
where
    SCS: OutputPin,
    DCS: OutputPin,
{
    /// Drive the chip-select of `role` (active low)
    fn select(&mut self, role: BusOwner, active: bool) -> Result<(), BusError> {
        let result = match (role, active) {
            (BusOwner::Idle, _) => Ok(()),
            (BusOwner::Storage, true) => self.storage_cs.set_low().map_err(|_| ()),
            (BusOwner::Storage, false) => self.storage_cs.set_high().map_err(|_| ()),
            (BusOwner::Display, true) => self.display_cs.set_low().map_err(|_| ()),
            (BusOwner::Display, false) => self.display_cs.set_high().map_err(|_| ()),
        };
        result.map_err(|_| BusError::ChipSelect)
    }

    fn deselect_all(&mut self) -> Result<(), BusError> {
        self.select(BusOwner::Storage, false)?;
        self.select(BusOwner::Display, false)
    }
}

/// SPI bus shared between a storage device and a display controller
pub struct SharedSpiBus<BUS, SCS, DCS> {
    state: RefCell<BusState<BUS, SCS, DCS>>,
}

impl<BUS, SCS, DCS> SharedSpiBus<BUS, SCS, DCS>
where
    BUS: SpiBus,
    SCS: OutputPin,
    DCS: OutputPin,
{
    /// Take the bus and both chip-selects, leaving everything deselected
    pub fn new(bus: BUS, storage_cs: SCS, display_cs: DCS) -> Result<Self, BusError> {
        let mut state = BusState {
            bus,
            storage_cs,
            display_cs,
            owner: BusOwner::Idle,
        };
        state.deselect_all()?;
        Ok(Self {
            state: RefCell::new(state),
        })
    }

    /// Device handle for the storage chip-select
    pub fn storage(&self) -> BusDevice<'_, BUS, SCS, DCS> {
        BusDevice {
            shared: self,
            role: BusOwner::Storage,
        }
    }

    /// Device handle for the display chip-select
    pub fn display(&self) -> BusDevice<'_, BUS, SCS, DCS> {
        BusDevice {
            shared: self,
            role: BusOwner::Display,
        }
    }

    pub fn owner(&self) -> BusOwner {
        self.state.borrow().owner
    }

    /// Hand the bus to `owner`
    pub fn hand_over(&self, owner: BusOwner) -> Result<(), BusError> {
        let mut state = self.state.borrow_mut();
        if state.owner == owner {
            return Ok(());
        }
        state.bus.flush().map_err(|_| BusError::Flush)?;
        state.deselect_all()?;
        state.owner = owner;
        Ok(())
    }

    /// Give back the bus and pins
    pub fn into_inner(self) -> (BUS, SCS, DCS) {
        let state = self.state.into_inner();
        (state.bus, state.storage_cs, state.display_cs)
    }
}

impl<BUS, SCS, DCS> BusArbiter for &SharedSpiBus<BUS, SCS, DCS>
where
    BUS: SpiBus,
    SCS: OutputPin,
    DCS: OutputPin,
{
    fn hand_over(&mut self, owner: BusOwner) -> Result<(), BusError> {
        SharedSpiBus::hand_over(self, owner)
    }

    fn owner(&self) -> BusOwner {
        SharedSpiBus::owner(self)
    }
}

/// One chip-select's view of a [`SharedSpiBus`]
pub struct BusDevice<'a, BUS, SCS, DCS> {
    shared: &'a SharedSpiBus<BUS, SCS, DCS>,
    role: BusOwner,
}

impl<BUS, SCS, DCS> BusDevice<'_, BUS, SCS, DCS> {
    /// Which owner this device transacts as
    pub fn role(&self) -> BusOwner {
        self.role
    }
}

impl<BUS: SpiBus, SCS, DCS> ErrorType for BusDevice<'_, BUS, SCS, DCS> {
    type Error = DeviceError<BUS::Error>;
}

impl<BUS, SCS, DCS> SpiDevice for BusDevice<'_, BUS, SCS, DCS>
where
    BUS: SpiBus,
    SCS: OutputPin,
    DCS: OutputPin,
{
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut guard = self.shared.state.borrow_mut();
        let state = &mut *guard;
        if state.owner != self.role {
            return Err(DeviceError::NotOwner);
        }

        state
            .select(self.role, true)
            .map_err(|_| DeviceError::ChipSelect)?;

        let result = operations.iter_mut().try_for_each(|op| match op {
            Operation::Read(buf) => state.bus.read(buf).map_err(DeviceError::Spi),
            Operation::Write(buf) => state.bus.write(buf).map_err(DeviceError::Spi),
            Operation::Transfer(read, write) => {
                state.bus.transfer(read, write).map_err(DeviceError::Spi)
            }
            Operation::TransferInPlace(buf) => {
                state.bus.transfer_in_place(buf).map_err(DeviceError::Spi)
            }
            Operation::DelayNs(_) => Err(DeviceError::DelayUnsupported),
        });
        let flushed = state.bus.flush().map_err(DeviceError::Spi);

        state
            .select(self.role, false)
            .map_err(|_| DeviceError::ChipSelect)?;
        result?;
        flushed
    }
}
