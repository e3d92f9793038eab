//! Shared bus ownership
//!
//! Storage and display sit on one SPI bus and must never drive it at the
//! same time. Ownership is an explicit state that only the playback
//! scheduler changes; device code checks it but never takes it.

use core::fmt;

/// Which peripheral currently owns the shared bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusOwner {
    /// Nobody; every chip-select deasserted
    #[default]
    Idle,
    /// Storage device may run transactions
    Storage,
    /// Display controller may run transactions
    Display,
}

/// Bus arbitration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Bus flush before handover failed
    Flush,
    /// Chip-select pin could not be driven
    ChipSelect,
    /// A device ran a transaction without owning the bus
    NotOwner,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Flush => f.write_str("bus flush failed"),
            BusError::ChipSelect => f.write_str("chip-select pin error"),
            BusError::NotOwner => f.write_str("transaction without bus ownership"),
        }
    }
}

/// Arbiter for a bus shared between storage and display
pub trait BusArbiter {
    /// Hand the bus to `owner`
    ///
    /// Completes any in-flight transfer and deasserts the previous owner
    /// before the new owner is recorded. Handing over to the current owner
    /// is a no-op.
    fn hand_over(&mut self, owner: BusOwner) -> Result<(), BusError>;

    /// Current owner
    fn owner(&self) -> BusOwner;

    /// Return the bus to the neutral state
    fn release(&mut self) -> Result<(), BusError> {
        self.hand_over(BusOwner::Idle)
    }
}
