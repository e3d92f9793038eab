//! Kineto Hardware Abstraction Layer
//!
//! This crate defines the interfaces between the playback engine and the
//! peripherals it drives. The engine is written once against these traits;
//! board crates (or the mocks in the tests) provide the implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (kineto-firmware, etc.)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  kineto-core (decoder, scheduler)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  kineto-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ kineto-       │       │  host mocks   │
//! │   drivers     │       │  (tests)      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`storage::StorageReader`] - Byte-range reads from a named file
//! - [`display::DisplaySink`] - Rectangular pixel block writes
//! - [`bus::BusArbiter`] - Exclusive ownership of the shared bus
//! - [`time::Clock`] - Millisecond time source

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod display;
pub mod storage;
pub mod time;

// Re-export key traits at crate root for convenience
pub use bus::{BusArbiter, BusError, BusOwner};
pub use display::{DisplayError, DisplaySink};
pub use storage::{StorageError, StorageReader};
pub use time::Clock;
