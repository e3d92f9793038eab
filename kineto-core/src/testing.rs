//! Host-side doubles for storage, display, bus and time

use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use kineto_format::ContainerWriter;
use kineto_hal::{
    BusArbiter, BusError, BusOwner, Clock, DisplayError, DisplaySink, StorageError, StorageReader,
};

/// Simulated time in nanoseconds, shared between clock, delay and sinks
pub type SimTime = Rc<Cell<u64>>;

pub fn sim_time() -> SimTime {
    Rc::new(Cell::new(0))
}

pub fn advance_ms(time: &SimTime, ms: u64) {
    time.set(time.get() + ms * 1_000_000);
}

/// Build a complete container from decoded frames
pub fn video_file(width: u16, height: u16, fps: u8, frames: &[Vec<u16>]) -> Vec<u8> {
    let mut writer =
        ContainerWriter::new(Cursor::new(Vec::new()), frames.len() as u32, width, height, fps)
            .unwrap();
    for frame in frames {
        writer.push_frame(frame).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// In-memory files with read accounting
#[derive(Default)]
pub struct MemoryStorage {
    files: Vec<(String, Vec<u8>)>,
    range_reads: usize,
    handle_reads: usize,
    open_handles: usize,
    /// Fail the handle read with this (zero-based) sequence number
    fail_handle_read: Option<usize>,
    /// Milliseconds added to the shared time by every handle read
    read_cost: Option<(SimTime, u64)>,
    bus: Option<Rc<Cell<BusOwner>>>,
    violations: usize,
}

impl MemoryStorage {
    pub fn with_file(path: &str, bytes: Vec<u8>) -> Self {
        Self {
            files: vec![(path.into(), bytes)],
            ..Default::default()
        }
    }

    pub fn fail_handle_read(mut self, nth: usize) -> Self {
        self.fail_handle_read = Some(nth);
        self
    }

    pub fn read_cost(mut self, time: SimTime, ms: u64) -> Self {
        self.read_cost = Some((time, ms));
        self
    }

    pub fn watch_bus(mut self, owner: Rc<Cell<BusOwner>>) -> Self {
        self.bus = Some(owner);
        self
    }

    pub fn range_reads(&self) -> usize {
        self.range_reads
    }

    pub fn handle_reads(&self) -> usize {
        self.handle_reads
    }

    pub fn open_handles(&self) -> usize {
        self.open_handles
    }

    /// Reads issued while the bus was not handed to storage
    pub fn violations(&self) -> usize {
        self.violations
    }

    pub fn file_len(&self, path: &str) -> usize {
        self.find(path).map(|i| self.files[i].1.len()).unwrap_or(0)
    }

    fn find(&self, path: &str) -> Option<usize> {
        self.files.iter().position(|(name, _)| name == path)
    }

    fn check_bus(&mut self) {
        if let Some(owner) = &self.bus {
            if owner.get() != BusOwner::Storage {
                self.violations += 1;
            }
        }
    }

    fn copy(&self, file: usize, buf: &mut [u8], offset: u32) -> Result<usize, StorageError> {
        let data = &self.files[file].1;
        let offset = offset as usize;
        if offset >= data.len() {
            return Err(StorageError::OutOfBounds);
        }
        let n = buf.len().min(data.len() - offset);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        Ok(n)
    }
}

impl StorageReader for MemoryStorage {
    type Handle = usize;

    fn read_range(
        &mut self,
        path: &str,
        buf: &mut [u8],
        offset: u32,
    ) -> Result<usize, StorageError> {
        self.range_reads += 1;
        let file = self.find(path).ok_or(StorageError::NotFound)?;
        self.copy(file, buf, offset)
    }

    fn open(&mut self, path: &str) -> Result<Self::Handle, StorageError> {
        let file = self.find(path).ok_or(StorageError::NotFound)?;
        self.open_handles += 1;
        Ok(file)
    }

    fn read_at(
        &mut self,
        handle: &mut Self::Handle,
        buf: &mut [u8],
        offset: u32,
    ) -> Result<usize, StorageError> {
        self.check_bus();
        let seq = self.handle_reads;
        self.handle_reads += 1;
        if let Some((time, ms)) = &self.read_cost {
            advance_ms(time, *ms);
        }
        if self.fail_handle_read == Some(seq) {
            return Err(StorageError::Io);
        }
        self.copy(*handle, buf, offset)
    }

    fn close(&mut self, _handle: Self::Handle) {
        self.open_handles -= 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u16>,
}

/// Display sink that records every block it receives
pub struct RecordingSink {
    pub blocks: Vec<Block>,
    size: (u16, u16),
    fail_on: Option<usize>,
    draw_cost: Option<(SimTime, u64)>,
    bus: Option<Rc<Cell<BusOwner>>>,
    violations: usize,
}

impl RecordingSink {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            blocks: Vec::new(),
            size: (width, height),
            fail_on: None,
            draw_cost: None,
            bus: None,
            violations: 0,
        }
    }

    /// Reject the block with this (zero-based) sequence number
    pub fn fail_on(mut self, nth: usize) -> Self {
        self.fail_on = Some(nth);
        self
    }

    pub fn draw_cost(mut self, time: SimTime, ms: u64) -> Self {
        self.draw_cost = Some((time, ms));
        self
    }

    pub fn watch_bus(mut self, owner: Rc<Cell<BusOwner>>) -> Self {
        self.bus = Some(owner);
        self
    }

    pub fn violations(&self) -> usize {
        self.violations
    }

    /// Pixels of all blocks, converted back from wire order
    pub fn native_pixels(&self) -> Vec<u16> {
        self.blocks
            .iter()
            .flat_map(|b| b.pixels.iter().map(|p| u16::from_be(*p)))
            .collect()
    }
}

impl DisplaySink for RecordingSink {
    fn write_block(
        &mut self,
        x: u16,
        y: u16,
        pixels: &[u16],
        width: u16,
        height: u16,
    ) -> Result<(), DisplayError> {
        if let Some(owner) = &self.bus {
            if owner.get() != BusOwner::Display {
                self.violations += 1;
            }
        }
        if let Some((time, ms)) = &self.draw_cost {
            advance_ms(time, *ms);
        }
        if self.fail_on == Some(self.blocks.len()) {
            return Err(DisplayError::Communication);
        }
        if pixels.len() != width as usize * height as usize {
            return Err(DisplayError::BufferMismatch);
        }
        self.blocks.push(Block {
            x,
            y,
            width,
            height,
            pixels: pixels.to_vec(),
        });
        Ok(())
    }

    fn dimensions(&self) -> (u16, u16) {
        self.size
    }
}

pub struct SimClock(pub SimTime);

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }
}

/// Delay that advances simulated time instead of sleeping
pub struct SimDelay {
    time: SimTime,
    pub total_ms: u64,
}

impl SimDelay {
    pub fn new(time: SimTime) -> Self {
        Self { time, total_ms: 0 }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.time.set(self.time.get() + ns as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms as u64;
        advance_ms(&self.time, ms as u64);
    }
}

/// Arbiter that logs every handover
pub struct RecordingBus {
    owner: Rc<Cell<BusOwner>>,
    pub log: Vec<BusOwner>,
    fail_on: Option<usize>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self {
            owner: Rc::new(Cell::new(BusOwner::Idle)),
            log: Vec::new(),
            fail_on: None,
        }
    }

    /// Fail the handover with this (zero-based) sequence number
    pub fn fail_on(mut self, nth: usize) -> Self {
        self.fail_on = Some(nth);
        self
    }

    pub fn shared_owner(&self) -> Rc<Cell<BusOwner>> {
        self.owner.clone()
    }
}

impl BusArbiter for RecordingBus {
    fn hand_over(&mut self, owner: BusOwner) -> Result<(), BusError> {
        let seq = self.log.len();
        self.log.push(owner);
        if self.fail_on == Some(seq) {
            return Err(BusError::Flush);
        }
        self.owner.set(owner);
        Ok(())
    }

    fn owner(&self) -> BusOwner {
        self.owner.get()
    }
}
