//! Recording doubles for SPI and GPIO

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, ErrorKind, Operation, SpiBus, SpiDevice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Low(char),
    High(char),
    Write(Vec<u8>),
    Read(usize),
    Flush,
}

/// Shared, ordered log of pin and bus activity
#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn take(&self) -> Vec<Event> {
        self.0.borrow_mut().drain(..).collect()
    }
}

pub struct MockPin {
    name: char,
    journal: Journal,
}

impl MockPin {
    pub fn new(name: char, journal: Journal) -> Self {
        Self { name, journal }
    }
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.journal.push(Event::Low(self.name));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.journal.push(Event::High(self.name));
        Ok(())
    }
}

/// Raw bus; reads return 0xA5
pub struct MockSpiBus {
    journal: Journal,
    fail_flush: bool,
}

impl MockSpiBus {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_flush: false,
        }
    }

    pub fn failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }
}

impl spi::ErrorType for MockSpiBus {
    type Error = ErrorKind;
}

impl SpiBus for MockSpiBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0xA5);
        self.journal.push(Event::Read(words.len()));
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.journal.push(Event::Write(words.to_vec()));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        self.read(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.journal.push(Event::Write(words.to_vec()));
        self.read(words)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.journal.push(Event::Flush);
        if self.fail_flush {
            return Err(ErrorKind::Other);
        }
        Ok(())
    }
}

/// Device that logs every write and can be told to fail
pub struct MockSpiDevice {
    journal: Journal,
    fail_after: Option<usize>,
    transactions: usize,
}

impl MockSpiDevice {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_after: None,
            transactions: 0,
        }
    }

    /// Fail every transaction after the first `n`
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn transactions(&self) -> usize {
        self.transactions
    }
}

impl spi::ErrorType for MockSpiDevice {
    type Error = ErrorKind;
}

impl SpiDevice for MockSpiDevice {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        if self.fail_after.is_some_and(|n| self.transactions >= n) {
            return Err(ErrorKind::Other);
        }
        self.transactions += 1;
        for op in operations {
            match op {
                Operation::Write(buf) => self.journal.push(Event::Write(buf.to_vec())),
                Operation::Read(buf) => self.journal.push(Event::Read(buf.len())),
                _ => {}
            }
        }
        Ok(())
    }
}

/// SPI NOR flash answering READ (0x03) from a memory image
pub struct FlashImage {
    pub image: Vec<u8>,
    pub commands: Vec<[u8; 4]>,
}

impl FlashImage {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            commands: Vec::new(),
        }
    }
}

impl spi::ErrorType for FlashImage {
    type Error = ErrorKind;
}

impl SpiDevice for FlashImage {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut address = None;
        for op in operations {
            match op {
                Operation::Write(cmd) => {
                    let cmd: [u8; 4] = (*cmd).try_into().map_err(|_| ErrorKind::Other)?;
                    if cmd[0] != 0x03 {
                        return Err(ErrorKind::Other);
                    }
                    self.commands.push(cmd);
                    address = Some(u32::from_be_bytes([0, cmd[1], cmd[2], cmd[3]]) as usize);
                }
                Operation::Read(buf) => {
                    let start = address.ok_or(ErrorKind::Other)?;
                    let end = start + buf.len();
                    if end > self.image.len() {
                        return Err(ErrorKind::Other);
                    }
                    buf.copy_from_slice(&self.image[start..end]);
                }
                _ => return Err(ErrorKind::Other),
            }
        }
        Ok(())
    }
}
