#![allow(dead_code)]

use ledctl::settings::LAYOUT_SIZE;
use ledctl::Storage;
use std::cell::Cell;
use std::rc::Rc;
use std::vec::Vec;

/// In-memory store that records every write.
pub struct MemoryStorage {
    pub bytes: [u8; LAYOUT_SIZE],
    pub writes: Vec<(usize, Vec<u8>)>,
    /// Shared so a test can break the store while something else owns it.
    pub fail_writes: Rc<Cell<bool>>,
}

#[derive(Debug, PartialEq)]
pub struct WriteFailed;

impl MemoryStorage {
    pub fn erased() -> Self {
        Self::from_bytes([0xff; LAYOUT_SIZE])
    }

    pub fn from_bytes(bytes: [u8; LAYOUT_SIZE]) -> Self {
        Self {
            bytes,
            writes: Vec::new(),
            fail_writes: Rc::new(Cell::new(false)),
        }
    }

    pub fn word(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }
}

impl Storage for MemoryStorage {
    type Error = WriteFailed;

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error> {
        buf.copy_from_slice(&self.bytes[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes.get() {
            return Err(WriteFailed);
        }
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        self.writes.push((offset, data.to_vec()));
        Ok(())
    }
}

/// Store image with every output constant, full brightness, `Direct`,
/// period 10, and inputs bounded to 1000..2000.
pub fn configured() -> [u8; LAYOUT_SIZE] {
    let mut bytes = [0u8; LAYOUT_SIZE];
    bytes[0..7].fill(10);
    bytes[7..14].fill(255);
    bytes[14..21].fill(0);
    bytes[21..28].fill(10);
    for led in 0..7 {
        bytes[28 + 2 * led..30 + 2 * led].copy_from_slice(&10u16.to_le_bytes());
    }
    for input in 0..3 {
        bytes[42 + 2 * input..44 + 2 * input].copy_from_slice(&1000u16.to_le_bytes());
        bytes[48 + 2 * input..50 + 2 * input].copy_from_slice(&2000u16.to_le_bytes());
    }
    bytes
}
