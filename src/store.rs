//! Settings storage on the last page of the nRF52833's internal flash.
//!
//! Flash operations stall the CPU, interrupts included, for up to about
//! 85 ms per page erase. Pulse capture is suspended around every write so
//! that pulses caught across a stall are dropped instead of mismeasured.
use crate::*;

use embedded_storage::nor_flash::NorFlashErrorKind;
use microbit_bsp::embassy_nrf::nvmc::{Nvmc, PAGE_SIZE};

/// Start of the settings page: the last page of the 512 KiB flash.
const STORE_BASE: u32 = 0x8_0000 - PAGE_SIZE as u32;

pub struct NvmcStore(FlashStore<Nvmc<'static>>);

impl NvmcStore {
    pub fn new(nvmc: Nvmc<'static>) -> Result<Self, NorFlashErrorKind> {
        FlashStore::new(nvmc, STORE_BASE).map(Self)
    }
}

impl Storage for NvmcStore {
    type Error = NorFlashErrorKind;

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.0.read(offset, buf)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        SHARED.samples.suspend();
        let result = self.0.write(offset, data);
        SHARED.samples.resume();
        result
    }
}
