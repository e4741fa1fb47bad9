use std::ops::Range;

use crate::{
    error::MiaError,
    slot::{Address24, ADDRESS_MASK},
};

/// Flat backing store behind the 256 slots.
#[derive(Clone, Debug, PartialEq)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Memory {
            data: vec![0x00; size],
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn reset(&mut self) {
        self.data.fill(0x00);
    }

    pub fn read_byte(&self, address: Address24) -> Result<u8, MiaError> {
        self.data
            .get(address.value() as usize)
            .copied()
            .ok_or(MiaError::AddressOutOfRange {
                address: address.value(),
                size: self.data.len(),
            })
    }

    pub fn write_byte(&mut self, address: Address24, value: u8) -> Result<(), MiaError> {
        let size = self.data.len();
        let cell = self
            .data
            .get_mut(address.value() as usize)
            .ok_or(MiaError::AddressOutOfRange {
                address: address.value(),
                size,
            })?;
        *cell = value;
        Ok(())
    }

    /// Validates an absolute address from outside the slot table. Anything
    /// above 24 bits is rejected instead of being masked onto low memory.
    pub fn address(&self, address: u32) -> Result<Address24, MiaError> {
        if address > ADDRESS_MASK {
            return Err(MiaError::AddressOutOfRange {
                address,
                size: self.data.len(),
            });
        }
        Ok(Address24::new(address))
    }

    /// Index range covering `count` bytes from `address`, if all of them exist.
    pub fn range(&self, address: Address24, count: usize) -> Result<Range<usize>, MiaError> {
        let start = address.value() as usize;
        let end = start + count;
        if end > self.data.len() {
            return Err(MiaError::RangeOutOfBounds {
                address: address.value(),
                count,
                size: self.data.len(),
            });
        }
        Ok(start..end)
    }

    pub fn slice(&self, address: Address24, count: usize) -> Result<&[u8], MiaError> {
        let range = self.range(address, count)?;
        Ok(&self.data[range])
    }

    pub fn load(&mut self, address: Address24, data: &[u8]) -> Result<(), MiaError> {
        let range = self.range(address, data.len())?;
        self.data[range].copy_from_slice(data);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
