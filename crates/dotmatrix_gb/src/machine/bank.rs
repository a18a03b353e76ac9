use crate::{Error, Result};

/// Fixed-size block of memory mapped at `base` in the address space.
///
/// Addresses handed to a bank are absolute; the bank subtracts its base
/// and rejects anything that lands outside its storage. A failed check is
/// reported as [`Error::BankOutOfBounds`] and logged, never wrapped.
#[derive(Clone, Debug)]
pub struct MemoryBank {
    name: &'static str,
    data: Box<[u8]>,
    base: usize,
}

impl MemoryBank {
    /// Zero-filled bank of `size` bytes.
    pub fn new(name: &'static str, size: usize, base: usize) -> Self {
        Self {
            name,
            data: vec![0; size].into_boxed_slice(),
            base,
        }
    }

    /// Bank backed by `bytes`, zero-padded up to `min_size`.
    pub fn with_contents(name: &'static str, bytes: &[u8], min_size: usize, base: usize) -> Self {
        let mut data = bytes.to_vec();
        if data.len() < min_size {
            data.resize(min_size, 0);
        }
        Self {
            name,
            data: data.into_boxed_slice(),
            base,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Zero every byte. Storage is reused.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Replace the contents from the start of the bank; the rest is zeroed.
    pub(crate) fn load(&mut self, bytes: &[u8]) {
        self.data.fill(0);
        let len = bytes.len().min(self.data.len());
        self.data[..len].copy_from_slice(&bytes[..len]);
    }

    fn index(&self, addr: usize) -> Result<usize> {
        match addr.checked_sub(self.base) {
            Some(offset) if offset < self.data.len() => Ok(offset),
            _ => {
                let err = Error::BankOutOfBounds {
                    bank: self.name,
                    addr,
                    base: self.base,
                    size: self.data.len(),
                };
                log::error!("{err}");
                Err(err)
            }
        }
    }

    /// Fail exactly as an access at `addr` would, without touching the data.
    pub(crate) fn check(&self, addr: usize) -> Result<()> {
        self.index(addr).map(|_| ())
    }

    pub fn read8(&self, addr: usize) -> Result<u8> {
        let idx = self.index(addr)?;
        Ok(self.data[idx])
    }

    pub fn write8(&mut self, addr: usize, value: u8) -> Result<()> {
        let idx = self.index(addr)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Little-endian word read. Both bytes must fall inside the bank.
    pub fn read16(&self, addr: usize) -> Result<u16> {
        let lo = self.read8(addr)?;
        let hi = self.read8(addr + 1)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub fn write16(&mut self, addr: usize, value: u16) -> Result<()> {
        // Check the high byte first so a failing write leaves no partial update.
        self.index(addr + 1)?;
        let [lo, hi] = value.to_le_bytes();
        self.write8(addr, lo)?;
        self.write8(addr + 1, hi)
    }
}
