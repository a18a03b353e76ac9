use bitflags::bitflags;

bitflags! {
    /// Flag bits in the F register.
    ///
    /// Only the upper nibble is meaningful; the lower four bits always
    /// read back as zero.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Flags: u8 {
        /// Set if the last operation produced a zero result.
        const Z = 0x80;
        /// Set if the last operation was a subtraction.
        const N = 0x40;
        /// Set if the low nibble carried (or borrowed) out of bit 3.
        const H = 0x20;
        /// Set if the result overflowed 255 or went below 0.
        const C = 0x10;
    }
}

impl Flags {
    /// Rebuild flags from the packed byte, discarding the low nibble.
    #[inline]
    pub fn from_byte(value: u8) -> Self {
        Self::from_bits_truncate(value)
    }

    #[inline]
    pub fn zero(self) -> bool {
        self.contains(Self::Z)
    }

    #[inline]
    pub fn subtract(self) -> bool {
        self.contains(Self::N)
    }

    #[inline]
    pub fn half_carry(self) -> bool {
        self.contains(Self::H)
    }

    #[inline]
    pub fn carry(self) -> bool {
        self.contains(Self::C)
    }
}

/// Register file for the DMG CPU.
///
/// Besides the 8-bit registers this also carries the interrupt master
/// enable bit and the cost of the instruction that executed last, in
/// machine cycles (`m`) and clock cycles (`t`, always `4 * m`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub ime: bool,
    pub m: u32,
    pub t: u32,
}

impl Registers {
    /// Power-on defaults: everything zero, execution from 0x0000, IME on.
    pub fn clear(&mut self) {
        *self = Self {
            ime: true,
            ..Self::default()
        };
    }

    #[inline]
    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f.bits()])
    }

    #[inline]
    pub fn set_af(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.f = Flags::from_byte(f);
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        let [b, c] = value.to_be_bytes();
        self.b = b;
        self.c = c;
    }

    #[inline]
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        let [d, e] = value.to_be_bytes();
        self.d = d;
        self.e = e;
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        let [h, l] = value.to_be_bytes();
        self.h = h;
        self.l = l;
    }

    /// Record the cost of the instruction that just executed.
    #[inline]
    pub(crate) fn set_cycles(&mut self, m: u32) {
        self.m = m;
        self.t = m * 4;
    }

    pub(crate) fn snapshot(&self) -> SavedRegisters {
        SavedRegisters {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
        }
    }

    pub(crate) fn restore(&mut self, saved: SavedRegisters) {
        self.a = saved.a;
        self.f = saved.f;
        self.b = saved.b;
        self.c = saved.c;
        self.d = saved.d;
        self.e = saved.e;
        self.h = saved.h;
        self.l = saved.l;
    }
}

/// General-purpose registers captured on interrupt entry and put back by
/// RETI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SavedRegisters {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
}
