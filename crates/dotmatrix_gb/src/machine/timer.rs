//! Divider and programmable counter.
//!
//! Time arrives in machine cycles from the bus. Every four of those make
//! one "main" tick; DIV advances once per sixteen main ticks and TIMA
//! once per `threshold` main ticks while TAC bit 2 is set.

mod io;

use crate::cpu::Interrupts;

/// Main ticks per TIMA increment, indexed by TAC bits 0-1.
const THRESHOLDS: [u32; 4] = [64, 1, 4, 16];
/// Main ticks per DIV increment.
const DIV_PERIOD: u32 = 16;

#[derive(Clone, Debug, Default)]
pub(super) struct Timer {
    /// DIV (FF04).
    pub(super) div: u8,
    /// TIMA (FF05).
    pub(super) tima: u8,
    /// TMA (FF06).
    pub(super) tma: u8,
    /// TAC (FF07), lower 3 bits.
    pub(super) tac: u8,
    /// Machine cycles not yet folded into a main tick.
    sub: u32,
    /// Main ticks since the last TIMA increment.
    main: u32,
    /// Main ticks since the last DIV increment.
    div_sub: u32,
}

impl Timer {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    fn enabled(&self) -> bool {
        self.tac & 0x04 != 0
    }

    #[inline]
    fn threshold(&self) -> u32 {
        THRESHOLDS[(self.tac & 0x03) as usize]
    }

    /// Advance by `m_cycles` machine cycles, raising the timer bit in
    /// `if_reg` on every TIMA overflow.
    pub(super) fn tick(&mut self, m_cycles: u32, if_reg: &mut Interrupts) {
        self.sub += m_cycles;
        while self.sub >= 4 {
            self.sub -= 4;
            self.main_tick(if_reg);
        }
    }

    fn main_tick(&mut self, if_reg: &mut Interrupts) {
        self.div_sub += 1;
        if self.div_sub == DIV_PERIOD {
            self.div_sub = 0;
            self.div = self.div.wrapping_add(1);
        }

        if !self.enabled() {
            return;
        }
        self.main += 1;
        if self.main >= self.threshold() {
            self.main = 0;
            self.increment_tima(if_reg);
        }
    }

    fn increment_tima(&mut self, if_reg: &mut Interrupts) {
        let (next, overflow) = self.tima.overflowing_add(1);
        if overflow {
            self.tima = self.tma;
            if_reg.insert(Interrupts::TIMER);
            log::trace!("Timer: TIMA overflow, reload 0x{:02X}", self.tma);
        } else {
            self.tima = next;
        }
    }
}
