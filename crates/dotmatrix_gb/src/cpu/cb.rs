use super::table::{CbOp, EXTENDED};
use super::{Bus, Cpu};
use crate::Result;

impl Cpu {
    /// Handle CB-prefixed instructions (bit operations, shifts and rotates).
    pub(super) fn exec_cb<B: Bus>(&mut self, bus: &mut B) -> Result<u32> {
        let opcode = self.fetch8(bus)?;
        let entry = EXTENDED[opcode as usize];
        let value = self.read_reg8(bus, entry.target)?;

        match entry.op {
            CbOp::Shift(shift) => {
                let result = self.alu_shift(shift, value);
                self.write_reg8(bus, entry.target, result)?;
            }
            // BIT never writes back.
            CbOp::Bit(bit) => self.alu_bit(bit, value),
            CbOp::Res(bit) => self.write_reg8(bus, entry.target, value & !(1 << bit))?,
            CbOp::Set(bit) => self.write_reg8(bus, entry.target, value | (1 << bit))?,
        }

        Ok(entry.cycles)
    }
}
