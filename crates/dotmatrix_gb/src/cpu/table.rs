//! Opcode tables.
//!
//! Every opcode is described as data: which operation it performs, which
//! operands it uses and what it costs in machine cycles. The two 256-entry
//! tables are built at compile time from the regular x/y/z bit layout of
//! the instruction set, so the interpreter only needs one generic routine
//! per operation kind.

/// 8-bit operand slot, in the order used by bits 0-2 and 3-5 of an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg8 {
    B,
    C,
    D,
    E,
    H,
    L,
    /// Memory at the address held in HL.
    HlInd,
    A,
}

impl Reg8 {
    const fn from_index(index: u8) -> Self {
        match index & 0x07 {
            0 => Reg8::B,
            1 => Reg8::C,
            2 => Reg8::D,
            3 => Reg8::E,
            4 => Reg8::H,
            5 => Reg8::L,
            6 => Reg8::HlInd,
            _ => Reg8::A,
        }
    }

    #[inline]
    pub const fn is_memory(self) -> bool {
        matches!(self, Reg8::HlInd)
    }
}

/// 16-bit register pair used by loads and 16-bit arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg16 {
    Bc,
    De,
    Hl,
    Sp,
}

impl Reg16 {
    const fn from_index(index: u8) -> Self {
        match index & 0x03 {
            0 => Reg16::Bc,
            1 => Reg16::De,
            2 => Reg16::Hl,
            _ => Reg16::Sp,
        }
    }
}

/// Register pair used by PUSH and POP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackPair {
    Bc,
    De,
    Hl,
    Af,
}

impl StackPair {
    const fn from_index(index: u8) -> Self {
        match index & 0x03 {
            0 => StackPair::Bc,
            1 => StackPair::De,
            2 => StackPair::Hl,
            _ => StackPair::Af,
        }
    }
}

/// Address source for `LD (rr),A` and `LD A,(rr)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indirect {
    Bc,
    De,
    /// (HL), then HL is incremented.
    HlInc,
    /// (HL), then HL is decremented.
    HlDec,
}

impl Indirect {
    const fn from_index(index: u8) -> Self {
        match index & 0x03 {
            0 => Indirect::Bc,
            1 => Indirect::De,
            2 => Indirect::HlInc,
            _ => Indirect::HlDec,
        }
    }
}

/// Branch condition tested against the flag register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cond {
    Always,
    Nz,
    Z,
    Nc,
    C,
}

impl Cond {
    const fn from_index(index: u8) -> Self {
        match index & 0x03 {
            0 => Cond::Nz,
            1 => Cond::Z,
            2 => Cond::Nc,
            _ => Cond::C,
        }
    }
}

/// Accumulator operations of the 0x80-0xBF block and their immediate forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    const fn from_index(index: u8) -> Self {
        match index & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

/// Rotate and shift operations. The first four also back the unprefixed
/// RLCA/RRCA/RLA/RRA forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shift {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

impl Shift {
    const fn from_index(index: u8) -> Self {
        match index & 0x07 {
            0 => Shift::Rlc,
            1 => Shift::Rrc,
            2 => Shift::Rl,
            3 => Shift::Rr,
            4 => Shift::Sla,
            5 => Shift::Sra,
            6 => Shift::Swap,
            _ => Shift::Srl,
        }
    }
}

/// Decoded primary-table operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instr {
    Nop,
    Stop,
    Halt,
    Di,
    Ei,
    /// Fetch a second byte and dispatch through the extended table.
    Prefix,
    /// No defined operation; executing it stops the machine.
    Illegal,

    Ld { dst: Reg8, src: Reg8 },
    LdImm(Reg8),
    LdImm16(Reg16),
    StoreA(Indirect),
    LoadA(Indirect),
    StoreSp,
    StoreHighImm,
    LoadHighImm,
    StoreHighC,
    LoadHighC,
    StoreAbs,
    LoadAbs,
    LdSpHl,
    LdHlSpOffset,
    AddSpOffset,

    Alu(AluOp, Reg8),
    AluImm(AluOp),
    Inc(Reg8),
    Dec(Reg8),
    Inc16(Reg16),
    Dec16(Reg16),
    AddHl(Reg16),
    RotateA(Shift),
    Daa,
    Cpl,
    Scf,
    Ccf,

    Jp(Cond),
    JpHl,
    Jr(Cond),
    Call(Cond),
    Ret(Cond),
    Reti,
    Rst(u16),
    Push(StackPair),
    Pop(StackPair),
}

/// A primary-table entry: the operation and its base cost in machine
/// cycles. Conditional branches add their extra cost only when taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode {
    pub instr: Instr,
    pub cycles: u32,
}

/// Extended (0xCB-prefixed) operation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CbOp {
    Shift(Shift),
    Bit(u8),
    Res(u8),
    Set(u8),
}

/// An extended-table entry. `cycles` includes the prefix byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CbOpcode {
    pub op: CbOp,
    pub target: Reg8,
    pub cycles: u32,
}

pub const PRIMARY: [Opcode; 256] = build_primary();
pub const EXTENDED: [CbOpcode; 256] = build_extended();

const fn op(instr: Instr, cycles: u32) -> Opcode {
    Opcode { instr, cycles }
}

const fn decode_primary(opcode: u8) -> Opcode {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;

    match x {
        0 => match z {
            0 => match y {
                0 => op(Instr::Nop, 1),
                1 => op(Instr::StoreSp, 4),
                2 => op(Instr::Stop, 1),
                3 => op(Instr::Jr(Cond::Always), 2),
                _ => op(Instr::Jr(Cond::from_index(y - 4)), 2),
            },
            1 => {
                if y & 1 == 0 {
                    op(Instr::LdImm16(Reg16::from_index(y >> 1)), 3)
                } else {
                    op(Instr::AddHl(Reg16::from_index(y >> 1)), 3)
                }
            }
            2 => {
                if y & 1 == 0 {
                    op(Instr::StoreA(Indirect::from_index(y >> 1)), 2)
                } else {
                    op(Instr::LoadA(Indirect::from_index(y >> 1)), 2)
                }
            }
            3 => {
                if y & 1 == 0 {
                    op(Instr::Inc16(Reg16::from_index(y >> 1)), 1)
                } else {
                    op(Instr::Dec16(Reg16::from_index(y >> 1)), 1)
                }
            }
            4 => {
                let r = Reg8::from_index(y);
                op(Instr::Inc(r), if r.is_memory() { 3 } else { 1 })
            }
            5 => {
                let r = Reg8::from_index(y);
                op(Instr::Dec(r), if r.is_memory() { 3 } else { 1 })
            }
            6 => {
                let r = Reg8::from_index(y);
                op(Instr::LdImm(r), if r.is_memory() { 3 } else { 2 })
            }
            _ => match y {
                0 => op(Instr::RotateA(Shift::Rlc), 1),
                1 => op(Instr::RotateA(Shift::Rrc), 1),
                2 => op(Instr::RotateA(Shift::Rl), 1),
                3 => op(Instr::RotateA(Shift::Rr), 1),
                4 => op(Instr::Daa, 1),
                5 => op(Instr::Cpl, 1),
                6 => op(Instr::Scf, 1),
                _ => op(Instr::Ccf, 1),
            },
        },
        1 => {
            if opcode == 0x76 {
                op(Instr::Halt, 1)
            } else {
                let dst = Reg8::from_index(y);
                let src = Reg8::from_index(z);
                let cycles = if dst.is_memory() || src.is_memory() { 2 } else { 1 };
                op(Instr::Ld { dst, src }, cycles)
            }
        }
        2 => {
            let src = Reg8::from_index(z);
            op(
                Instr::Alu(AluOp::from_index(y), src),
                if src.is_memory() { 2 } else { 1 },
            )
        }
        _ => match opcode {
            0xC0 | 0xC8 | 0xD0 | 0xD8 => op(Instr::Ret(Cond::from_index(y)), 1),
            0xC2 | 0xCA | 0xD2 | 0xDA => op(Instr::Jp(Cond::from_index(y)), 3),
            0xC4 | 0xCC | 0xD4 | 0xDC => op(Instr::Call(Cond::from_index(y)), 3),
            0xC1 | 0xD1 | 0xE1 | 0xF1 => op(Instr::Pop(StackPair::from_index(y >> 1)), 3),
            0xC5 | 0xD5 | 0xE5 | 0xF5 => op(Instr::Push(StackPair::from_index(y >> 1)), 3),
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                op(Instr::AluImm(AluOp::from_index(y)), 2)
            }
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                op(Instr::Rst((y as u16) * 8), 3)
            }
            0xC3 => op(Instr::Jp(Cond::Always), 3),
            0xC9 => op(Instr::Ret(Cond::Always), 3),
            0xCB => op(Instr::Prefix, 0),
            0xCD => op(Instr::Call(Cond::Always), 5),
            0xD9 => op(Instr::Reti, 3),
            0xE0 => op(Instr::StoreHighImm, 3),
            0xE2 => op(Instr::StoreHighC, 2),
            0xE8 => op(Instr::AddSpOffset, 4),
            0xE9 => op(Instr::JpHl, 1),
            0xEA => op(Instr::StoreAbs, 4),
            0xF0 => op(Instr::LoadHighImm, 3),
            0xF2 => op(Instr::LoadHighC, 2),
            0xF3 => op(Instr::Di, 1),
            0xF8 => op(Instr::LdHlSpOffset, 3),
            0xF9 => op(Instr::LdSpHl, 2),
            0xFA => op(Instr::LoadAbs, 4),
            0xFB => op(Instr::Ei, 1),
            // D3 DB DD E3 E4 EB EC ED F4 FC FD
            _ => op(Instr::Illegal, 0),
        },
    }
}

const fn decode_extended(opcode: u8) -> CbOpcode {
    let y = (opcode >> 3) & 0x07;
    let target = Reg8::from_index(opcode);
    let (op, cycles) = match opcode >> 6 {
        0 => (CbOp::Shift(Shift::from_index(y)), if target.is_memory() { 4 } else { 2 }),
        1 => (CbOp::Bit(y), if target.is_memory() { 3 } else { 2 }),
        2 => (CbOp::Res(y), if target.is_memory() { 4 } else { 2 }),
        _ => (CbOp::Set(y), if target.is_memory() { 4 } else { 2 }),
    };
    CbOpcode { op, target, cycles }
}

const fn build_primary() -> [Opcode; 256] {
    let mut table = [op(Instr::Illegal, 0); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode_primary(i as u8);
        i += 1;
    }
    table
}

const fn build_extended() -> [CbOpcode; 256] {
    let mut table = [CbOpcode {
        op: CbOp::Bit(0),
        target: Reg8::B,
        cycles: 0,
    }; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode_extended(i as u8);
        i += 1;
    }
    table
}
