//! Per-cycle micro-operation table.
//!
//! Every opcode owns eight consecutive slots, indexed by
//! `(opcode << 3) | sub_cycle`. Each slot names the micro-op performed on
//! that clock and whether it may be stolen by DMA. Reads can always be
//! stolen; writes cannot, because the real chip ignores RDY while writing.
//!
//! An instruction's sequence is its addressing-mode steps, an optional
//! operand read, the instruction's own steps, and finally the
//! interrupts-or-next-opcode check. For most ALU instructions the semantic
//! step also performs that check on the same clock, which is how the 6502
//! overlaps the last cycle of one instruction with the fetch of the next.
//!
//! The table is evaluated at compile time.

/// Slots reserved per opcode.
pub const SLOTS_PER_OPCODE: usize = 8;

/// Opcodes the cycle driver refers to by value.
pub mod opcode {
    pub const BRK: u8 = 0x00;
    pub const CLI: u8 = 0x58;
    pub const SEI: u8 = 0x78;
    pub const SHA_IY: u8 = 0x93;
    pub const SHS_AY: u8 = 0x9B;
    pub const SHY_AX: u8 = 0x9C;
    pub const SHX_AY: u8 = 0x9E;
    pub const SHA_AY: u8 = 0x9F;
}

/// Branch conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    CarryClear,
    CarrySet,
    NotEqual,
    Equal,
    Plus,
    Minus,
    OverflowClear,
    OverflowSet,
}

/// Instruction semantics, documented and undocumented.
///
/// Names follow the common mnemonics; the undocumented ones use the names
/// most assemblers accept (SLO rather than ASO, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Adc,
    Alr,
    Anc,
    And,
    Ane,
    Arr,
    Asl,
    AslA,
    Bit,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dcp,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Isb,
    Jmp,
    Las,
    Lax,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    LsrA,
    Lxa,
    Ora,
    Pha,
    Pla,
    Rla,
    Rol,
    RolA,
    Ror,
    RorA,
    Rra,
    Rti,
    Rts,
    Sax,
    Sbc,
    Sbx,
    Sec,
    Sed,
    Sei,
    Sha,
    Shs,
    Shx,
    Shy,
    Slo,
    Sre,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

/// One clock's worth of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    // Operand and address generation
    ThrowAwayFetch,
    ThrowAwayRead,
    FetchDataByte,
    FetchLowAddr,
    FetchLowAddrX,
    FetchLowAddrY,
    FetchHighAddr,
    FetchHighAddrX,
    /// As `FetchHighAddrX`, skipping the fix-up read when no page is crossed.
    FetchHighAddrX2,
    FetchHighAddrY,
    /// As `FetchHighAddrY`, skipping the fix-up read when no page is crossed.
    FetchHighAddrY2,
    FetchLowPointer,
    FetchLowPointerX,
    FetchHighPointer,
    FetchLowEffAddr,
    FetchHighEffAddr,
    FetchHighEffAddrY,
    /// As `FetchHighEffAddrY`, skipping the fix-up read when no page is crossed.
    FetchHighEffAddrY2,
    FetchEffAddrDataByte,
    PutEffAddrDataByte,
    WasteCycle,

    // Stack
    PushHighPc,
    PushLowPc,
    PushSr,
    PopSr,
    PopLowPc,
    PopHighPc,

    // BRK and interrupt sequence
    BrkPushLowPc,
    IrqLoRequest,
    IrqHiRequest,
    FetchNextOpcode,
    InterruptsAndNextOpcode,

    Branch(Condition),
    FixBranch,
    Execute(Operation),

    /// HLT/KIL: the chip locks up.
    Jam,
}

/// A table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroCycle {
    pub op: MicroOp,
    /// Runs even while RDY is low.
    pub no_steal: bool,
}

impl MicroCycle {
    const UNUSED: Self = Self {
        op: MicroOp::Jam,
        no_steal: false,
    };
}

/// The full table, `[opcode][sub_cycle]`.
pub static MICROCODE: [[MicroCycle; SLOTS_PER_OPCODE]; 256] = build();

/// Slot for a packed cycle position `(opcode << 3) | sub_cycle`.
#[must_use]
pub fn slot(cycle_count: u16) -> MicroCycle {
    let opcode = usize::from(cycle_count >> 3) & 0xFF;
    let sub = usize::from(cycle_count) & (SLOTS_PER_OPCODE - 1);
    MICROCODE[opcode][sub]
}

#[derive(Clone, Copy)]
enum Mode {
    Implied,
    /// Immediate and relative. BRK, RTI and RTS also start here.
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    /// First half of JSR; the high byte is fetched after the pushes.
    AbsoluteLow,
    /// Read-only absolute,X: fix-up cycle only on a page crossing.
    AbsoluteX,
    /// Write and RMW absolute,X: fix-up cycle always.
    AbsoluteXFixed,
    AbsoluteY,
    AbsoluteYFixed,
    Indirect,
    IndexedIndirect,
    /// Read-only (zp),Y: fix-up cycle only on a page crossing.
    IndirectIndexed,
    IndirectIndexedFixed,
    Undefined,
}

#[derive(Clone, Copy)]
enum Body {
    /// Single cycle that finishes with the interrupt/fetch check.
    Op(Operation),
    /// Dummy write, compute, then the real write. Both cycles no-steal.
    Rmw(Operation),
    /// Single no-steal write cycle.
    Store(Operation),
    Branch(Condition),
    Brk,
    Jsr,
    Php,
    Pla,
    Plp,
    Rti,
    Rts,
    Nop,
    Undefined,
}

#[derive(Clone, Copy)]
struct Decoded {
    mode: Mode,
    /// Whether the operand is read from the effective address.
    read: bool,
    body: Body,
}

const fn rd(mode: Mode, body: Body) -> Decoded {
    Decoded {
        mode,
        read: true,
        body,
    }
}

const fn wr(mode: Mode, body: Body) -> Decoded {
    Decoded {
        mode,
        read: false,
        body,
    }
}

const JAM: Decoded = wr(Mode::Undefined, Body::Undefined);

#[allow(clippy::enum_glob_use)]
const fn decode(opcode: u8) -> Decoded {
    use Body::*;
    use Condition::*;
    use Mode::*;
    use Operation as O;

    match opcode {
        0x00 => wr(Immediate, Brk),
        0x01 => rd(IndexedIndirect, Op(O::Ora)),
        0x03 => rd(IndexedIndirect, Rmw(O::Slo)),
        0x04 => rd(ZeroPage, Nop),
        0x05 => rd(ZeroPage, Op(O::Ora)),
        0x06 => rd(ZeroPage, Rmw(O::Asl)),
        0x07 => rd(ZeroPage, Rmw(O::Slo)),
        0x08 => wr(Implied, Php),
        0x09 => wr(Immediate, Op(O::Ora)),
        0x0A => wr(Implied, Op(O::AslA)),
        0x0B => wr(Immediate, Op(O::Anc)),
        0x0C => rd(Absolute, Nop),
        0x0D => rd(Absolute, Op(O::Ora)),
        0x0E => rd(Absolute, Rmw(O::Asl)),
        0x0F => rd(Absolute, Rmw(O::Slo)),

        0x10 => wr(Immediate, Branch(Plus)),
        0x11 => rd(IndirectIndexed, Op(O::Ora)),
        0x13 => rd(IndirectIndexedFixed, Rmw(O::Slo)),
        0x14 => rd(ZeroPageX, Nop),
        0x15 => rd(ZeroPageX, Op(O::Ora)),
        0x16 => rd(ZeroPageX, Rmw(O::Asl)),
        0x17 => rd(ZeroPageX, Rmw(O::Slo)),
        0x18 => wr(Implied, Op(O::Clc)),
        0x19 => rd(AbsoluteY, Op(O::Ora)),
        0x1A => wr(Implied, Nop),
        0x1B => rd(AbsoluteYFixed, Rmw(O::Slo)),
        0x1C => rd(AbsoluteX, Nop),
        0x1D => rd(AbsoluteX, Op(O::Ora)),
        0x1E => rd(AbsoluteXFixed, Rmw(O::Asl)),
        0x1F => rd(AbsoluteXFixed, Rmw(O::Slo)),

        0x20 => wr(AbsoluteLow, Jsr),
        0x21 => rd(IndexedIndirect, Op(O::And)),
        0x23 => rd(IndexedIndirect, Rmw(O::Rla)),
        0x24 => rd(ZeroPage, Op(O::Bit)),
        0x25 => rd(ZeroPage, Op(O::And)),
        0x26 => rd(ZeroPage, Rmw(O::Rol)),
        0x27 => rd(ZeroPage, Rmw(O::Rla)),
        0x28 => wr(Implied, Plp),
        0x29 => wr(Immediate, Op(O::And)),
        0x2A => wr(Implied, Op(O::RolA)),
        0x2B => wr(Immediate, Op(O::Anc)),
        0x2C => rd(Absolute, Op(O::Bit)),
        0x2D => rd(Absolute, Op(O::And)),
        0x2E => rd(Absolute, Rmw(O::Rol)),
        0x2F => rd(Absolute, Rmw(O::Rla)),

        0x30 => wr(Immediate, Branch(Minus)),
        0x31 => rd(IndirectIndexed, Op(O::And)),
        0x33 => rd(IndirectIndexedFixed, Rmw(O::Rla)),
        0x34 => rd(ZeroPageX, Nop),
        0x35 => rd(ZeroPageX, Op(O::And)),
        0x36 => rd(ZeroPageX, Rmw(O::Rol)),
        0x37 => rd(ZeroPageX, Rmw(O::Rla)),
        0x38 => wr(Implied, Op(O::Sec)),
        0x39 => rd(AbsoluteY, Op(O::And)),
        0x3A => wr(Implied, Nop),
        0x3B => rd(AbsoluteYFixed, Rmw(O::Rla)),
        0x3C => rd(AbsoluteX, Nop),
        0x3D => rd(AbsoluteX, Op(O::And)),
        0x3E => rd(AbsoluteXFixed, Rmw(O::Rol)),
        0x3F => rd(AbsoluteXFixed, Rmw(O::Rla)),

        0x40 => wr(Immediate, Rti),
        0x41 => rd(IndexedIndirect, Op(O::Eor)),
        0x43 => rd(IndexedIndirect, Rmw(O::Sre)),
        0x44 => rd(ZeroPage, Nop),
        0x45 => rd(ZeroPage, Op(O::Eor)),
        0x46 => rd(ZeroPage, Rmw(O::Lsr)),
        0x47 => rd(ZeroPage, Rmw(O::Sre)),
        0x48 => wr(Implied, Store(O::Pha)),
        0x49 => wr(Immediate, Op(O::Eor)),
        0x4A => wr(Implied, Op(O::LsrA)),
        0x4B => wr(Immediate, Op(O::Alr)),
        0x4C => wr(Absolute, Op(O::Jmp)),
        0x4D => rd(Absolute, Op(O::Eor)),
        0x4E => rd(Absolute, Rmw(O::Lsr)),
        0x4F => rd(Absolute, Rmw(O::Sre)),

        0x50 => wr(Immediate, Branch(OverflowClear)),
        0x51 => rd(IndirectIndexed, Op(O::Eor)),
        0x53 => rd(IndirectIndexedFixed, Rmw(O::Sre)),
        0x54 => rd(ZeroPageX, Nop),
        0x55 => rd(ZeroPageX, Op(O::Eor)),
        0x56 => rd(ZeroPageX, Rmw(O::Lsr)),
        0x57 => rd(ZeroPageX, Rmw(O::Sre)),
        0x58 => wr(Implied, Op(O::Cli)),
        0x59 => rd(AbsoluteY, Op(O::Eor)),
        0x5A => wr(Implied, Nop),
        0x5B => rd(AbsoluteYFixed, Rmw(O::Sre)),
        0x5C => rd(AbsoluteX, Nop),
        0x5D => rd(AbsoluteX, Op(O::Eor)),
        0x5E => rd(AbsoluteXFixed, Rmw(O::Lsr)),
        0x5F => rd(AbsoluteXFixed, Rmw(O::Sre)),

        0x60 => wr(Immediate, Rts),
        0x61 => rd(IndexedIndirect, Op(O::Adc)),
        0x63 => rd(IndexedIndirect, Rmw(O::Rra)),
        0x64 => rd(ZeroPage, Nop),
        0x65 => rd(ZeroPage, Op(O::Adc)),
        0x66 => rd(ZeroPage, Rmw(O::Ror)),
        0x67 => rd(ZeroPage, Rmw(O::Rra)),
        0x68 => wr(Implied, Pla),
        0x69 => wr(Immediate, Op(O::Adc)),
        0x6A => wr(Implied, Op(O::RorA)),
        0x6B => wr(Immediate, Op(O::Arr)),
        0x6C => wr(Indirect, Op(O::Jmp)),
        0x6D => rd(Absolute, Op(O::Adc)),
        0x6E => rd(Absolute, Rmw(O::Ror)),
        0x6F => rd(Absolute, Rmw(O::Rra)),

        0x70 => wr(Immediate, Branch(OverflowSet)),
        0x71 => rd(IndirectIndexed, Op(O::Adc)),
        0x73 => rd(IndirectIndexedFixed, Rmw(O::Rra)),
        0x74 => rd(ZeroPageX, Nop),
        0x75 => rd(ZeroPageX, Op(O::Adc)),
        0x76 => rd(ZeroPageX, Rmw(O::Ror)),
        0x77 => rd(ZeroPageX, Rmw(O::Rra)),
        0x78 => wr(Implied, Op(O::Sei)),
        0x79 => rd(AbsoluteY, Op(O::Adc)),
        0x7A => wr(Implied, Nop),
        0x7B => rd(AbsoluteYFixed, Rmw(O::Rra)),
        0x7C => rd(AbsoluteX, Nop),
        0x7D => rd(AbsoluteX, Op(O::Adc)),
        0x7E => rd(AbsoluteXFixed, Rmw(O::Ror)),
        0x7F => rd(AbsoluteXFixed, Rmw(O::Rra)),

        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => wr(Immediate, Nop),
        0x81 => wr(IndexedIndirect, Store(O::Sta)),
        0x83 => wr(IndexedIndirect, Store(O::Sax)),
        0x84 => wr(ZeroPage, Store(O::Sty)),
        0x85 => wr(ZeroPage, Store(O::Sta)),
        0x86 => wr(ZeroPage, Store(O::Stx)),
        0x87 => wr(ZeroPage, Store(O::Sax)),
        0x88 => wr(Implied, Op(O::Dey)),
        0x8A => wr(Implied, Op(O::Txa)),
        0x8B => wr(Immediate, Op(O::Ane)),
        0x8C => wr(Absolute, Store(O::Sty)),
        0x8D => wr(Absolute, Store(O::Sta)),
        0x8E => wr(Absolute, Store(O::Stx)),
        0x8F => wr(Absolute, Store(O::Sax)),

        0x90 => wr(Immediate, Branch(CarryClear)),
        0x91 => wr(IndirectIndexedFixed, Store(O::Sta)),
        0x93 => wr(IndirectIndexedFixed, Store(O::Sha)),
        0x94 => wr(ZeroPageX, Store(O::Sty)),
        0x95 => wr(ZeroPageX, Store(O::Sta)),
        0x96 => wr(ZeroPageY, Store(O::Stx)),
        0x97 => wr(ZeroPageY, Store(O::Sax)),
        0x98 => wr(Implied, Op(O::Tya)),
        0x99 => wr(AbsoluteYFixed, Store(O::Sta)),
        0x9A => wr(Implied, Op(O::Txs)),
        0x9B => wr(AbsoluteYFixed, Store(O::Shs)),
        0x9C => wr(AbsoluteXFixed, Store(O::Shy)),
        0x9D => wr(AbsoluteXFixed, Store(O::Sta)),
        0x9E => wr(AbsoluteYFixed, Store(O::Shx)),
        0x9F => wr(AbsoluteYFixed, Store(O::Sha)),

        0xA0 => wr(Immediate, Op(O::Ldy)),
        0xA1 => rd(IndexedIndirect, Op(O::Lda)),
        0xA2 => wr(Immediate, Op(O::Ldx)),
        0xA3 => rd(IndexedIndirect, Op(O::Lax)),
        0xA4 => rd(ZeroPage, Op(O::Ldy)),
        0xA5 => rd(ZeroPage, Op(O::Lda)),
        0xA6 => rd(ZeroPage, Op(O::Ldx)),
        0xA7 => rd(ZeroPage, Op(O::Lax)),
        0xA8 => wr(Implied, Op(O::Tay)),
        0xA9 => wr(Immediate, Op(O::Lda)),
        0xAA => wr(Implied, Op(O::Tax)),
        0xAB => wr(Immediate, Op(O::Lxa)),
        0xAC => rd(Absolute, Op(O::Ldy)),
        0xAD => rd(Absolute, Op(O::Lda)),
        0xAE => rd(Absolute, Op(O::Ldx)),
        0xAF => rd(Absolute, Op(O::Lax)),

        0xB0 => wr(Immediate, Branch(CarrySet)),
        0xB1 => rd(IndirectIndexed, Op(O::Lda)),
        0xB3 => rd(IndirectIndexed, Op(O::Lax)),
        0xB4 => rd(ZeroPageX, Op(O::Ldy)),
        0xB5 => rd(ZeroPageX, Op(O::Lda)),
        0xB6 => rd(ZeroPageY, Op(O::Ldx)),
        0xB7 => rd(ZeroPageY, Op(O::Lax)),
        0xB8 => wr(Implied, Op(O::Clv)),
        0xB9 => rd(AbsoluteY, Op(O::Lda)),
        0xBA => wr(Implied, Op(O::Tsx)),
        0xBB => rd(AbsoluteY, Op(O::Las)),
        0xBC => rd(AbsoluteX, Op(O::Ldy)),
        0xBD => rd(AbsoluteX, Op(O::Lda)),
        0xBE => rd(AbsoluteY, Op(O::Ldx)),
        0xBF => rd(AbsoluteY, Op(O::Lax)),

        0xC0 => wr(Immediate, Op(O::Cpy)),
        0xC1 => rd(IndexedIndirect, Op(O::Cmp)),
        0xC3 => rd(IndexedIndirect, Rmw(O::Dcp)),
        0xC4 => rd(ZeroPage, Op(O::Cpy)),
        0xC5 => rd(ZeroPage, Op(O::Cmp)),
        0xC6 => rd(ZeroPage, Rmw(O::Dec)),
        0xC7 => rd(ZeroPage, Rmw(O::Dcp)),
        0xC8 => wr(Implied, Op(O::Iny)),
        0xC9 => wr(Immediate, Op(O::Cmp)),
        0xCA => wr(Implied, Op(O::Dex)),
        0xCB => wr(Immediate, Op(O::Sbx)),
        0xCC => rd(Absolute, Op(O::Cpy)),
        0xCD => rd(Absolute, Op(O::Cmp)),
        0xCE => rd(Absolute, Rmw(O::Dec)),
        0xCF => rd(Absolute, Rmw(O::Dcp)),

        0xD0 => wr(Immediate, Branch(NotEqual)),
        0xD1 => rd(IndirectIndexed, Op(O::Cmp)),
        0xD3 => rd(IndirectIndexedFixed, Rmw(O::Dcp)),
        0xD4 => rd(ZeroPageX, Nop),
        0xD5 => rd(ZeroPageX, Op(O::Cmp)),
        0xD6 => rd(ZeroPageX, Rmw(O::Dec)),
        0xD7 => rd(ZeroPageX, Rmw(O::Dcp)),
        0xD8 => wr(Implied, Op(O::Cld)),
        0xD9 => rd(AbsoluteY, Op(O::Cmp)),
        0xDA => wr(Implied, Nop),
        0xDB => rd(AbsoluteYFixed, Rmw(O::Dcp)),
        0xDC => rd(AbsoluteX, Nop),
        0xDD => rd(AbsoluteX, Op(O::Cmp)),
        0xDE => rd(AbsoluteXFixed, Rmw(O::Dec)),
        0xDF => rd(AbsoluteXFixed, Rmw(O::Dcp)),

        0xE0 => wr(Immediate, Op(O::Cpx)),
        0xE1 => rd(IndexedIndirect, Op(O::Sbc)),
        0xE3 => rd(IndexedIndirect, Rmw(O::Isb)),
        0xE4 => rd(ZeroPage, Op(O::Cpx)),
        0xE5 => rd(ZeroPage, Op(O::Sbc)),
        0xE6 => rd(ZeroPage, Rmw(O::Inc)),
        0xE7 => rd(ZeroPage, Rmw(O::Isb)),
        0xE8 => wr(Implied, Op(O::Inx)),
        0xE9 | 0xEB => wr(Immediate, Op(O::Sbc)),
        0xEA => wr(Implied, Nop),
        0xEC => rd(Absolute, Op(O::Cpx)),
        0xED => rd(Absolute, Op(O::Sbc)),
        0xEE => rd(Absolute, Rmw(O::Inc)),
        0xEF => rd(Absolute, Rmw(O::Isb)),

        0xF0 => wr(Immediate, Branch(Equal)),
        0xF1 => rd(IndirectIndexed, Op(O::Sbc)),
        0xF3 => rd(IndirectIndexedFixed, Rmw(O::Isb)),
        0xF4 => rd(ZeroPageX, Nop),
        0xF5 => rd(ZeroPageX, Op(O::Sbc)),
        0xF6 => rd(ZeroPageX, Rmw(O::Inc)),
        0xF7 => rd(ZeroPageX, Rmw(O::Isb)),
        0xF8 => wr(Implied, Op(O::Sed)),
        0xF9 => rd(AbsoluteY, Op(O::Sbc)),
        0xFA => wr(Implied, Nop),
        0xFB => rd(AbsoluteYFixed, Rmw(O::Isb)),
        0xFC => rd(AbsoluteX, Nop),
        0xFD => rd(AbsoluteX, Op(O::Sbc)),
        0xFE => rd(AbsoluteXFixed, Rmw(O::Inc)),
        0xFF => rd(AbsoluteXFixed, Rmw(O::Isb)),

        // $02 $12 $22 $32 $42 $52 $62 $72 $92 $B2 $D2 $F2
        _ => JAM,
    }
}

struct Sequence {
    slots: [MicroCycle; SLOTS_PER_OPCODE],
    len: usize,
}

impl Sequence {
    const fn new() -> Self {
        Self {
            slots: [MicroCycle::UNUSED; SLOTS_PER_OPCODE],
            len: 0,
        }
    }

    const fn push(&mut self, op: MicroOp) {
        self.slots[self.len] = MicroCycle {
            op,
            no_steal: false,
        };
        self.len += 1;
    }

    const fn push_no_steal(&mut self, op: MicroOp) {
        self.slots[self.len] = MicroCycle { op, no_steal: true };
        self.len += 1;
    }

    /// Returns false for an undefined mode.
    const fn addressing(&mut self, mode: Mode) -> bool {
        use MicroOp as M;

        match mode {
            Mode::Implied => self.push(M::ThrowAwayFetch),
            Mode::Immediate => self.push(M::FetchDataByte),
            Mode::ZeroPage | Mode::AbsoluteLow => self.push(M::FetchLowAddr),
            Mode::ZeroPageX => {
                self.push(M::FetchLowAddrX);
                // Re-reads the unindexed zero page address on real silicon.
                // Zero page reads have no side effects, so nothing is issued.
                self.push(M::WasteCycle);
            }
            Mode::ZeroPageY => {
                self.push(M::FetchLowAddrY);
                self.push(M::WasteCycle);
            }
            Mode::Absolute => {
                self.push(M::FetchLowAddr);
                self.push(M::FetchHighAddr);
            }
            Mode::AbsoluteX => {
                self.push(M::FetchLowAddr);
                self.push(M::FetchHighAddrX2);
                self.push(M::ThrowAwayRead);
            }
            Mode::AbsoluteXFixed => {
                self.push(M::FetchLowAddr);
                self.push(M::FetchHighAddrX);
                self.push(M::ThrowAwayRead);
            }
            Mode::AbsoluteY => {
                self.push(M::FetchLowAddr);
                self.push(M::FetchHighAddrY2);
                self.push(M::ThrowAwayRead);
            }
            Mode::AbsoluteYFixed => {
                self.push(M::FetchLowAddr);
                self.push(M::FetchHighAddrY);
                self.push(M::ThrowAwayRead);
            }
            Mode::Indirect => {
                self.push(M::FetchLowPointer);
                self.push(M::FetchHighPointer);
                self.push(M::FetchLowEffAddr);
                self.push(M::FetchHighEffAddr);
            }
            Mode::IndexedIndirect => {
                self.push(M::FetchLowPointer);
                self.push(M::FetchLowPointerX);
                self.push(M::FetchLowEffAddr);
                self.push(M::FetchHighEffAddr);
            }
            Mode::IndirectIndexed => {
                self.push(M::FetchLowPointer);
                self.push(M::FetchLowEffAddr);
                self.push(M::FetchHighEffAddrY2);
                self.push(M::ThrowAwayRead);
            }
            Mode::IndirectIndexedFixed => {
                self.push(M::FetchLowPointer);
                self.push(M::FetchLowEffAddr);
                self.push(M::FetchHighEffAddrY);
                self.push(M::ThrowAwayRead);
            }
            Mode::Undefined => return false,
        }
        true
    }

    /// Returns false for an undefined instruction.
    const fn instruction(&mut self, body: Body) -> bool {
        use MicroOp as M;

        match body {
            Body::Op(op) => self.push(M::Execute(op)),
            Body::Rmw(op) => {
                self.push_no_steal(M::Execute(op));
                self.push_no_steal(M::PutEffAddrDataByte);
            }
            Body::Store(op) => self.push_no_steal(M::Execute(op)),
            Body::Branch(condition) => {
                self.push(M::Branch(condition));
                self.push(M::FixBranch);
            }
            Body::Brk => {
                self.push_no_steal(M::PushHighPc);
                self.push_no_steal(M::BrkPushLowPc);
                self.push_no_steal(M::PushSr);
                self.push(M::IrqLoRequest);
                self.push(M::IrqHiRequest);
                self.push(M::FetchNextOpcode);
            }
            Body::Jsr => {
                self.push(M::WasteCycle);
                self.push_no_steal(M::PushHighPc);
                self.push_no_steal(M::PushLowPc);
                self.push(M::FetchHighAddr);
                self.push(M::Execute(Operation::Jmp));
            }
            Body::Php => self.push_no_steal(M::PushSr),
            // The stack reads before the pull have no side effects.
            Body::Pla => {
                self.push(M::WasteCycle);
                self.push(M::Execute(Operation::Pla));
            }
            Body::Plp => {
                self.push(M::WasteCycle);
                self.push(M::PopSr);
            }
            Body::Rti => {
                self.push(M::WasteCycle);
                self.push(M::PopSr);
                self.push(M::PopLowPc);
                self.push(M::PopHighPc);
                self.push(M::Execute(Operation::Rti));
            }
            Body::Rts => {
                self.push(M::WasteCycle);
                self.push(M::PopLowPc);
                self.push(M::PopHighPc);
                self.push(M::Execute(Operation::Rts));
            }
            Body::Nop => {}
            Body::Undefined => return false,
        }
        true
    }
}

const fn sequence(opcode: u8) -> [MicroCycle; SLOTS_PER_OPCODE] {
    let decoded = decode(opcode);
    let mut seq = Sequence::new();

    let legal_mode = seq.addressing(decoded.mode);
    if decoded.read {
        seq.push(MicroOp::FetchEffAddrDataByte);
    }
    let legal_instruction = seq.instruction(decoded.body);

    // A state machine with neither half defined never reaches the
    // instruction boundary again.
    if !legal_mode && !legal_instruction {
        seq.push(MicroOp::Jam);
    }

    seq.push(MicroOp::InterruptsAndNextOpcode);
    seq.slots
}

const fn build() -> [[MicroCycle; SLOTS_PER_OPCODE]; 256] {
    let mut table = [[MicroCycle::UNUSED; SLOTS_PER_OPCODE]; 256];
    let mut opcode = 0;
    while opcode < 256 {
        table[opcode] = sequence(opcode as u8);
        opcode += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(opcode: u8) -> Vec<MicroOp> {
        let seq = &MICROCODE[usize::from(opcode)];
        let end = seq
            .iter()
            .position(|c| c.op == MicroOp::InterruptsAndNextOpcode)
            .expect("every sequence ends at the instruction boundary");
        seq[..=end].iter().map(|c| c.op).collect()
    }

    #[test]
    fn exactly_twelve_jam_opcodes() {
        let jams: Vec<u8> = (0..=255u8)
            .filter(|&op| MICROCODE[usize::from(op)][0].op == MicroOp::Jam)
            .collect();
        assert_eq!(
            jams,
            vec![
                0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2
            ]
        );
    }

    #[test]
    fn no_other_sequence_contains_jam() {
        for op in 0..=255u8 {
            let seq = ops(op);
            let jam_count = seq.iter().filter(|&&m| m == MicroOp::Jam).count();
            let expected = usize::from(seq[0] == MicroOp::Jam);
            assert_eq!(jam_count, expected, "opcode ${op:02X}");
        }
    }

    #[test]
    fn lda_absolute_x_skips_fixup_without_crossing() {
        assert_eq!(
            ops(0xBD),
            vec![
                MicroOp::FetchLowAddr,
                MicroOp::FetchHighAddrX2,
                MicroOp::ThrowAwayRead,
                MicroOp::FetchEffAddrDataByte,
                MicroOp::Execute(Operation::Lda),
                MicroOp::InterruptsAndNextOpcode,
            ]
        );
    }

    #[test]
    fn sta_absolute_x_always_fixes_up() {
        assert_eq!(
            ops(0x9D),
            vec![
                MicroOp::FetchLowAddr,
                MicroOp::FetchHighAddrX,
                MicroOp::ThrowAwayRead,
                MicroOp::Execute(Operation::Sta),
                MicroOp::InterruptsAndNextOpcode,
            ]
        );
    }

    #[test]
    fn rmw_write_cycles_are_no_steal() {
        // INC abs: low, high, read, dummy write + compute, write.
        let seq = &MICROCODE[0xEE];
        let flags: Vec<bool> = seq[..6].iter().map(|c| c.no_steal).collect();
        assert_eq!(flags, vec![false, false, false, true, true, false]);
        assert_eq!(seq[3].op, MicroOp::Execute(Operation::Inc));
        assert_eq!(seq[4].op, MicroOp::PutEffAddrDataByte);
    }

    #[test]
    fn brk_pushes_are_no_steal() {
        let seq = &MICROCODE[usize::from(opcode::BRK)];
        assert_eq!(seq[0].op, MicroOp::FetchDataByte);
        assert!(seq[1].no_steal && seq[2].no_steal && seq[3].no_steal);
        assert!(!seq[4].no_steal && !seq[5].no_steal);
        assert_eq!(seq[6].op, MicroOp::FetchNextOpcode);
    }

    #[test]
    fn sh_throw_away_reads_sit_where_the_driver_expects() {
        let at = |op: u8, sub: usize| MICROCODE[usize::from(op)][sub].op;
        assert_eq!(at(opcode::SHA_IY, 3), MicroOp::ThrowAwayRead);
        assert_eq!(at(opcode::SHS_AY, 2), MicroOp::ThrowAwayRead);
        assert_eq!(at(opcode::SHY_AX, 2), MicroOp::ThrowAwayRead);
        assert_eq!(at(opcode::SHX_AY, 2), MicroOp::ThrowAwayRead);
        assert_eq!(at(opcode::SHA_AY, 2), MicroOp::ThrowAwayRead);
    }

    #[test]
    fn only_writes_are_no_steal() {
        for op in 0..=255u8 {
            for cycle in &MICROCODE[usize::from(op)] {
                if cycle.no_steal {
                    let writes = matches!(
                        cycle.op,
                        MicroOp::PushHighPc
                            | MicroOp::PushLowPc
                            | MicroOp::BrkPushLowPc
                            | MicroOp::PushSr
                            | MicroOp::PutEffAddrDataByte
                            | MicroOp::Execute(_)
                    );
                    assert!(writes, "opcode ${op:02X}: {:?}", cycle.op);
                }
            }
        }
    }

    #[test]
    fn slot_unpacks_cycle_position() {
        let packed = (u16::from(opcode::BRK) << 3) | 6;
        assert_eq!(slot(packed).op, MicroOp::FetchNextOpcode);
        assert_eq!(slot(0xA9 << 3).op, MicroOp::FetchDataByte);
    }
}
