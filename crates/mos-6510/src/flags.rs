//! 6510 processor status register (P).
//!
//! The status register contains flags that reflect the result of operations
//! and control CPU behavior. Bits 4 and 5 have no storage on the chip: they
//! read back as 0 here. Bit 5 is forced high whenever the register is
//! pushed, and B only exists in the pushed copy.

/// Carry flag - set if operation resulted in carry/borrow.
pub const C: u8 = 0x01;

/// Zero flag - set if result is zero.
pub const Z: u8 = 0x02;

/// Interrupt disable - when set, IRQ interrupts are ignored.
pub const I: u8 = 0x04;

/// Decimal mode - enables BCD arithmetic for ADC/SBC.
pub const D: u8 = 0x08;

/// Break flag - only meaningful in a pushed copy of P.
/// Set when BRK/PHP pushes status, clear when IRQ/NMI/RESET pushes status.
pub const B: u8 = 0x10;

/// Unused bit - always set in a pushed copy of P.
pub const U: u8 = 0x20;

/// Overflow flag - set if signed arithmetic overflowed.
pub const V: u8 = 0x40;

/// Negative flag - set if result has bit 7 set.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(u8);

impl Status {
    /// All flags clear, as after power-up.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Packed value (N V 0 B D I Z C).
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Load every flag from a packed byte. B and bit 5 are ignored.
    pub fn set(&mut self, value: u8) {
        self.0 = value & !(B | U);
    }

    /// The byte a push writes to the stack.
    ///
    /// `brk` selects the BRK/PHP form (B set) over the hardware-interrupt
    /// form (B clear). Bit 5 is always set.
    #[must_use]
    pub const fn pushed(self, brk: bool) -> u8 {
        let b = if brk { B } else { 0 };
        (self.0 & !B) | U | b
    }

    /// Set N from bit 7 and Z from `value == 0`; returns `value` unchanged.
    pub fn set_nz(&mut self, value: u8) -> u8 {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
        value
    }

    /// Check if a flag is set.
    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Set or clear a flag based on condition. B and bit 5 stay clear.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.0 |= flag & !(B | U);
        } else {
            self.0 &= !flag;
        }
    }

    #[must_use]
    pub const fn c(self) -> bool {
        self.is_set(C)
    }

    pub fn set_c(&mut self, on: bool) {
        self.set_if(C, on);
    }

    #[must_use]
    pub const fn z(self) -> bool {
        self.is_set(Z)
    }

    pub fn set_z(&mut self, on: bool) {
        self.set_if(Z, on);
    }

    #[must_use]
    pub const fn i(self) -> bool {
        self.is_set(I)
    }

    pub fn set_i(&mut self, on: bool) {
        self.set_if(I, on);
    }

    #[must_use]
    pub const fn d(self) -> bool {
        self.is_set(D)
    }

    pub fn set_d(&mut self, on: bool) {
        self.set_if(D, on);
    }

    #[must_use]
    pub const fn b(self) -> bool {
        self.is_set(B)
    }

    #[must_use]
    pub const fn v(self) -> bool {
        self.is_set(V)
    }

    pub fn set_v(&mut self, on: bool) {
        self.set_if(V, on);
    }

    #[must_use]
    pub const fn n(self) -> bool {
        self.is_set(N)
    }

    pub fn set_n(&mut self, on: bool) {
        self.set_if(N, on);
    }
}
