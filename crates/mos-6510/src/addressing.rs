//! Operand fetch, address generation and stack micro-ops.
//!
//! Each method is one clock. Methods that touch the bus do exactly one
//! access; the rest only move latches.

use emu_core::Bus;

use crate::cpu::Mos6510;

const fn with_low(word: u16, lo: u8) -> u16 {
    (word & 0xFF00) | lo as u16
}

const fn with_high(word: u16, hi: u8) -> u16 {
    (word & 0x00FF) | ((hi as u16) << 8)
}

impl<B: Bus> Mos6510<B> {
    fn advance_pc(&mut self) {
        self.regs.pc = self.regs.pc.wrapping_add(1);
    }

    pub(crate) fn throw_away_fetch(&mut self) {
        self.read(self.regs.pc);
    }

    /// Fix-up read at the uncorrected address; applies the page carry.
    pub(crate) fn throw_away_read(&mut self) {
        self.read(self.ctx.effective_address);
        if self.ctx.adl_carry {
            self.ctx.effective_address = self.ctx.effective_address.wrapping_add(0x100);
        }
    }

    /// Immediate operand. PC stays put while an interrupt is being serviced.
    pub(crate) fn fetch_data_byte(&mut self) {
        self.ctx.data = self.read(self.regs.pc);
        if !self.ctx.servicing_interrupt {
            self.advance_pc();
        }
    }

    pub(crate) fn fetch_low_addr(&mut self) {
        self.ctx.effective_address = u16::from(self.read(self.regs.pc));
        self.advance_pc();
    }

    pub(crate) fn fetch_low_addr_x(&mut self) {
        self.fetch_low_addr();
        self.ctx.effective_address = (self.ctx.effective_address + u16::from(self.regs.x)) & 0xFF;
    }

    pub(crate) fn fetch_low_addr_y(&mut self) {
        self.fetch_low_addr();
        self.ctx.effective_address = (self.ctx.effective_address + u16::from(self.regs.y)) & 0xFF;
    }

    pub(crate) fn fetch_high_addr(&mut self) {
        let hi = self.read(self.regs.pc);
        self.ctx.effective_address = with_high(self.ctx.effective_address, hi);
        self.advance_pc();
    }

    fn index_low(&mut self, index: u8) {
        self.ctx.effective_address += u16::from(index);
        self.ctx.adl_carry = self.ctx.effective_address > 0xFF;
    }

    pub(crate) fn fetch_high_addr_x(&mut self) {
        self.index_low(self.regs.x);
        self.fetch_high_addr();
    }

    pub(crate) fn fetch_high_addr_x2(&mut self) {
        self.fetch_high_addr_x();
        if !self.ctx.adl_carry {
            self.cycle_count += 1;
        }
    }

    pub(crate) fn fetch_high_addr_y(&mut self) {
        self.index_low(self.regs.y);
        self.fetch_high_addr();
    }

    pub(crate) fn fetch_high_addr_y2(&mut self) {
        self.fetch_high_addr_y();
        if !self.ctx.adl_carry {
            self.cycle_count += 1;
        }
    }

    pub(crate) fn fetch_low_pointer(&mut self) {
        self.ctx.pointer = u16::from(self.read(self.regs.pc));
        self.advance_pc();
    }

    /// Index the zero page pointer. Wraps within page zero.
    pub(crate) fn fetch_low_pointer_x(&mut self) {
        let lo = (self.ctx.pointer as u8).wrapping_add(self.regs.x);
        self.ctx.pointer = with_low(self.ctx.pointer, lo);
    }

    pub(crate) fn fetch_high_pointer(&mut self) {
        let hi = self.read(self.regs.pc);
        self.ctx.pointer = with_high(self.ctx.pointer, hi);
        self.advance_pc();
    }

    pub(crate) fn fetch_low_eff_addr(&mut self) {
        self.ctx.effective_address = u16::from(self.read(self.ctx.pointer));
    }

    /// High byte from pointer + 1. The carry out of the low byte is lost,
    /// so `JMP ($xxFF)` reads its high byte from `$xx00`.
    pub(crate) fn fetch_high_eff_addr(&mut self) {
        let lo = (self.ctx.pointer as u8).wrapping_add(1);
        self.ctx.pointer = with_low(self.ctx.pointer, lo);
        let hi = self.read(self.ctx.pointer);
        self.ctx.effective_address = with_high(self.ctx.effective_address, hi);
    }

    pub(crate) fn fetch_high_eff_addr_y(&mut self) {
        self.index_low(self.regs.y);
        self.fetch_high_eff_addr();
    }

    pub(crate) fn fetch_high_eff_addr_y2(&mut self) {
        self.fetch_high_eff_addr_y();
        if !self.ctx.adl_carry {
            self.cycle_count += 1;
        }
    }

    pub(crate) fn fetch_eff_addr_data_byte(&mut self) {
        self.ctx.data = self.read(self.ctx.effective_address);
    }

    pub(crate) fn put_eff_addr_data_byte(&mut self) {
        self.write(self.ctx.effective_address, self.ctx.data);
    }

    // === Stack ===

    pub(crate) fn push(&mut self, value: u8) {
        let addr = self.regs.push();
        self.write(addr, value);
    }

    pub(crate) fn pop(&mut self) -> u8 {
        let addr = self.regs.pop();
        self.read(addr)
    }

    pub(crate) fn push_high_pc(&mut self) {
        self.push((self.regs.pc >> 8) as u8);
    }

    pub(crate) fn push_low_pc(&mut self) {
        self.push(self.regs.pc as u8);
    }

    /// PHP and BRK push B set; IRQ, NMI and RESET push it clear.
    pub(crate) fn push_sr(&mut self) {
        let value = self.regs.p.pushed(!self.ctx.servicing_interrupt);
        self.push(value);
    }

    pub(crate) fn pop_sr(&mut self) {
        let value = self.pop();
        self.regs.p.set(value);
        self.calculate_interrupt_trigger_cycle();
    }

    pub(crate) fn pop_low_pc(&mut self) {
        let lo = self.pop();
        self.ctx.effective_address = with_low(self.ctx.effective_address, lo);
    }

    pub(crate) fn pop_high_pc(&mut self) {
        let hi = self.pop();
        self.ctx.effective_address = with_high(self.ctx.effective_address, hi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_splicing() {
        assert_eq!(with_low(0x12FF, 0x34), 0x1234);
        assert_eq!(with_high(0x12FF, 0x34), 0x34FF);
    }
}
