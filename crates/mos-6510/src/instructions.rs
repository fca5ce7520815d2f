//! Instruction semantics.
//!
//! Each operation runs in the final cycle of its instruction. Reads,
//! register ops and flag ops fold the next opcode fetch (or interrupt
//! entry) into that same cycle, as the chip does. Writes and stack pushes
//! leave the fetch to the following slot.

use emu_core::Bus;

use crate::cpu::Mos6510;
use crate::interrupts::InterruptCycle;
use crate::microcode::{Condition, Operation};

impl<B: Bus> Mos6510<B> {
    pub(crate) fn execute(&mut self, op: Operation) {
        let fetch_next = match op {
            // === Loads, transfers ===
            Operation::Lda => {
                self.regs.a = self.regs.p.set_nz(self.ctx.data);
                true
            }
            Operation::Ldx => {
                self.regs.x = self.regs.p.set_nz(self.ctx.data);
                true
            }
            Operation::Ldy => {
                self.regs.y = self.regs.p.set_nz(self.ctx.data);
                true
            }
            Operation::Lax => {
                let value = self.regs.p.set_nz(self.ctx.data);
                self.regs.a = value;
                self.regs.x = value;
                true
            }
            Operation::Tax => {
                self.regs.x = self.regs.p.set_nz(self.regs.a);
                true
            }
            Operation::Tay => {
                self.regs.y = self.regs.p.set_nz(self.regs.a);
                true
            }
            Operation::Tsx => {
                self.regs.x = self.regs.p.set_nz(self.regs.s);
                true
            }
            Operation::Txa => {
                self.regs.a = self.regs.p.set_nz(self.regs.x);
                true
            }
            Operation::Txs => {
                self.regs.s = self.regs.x;
                true
            }
            Operation::Tya => {
                self.regs.a = self.regs.p.set_nz(self.regs.y);
                true
            }

            // === Stores ===
            Operation::Sta => self.store(self.regs.a),
            Operation::Stx => self.store(self.regs.x),
            Operation::Sty => self.store(self.regs.y),
            Operation::Sax => self.store(self.regs.a & self.regs.x),
            Operation::Sha => {
                self.ctx.data = self.regs.x & self.regs.a;
                self.sh_store()
            }
            Operation::Shx => {
                self.ctx.data = self.regs.x;
                self.sh_store()
            }
            Operation::Shy => {
                self.ctx.data = self.regs.y;
                self.sh_store()
            }
            Operation::Shs => {
                self.regs.s = self.regs.a & self.regs.x;
                self.ctx.data = self.regs.s;
                self.sh_store()
            }

            // === Logic and arithmetic ===
            Operation::And => {
                self.regs.a = self.regs.p.set_nz(self.regs.a & self.ctx.data);
                true
            }
            Operation::Ora => {
                self.regs.a = self.regs.p.set_nz(self.regs.a | self.ctx.data);
                true
            }
            Operation::Eor => {
                self.regs.a = self.regs.p.set_nz(self.regs.a ^ self.ctx.data);
                true
            }
            Operation::Bit => {
                let data = self.ctx.data;
                self.regs.p.set_z(self.regs.a & data == 0);
                self.regs.p.set_n(data & 0x80 != 0);
                self.regs.p.set_v(data & 0x40 != 0);
                true
            }
            Operation::Adc => {
                self.do_adc();
                true
            }
            Operation::Sbc => {
                self.do_sbc();
                true
            }
            Operation::Cmp => {
                self.compare(self.regs.a);
                true
            }
            Operation::Cpx => {
                self.compare(self.regs.x);
                true
            }
            Operation::Cpy => {
                self.compare(self.regs.y);
                true
            }

            // === Register increments ===
            Operation::Inx => {
                self.regs.x = self.regs.p.set_nz(self.regs.x.wrapping_add(1));
                true
            }
            Operation::Iny => {
                self.regs.y = self.regs.p.set_nz(self.regs.y.wrapping_add(1));
                true
            }
            Operation::Dex => {
                self.regs.x = self.regs.p.set_nz(self.regs.x.wrapping_sub(1));
                true
            }
            Operation::Dey => {
                self.regs.y = self.regs.p.set_nz(self.regs.y.wrapping_sub(1));
                true
            }

            // === Accumulator shifts ===
            Operation::AslA => {
                self.regs.p.set_c(self.regs.a & 0x80 != 0);
                self.regs.a = self.regs.p.set_nz(self.regs.a << 1);
                true
            }
            Operation::LsrA => {
                self.regs.p.set_c(self.regs.a & 0x01 != 0);
                self.regs.a = self.regs.p.set_nz(self.regs.a >> 1);
                true
            }
            Operation::RolA => {
                let carry_in = u8::from(self.regs.p.c());
                self.regs.p.set_c(self.regs.a & 0x80 != 0);
                self.regs.a = self.regs.p.set_nz((self.regs.a << 1) | carry_in);
                true
            }
            Operation::RorA => {
                let carry_in = if self.regs.p.c() { 0x80 } else { 0 };
                self.regs.p.set_c(self.regs.a & 0x01 != 0);
                self.regs.a = self.regs.p.set_nz((self.regs.a >> 1) | carry_in);
                true
            }

            // === Read-modify-write ===
            // The unmodified value goes back out first.
            Operation::Asl => {
                self.put_eff_addr_data_byte();
                self.regs.p.set_c(self.ctx.data & 0x80 != 0);
                self.ctx.data = self.regs.p.set_nz(self.ctx.data << 1);
                false
            }
            Operation::Lsr => {
                self.put_eff_addr_data_byte();
                self.regs.p.set_c(self.ctx.data & 0x01 != 0);
                self.ctx.data = self.regs.p.set_nz(self.ctx.data >> 1);
                false
            }
            Operation::Rol => {
                self.rotate_left();
                self.regs.p.set_nz(self.ctx.data);
                false
            }
            Operation::Ror => {
                self.rotate_right();
                self.regs.p.set_nz(self.ctx.data);
                false
            }
            Operation::Inc => {
                self.put_eff_addr_data_byte();
                self.ctx.data = self.regs.p.set_nz(self.ctx.data.wrapping_add(1));
                false
            }
            Operation::Dec => {
                self.put_eff_addr_data_byte();
                self.ctx.data = self.regs.p.set_nz(self.ctx.data.wrapping_sub(1));
                false
            }
            Operation::Slo => {
                self.put_eff_addr_data_byte();
                self.regs.p.set_c(self.ctx.data & 0x80 != 0);
                self.ctx.data <<= 1;
                self.regs.a = self.regs.p.set_nz(self.regs.a | self.ctx.data);
                false
            }
            Operation::Sre => {
                self.put_eff_addr_data_byte();
                self.regs.p.set_c(self.ctx.data & 0x01 != 0);
                self.ctx.data >>= 1;
                self.regs.a = self.regs.p.set_nz(self.regs.a ^ self.ctx.data);
                false
            }
            Operation::Rla => {
                self.rotate_left();
                self.regs.a = self.regs.p.set_nz(self.regs.a & self.ctx.data);
                false
            }
            Operation::Rra => {
                self.rotate_right();
                self.do_adc();
                false
            }
            Operation::Dcp => {
                self.put_eff_addr_data_byte();
                self.ctx.data = self.ctx.data.wrapping_sub(1);
                self.compare(self.regs.a);
                false
            }
            Operation::Isb => {
                self.put_eff_addr_data_byte();
                self.ctx.data = self.ctx.data.wrapping_add(1);
                self.do_sbc();
                false
            }

            // === Undocumented immediates ===
            Operation::Alr => {
                let value = self.regs.a & self.ctx.data;
                self.regs.p.set_c(value & 0x01 != 0);
                self.regs.a = self.regs.p.set_nz(value >> 1);
                true
            }
            Operation::Anc => {
                self.regs.a = self.regs.p.set_nz(self.regs.a & self.ctx.data);
                self.regs.p.set_c(self.regs.p.n());
                true
            }
            Operation::Ane => {
                let value = (self.regs.a | self.config.ane_magic) & self.regs.x & self.ctx.data;
                self.regs.a = self.regs.p.set_nz(value);
                true
            }
            Operation::Lxa => {
                let value = self.ctx.data & (self.regs.a | self.config.lxa_magic);
                self.regs.a = self.regs.p.set_nz(value);
                self.regs.x = value;
                true
            }
            Operation::Arr => {
                self.do_arr();
                true
            }
            Operation::Sbx => {
                let tmp = u16::from(self.regs.x & self.regs.a).wrapping_sub(u16::from(self.ctx.data));
                self.regs.x = self.regs.p.set_nz(tmp as u8);
                self.regs.p.set_c(tmp < 0x100);
                true
            }
            Operation::Las => {
                let value = self.regs.p.set_nz(self.ctx.data & self.regs.s);
                self.ctx.data = value;
                self.regs.a = value;
                self.regs.x = value;
                self.regs.s = value;
                true
            }

            // === Flags ===
            Operation::Clc => {
                self.regs.p.set_c(false);
                true
            }
            Operation::Sec => {
                self.regs.p.set_c(true);
                true
            }
            Operation::Cld => {
                self.regs.p.set_d(false);
                true
            }
            Operation::Sed => {
                self.regs.p.set_d(true);
                true
            }
            Operation::Clv => {
                self.regs.p.set_v(false);
                true
            }
            Operation::Cli => {
                self.regs.p.set_i(false);
                self.calculate_interrupt_trigger_cycle();
                true
            }
            Operation::Sei => {
                self.regs.p.set_i(true);
                self.interrupts_and_next_opcode();
                // An IRQ that became visible during SEI is not taken after
                // the following instruction either.
                self.disarm_irq();
                false
            }

            // === Stack and flow ===
            Operation::Pha => {
                self.push(self.regs.a);
                false
            }
            Operation::Pla => {
                let value = self.pop();
                self.regs.a = self.regs.p.set_nz(value);
                false
            }
            Operation::Jmp | Operation::Rti => {
                self.regs.pc = self.ctx.effective_address;
                true
            }
            Operation::Rts => {
                self.read(self.ctx.effective_address);
                self.regs.pc = self.ctx.effective_address.wrapping_add(1);
                false
            }
        };

        if fetch_next {
            self.interrupts_and_next_opcode();
        }
    }

    fn store(&mut self, value: u8) -> bool {
        self.ctx.data = value;
        self.put_eff_addr_data_byte();
        false
    }

    /// Common tail of SHA, SHX, SHY and SHS.
    ///
    /// The stored value is ANDed with the high byte of the base address
    /// plus one. On a page crossing the high byte of the target itself is
    /// replaced by that AND. If RDY was low during the fix-up read the AND
    /// with the address is skipped.
    fn sh_store(&mut self) -> bool {
        let mut high = (self.ctx.effective_address >> 8) as u8;

        if self.ctx.adl_carry {
            self.ctx.effective_address =
                (self.ctx.effective_address & 0x00FF) | (u16::from(high & self.ctx.data) << 8);
        } else {
            high = high.wrapping_add(1);
        }

        if !self.rdy_on_throw_away_read {
            self.ctx.data &= high;
        }

        self.put_eff_addr_data_byte();
        false
    }

    fn rotate_left(&mut self) {
        let carry_out = self.ctx.data & 0x80 != 0;
        self.put_eff_addr_data_byte();
        self.ctx.data = (self.ctx.data << 1) | u8::from(self.regs.p.c());
        self.regs.p.set_c(carry_out);
    }

    fn rotate_right(&mut self) {
        let carry_out = self.ctx.data & 0x01 != 0;
        self.put_eff_addr_data_byte();
        self.ctx.data >>= 1;
        if self.regs.p.c() {
            self.ctx.data |= 0x80;
        }
        self.regs.p.set_c(carry_out);
    }

    fn compare(&mut self, register: u8) {
        let tmp = u16::from(register).wrapping_sub(u16::from(self.ctx.data));
        self.regs.p.set_nz(tmp as u8);
        self.regs.p.set_c(tmp < 0x100);
    }

    /// ADC with the NMOS decimal quirks: N, V and Z come from intermediate
    /// values, not from the corrected BCD result.
    fn do_adc(&mut self) {
        let carry = u32::from(self.regs.p.c());
        let a = u32::from(self.regs.a);
        let s = u32::from(self.ctx.data);
        let sum = a + s + carry;

        if self.regs.p.d() {
            let mut lo = (a & 0x0F) + (s & 0x0F) + carry;
            let mut hi = (a & 0xF0) + (s & 0xF0);
            if lo > 0x09 {
                lo += 0x06;
            }
            if lo > 0x0F {
                hi += 0x10;
            }

            self.regs.p.set_z(sum & 0xFF == 0);
            self.regs.p.set_n(hi & 0x80 != 0);
            self.regs.p.set_v(((hi ^ a) & 0x80) != 0 && ((a ^ s) & 0x80) == 0);
            if hi > 0x90 {
                hi += 0x60;
            }

            self.regs.p.set_c(hi > 0xFF);
            self.regs.a = (hi | (lo & 0x0F)) as u8;
        } else {
            self.regs.p.set_c(sum > 0xFF);
            self.regs.p.set_v(((sum ^ a) & 0x80) != 0 && ((a ^ s) & 0x80) == 0);
            self.regs.a = self.regs.p.set_nz(sum as u8);
        }
    }

    /// SBC. All flags come from the binary difference, in both modes.
    fn do_sbc(&mut self) {
        let borrow = u32::from(!self.regs.p.c());
        let a = u32::from(self.regs.a);
        let s = u32::from(self.ctx.data);
        let diff = a.wrapping_sub(s).wrapping_sub(borrow);

        self.regs.p.set_c(diff < 0x100);
        self.regs.p.set_v(((diff ^ a) & 0x80) != 0 && ((a ^ s) & 0x80) != 0);
        self.regs.p.set_nz(diff as u8);

        if self.regs.p.d() {
            let mut lo = (a & 0x0F).wrapping_sub(s & 0x0F).wrapping_sub(borrow);
            let mut hi = (a & 0xF0).wrapping_sub(s & 0xF0);
            if lo & 0x10 != 0 {
                lo = lo.wrapping_sub(0x06);
                hi = hi.wrapping_sub(0x10);
            }
            if hi & 0x100 != 0 {
                hi = hi.wrapping_sub(0x60);
            }
            self.regs.a = (hi | (lo & 0x0F)) as u8;
        } else {
            self.regs.a = diff as u8;
        }
    }

    /// ARR: AND then ROR, with flags that follow neither.
    fn do_arr(&mut self) {
        let data = self.ctx.data & self.regs.a;
        let mut a = data >> 1;
        if self.regs.p.c() {
            a |= 0x80;
        }

        if self.regs.p.d() {
            self.regs.p.set_n(self.regs.p.c());
            self.regs.p.set_z(a == 0);
            self.regs.p.set_v((data ^ a) & 0x40 != 0);

            if (data & 0x0F) + (data & 0x01) > 5 {
                a = (a & 0xF0) | (a.wrapping_add(6) & 0x0F);
            }
            let carry = ((u16::from(data) + u16::from(data & 0x10)) & 0x1F0) > 0x50;
            self.regs.p.set_c(carry);
            if carry {
                a = a.wrapping_add(0x60);
            }
        } else {
            self.regs.p.set_nz(a);
            self.regs.p.set_c(a & 0x40 != 0);
            self.regs.p.set_v(((a & 0x40) ^ ((a & 0x20) << 1)) != 0);
        }

        self.regs.a = a;
    }

    fn condition_met(&self, condition: Condition) -> bool {
        let p = self.regs.p;
        match condition {
            Condition::CarryClear => !p.c(),
            Condition::CarrySet => p.c(),
            Condition::NotEqual => !p.z(),
            Condition::Equal => p.z(),
            Condition::Plus => !p.n(),
            Condition::Minus => p.n(),
            Condition::OverflowClear => !p.v(),
            Condition::OverflowSet => p.v(),
        }
    }

    /// Second cycle of a branch. Not taken: this is the boundary. Taken:
    /// dummy read and add the offset to PCL, skipping the fix-up cycle when
    /// no page is crossed.
    pub(crate) fn branch(&mut self, condition: Condition) {
        if !self.condition_met(condition) {
            self.interrupts_and_next_opcode();
            return;
        }

        self.read(self.regs.pc);

        let pc = self.regs.pc;
        let data = self.ctx.data;
        let target = u16::from(pc as u8) + u16::from(data);
        self.ctx.adl_carry = (target > 0xFF) != (data > 0x7F);
        self.ctx.effective_address = (pc & 0xFF00) | (target & 0x00FF);
        self.regs.pc = self.ctx.effective_address;

        if !self.ctx.adl_carry {
            self.cycle_count += 1;

            // A taken branch without a page crossing does not poll
            // interrupts on its last cycle.
            if let InterruptCycle::At(seen) = self.interrupts.cycle {
                if (seen >> 3) == i32::from(self.cycle_count >> 3) {
                    self.interrupts.cycle = InterruptCycle::At(seen + 2);
                }
            }
        }
    }

    /// Third cycle of a branch that crossed a page: correct PCH.
    pub(crate) fn fix_branch(&mut self) {
        self.read(self.ctx.effective_address);
        let adjust = if self.ctx.data < 0x80 { 0x0100 } else { 0xFF00 };
        self.regs.pc = self.regs.pc.wrapping_add(adjust);
    }
}
