//! Interrupt lines and the cycle-accurate trigger latency.
//!
//! The 6510 samples its interrupt inputs every cycle but only acts on them
//! at an instruction boundary, and only if the request was seen at least
//! two cycles before that boundary. `InterruptCycle` records the cycle
//! position at which a request became visible; the boundary compares it
//! against the current position.

use emu_core::{Bus, Phase, Scheduler};

use crate::cpu::{CpuEvent, IRQ_VECTOR, Mos6510, NMI_VECTOR, RESET_VECTOR};
use crate::microcode::opcode;

/// Cycles between a request becoming visible and the earliest boundary
/// that may take it.
const INTERRUPT_DELAY: i32 = 2;

/// When the pending interrupt, if any, was first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptCycle {
    /// No interrupt is pending. Never due.
    NotScheduled,
    /// Seen at this packed cycle position of the current instruction.
    At(i32),
    /// Seen during an earlier instruction. Due at the next boundary.
    Overdue,
}

impl InterruptCycle {
    /// Whether a boundary at `cycle_count` takes the interrupt.
    #[must_use]
    pub fn is_due(self, cycle_count: u16) -> bool {
        match self {
            Self::NotScheduled => false,
            Self::At(seen) => i32::from(cycle_count) > seen + INTERRUPT_DELAY,
            Self::Overdue => true,
        }
    }

    /// Whether `cycle_count` is still inside the delay window.
    #[must_use]
    pub fn within_delay(self, cycle_count: u16) -> bool {
        !self.is_due(cycle_count)
    }

    #[must_use]
    pub fn is_at(self, cycle_count: u16) -> bool {
        self == Self::At(i32::from(cycle_count))
    }

    /// One cycle earlier. Only moves `At`.
    #[must_use]
    pub fn earlier(self) -> Self {
        match self {
            Self::At(seen) => Self::At(seen - 1),
            other => other,
        }
    }
}

/// Latched interrupt inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InterruptState {
    pub rst: bool,
    pub nmi: bool,
    /// IRQ line asserted.
    pub irq: bool,
    pub cycle: InterruptCycle,
}

impl InterruptState {
    pub const fn new() -> Self {
        Self {
            rst: false,
            nmi: false,
            irq: false,
            cycle: InterruptCycle::NotScheduled,
        }
    }
}

impl<B: Bus> Mos6510<B> {
    /// Raise RESET. Clears all state and enters the interrupt sequence
    /// directly: the next tick is the first BRK micro-op, with no opcode
    /// fetched, and the vector comes from `$FFFC`.
    pub fn trigger_rst<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler,
        S::Event: From<CpuEvent>,
    {
        self.initialise(scheduler);
        self.cycle_count = u16::from(opcode::BRK) << 3;
        self.ctx.servicing_interrupt = true;
        self.interrupts.rst = true;
        self.calculate_interrupt_trigger_cycle();
        log::debug!("6510 RESET line raised");
    }

    /// Raise NMI. Edge triggered; taken once at the next eligible boundary.
    pub fn trigger_nmi<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler,
        S::Event: From<CpuEvent>,
    {
        self.interrupts.nmi = true;
        self.calculate_interrupt_trigger_cycle();

        // A halted CPU re-enters the stall loop so the request is counted
        // from this cycle.
        if !self.is_rdy() {
            scheduler.cancel(CpuEvent::StolenTick.into());
            scheduler.schedule(CpuEvent::StolenTick.into(), 0, Phase::Phi2);
        }
    }

    /// Assert IRQ. Level triggered; stays asserted until [`Self::clear_irq`].
    pub fn trigger_irq<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler,
        S::Event: From<CpuEvent>,
    {
        self.interrupts.irq = true;
        scheduler.cancel(CpuEvent::ReleaseIrq.into());
        self.calculate_interrupt_trigger_cycle();

        if !self.is_rdy() && self.interrupts.cycle.is_at(self.cycle_count) {
            scheduler.cancel(CpuEvent::StolenTick.into());
            scheduler.schedule(CpuEvent::StolenTick.into(), 0, Phase::Phi2);
        }
    }

    /// Release IRQ. A pending IRQ that has not been taken is dropped two
    /// cycles later, at PHI1.
    pub fn clear_irq<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler,
        S::Event: From<CpuEvent>,
    {
        self.interrupts.irq = false;
        scheduler.schedule(CpuEvent::ReleaseIrq.into(), 2, Phase::Phi1);
    }

    pub(crate) fn release_irq(&mut self) {
        self.disarm_irq();
    }

    /// Drop a pending interrupt unless it is RESET or NMI.
    pub(crate) fn disarm_irq(&mut self) {
        let state = &mut self.interrupts;
        if !state.rst && !state.nmi && state.cycle != InterruptCycle::NotScheduled {
            state.cycle = InterruptCycle::NotScheduled;
        }
    }

    pub(crate) fn check_interrupts(&self) -> bool {
        let state = &self.interrupts;
        state.rst || state.nmi || (state.irq && !self.regs.p.i())
    }

    pub(crate) fn calculate_interrupt_trigger_cycle(&mut self) {
        if self.interrupts.cycle == InterruptCycle::NotScheduled && self.check_interrupts() {
            self.interrupts.cycle = InterruptCycle::At(i32::from(self.cycle_count));
        }
    }

    /// Instruction boundary: divert into the interrupt sequence or fetch
    /// the next opcode.
    pub(crate) fn interrupts_and_next_opcode(&mut self) {
        if self.interrupts.cycle.is_due(self.cycle_count) {
            log::trace!(
                "6510 interrupt taken at PC=${:04X} (rst={} nmi={} irq={})",
                self.regs.pc,
                self.interrupts.rst,
                self.interrupts.nmi,
                self.interrupts.irq
            );
            self.read(self.regs.pc);
            self.cycle_count = u16::from(opcode::BRK) << 3;
            self.ctx.servicing_interrupt = true;
            self.interrupts.cycle = InterruptCycle::NotScheduled;
        } else {
            self.fetch_next_opcode();
        }
    }

    pub(crate) fn fetch_next_opcode(&mut self) {
        self.rdy_on_throw_away_read = false;

        let op = self.read(self.regs.pc);
        self.cycle_count = u16::from(op) << 3;
        self.regs.pc = self.regs.pc.wrapping_add(1);

        if !self.check_interrupts() {
            self.interrupts.cycle = InterruptCycle::NotScheduled;
        } else if self.interrupts.cycle != InterruptCycle::NotScheduled {
            self.interrupts.cycle = InterruptCycle::Overdue;
        }
    }

    /// Push PCL and pick the vector. RESET beats NMI beats IRQ/BRK.
    pub(crate) fn brk_push_low_pc(&mut self) {
        self.push_low_pc();

        self.ctx.effective_address = if self.interrupts.rst {
            RESET_VECTOR
        } else if self.interrupts.nmi {
            NMI_VECTOR
        } else {
            IRQ_VECTOR
        };

        self.interrupts.rst = false;
        self.interrupts.nmi = false;
        self.calculate_interrupt_trigger_cycle();
    }

    pub(crate) fn irq_lo_request(&mut self) {
        let lo = self.read(self.ctx.effective_address);
        self.regs.pc = (self.regs.pc & 0xFF00) | u16::from(lo);
        self.ctx.servicing_interrupt = false;
    }

    pub(crate) fn irq_hi_request(&mut self) {
        let hi = self.read(self.ctx.effective_address.wrapping_add(1));
        self.regs.pc = (self.regs.pc & 0x00FF) | (u16::from(hi) << 8);
        self.regs.p.set_i(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_scheduled_is_never_due() {
        assert!(!InterruptCycle::NotScheduled.is_due(0x7FF));
        assert!(InterruptCycle::NotScheduled.within_delay(0x7FF));
    }

    #[test]
    fn overdue_is_always_due() {
        assert!(InterruptCycle::Overdue.is_due(0));
        assert!(!InterruptCycle::Overdue.within_delay(0));
    }

    #[test]
    fn at_becomes_due_after_two_cycles() {
        let seen = InterruptCycle::At(0x100);
        assert!(!seen.is_due(0x101));
        assert!(!seen.is_due(0x102));
        assert!(seen.is_due(0x103));
    }

    #[test]
    fn earlier_only_moves_at() {
        assert_eq!(InterruptCycle::At(8).earlier(), InterruptCycle::At(7));
        assert_eq!(InterruptCycle::Overdue.earlier(), InterruptCycle::Overdue);
        assert!(InterruptCycle::At(8).is_at(8));
        assert!(!InterruptCycle::Overdue.is_at(8));
    }
}
