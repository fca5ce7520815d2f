//! The 6510 cycle driver.
//!
//! The CPU never runs on its own. It schedules a [`CpuEvent`] on the
//! owner's scheduler and, when the owner hands that event back through
//! [`Mos6510::handle_event`], performs exactly one clock of work and
//! schedules the next one. Which event is pending depends on RDY:
//!
//! - [`CpuEvent::Tick`] while the bus is available: run the micro-op at the
//!   current cycle position and advance.
//! - [`CpuEvent::StolenTick`] while DMA holds the bus: writes still run,
//!   anything else stays put and only the bookkeeping the real chip does
//!   while halted is applied.

use emu_core::{Bus, Observable, Phase, Scheduler, Value};

use crate::config::Mos6510Config;
use crate::error::CpuError;
use crate::flags::{self, Status};
use crate::interrupts::{InterruptCycle, InterruptState};
use crate::microcode::{self, MicroOp, opcode};
use crate::registers::Registers;

/// Mask of the interrupt-disable bit in P.
pub const SR_INTERRUPT: u8 = flags::I;

pub(crate) const RESET_VECTOR: u16 = 0xFFFC;
pub(crate) const NMI_VECTOR: u16 = 0xFFFA;
pub(crate) const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycle position of the opcode fetch at the end of the BRK sequence.
const FETCH_AFTER_RESET: u16 = ((opcode::BRK as u16) << 3) + 6;

const CLI_FIRST: u16 = (opcode::CLI as u16) << 3;
const SEI_FIRST: u16 = (opcode::SEI as u16) << 3;
const SHA_IY_FIXUP: u16 = ((opcode::SHA_IY as u16) << 3) + 3;
const SHS_AY_FIXUP: u16 = ((opcode::SHS_AY as u16) << 3) + 2;
const SHY_AX_FIXUP: u16 = ((opcode::SHY_AX as u16) << 3) + 2;
const SHX_AY_FIXUP: u16 = ((opcode::SHX_AY as u16) << 3) + 2;
const SHA_AY_FIXUP: u16 = ((opcode::SHA_AY as u16) << 3) + 2;

/// Events the CPU puts on the owner's scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuEvent {
    /// One clock with the bus available.
    Tick,
    /// One clock with RDY low.
    StolenTick,
    /// End of the IRQ release delay started by [`Mos6510::clear_irq`].
    ReleaseIrq,
}

/// Scratch state shared by the micro-ops of one instruction.
///
/// Addressing steps fill it in, semantic steps consume it. Nothing here
/// survives past the next opcode's addressing steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstructionContext {
    pub effective_address: u16,
    /// Zero page or absolute pointer for indirect modes.
    pub pointer: u16,
    pub data: u8,
    /// Low-byte carry of the last index add (page crossed).
    pub adl_carry: bool,
    /// Set while the BRK sequence is running on behalf of IRQ/NMI/RESET.
    /// Stops the PC increment and clears B in the pushed status.
    pub servicing_interrupt: bool,
}

/// MOS 6510 CPU.
pub struct Mos6510<B: Bus> {
    pub(crate) regs: Registers,
    pub(crate) ctx: InstructionContext,
    pub(crate) interrupts: InterruptState,
    /// `(opcode << 3) | sub_cycle`.
    pub(crate) cycle_count: u16,
    rdy: bool,
    /// RDY was low during the fix-up read of an SH* store.
    pub(crate) rdy_on_throw_away_read: bool,
    jammed: Option<CpuError>,
    pub(crate) config: Mos6510Config,
    bus: B,
}

impl<B: Bus> Mos6510<B> {
    /// Create a CPU on `bus` and reset it.
    pub fn new<S>(bus: B, config: Mos6510Config, scheduler: &mut S) -> Self
    where
        S: Scheduler,
        S::Event: From<CpuEvent>,
    {
        let mut cpu = Self {
            regs: Registers::new(),
            ctx: InstructionContext::default(),
            interrupts: InterruptState::new(),
            cycle_count: FETCH_AFTER_RESET,
            rdy: true,
            rdy_on_throw_away_read: false,
            jammed: None,
            config,
            bus,
        };
        cpu.reset(scheduler);
        cpu
    }

    /// Power-on reset.
    ///
    /// Clears registers and latches, writes the processor port defaults
    /// (if configured) and loads PC from $FFFC/$FFFD. The first tick after
    /// this fetches the opcode at PC.
    pub fn reset<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler,
        S::Event: From<CpuEvent>,
    {
        self.initialise(scheduler);

        if self.config.init_processor_port {
            self.bus.write(0x0000, 0x2F);
            self.bus.write(0x0001, 0x37);
        }

        let lo = self.bus.read(RESET_VECTOR);
        let hi = self.bus.read(RESET_VECTOR + 1);
        self.ctx.effective_address = u16::from_le_bytes([lo, hi]);
        self.regs.pc = self.ctx.effective_address;
        log::debug!("6510 reset, PC=${:04X}", self.regs.pc);
    }

    pub(crate) fn initialise<S>(&mut self, scheduler: &mut S)
    where
        S: Scheduler,
        S::Event: From<CpuEvent>,
    {
        self.regs = Registers::new();
        self.ctx = InstructionContext::default();
        self.interrupts = InterruptState::new();
        self.cycle_count = FETCH_AFTER_RESET;
        self.rdy = true;
        self.rdy_on_throw_away_read = false;
        self.jammed = None;

        scheduler.cancel(CpuEvent::StolenTick.into());
        scheduler.cancel(CpuEvent::ReleaseIrq.into());
        scheduler.schedule(CpuEvent::Tick.into(), 0, Phase::Phi2);
    }

    /// Dispatch an event previously scheduled by this CPU.
    ///
    /// Returns [`CpuError::Jammed`] from the tick that executes a HLT
    /// opcode and from every tick after it until reset. A jammed CPU does
    /// not reschedule itself.
    pub fn handle_event<S>(&mut self, event: CpuEvent, scheduler: &mut S) -> Result<(), CpuError>
    where
        S: Scheduler,
        S::Event: From<CpuEvent>,
    {
        match event {
            CpuEvent::Tick => {
                self.check_jammed()?;
                self.step()?;
                scheduler.schedule_in(CpuEvent::Tick.into(), 1);
            }
            CpuEvent::StolenTick => {
                self.check_jammed()?;
                if microcode::slot(self.cycle_count).no_steal {
                    self.step()?;
                } else {
                    self.stall();
                }
                scheduler.schedule_in(CpuEvent::StolenTick.into(), 1);
            }
            CpuEvent::ReleaseIrq => self.release_irq(),
        }
        Ok(())
    }

    /// Drive the RDY line. `true` lets the CPU run; `false` halts it on
    /// its next read cycle.
    pub fn set_rdy<S>(&mut self, ready: bool, scheduler: &mut S)
    where
        S: Scheduler,
        S::Event: From<CpuEvent>,
    {
        log::trace!("6510 RDY {}", if ready { "high" } else { "low" });
        self.rdy = ready;

        if ready {
            scheduler.cancel(CpuEvent::StolenTick.into());
            scheduler.schedule(CpuEvent::Tick.into(), 0, Phase::Phi2);
        } else {
            scheduler.cancel(CpuEvent::Tick.into());
            scheduler.schedule(CpuEvent::StolenTick.into(), 0, Phase::Phi2);
        }
    }

    fn check_jammed(&self) -> Result<(), CpuError> {
        match self.jammed {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn step(&mut self) -> Result<(), CpuError> {
        let cycle = microcode::slot(self.cycle_count);
        self.cycle_count += 1;
        self.run(cycle.op)
    }

    /// Bookkeeping for a clock the CPU spends halted by RDY.
    fn stall(&mut self) {
        match self.cycle_count {
            CLI_FIRST => {
                self.regs.p.set_i(false);
                if self.interrupts.irq && self.interrupts.cycle == InterruptCycle::NotScheduled {
                    self.interrupts.cycle = InterruptCycle::Overdue;
                }
            }
            SEI_FIRST => {
                self.regs.p.set_i(true);
                if !self.interrupts.rst
                    && !self.interrupts.nmi
                    && self.interrupts.cycle.within_delay(self.cycle_count)
                {
                    self.interrupts.cycle = InterruptCycle::NotScheduled;
                }
            }
            SHA_IY_FIXUP | SHS_AY_FIXUP | SHY_AX_FIXUP | SHX_AY_FIXUP | SHA_AY_FIXUP => {
                self.rdy_on_throw_away_read = true;
            }
            _ => {}
        }

        // A halted 6510 still counts the first cycle of interrupt delay.
        if self.interrupts.cycle.is_at(self.cycle_count) {
            self.interrupts.cycle = self.interrupts.cycle.earlier();
        }
    }

    fn run(&mut self, op: MicroOp) -> Result<(), CpuError> {
        match op {
            MicroOp::ThrowAwayFetch => self.throw_away_fetch(),
            MicroOp::ThrowAwayRead => self.throw_away_read(),
            MicroOp::FetchDataByte => self.fetch_data_byte(),
            MicroOp::FetchLowAddr => self.fetch_low_addr(),
            MicroOp::FetchLowAddrX => self.fetch_low_addr_x(),
            MicroOp::FetchLowAddrY => self.fetch_low_addr_y(),
            MicroOp::FetchHighAddr => self.fetch_high_addr(),
            MicroOp::FetchHighAddrX => self.fetch_high_addr_x(),
            MicroOp::FetchHighAddrX2 => self.fetch_high_addr_x2(),
            MicroOp::FetchHighAddrY => self.fetch_high_addr_y(),
            MicroOp::FetchHighAddrY2 => self.fetch_high_addr_y2(),
            MicroOp::FetchLowPointer => self.fetch_low_pointer(),
            MicroOp::FetchLowPointerX => self.fetch_low_pointer_x(),
            MicroOp::FetchHighPointer => self.fetch_high_pointer(),
            MicroOp::FetchLowEffAddr => self.fetch_low_eff_addr(),
            MicroOp::FetchHighEffAddr => self.fetch_high_eff_addr(),
            MicroOp::FetchHighEffAddrY => self.fetch_high_eff_addr_y(),
            MicroOp::FetchHighEffAddrY2 => self.fetch_high_eff_addr_y2(),
            MicroOp::FetchEffAddrDataByte => self.fetch_eff_addr_data_byte(),
            MicroOp::PutEffAddrDataByte => self.put_eff_addr_data_byte(),
            MicroOp::WasteCycle => {}
            MicroOp::PushHighPc => self.push_high_pc(),
            MicroOp::PushLowPc => self.push_low_pc(),
            MicroOp::PushSr => self.push_sr(),
            MicroOp::PopSr => self.pop_sr(),
            MicroOp::PopLowPc => self.pop_low_pc(),
            MicroOp::PopHighPc => self.pop_high_pc(),
            MicroOp::BrkPushLowPc => self.brk_push_low_pc(),
            MicroOp::IrqLoRequest => self.irq_lo_request(),
            MicroOp::IrqHiRequest => self.irq_hi_request(),
            MicroOp::FetchNextOpcode => self.fetch_next_opcode(),
            MicroOp::InterruptsAndNextOpcode => self.interrupts_and_next_opcode(),
            MicroOp::Branch(condition) => self.branch(condition),
            MicroOp::FixBranch => self.fix_branch(),
            MicroOp::Execute(operation) => self.execute(operation),
            MicroOp::Jam => return Err(self.jam()),
        }
        Ok(())
    }

    fn jam(&mut self) -> CpuError {
        // Park on the jam slot so the position still names the opcode.
        self.cycle_count -= 1;
        let err = CpuError::Jammed {
            opcode: self.current_opcode(),
            address: self.regs.pc.wrapping_sub(1),
        };
        log::error!("{err}");
        self.jammed = Some(err);
        err
    }

    pub(crate) fn read(&mut self, address: u16) -> u8 {
        self.bus.read(address)
    }

    pub(crate) fn write(&mut self, address: u16, value: u8) {
        self.bus.write(address, value);
    }

    // === Accessors ===

    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.regs.p
    }

    #[must_use]
    pub fn context(&self) -> &InstructionContext {
        &self.ctx
    }

    #[must_use]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    #[must_use]
    pub fn config(&self) -> &Mos6510Config {
        &self.config
    }

    /// Opcode whose micro-ops are running. BRK while an interrupt is being
    /// serviced.
    #[must_use]
    pub fn current_opcode(&self) -> u8 {
        (self.cycle_count >> 3) as u8
    }

    /// Packed `(opcode << 3) | sub_cycle`.
    #[must_use]
    pub fn cycle_position(&self) -> u16 {
        self.cycle_count
    }

    /// True right after an opcode fetch or after diverting into an
    /// interrupt, before any of the instruction's own cycles have run.
    #[must_use]
    pub fn is_at_instruction_start(&self) -> bool {
        self.cycle_count & 7 == 0
    }

    #[must_use]
    pub fn is_rdy(&self) -> bool {
        self.rdy
    }

    #[must_use]
    pub fn is_jammed(&self) -> bool {
        self.jammed.is_some()
    }

    #[must_use]
    pub fn interrupt_cycle(&self) -> InterruptCycle {
        self.interrupts.cycle
    }
}

const QUERY_PATHS: &[&str] = &[
    "pc",
    "a",
    "x",
    "y",
    "s",
    "p",
    "flags.n",
    "flags.v",
    "flags.b",
    "flags.d",
    "flags.i",
    "flags.z",
    "flags.c",
    "opcode",
    "cycle",
    "rdy",
    "irq",
    "nmi",
    "jammed",
];

impl<B: Bus> Observable for Mos6510<B> {
    fn query(&self, path: &str) -> Option<Value> {
        let p = self.regs.p;
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" => Some(self.regs.s.into()),
            "p" => Some(p.get().into()),
            "flags.n" => Some(p.n().into()),
            "flags.v" => Some(p.v().into()),
            "flags.b" => Some(p.b().into()),
            "flags.d" => Some(p.d().into()),
            "flags.i" => Some(p.i().into()),
            "flags.z" => Some(p.z().into()),
            "flags.c" => Some(p.c().into()),
            "opcode" => Some(self.current_opcode().into()),
            "cycle" => Some(self.cycle_count.into()),
            "rdy" => Some(self.rdy.into()),
            "irq" => Some(self.interrupts.irq.into()),
            "nmi" => Some(self.interrupts.nmi.into()),
            "jammed" => Some(self.is_jammed().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
