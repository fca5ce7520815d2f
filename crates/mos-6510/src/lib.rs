//! Cycle-exact MOS 6510 CPU emulation.
//!
//! The core models every bus access of the NMOS 6502 family, including the
//! dummy reads and writes, the undocumented opcodes, the decimal-mode flag
//! quirks, the two-cycle interrupt latency and the C64's RDY line.
//!
//! Instructions are tables of per-cycle micro-ops, one row of eight slots
//! per opcode. The CPU runs on a shared [`emu_core::EventScheduler`]: it
//! schedules a [`CpuEvent`] for its next clock, and the owner pops events
//! and hands them back through [`Mos6510::handle_event`].
//!
//! ```ignore
//! let mut scheduler = EventScheduler::<CpuEvent>::new();
//! let mut cpu = Mos6510::new(SimpleBus::new(), Mos6510Config::default(), &mut scheduler);
//! while let Some(event) = scheduler.next_event() {
//!     cpu.handle_event(event, &mut scheduler)?;
//! }
//! ```

mod addressing;
mod config;
mod cpu;
mod error;
pub mod flags;
mod instructions;
mod interrupts;
pub mod microcode;
mod registers;

pub use config::{DEFAULT_ANE_MAGIC, DEFAULT_LXA_MAGIC, Mos6510Config};
pub use cpu::{CpuEvent, InstructionContext, Mos6510, SR_INTERRUPT};
pub use error::CpuError;
pub use flags::Status;
pub use interrupts::InterruptCycle;
pub use registers::{Registers, STACK_PAGE};
