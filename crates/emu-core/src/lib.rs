//! Core traits and types for cycle-accurate emulation.
//!
//! Chips never call each other directly. Memory traffic goes through a
//! [`Bus`], and time only moves when the owner pops the next event off a
//! [`Scheduler`] and hands it back to the chip that scheduled it.

mod bus;
mod observable;
mod scheduler;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use observable::{Observable, Value};
pub use scheduler::{EventScheduler, Phase, Scheduler};
pub use ticks::Ticks;
