//! Errors raised by the cycle driver.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    /// A HLT/KIL opcode was executed. The real chip locks up until reset.
    Jammed {
        /// The jam opcode.
        opcode: u8,
        /// Address the opcode was fetched from.
        address: u16,
    },
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jammed { opcode, address } => {
                write!(f, "CPU jammed by opcode ${opcode:02X} at ${address:04X}")
            }
        }
    }
}

impl std::error::Error for CpuError {}
