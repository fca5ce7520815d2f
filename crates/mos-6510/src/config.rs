//! 6510 configuration: chip-batch constants and reset behaviour.

/// Value ORed into A by LXA (`$AB`) before the AND.
///
/// Depends on the chip batch and even on temperature; `$EE` matches the
/// units the C64 SID players were tuned against.
pub const DEFAULT_LXA_MAGIC: u8 = 0xEE;

/// Value ORed into A by ANE (`$8B`) before the AND. Batch dependent like
/// [`DEFAULT_LXA_MAGIC`].
pub const DEFAULT_ANE_MAGIC: u8 = 0xEF;

/// Configuration for constructing a 6510 instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mos6510Config {
    /// Magic constant for LXA.
    pub lxa_magic: u8,
    /// Magic constant for ANE.
    pub ane_magic: u8,
    /// Write the processor port defaults ($2F to $00, $37 to $01) on reset.
    pub init_processor_port: bool,
}

impl Default for Mos6510Config {
    fn default() -> Self {
        Self {
            lxa_magic: DEFAULT_LXA_MAGIC,
            ane_magic: DEFAULT_ANE_MAGIC,
            init_processor_port: true,
        }
    }
}

impl Mos6510Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_lxa_magic(mut self, magic: u8) -> Self {
        self.lxa_magic = magic;
        self
    }

    #[must_use]
    pub fn with_ane_magic(mut self, magic: u8) -> Self {
        self.ane_magic = magic;
        self
    }

    /// Skip the processor port writes, e.g. for a bare 6502 memory map.
    #[must_use]
    pub fn without_processor_port(mut self) -> Self {
        self.init_processor_port = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_chip() {
        let config = Mos6510Config::new();
        assert_eq!(config.lxa_magic, 0xEE);
        assert_eq!(config.ane_magic, 0xEF);
        assert!(config.init_processor_port);
    }

    #[test]
    fn builders_override_single_fields() {
        let config = Mos6510Config::new()
            .with_lxa_magic(0xFF)
            .without_processor_port();
        assert_eq!(config.lxa_magic, 0xFF);
        assert_eq!(config.ane_magic, DEFAULT_ANE_MAGIC);
        assert!(!config.init_processor_port);
    }
}
