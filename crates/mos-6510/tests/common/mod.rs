//! Shared test harness: a logging bus and a scheduler loop.

#![allow(dead_code)]

use emu_core::{Bus, EventScheduler, Observable, Value};
use mos_6510::{CpuError, CpuEvent, Mos6510, Mos6510Config};

/// Where programs are loaded and where the reset vector points.
pub const ORIGIN: u16 = 0x1000;

/// One bus access, in the `(address, value, "read"|"write")` shape the
/// JSON fixtures use.
pub type Access = (u16, u8, String);

/// Flat 64KB RAM that records every access.
pub struct LoggingBus {
    ram: Box<[u8; 0x10000]>,
    log: Vec<Access>,
}

impl LoggingBus {
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x10000]),
            log: Vec::new(),
        }
    }

    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        for (offset, &byte) in bytes.iter().enumerate() {
            let addr = address.wrapping_add(offset as u16);
            self.ram[usize::from(addr)] = byte;
        }
    }

    pub fn peek(&self, address: u16) -> u8 {
        self.ram[usize::from(address)]
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }

    pub fn log(&self) -> &[Access] {
        &self.log
    }

    pub fn take_log(&mut self) -> Vec<Access> {
        std::mem::take(&mut self.log)
    }

    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.log
            .iter()
            .filter(|(_, _, kind)| kind == "write")
            .map(|&(addr, value, _)| (addr, value))
            .collect()
    }
}

impl Bus for LoggingBus {
    fn read(&mut self, address: u16) -> u8 {
        let value = self.ram[usize::from(address)];
        self.log.push((address, value, "read".to_string()));
        value
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
        self.log.push((address, value, "write".to_string()));
    }
}

/// A CPU on a logging bus plus the scheduler that drives it.
pub struct Machine {
    pub cpu: Mos6510<LoggingBus>,
    pub scheduler: EventScheduler<CpuEvent>,
}

impl Machine {
    /// Reset with `program` at [`ORIGIN`]. The processor port writes are
    /// skipped so zero page starts out clear.
    pub fn new(program: &[u8]) -> Self {
        Self::with_config(program, Mos6510Config::new().without_processor_port())
    }

    pub fn with_config(program: &[u8], config: Mos6510Config) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut bus = LoggingBus::new();
        bus.load(0xFFFC, &ORIGIN.to_le_bytes());
        bus.load(ORIGIN, program);

        let mut scheduler = EventScheduler::new();
        let mut cpu = Mos6510::new(bus, config, &mut scheduler);
        cpu.bus_mut().take_log();
        Self { cpu, scheduler }
    }

    /// Reset, then run the first opcode fetch so the CPU sits at the start
    /// of the first instruction.
    pub fn boot(program: &[u8]) -> Self {
        let mut machine = Self::new(program);
        machine.clock().expect("opcode fetch");
        machine.cpu.bus_mut().take_log();
        machine
    }

    /// Run one CPU clock, dispatching any other events due before it.
    pub fn clock(&mut self) -> Result<(), CpuError> {
        loop {
            let event = self
                .scheduler
                .next_event()
                .expect("the CPU always has a clock pending");
            self.cpu.handle_event(event, &mut self.scheduler)?;
            if matches!(event, CpuEvent::Tick | CpuEvent::StolenTick) {
                return Ok(());
            }
        }
    }

    pub fn clocks(&mut self, count: usize) {
        for _ in 0..count {
            self.clock().expect("CPU clock");
        }
    }

    /// Run to the next instruction boundary; returns the clocks taken.
    pub fn step(&mut self) -> u32 {
        let mut cycles = 0;
        loop {
            self.clock().expect("CPU clock");
            cycles += 1;
            if self.cpu.is_at_instruction_start() {
                return cycles;
            }
            assert!(cycles < 16, "instruction did not finish");
        }
    }

    pub fn steps(&mut self, count: usize) {
        for _ in 0..count {
            self.step();
        }
    }

    pub fn opcode(&self) -> u8 {
        self.cpu.current_opcode()
    }

    pub fn peek(&self, address: u16) -> u8 {
        self.cpu.bus().peek(address)
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        self.cpu.bus_mut().poke(address, value);
    }

    pub fn query(&self, path: &str) -> Value {
        self.cpu
            .query(path)
            .unwrap_or_else(|| panic!("unknown query path {path}"))
    }
}
