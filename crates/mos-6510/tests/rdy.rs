//! RDY bus stealing: the CPU halts on reads, writes still complete.

mod common;

use common::Machine;
use emu_core::{Scheduler, Value};
use mos_6510::CpuEvent;

fn set_rdy(m: &mut Machine, ready: bool) {
    m.cpu.set_rdy(ready, &mut m.scheduler);
}

#[test]
fn halted_read_cycle_makes_no_progress() {
    // LDA $2000
    let mut m = Machine::boot(&[0xAD, 0x00, 0x20]);
    m.poke(0x2000, 0x77);

    m.clocks(2);
    let position = m.cpu.cycle_position();
    set_rdy(&mut m, false);
    assert!(m.scheduler.is_pending(CpuEvent::StolenTick));
    assert!(!m.scheduler.is_pending(CpuEvent::Tick));
    assert_eq!(m.query("rdy"), Value::Bool(false));

    m.cpu.bus_mut().take_log();
    m.clocks(5);
    assert_eq!(m.cpu.cycle_position(), position);
    assert!(m.cpu.bus().log().is_empty());
    assert_eq!(m.cpu.registers().a, 0x00);

    set_rdy(&mut m, true);
    assert!(m.scheduler.is_pending(CpuEvent::Tick));
    assert_eq!(m.step(), 2);
    assert_eq!(m.cpu.registers().a, 0x77);
}

#[test]
fn stolen_clocks_add_to_instruction_length() {
    let mut m = Machine::boot(&[0xAD, 0x00, 0x20, 0xEA]);
    m.clocks(1);
    set_rdy(&mut m, false);
    m.clocks(3);
    set_rdy(&mut m, true);
    // Three clocks remain of the four-cycle LDA.
    assert_eq!(m.step(), 3);
    assert_eq!(m.opcode(), 0xEA);
}

#[test]
fn store_completes_while_halted() {
    // STA $2000
    let mut m = Machine::boot(&[0x8D, 0x00, 0x20, 0xEA]);
    m.cpu.registers_mut().a = 0x55;
    m.clocks(2);

    set_rdy(&mut m, false);
    m.cpu.bus_mut().take_log();
    m.clocks(1);
    assert_eq!(m.peek(0x2000), 0x55);
    assert_eq!(m.cpu.bus().writes(), vec![(0x2000, 0x55)]);

    // The fetch that follows is a read and waits.
    m.clocks(3);
    assert_eq!(m.cpu.bus().log().len(), 1);
    set_rdy(&mut m, true);
    m.clocks(1);
    assert_eq!(m.opcode(), 0xEA);
}

#[test]
fn rmw_writes_complete_while_halted() {
    // INC $2000
    let mut m = Machine::boot(&[0xEE, 0x00, 0x20]);
    m.poke(0x2000, 0x01);
    m.clocks(3);

    set_rdy(&mut m, false);
    m.cpu.bus_mut().take_log();
    m.clocks(4);
    assert_eq!(m.cpu.bus().writes(), vec![(0x2000, 0x01), (0x2000, 0x02)]);
    assert_eq!(m.cpu.bus().log().len(), 2);
}

#[test]
fn interrupt_pushes_complete_while_halted() {
    // BRK: pushes are writes and run through RDY.
    let mut m = Machine::boot(&[0x00, 0x00]);
    m.clocks(1);
    set_rdy(&mut m, false);
    m.cpu.bus_mut().take_log();
    m.clocks(5);
    assert_eq!(
        m.cpu.bus().writes(),
        vec![(0x01FF, 0x10), (0x01FE, 0x02), (0x01FD, 0x30)]
    );
}

#[test]
fn sha_skips_and_when_rdy_drops_during_fixup_read() {
    // SHA $2000,Y with A=X=$FF, Y=0
    let run = |halt: bool| {
        let mut m = Machine::boot(&[0x9F, 0x00, 0x20]);
        let regs = m.cpu.registers_mut();
        regs.a = 0xFF;
        regs.x = 0xFF;
        m.clocks(2);
        if halt {
            set_rdy(&mut m, false);
            m.clocks(1);
            set_rdy(&mut m, true);
        }
        m.clocks(2);
        m.peek(0x2000)
    };

    assert_eq!(run(false), 0x21);
    assert_eq!(run(true), 0xFF);
}

#[test]
fn halted_cpu_counts_irq_delay() {
    // CLI; NOP; NOP with RDY low while the IRQ becomes visible.
    let mut m = Machine::new(&[0x58, 0xEA, 0xEA]);
    m.cpu.bus_mut().load(0xFFFE, &[0x00, 0x30]);
    m.steps(2);

    set_rdy(&mut m, false);
    m.cpu.trigger_irq(&mut m.scheduler);
    m.clocks(4);
    set_rdy(&mut m, true);

    // The delay elapsed while halted: the first NOP's boundary takes it.
    m.steps(1);
    assert_eq!(m.opcode(), 0x00);
}
