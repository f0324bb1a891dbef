//! Tests for the stage-evaluation engine and pipeline construction.

use std::cell::Cell;
use std::rc::Rc;

use pipesim::common::BuildError;
use pipesim::core::instruction::{Instruction, Opcode, Operand};
use pipesim::core::latch::Latch;
use pipesim::core::stage::{ManualStage, SimpleStage, StageContext};
use pipesim::core::{Core, CoreBuilder};

/// Emits a fresh instruction every cycle the downstream register accepts
/// one, counting how many were produced.
struct Emitter {
    emitted: Rc<Cell<u64>>,
}

impl SimpleStage for Emitter {
    fn compute(&mut self, ctx: &mut StageContext<'_>, _input: &Latch, output: &mut Latch) {
        if !ctx.output_can_accept(0) {
            return;
        }
        let n = self.emitted.get();
        output.set_instruction(Instruction::new(
            Opcode::Movc,
            n,
            Operand::register(0),
            Operand::immediate(n as i64),
            Operand::none(),
        ));
        self.emitted.set(n + 1);
    }
}

/// Counts compute invocations and otherwise does nothing.
struct Counter {
    runs: Rc<Cell<u64>>,
}

impl SimpleStage for Counter {
    fn compute(&mut self, _ctx: &mut StageContext<'_>, _input: &Latch, _output: &mut Latch) {
        self.runs.set(self.runs.get() + 1);
    }
}

/// Declares a resource stall every cycle, so it never consumes its input
/// and only ever emits bubbles.
struct Staller;

impl SimpleStage for Staller {
    fn compute(&mut self, ctx: &mut StageContext<'_>, _input: &Latch, _output: &mut Latch) {
        ctx.set_resource_stall(true);
    }
}

/// Consumes whatever arrives, recording how many valid instructions it saw.
struct Sink {
    seen: Rc<Cell<u64>>,
}

impl SimpleStage for Sink {
    fn compute(&mut self, _ctx: &mut StageContext<'_>, input: &Latch, _output: &mut Latch) {
        if input.instruction().is_valid() {
            self.seen.set(self.seen.get() + 1);
        }
    }
}

/// Duplicates its input onto two output registers, coordinating both
/// ports itself.
struct Splitter;

impl ManualStage for Splitter {
    fn compute(&mut self, ctx: &mut StageContext<'_>) {
        let input = ctx.read_input(0);
        if !input.instruction().is_valid() {
            return;
        }
        if !ctx.output_can_accept(0) || !ctx.output_can_accept(1) {
            ctx.set_resource_stall(true);
            return;
        }
        let mut left = ctx.new_output(0);
        left.set_instruction(*input.instruction());
        let mut right = ctx.new_output(1);
        right.set_instruction(*input.instruction());
        ctx.consumed_input(0);
        ctx.write_output(0, left);
        ctx.write_output(1, right);
    }
}

/// Builds Emitter -> Sink over one pipe register.
fn two_stage_core(emitted: Rc<Cell<u64>>, seen: Rc<Cell<u64>>) -> Core {
    let mut builder = CoreBuilder::new(4);
    let reg = builder.pipe_register("A2B").unwrap();
    builder
        .simple_stage("A", Box::new(Emitter { emitted }), None, Some(reg))
        .unwrap();
    builder
        .simple_stage("B", Box::new(Sink { seen }), Some(reg), None)
        .unwrap();
    builder.build().unwrap()
}

/// Tests that every stage runs exactly once per cycle and that redundant
/// invocations within a cycle are no-ops.
#[test]
fn test_stage_evaluated_once_per_cycle() {
    let runs = Rc::new(Cell::new(0));
    let mut builder = CoreBuilder::new(4);
    let reg = builder.pipe_register("A2B").unwrap();
    builder
        .simple_stage(
            "A",
            Box::new(Emitter {
                emitted: Rc::new(Cell::new(0)),
            }),
            None,
            Some(reg),
        )
        .unwrap();
    builder
        .simple_stage("B", Box::new(Counter { runs: runs.clone() }), Some(reg), None)
        .unwrap();
    let mut core = builder.build().unwrap();

    core.cycle();
    assert_eq!(runs.get(), 1);

    assert!(core.evaluate_stage("B"), "Stage B should exist");
    assert_eq!(runs.get(), 1, "Repeat evaluation in a cycle must be a no-op");

    core.cycle();
    assert_eq!(runs.get(), 2);
}

/// Tests that work flows one register per cycle: the sink sees the first
/// instruction on the cycle after it was produced.
#[test]
fn test_work_moves_one_register_per_cycle() {
    let emitted = Rc::new(Cell::new(0));
    let seen = Rc::new(Cell::new(0));
    let mut core = two_stage_core(emitted.clone(), seen.clone());

    core.cycle();
    assert_eq!(emitted.get(), 1);
    assert_eq!(seen.get(), 0, "Produced work is not visible until clocked");

    core.cycle();
    assert_eq!(seen.get(), 1);

    for _ in 0..3 {
        core.cycle();
    }
    assert_eq!(emitted.get(), 5);
    assert_eq!(seen.get(), 4);
}

/// Tests that a permanently stalled stage blocks its producer: the
/// producer's output register fills once and then refuses further work.
#[test]
fn test_stalled_consumer_blocks_producer() {
    let emitted = Rc::new(Cell::new(0));
    let mut builder = CoreBuilder::new(4);
    let r1 = builder.pipe_register("A2B").unwrap();
    let r2 = builder.pipe_register("B2C").unwrap();
    builder
        .simple_stage(
            "A",
            Box::new(Emitter {
                emitted: emitted.clone(),
            }),
            None,
            Some(r1),
        )
        .unwrap();
    builder
        .simple_stage("B", Box::new(Staller), Some(r1), Some(r2))
        .unwrap();
    let seen = Rc::new(Cell::new(0));
    builder
        .simple_stage("C", Box::new(Sink { seen: seen.clone() }), Some(r2), None)
        .unwrap();
    let mut core = builder.build().unwrap();

    for _ in 0..5 {
        core.cycle();
    }

    assert_eq!(
        emitted.get(),
        1,
        "With the downstream latch never consumed, exactly one emit fits"
    );
    assert_eq!(
        seen.get(),
        0,
        "A stalled stage must emit only bubbles downstream"
    );
    assert_eq!(core.state.stats.stalls_data, 5);
    assert_eq!(core.state.stats.bubbles_injected, 5);
}

/// Tests the manual-stage protocol: a stage with two output ports drives
/// its own reads, stall checks, and commits.
#[test]
fn test_manual_stage_duplicates_to_both_outputs() {
    let emitted = Rc::new(Cell::new(0));
    let left_seen = Rc::new(Cell::new(0));
    let right_seen = Rc::new(Cell::new(0));

    let mut builder = CoreBuilder::new(4);
    let r_in = builder.pipe_register("A2M").unwrap();
    let r_left = builder.pipe_register("M2L").unwrap();
    let r_right = builder.pipe_register("M2R").unwrap();
    builder
        .simple_stage(
            "A",
            Box::new(Emitter {
                emitted: emitted.clone(),
            }),
            None,
            Some(r_in),
        )
        .unwrap();
    builder
        .manual_stage("M", Box::new(Splitter), vec![r_in], vec![r_left, r_right])
        .unwrap();
    builder
        .simple_stage(
            "L",
            Box::new(Sink {
                seen: left_seen.clone(),
            }),
            Some(r_left),
            None,
        )
        .unwrap();
    builder
        .simple_stage(
            "R",
            Box::new(Sink {
                seen: right_seen.clone(),
            }),
            Some(r_right),
            None,
        )
        .unwrap();
    let mut core = builder.build().unwrap();

    for _ in 0..4 {
        core.cycle();
    }

    assert_eq!(emitted.get(), 4, "The splitter consumes every cycle");
    assert_eq!(left_seen.get(), 2);
    assert_eq!(
        right_seen.get(),
        2,
        "Both output ports must receive a copy of every instruction"
    );
}

/// Tests that the diagnostic reports surface stalls and idleness.
#[test]
fn test_reports_surface_stall_and_idle() {
    let mut builder = CoreBuilder::new(4);
    let r1 = builder.pipe_register("A2B").unwrap();
    let r2 = builder.pipe_register("B2C").unwrap();
    builder
        .simple_stage(
            "A",
            Box::new(Emitter {
                emitted: Rc::new(Cell::new(0)),
            }),
            None,
            Some(r1),
        )
        .unwrap();
    builder
        .simple_stage("B", Box::new(Staller), Some(r1), Some(r2))
        .unwrap();
    builder
        .simple_stage(
            "C",
            Box::new(Sink {
                seen: Rc::new(Cell::new(0)),
            }),
            Some(r2),
            None,
        )
        .unwrap();
    let mut core = builder.build().unwrap();

    core.cycle();
    core.cycle();
    let reports = core.reports();

    let staller = reports.iter().find(|r| r.name == "B").unwrap();
    assert!(staller.status.contains("ResourceWait"));
    assert!(
        staller.status.contains("HasWork"),
        "An unconsumed valid input must be reported as pending work"
    );

    let sink = reports.iter().find(|r| r.name == "C").unwrap();
    assert_eq!(sink.activity, "----: NULL");
}

/// Tests that construction rejects duplicate pipe register names.
#[test]
fn test_build_rejects_duplicate_register() {
    let mut builder = CoreBuilder::new(4);
    builder.pipe_register("A2B").unwrap();
    let err = builder.pipe_register("A2B").unwrap_err();
    assert!(matches!(err, BuildError::DuplicatePipeRegister(_)));
}

/// Tests that construction rejects a pipe register nobody writes.
#[test]
fn test_build_rejects_unwritten_register() {
    let seen = Rc::new(Cell::new(0));
    let mut builder = CoreBuilder::new(4);
    let reg = builder.pipe_register("A2B").unwrap();
    builder
        .simple_stage("B", Box::new(Sink { seen }), Some(reg), None)
        .unwrap();
    let err = builder.build().err().unwrap();
    assert!(matches!(err, BuildError::UnwrittenPipeRegister(_)));
}

/// Tests that construction rejects a pipe register with two consumers.
#[test]
fn test_build_rejects_shared_register() {
    let mut builder = CoreBuilder::new(4);
    let reg = builder.pipe_register("A2B").unwrap();
    builder
        .simple_stage(
            "A",
            Box::new(Emitter {
                emitted: Rc::new(Cell::new(0)),
            }),
            None,
            Some(reg),
        )
        .unwrap();
    builder
        .simple_stage(
            "B",
            Box::new(Sink {
                seen: Rc::new(Cell::new(0)),
            }),
            Some(reg),
            None,
        )
        .unwrap();
    builder
        .simple_stage(
            "C",
            Box::new(Sink {
                seen: Rc::new(Cell::new(0)),
            }),
            Some(reg),
            None,
        )
        .unwrap();
    let err = builder.build().err().unwrap();
    assert!(matches!(err, BuildError::SharedPipeRegister(_)));
}

/// Tests that an unknown forwarding source name is rejected up front.
#[test]
fn test_build_rejects_unknown_forwarding_source() {
    let mut builder = CoreBuilder::new(4);
    let err = builder.forwarding_source("NoSuchRegister").unwrap_err();
    assert!(matches!(err, BuildError::UnknownPipeRegister(_)));
}
