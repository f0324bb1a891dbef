//! Pipeline engine: core orchestrator, shared state, and components.
//!
//! The [`Core`] owns the cycle counter, the register file, every pipe
//! register, the forwarding-source registry, and the stages. Each cycle it
//! advances the counter, evaluates every stage exactly once in a fixed
//! deterministic order, then clocks every pipe register so work written
//! this cycle becomes visible next cycle.

/// Pipeline topology construction and validation.
pub mod builder;

/// Register-file lookup and the forwarding network.
pub mod forwarding;

/// Instruction and operand value types.
pub mod instruction;

/// The inter-stage latch type.
pub mod latch;

/// Inter-stage buffered pipe registers.
pub mod pipe_reg;

/// Register file with pending-write tracking.
pub mod regfile;

/// The stage-evaluation engine.
pub mod stage;

/// Demo five-stage scalar pipeline stage implementations.
pub mod stages;

pub use builder::CoreBuilder;
pub use forwarding::ForwardingStatus;
pub use instruction::{Instruction, Opcode, Operand};
pub use latch::Latch;
pub use pipe_reg::PipeRegister;
pub use regfile::RegisterFile;
pub use stage::{ManualStage, SimpleStage, Stage, StageContext, StageLogic};

use crate::stats::SimStats;

/// Handle to a pipe register owned by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeRegId(pub(crate) usize);

/// Process-wide simulation state shared by all stages.
///
/// Passed explicitly to whichever component needs it each cycle; the
/// evaluation engine has no ambient globals.
pub struct CoreState {
    cycle: u64,
    /// Architectural registers plus pending-write flags.
    pub regs: RegisterFile,
    /// Simulation counters.
    pub stats: SimStats,
    /// Values retired by `OUT` instructions, in retirement order.
    pub retired_output: Vec<i64>,
    pipe_regs: Vec<PipeRegister>,
    fwd_sources: Vec<PipeRegId>,
    trace_forwarding: bool,
    halted: bool,
}

impl CoreState {
    pub(crate) fn new(registers: usize, trace_forwarding: bool) -> Self {
        Self {
            cycle: 0,
            regs: RegisterFile::new(registers),
            stats: SimStats::default(),
            retired_output: Vec::new(),
            pipe_regs: Vec::new(),
            fwd_sources: Vec::new(),
            trace_forwarding,
            halted: false,
        }
    }

    /// Current cycle number. Cycle 0 is "before the first cycle"; the core
    /// advances the counter before evaluating any stage.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub(crate) fn advance_cycle(&mut self) {
        self.cycle += 1;
        self.stats.cycles += 1;
    }

    pub fn pipe_reg(&self, id: PipeRegId) -> &PipeRegister {
        &self.pipe_regs[id.0]
    }

    pub fn pipe_reg_mut(&mut self, id: PipeRegId) -> &mut PipeRegister {
        &mut self.pipe_regs[id.0]
    }

    /// Looks up a pipe register handle by name.
    pub fn pipe_reg_id(&self, name: &str) -> Option<PipeRegId> {
        self.pipe_regs
            .iter()
            .position(|r| r.name() == name)
            .map(PipeRegId)
    }

    pub(crate) fn add_pipe_reg(&mut self, reg: PipeRegister) -> PipeRegId {
        self.pipe_regs.push(reg);
        PipeRegId(self.pipe_regs.len() - 1)
    }

    /// The registered forwarding sources, in priority order.
    pub fn forwarding_sources(&self) -> &[PipeRegId] {
        &self.fwd_sources
    }

    pub(crate) fn add_forwarding_source(&mut self, id: PipeRegId) {
        self.fwd_sources.push(id);
    }

    /// Answers a forwarding query against one named source.
    pub fn match_forwarding_register(&self, source: PipeRegId, reg: usize) -> ForwardingStatus {
        self.pipe_reg(source).forwarding_status(reg)
    }

    /// The result value currently readable from one named source.
    pub fn result_value(&self, source: PipeRegId) -> Option<i64> {
        self.pipe_reg(source).result_value()
    }

    /// Whether the forwarding trace side channel is enabled.
    pub fn trace_enabled(&self) -> bool {
        self.trace_forwarding || cfg!(feature = "always-trace")
    }

    /// Requests that the simulation stop at the end of the current cycle.
    pub fn request_halt(&mut self) {
        self.halted = true;
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub(crate) fn clock_registers(&mut self) {
        for reg in &mut self.pipe_regs {
            reg.advance_clock();
        }
    }
}

/// Per-stage diagnostic snapshot taken after a cycle.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: String,
    pub activity: String,
    pub status: String,
}

/// The pipeline core: shared state, stages, and the evaluation order.
pub struct Core {
    /// Shared simulation state.
    pub state: CoreState,
    stages: Vec<Stage>,
    eval_order: Vec<usize>,
}

impl Core {
    pub(crate) fn new(state: CoreState, stages: Vec<Stage>, eval_order: Vec<usize>) -> Self {
        Self {
            state,
            stages,
            eval_order,
        }
    }

    /// Runs one full cycle: advance the counter, evaluate every stage once
    /// in the fixed order, then clock every pipe register.
    pub fn cycle(&mut self) {
        self.state.advance_cycle();
        for &idx in &self.eval_order {
            self.stages[idx].evaluate(&mut self.state);
        }
        self.state.clock_registers();
    }

    /// Runs cycles until the core halts or `max_cycles` have elapsed.
    ///
    /// Returns the number of cycles executed.
    pub fn run(&mut self, max_cycles: u64) -> u64 {
        let start = self.state.cycle();
        while !self.state.halted() && self.state.cycle() - start < max_cycles {
            self.cycle();
        }
        self.state.cycle() - start
    }

    /// Evaluates one stage by name against the current cycle.
    ///
    /// Returns false if no stage has that name. Stages guard against
    /// repeat evaluation within a cycle, so invoking one that the cycle
    /// loop already ran is a safe no-op.
    pub fn evaluate_stage(&mut self, name: &str) -> bool {
        match self.stages.iter_mut().find(|s| s.name() == name) {
            Some(stage) => {
                stage.evaluate(&mut self.state);
                true
            }
            None => false,
        }
    }

    /// The stages in pipeline construction order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Diagnostic activity/status snapshot of every stage, in pipeline
    /// construction order.
    pub fn reports(&self) -> Vec<StageReport> {
        self.stages
            .iter()
            .map(|s| StageReport {
                name: s.name().to_string(),
                activity: s.activity().to_string(),
                status: s.status(&self.state),
            })
            .collect()
    }

    /// Resets the cycle counter, every pipe register, and all per-stage
    /// state. Register-file contents and statistics are kept.
    pub fn reset(&mut self) {
        self.state.cycle = 0;
        self.state.halted = false;
        for reg in &mut self.state.pipe_regs {
            reg.reset();
        }
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}
