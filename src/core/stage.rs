//! The per-cycle stage-evaluation engine.
//!
//! Every stage follows the same evaluation contract once per cycle: reset
//! transient bookkeeping, run the stage's compute logic, then consume the
//! input and commit the output only when no resource stall was declared and
//! the output register accepts work. A stalled stage has all of its outputs
//! forced to bubbles so tentative results never leak past a stall.
//!
//! Stage logic comes in two statically chosen kinds. A [`SimpleStage`] has
//! at most one input and one output register and the engine drives the
//! read/allocate/consume/commit protocol for it. A [`ManualStage`] has
//! multiple ports and must perform its own reads, allocations, stall
//! detection, and commits through the [`StageContext`].

use crate::core::forwarding;
use crate::core::latch::Latch;
use crate::core::regfile::RegisterFile;
use crate::core::{CoreState, PipeRegId};
use crate::stats::SimStats;

/// Compute logic for a stage with at most one input and one output
/// register.
///
/// The engine fetches the input latch (void if the stage has no input),
/// allocates the output latch (void if no output), and commits both sides
/// after `compute` returns, unless a resource stall was declared or the
/// output register cannot accept work. A stage that must hold its input
/// for retry calls [`StageContext::set_resource_stall`].
pub trait SimpleStage {
    fn compute(&mut self, ctx: &mut StageContext<'_>, input: &Latch, output: &mut Latch);

    /// Resets any internal state of the stage logic.
    fn reset(&mut self) {}
}

/// Compute logic for a stage with more than one input or output register.
///
/// The automatic single-slot protocol cannot express multi-port
/// coordination, so the logic itself must read inputs, allocate output
/// latches, check `output_can_accept`, declare resource stalls, consume
/// the inputs it used, and write its outputs, all via the context.
pub trait ManualStage {
    fn compute(&mut self, ctx: &mut StageContext<'_>);

    /// Resets any internal state of the stage logic.
    fn reset(&mut self) {}
}

/// The capability of a stage, chosen at construction.
pub enum StageLogic {
    Simple(Box<dyn SimpleStage>),
    Manual(Box<dyn ManualStage>),
}

/// Transient per-cycle bookkeeping for one stage.
#[derive(Debug, Default)]
struct StageMeta {
    last_cycle: u64,
    resource_wait: bool,
    activity: Option<String>,
    status_words: Vec<String>,
    input_doing: Vec<String>,
    output_doing: Vec<String>,
}

impl StageMeta {
    fn begin_cycle(&mut self) {
        self.resource_wait = false;
        self.activity = None;
        self.status_words.clear();
        self.input_doing.clear();
        self.output_doing.clear();
    }
}

/// One pipeline stage: its logic plus the engine-side state driving the
/// evaluation protocol.
pub struct Stage {
    name: String,
    topo_order: usize,
    inputs: Vec<PipeRegId>,
    outputs: Vec<PipeRegId>,
    logic: StageLogic,
    meta: StageMeta,
}

impl Stage {
    pub(crate) fn new(
        name: &str,
        logic: StageLogic,
        inputs: Vec<PipeRegId>,
        outputs: Vec<PipeRegId>,
    ) -> Self {
        Self {
            name: name.to_string(),
            topo_order: 0,
            inputs,
            outputs,
            logic,
            meta: StageMeta::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deterministic iteration tag assigned by the builder.
    pub fn topo_order(&self) -> usize {
        self.topo_order
    }

    pub(crate) fn set_topo_order(&mut self, order: usize) {
        self.topo_order = order;
    }

    pub(crate) fn input_registers(&self) -> &[PipeRegId] {
        &self.inputs
    }

    pub(crate) fn output_registers(&self) -> &[PipeRegId] {
        &self.outputs
    }

    /// Evaluates this stage for the current cycle.
    ///
    /// A no-op if the stage has already been evaluated this cycle, which
    /// makes redundant invocations safe when stages pull from each other
    /// out of strict pipeline order.
    pub fn evaluate(&mut self, state: &mut CoreState) {
        if self.meta.last_cycle == state.cycle() {
            return;
        }
        self.meta.begin_cycle();

        match &mut self.logic {
            StageLogic::Simple(logic) => {
                let input = match self.inputs.first() {
                    Some(&id) => state.pipe_reg(id).read().clone(),
                    None => Latch::void(),
                };
                if input.instruction().is_valid() {
                    self.meta.activity = Some(input.instruction().to_string());
                }

                let mut output = match self.outputs.first() {
                    Some(&id) => state.pipe_reg(id).new_latch(),
                    None => Latch::void(),
                };

                let mut ctx = StageContext {
                    state,
                    meta: &mut self.meta,
                    name: &self.name,
                    inputs: &self.inputs,
                    outputs: &self.outputs,
                };
                logic.compute(&mut ctx, &input, &mut output);

                if ctx.meta.activity.is_none() && output.instruction().is_valid() {
                    ctx.meta.activity = Some(output.instruction().to_string());
                }

                let out_ready = self.outputs.is_empty() || ctx.output_can_accept(0);
                if !ctx.meta.resource_wait && out_ready {
                    if !self.inputs.is_empty() {
                        ctx.consumed_input(0);
                    }
                    if !self.outputs.is_empty() {
                        ctx.write_output(0, output);
                    }
                }
            }
            StageLogic::Manual(logic) => {
                let mut ctx = StageContext {
                    state,
                    meta: &mut self.meta,
                    name: &self.name,
                    inputs: &self.inputs,
                    outputs: &self.outputs,
                };
                logic.compute(&mut ctx);
            }
        }

        if self.meta.resource_wait {
            for &id in &self.outputs {
                state.pipe_reg_mut(id).write_bubble();
                state.stats.bubbles_injected += 1;
            }
            state.stats.stalls_data += 1;
        }

        if self.meta.activity.is_none() {
            self.meta.activity = Some(if !self.meta.input_doing.is_empty() {
                self.meta.input_doing.join(", ")
            } else if !self.meta.output_doing.is_empty() {
                self.meta.output_doing.join(", ")
            } else {
                String::from("----: NULL")
            });
        }

        self.meta.last_cycle = state.cycle();
    }

    /// Whether this stage declared a resource stall this cycle.
    pub fn waiting_on_resource(&self) -> bool {
        self.meta.resource_wait
    }

    /// Whether any input register holds a still-valid instruction.
    pub fn has_work_to_do(&self, state: &CoreState) -> bool {
        self.inputs
            .iter()
            .any(|&id| state.pipe_reg(id).read().instruction().is_valid())
    }

    /// Human-readable description of the work done this cycle.
    pub fn activity(&self) -> &str {
        self.meta.activity.as_deref().unwrap_or("----: NULL")
    }

    /// Joins the accumulated status words for display, appending resource
    /// and pending-work indicators. Purely observational.
    pub fn status(&self, state: &CoreState) -> String {
        let mut words = self.meta.status_words.clone();
        if self.waiting_on_resource() {
            words.push("ResourceWait".to_string());
        }
        if self.has_work_to_do(state) {
            words.push("HasWork".to_string());
        }
        words.join(", ")
    }

    /// Clears per-cycle bookkeeping and the stage logic's internal state.
    pub fn reset(&mut self) {
        self.meta = StageMeta::default();
        match &mut self.logic {
            StageLogic::Simple(logic) => logic.reset(),
            StageLogic::Manual(logic) => logic.reset(),
        }
    }
}

/// The shared-state handle passed to stage compute logic.
///
/// Bundles the core's shared state with the evaluating stage's port lists
/// and bookkeeping, so the engine stays free of hidden dependencies and
/// stages can be tested against synthetic cores.
pub struct StageContext<'a> {
    state: &'a mut CoreState,
    meta: &'a mut StageMeta,
    name: &'a str,
    inputs: &'a [PipeRegId],
    outputs: &'a [PipeRegId],
}

impl StageContext<'_> {
    /// Current cycle number.
    pub fn cycle(&self) -> u64 {
        self.state.cycle()
    }

    /// Reads input register `n` without consuming it.
    pub fn read_input(&self, n: usize) -> Latch {
        self.state.pipe_reg(self.inputs[n]).read().clone()
    }

    /// Marks input register `n` consumed and logs the work taken.
    pub fn consumed_input(&mut self, n: usize) {
        let reg = self.state.pipe_reg_mut(self.inputs[n]);
        if reg.read().instruction().is_valid() {
            self.meta.input_doing.push(reg.read().instruction().to_string());
        }
        reg.consume();
    }

    /// Whether output register `n` can take new work this cycle.
    pub fn output_can_accept(&self, n: usize) -> bool {
        self.state.pipe_reg(self.outputs[n]).can_accept_work()
    }

    /// Allocates a fresh writable latch for output register `n`.
    pub fn new_output(&self, n: usize) -> Latch {
        self.state.pipe_reg(self.outputs[n]).new_latch()
    }

    /// Allocates an explicitly invalid latch for output register `n`.
    pub fn invalid_output(&self, n: usize) -> Latch {
        self.state.pipe_reg(self.outputs[n]).bubble_latch()
    }

    /// Commits a produced latch to output register `n`, logging the work
    /// and any result it carries.
    pub fn write_output(&mut self, n: usize, latch: Latch) {
        let ins = latch.instruction();
        if ins.is_valid() {
            self.meta.output_doing.push(ins.to_string());
            if let (Some(reg), Some(value)) = (ins.result_register(), ins.result_value()) {
                self.meta.status_words.push(format!("R{reg}={value}"));
            }
        }
        self.state.pipe_reg_mut(self.outputs[n]).write(latch);
    }

    /// Declares a resource stall: neither input consumption nor output
    /// commit happens this cycle and all outputs are bubbled.
    pub fn set_resource_stall(&mut self, wait: bool) {
        self.meta.resource_wait = wait;
    }

    /// Adds a word to the stage's status line.
    pub fn add_status_word(&mut self, word: &str) {
        self.meta.status_words.push(word.to_string());
    }

    /// Overrides the stage's activity description for this cycle.
    pub fn set_activity(&mut self, activity: String) {
        self.meta.activity = Some(activity);
    }

    /// Committed register values plus pending-write flags.
    pub fn regs(&self) -> &RegisterFile {
        &self.state.regs
    }

    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.state.regs
    }

    /// Resolves operands from the register file. See
    /// [`forwarding::register_file_lookup`].
    pub fn register_file_lookup(&mut self, latch: &mut Latch) {
        forwarding::register_file_lookup(&self.state.regs, latch);
    }

    /// Runs the forwarding search on a duplicate of `input`. See
    /// [`forwarding::forwarding_search`].
    pub fn forwarding_search(&mut self, input: &Latch) -> Latch {
        forwarding::forwarding_search(self.state, input)
    }

    /// Applies posted forwarding records on `latch`. See
    /// [`forwarding::do_posted_forwarding`].
    pub fn do_posted_forwarding(&mut self, latch: &mut Latch) {
        forwarding::do_posted_forwarding(self.state, latch, self.name);
    }

    /// Appends a retired value to the core's output buffer.
    pub fn emit(&mut self, value: i64) {
        self.state.retired_output.push(value);
    }

    /// Requests that the simulation stop at the end of this cycle.
    pub fn request_halt(&mut self) {
        self.state.request_halt();
    }

    pub fn stats_mut(&mut self) -> &mut SimStats {
        &mut self.state.stats
    }
}
