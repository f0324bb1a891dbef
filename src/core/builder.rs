//! Pipeline topology construction and validation.
//!
//! The builder registers pipe registers by name, wires stages to them, and
//! registers forwarding sources. Wiring defects (duplicate or unknown
//! names, dangling registers, shared ports) are configuration errors that
//! abort construction; they are never simulated conditions.
//!
//! The evaluation order is derived topologically with consumers before
//! producers, so that within a cycle a producer's `can_accept_work` check
//! observes its consumer's consumption of the previous latch.

use crate::common::BuildError;
use crate::core::pipe_reg::PipeRegister;
use crate::core::stage::{ManualStage, SimpleStage, Stage, StageLogic};
use crate::core::{Core, CoreState, PipeRegId};

/// Builder for a [`Core`] and its pipeline topology.
pub struct CoreBuilder {
    state: CoreState,
    stages: Vec<Stage>,
}

impl CoreBuilder {
    /// Starts a pipeline over a register file of `registers` registers.
    pub fn new(registers: usize) -> Self {
        Self {
            state: CoreState::new(registers, false),
            stages: Vec::new(),
        }
    }

    /// Enables the forwarding trace side channel.
    pub fn trace_forwarding(mut self, on: bool) -> Self {
        self.state.trace_forwarding = on;
        self
    }

    /// Registers a pipe register under a unique name.
    pub fn pipe_register(&mut self, name: &str) -> Result<PipeRegId, BuildError> {
        if self.state.pipe_reg_id(name).is_some() {
            return Err(BuildError::DuplicatePipeRegister(name.to_string()));
        }
        Ok(self.state.add_pipe_reg(PipeRegister::new(name)))
    }

    /// Registers a pipe register as a forwarding source.
    ///
    /// Registration order is priority order: callers must register the
    /// source holding the freshest result for a register first, because
    /// the forwarding search takes the first match.
    pub fn forwarding_source(&mut self, name: &str) -> Result<(), BuildError> {
        let id = self
            .state
            .pipe_reg_id(name)
            .ok_or_else(|| BuildError::UnknownPipeRegister(name.to_string()))?;
        self.state.add_forwarding_source(id);
        Ok(())
    }

    /// Adds a stage with at most one input and one output register.
    ///
    /// The single-slot arity is enforced by the signature, so the engine's
    /// automatic consume/commit protocol always applies to these stages.
    pub fn simple_stage(
        &mut self,
        name: &str,
        logic: Box<dyn SimpleStage>,
        input: Option<PipeRegId>,
        output: Option<PipeRegId>,
    ) -> Result<(), BuildError> {
        self.check_stage_name(name)?;
        self.stages.push(Stage::new(
            name,
            StageLogic::Simple(logic),
            input.into_iter().collect(),
            output.into_iter().collect(),
        ));
        Ok(())
    }

    /// Adds a stage that coordinates multiple input or output registers
    /// itself.
    pub fn manual_stage(
        &mut self,
        name: &str,
        logic: Box<dyn ManualStage>,
        inputs: Vec<PipeRegId>,
        outputs: Vec<PipeRegId>,
    ) -> Result<(), BuildError> {
        self.check_stage_name(name)?;
        self.stages
            .push(Stage::new(name, StageLogic::Manual(logic), inputs, outputs));
        Ok(())
    }

    fn check_stage_name(&self, name: &str) -> Result<(), BuildError> {
        if self.stages.iter().any(|s| s.name() == name) {
            return Err(BuildError::DuplicateStage(name.to_string()));
        }
        Ok(())
    }

    /// Validates the wiring and produces the core.
    pub fn build(mut self) -> Result<Core, BuildError> {
        self.check_register_wiring()?;
        let order = self.evaluation_order();
        for (pos, &idx) in order.iter().enumerate() {
            self.stages[idx].set_topo_order(pos);
        }
        Ok(Core::new(self.state, self.stages, order))
    }

    /// Every pipe register must be written by exactly one stage and read
    /// by exactly one stage.
    fn check_register_wiring(&self) -> Result<(), BuildError> {
        for (idx, reg) in self.state.pipe_regs.iter().enumerate() {
            let id = PipeRegId(idx);
            let producers = self
                .stages
                .iter()
                .filter(|s| s.output_registers().contains(&id))
                .count();
            let consumers = self
                .stages
                .iter()
                .filter(|s| s.input_registers().contains(&id))
                .count();
            if producers == 0 {
                return Err(BuildError::UnwrittenPipeRegister(reg.name().to_string()));
            }
            if consumers == 0 {
                return Err(BuildError::UnreadPipeRegister(reg.name().to_string()));
            }
            if producers > 1 || consumers > 1 {
                return Err(BuildError::SharedPipeRegister(reg.name().to_string()));
            }
        }
        Ok(())
    }

    /// Topological evaluation order, consumers first.
    ///
    /// Builds the producer-to-consumer stage graph, orders producers before
    /// consumers with Kahn's algorithm (ties broken by insertion order),
    /// then reverses. Stages left over by a cyclic topology are appended in
    /// insertion order before the reversal, so they lead the final order in
    /// reverse insertion order. The placement is still deterministic, which
    /// is all the evaluation order requires.
    fn evaluation_order(&self) -> Vec<usize> {
        let n = self.stages.len();
        let mut successors = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];

        for (p, producer) in self.stages.iter().enumerate() {
            for &reg in producer.output_registers() {
                for (c, consumer) in self.stages.iter().enumerate() {
                    if consumer.input_registers().contains(&reg) {
                        successors[p].push(c);
                        in_degree[c] += 1;
                    }
                }
            }
        }

        let mut order = Vec::with_capacity(n);
        let mut placed = vec![false; n];
        loop {
            let Some(next) = (0..n).find(|&i| !placed[i] && in_degree[i] == 0) else {
                break;
            };
            placed[next] = true;
            order.push(next);
            for &succ in &successors[next] {
                in_degree[succ] -= 1;
            }
        }
        for i in 0..n {
            if !placed[i] {
                order.push(i);
            }
        }

        order.reverse();
        order
    }
}
