//! The latch: the unit of data carried between stages each cycle.
//!
//! A latch wraps one instruction plus the per-operand-slot pending
//! forwarding records used for same-cycle-to-next-cycle signaling. Latches
//! are plain values: a stage that needs to annotate one clones it first, so
//! the original held by a pipe register is never mutated.

use crate::core::instruction::{Instruction, OPERAND_SLOTS};
use crate::core::PipeRegId;

/// The per-cycle data packet passed between adjacent pipeline stages.
#[derive(Debug, Clone)]
pub struct Latch {
    ins: Instruction,
    pending_forwards: [Option<PipeRegId>; OPERAND_SLOTS],
}

impl Latch {
    /// The void latch: no instruction, no pending signals.
    ///
    /// Used as the input of a stage with no input register and the output
    /// of a stage with no output register.
    pub fn void() -> Self {
        Self {
            ins: Instruction::void(),
            pending_forwards: [None; OPERAND_SLOTS],
        }
    }

    /// An explicitly invalid latch, injected to represent "no instruction"
    /// passing through a stage.
    pub fn bubble() -> Self {
        Self::void()
    }

    /// Wraps an instruction in a fresh latch with no pending signals.
    pub fn from_instruction(ins: Instruction) -> Self {
        Self {
            ins,
            pending_forwards: [None; OPERAND_SLOTS],
        }
    }

    pub fn instruction(&self) -> &Instruction {
        &self.ins
    }

    pub fn instruction_mut(&mut self) -> &mut Instruction {
        &mut self.ins
    }

    /// Replaces the carried instruction, leaving pending signals untouched.
    pub fn set_instruction(&mut self, ins: Instruction) {
        self.ins = ins;
    }

    /// The forwarding source scheduled to resolve operand slot `n` next
    /// cycle, if one was posted.
    pub fn pending_forward(&self, n: usize) -> Option<PipeRegId> {
        self.pending_forwards[n]
    }

    /// Schedules operand slot `n` to be resolved from `source` next cycle.
    pub fn set_pending_forward(&mut self, n: usize, source: PipeRegId) {
        self.pending_forwards[n] = Some(source);
    }

    /// Clears the pending record for operand slot `n`.
    pub fn clear_pending_forward(&mut self, n: usize) {
        self.pending_forwards[n] = None;
    }

    /// Clears all pending forwarding records.
    pub fn clear_pending_forwards(&mut self) {
        self.pending_forwards = [None; OPERAND_SLOTS];
    }

    /// The register read by operand slot `n`, or `None` if that slot is not
    /// a register source for this instruction's opcode.
    ///
    /// Slot 0 counts as a source only when the opcode reads operand 0.
    pub fn source_register(&self, n: usize) -> Option<usize> {
        if n == 0 && !self.ins.opcode().oper0_is_source() {
            return None;
        }
        self.ins.operand(n).register_number()
    }

    /// Whether any register-source operand is still unresolved with no
    /// posted forwarding scheduled to resolve it.
    ///
    /// A stage seeing this must declare a resource stall rather than
    /// proceed with a missing value.
    pub fn has_unresolved_sources(&self) -> bool {
        (0..OPERAND_SLOTS).any(|n| {
            self.source_register(n).is_some()
                && !self.ins.operand(n).has_value()
                && self.pending_forwards[n].is_none()
        })
    }

    /// Whether any register-source operand still lacks a value, counting
    /// slots whose posted forwarding has not delivered yet.
    ///
    /// Stricter than [`has_unresolved_sources`](Self::has_unresolved_sources):
    /// a pending record is a promise, not a value, so a stage about to use
    /// operand values must consult this form.
    pub fn has_unready_sources(&self) -> bool {
        (0..OPERAND_SLOTS)
            .any(|n| self.source_register(n).is_some() && !self.ins.operand(n).has_value())
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::void()
    }
}
