//! Fetch stage: feeds program instructions into the pipeline.

use crate::core::instruction::Instruction;
use crate::core::latch::Latch;
use crate::core::stage::{SimpleStage, StageContext};

/// Owns the program and the program counter. Emits one instruction per
/// cycle while the downstream register accepts work; holds the program
/// counter otherwise so the same instruction is offered again next cycle.
pub struct Fetch {
    program: Vec<Instruction>,
    pc: usize,
}

impl Fetch {
    pub fn new(program: Vec<Instruction>) -> Self {
        Self { program, pc: 0 }
    }

    /// Current program counter, for diagnostics.
    pub fn pc(&self) -> usize {
        self.pc
    }
}

impl SimpleStage for Fetch {
    fn compute(&mut self, ctx: &mut StageContext<'_>, _input: &Latch, output: &mut Latch) {
        if !ctx.output_can_accept(0) {
            return;
        }
        let Some(&ins) = self.program.get(self.pc) else {
            return;
        };
        output.set_instruction(ins);
        self.pc += 1;
    }

    fn reset(&mut self) {
        self.pc = 0;
    }
}
