//! Instruction and operand model.
//!
//! An [`Instruction`] is an immutable-per-cycle description of one in-flight
//! instruction: an opcode, three operand slots, and an optional result
//! (register number plus value) filled in as the instruction moves down the
//! pipeline. Operands carry their resolved values with them, so later stages
//! never have to reach back into the register file.

use std::fmt;

/// Number of operand slots on an instruction (oper0, src1, src2).
pub const OPERAND_SLOTS: usize = 3;

/// Opcodes understood by the demo pipeline.
///
/// `Nop` doubles as the encoding of the void instruction: a `Nop` with the
/// validity flag clear means "no instruction here".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// No operation.
    Nop,
    /// Move a constant into a register.
    Movc,
    /// Integer addition.
    Add,
    /// Integer subtraction.
    Sub,
    /// Integer multiplication.
    Mul,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Load a word from data memory.
    Load,
    /// Store a word to data memory.
    Store,
    /// Emit a register value to the simulation output.
    Out,
    /// Stop the simulation once this instruction retires.
    Halt,
}

impl Opcode {
    /// Whether operand 0 is read by this opcode rather than written.
    ///
    /// Operand 0 is the destination for most opcodes, but stores and `OUT`
    /// read it (the value to store or emit). Hazard resolution must consult
    /// this before treating operand 0 as a source.
    pub fn oper0_is_source(self) -> bool {
        matches!(self, Self::Store | Self::Out)
    }

    /// Whether this opcode produces a register result.
    pub fn writes_register(self) -> bool {
        matches!(
            self,
            Self::Movc
                | Self::Add
                | Self::Sub
                | Self::Mul
                | Self::And
                | Self::Or
                | Self::Xor
                | Self::Load
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = match self {
            Self::Nop => "NOP",
            Self::Movc => "MOVC",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Load => "LOAD",
            Self::Store => "STORE",
            Self::Out => "OUT",
            Self::Halt => "HALT",
        };
        f.write_str(mnemonic)
    }
}

/// One operand slot: a register reference or a literal, plus the resolved
/// value once lookup or forwarding has supplied it.
///
/// Invariant: once a value has been set it is never overwritten within the
/// same cycle; callers skip slots that already carry a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operand {
    reg: Option<usize>,
    value: Option<i64>,
}

impl Operand {
    /// An unused operand slot.
    pub fn none() -> Self {
        Self::default()
    }

    /// A reference to register `n`, value not yet resolved.
    pub fn register(n: usize) -> Self {
        Self {
            reg: Some(n),
            value: None,
        }
    }

    /// A literal value (no register reference).
    pub fn immediate(value: i64) -> Self {
        Self {
            reg: None,
            value: Some(value),
        }
    }

    /// The register this operand refers to, if any.
    pub fn register_number(&self) -> Option<usize> {
        self.reg
    }

    /// The resolved value, if one has been supplied.
    pub fn value(&self) -> Option<i64> {
        self.value
    }

    /// Whether a value has been resolved for this operand.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Supplies the resolved value for this operand.
    pub fn set_value(&mut self, value: i64) {
        debug_assert!(
            self.value.is_none(),
            "operand value overwritten within a cycle"
        );
        self.value = Some(value);
    }
}

/// An in-flight instruction.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    opcode: Opcode,
    addr: u64,
    operands: [Operand; OPERAND_SLOTS],
    result_reg: Option<usize>,
    result_value: Option<i64>,
    valid: bool,
}

impl Instruction {
    /// Creates a valid instruction at program address `addr`.
    pub fn new(opcode: Opcode, addr: u64, oper0: Operand, src1: Operand, src2: Operand) -> Self {
        Self {
            opcode,
            addr,
            operands: [oper0, src1, src2],
            result_reg: None,
            result_value: None,
            valid: true,
        }
    }

    /// The void instruction: always invalid, never carries a result.
    pub fn void() -> Self {
        Self {
            opcode: Opcode::Nop,
            addr: 0,
            operands: [Operand::none(); OPERAND_SLOTS],
            result_reg: None,
            result_value: None,
            valid: false,
        }
    }

    /// Whether this is a real instruction rather than the void filler.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Program address this instruction was fetched from.
    pub fn addr(&self) -> u64 {
        self.addr
    }

    pub fn oper0(&self) -> &Operand {
        &self.operands[0]
    }

    pub fn src1(&self) -> &Operand {
        &self.operands[1]
    }

    pub fn src2(&self) -> &Operand {
        &self.operands[2]
    }

    /// Operand slot `n` (0 = oper0, 1 = src1, 2 = src2).
    pub fn operand(&self, n: usize) -> &Operand {
        &self.operands[n]
    }

    pub fn operand_mut(&mut self, n: usize) -> &mut Operand {
        &mut self.operands[n]
    }

    /// The register this instruction will write, once known.
    pub fn result_register(&self) -> Option<usize> {
        self.result_reg
    }

    /// The computed result value, once known.
    pub fn result_value(&self) -> Option<i64> {
        self.result_value
    }

    /// Records the destination register before the value is available.
    pub fn set_result_register(&mut self, reg: usize) {
        self.result_reg = Some(reg);
    }

    /// Records the computed result value.
    pub fn set_result_value(&mut self, value: i64) {
        self.result_value = Some(value);
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::void()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return write!(f, "----: NULL");
        }
        write!(f, "{:04}: {}", self.addr, self.opcode)?;
        for (n, oper) in self.operands.iter().enumerate() {
            let sep = if n == 0 { ' ' } else { ',' };
            match (oper.register_number(), oper.value()) {
                (Some(reg), _) => write!(f, "{sep}R{reg}")?,
                (None, Some(value)) => write!(f, "{sep}#{value}")?,
                (None, None) => break,
            }
        }
        Ok(())
    }
}
