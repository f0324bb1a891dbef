//! Error types.
//!
//! Only configuration errors live here: wiring defects discovered at
//! construction and malformed program text. Hazard conditions (unresolved
//! dependencies, busy output registers) are expected simulation behavior,
//! handled by the stall/bubble mechanism, and never raised as errors.

use thiserror::Error;

/// A pipeline wiring defect. Fatal: construction aborts immediately.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("duplicate pipe register name '{0}'")]
    DuplicatePipeRegister(String),

    #[error("duplicate stage name '{0}'")]
    DuplicateStage(String),

    #[error("unknown pipe register '{0}'")]
    UnknownPipeRegister(String),

    #[error("pipe register '{0}' has no producing stage")]
    UnwrittenPipeRegister(String),

    #[error("pipe register '{0}' has no consuming stage")]
    UnreadPipeRegister(String),

    #[error("pipe register '{0}' is wired to more than one producer or consumer")]
    SharedPipeRegister(String),

    #[error("program references R{reg} but the register file has {count} registers")]
    RegisterOutOfRange { reg: usize, count: usize },
}

/// A malformed line in a program file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: unknown mnemonic '{found}'")]
    UnknownMnemonic { line: usize, found: String },

    #[error("line {line}: {mnemonic} takes {expected} operand(s)")]
    WrongArity {
        line: usize,
        mnemonic: String,
        expected: usize,
    },

    #[error("line {line}: expected {expected}, found '{found}'")]
    BadOperand {
        line: usize,
        expected: &'static str,
        found: String,
    },
}
