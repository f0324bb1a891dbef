//! Demo five-stage scalar pipeline stage implementations.
//!
//! Fetch, Decode, Execute, Memory, and Writeback over the small load/store
//! ISA. Each stage implements the single-slot compute protocol; the engine
//! in [`crate::core::stage`] drives the consume/commit handshake.

/// Instruction fetch from the loaded program.
pub mod fetch;

/// Operand resolution and dispatch.
pub mod decode;

/// ALU evaluation and posted-forwarding pickup.
pub mod execute;

/// Data memory access.
pub mod memory_access;

/// Result commit and retirement.
pub mod write_back;

pub use decode::Decode;
pub use execute::Execute;
pub use fetch::Fetch;
pub use memory_access::MemoryAccess;
pub use write_back::WriteBack;
