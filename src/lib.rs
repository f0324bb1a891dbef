//! Cycle-Accurate Pipelined Core Simulator Library.
//!
//! This crate implements a cycle-accurate simulator for a single-issue,
//! in-order pipelined processor core. The heart of the crate is a generic
//! stage-evaluation engine: stages exchange latches through buffered pipe
//! registers, data hazards are resolved by a register-file lookup plus a
//! priority-ordered forwarding network, and unresolved hazards are handled
//! with stalls and bubble injection rather than errors.
//!
//! # Architecture
//!
//! * **Engine**: per-cycle stage evaluation with an idempotence guard,
//!   master/slave pipe registers, and a stall/bubble handshake.
//! * **Hazards**: register-file lookup, immediate forwarding, and posted
//!   (next-cycle) forwarding from named pipe registers.
//! * **Demo core**: a five-stage scalar pipeline (Fetch, Decode, Execute,
//!   Memory, Writeback) over a small load/store ISA.
//!
//! # Modules
//!
//! * `common`: shared error types.
//! * `config`: configuration loading and parsing.
//! * `core`: the pipeline engine and the demo stage implementations.
//! * `sim`: program loader and pipeline topology wiring.
//! * `stats`: simulation statistics collection.

/// Shared error types for construction and program parsing.
///
/// Configuration errors (bad wiring, unknown register names) are fatal and
/// surface here. Hazard conditions are part of normal simulation and only
/// appear in stage status strings, never as errors.
pub mod common;

/// Configuration system for core, memory, and pipeline settings.
///
/// Loads and parses TOML configuration files to customize simulator
/// behavior for different simulation scenarios.
pub mod config;

/// Pipeline engine implementation.
///
/// Implements the instruction/operand model, latches, pipe registers, the
/// register file with pending-write tracking, the forwarding network, the
/// stage-evaluation engine, and the core orchestrator plus builder.
pub mod core;

/// Simulation harness: program loader and pipeline topology wiring.
///
/// Parses text programs into instructions and wires the demo five-stage
/// scalar pipeline onto the engine.
pub mod sim;

/// Performance statistics collection and reporting.
///
/// Tracks cycle counts, retired instructions, stalls, and forwarding
/// activity during simulation execution.
pub mod stats;
