//! Simulation harness: program loading and pipeline topology wiring.
//!
//! The pipeline topology is a driver concern: the engine knows nothing
//! about which stages exist or which registers forward. This module wires
//! the demo five-stage scalar pipeline and encodes its one topology
//! decision: forwarding sources are registered nearest-to-execute first
//! (`ExecuteToMemory` before `MemoryToWriteback`), because the youngest
//! in-flight producer of a register holds its freshest value and the
//! search takes the first match.

/// Text program parser.
pub mod loader;

use crate::common::BuildError;
use crate::config::Config;
use crate::core::stages::{Decode, Execute, Fetch, MemoryAccess, WriteBack};
use crate::core::{Core, CoreBuilder, Instruction};

/// Wires the five-stage scalar pipeline around `program`.
///
/// Fetch → Decode → Execute → Memory → Writeback, connected by the
/// `FetchToDecode`, `DecodeToExecute`, `ExecuteToMemory`, and
/// `MemoryToWriteback` pipe registers. The two downstream registers act as
/// forwarding sources unless forwarding is disabled in the configuration,
/// in which case every hazard is resolved by stalling.
pub fn build_scalar_pipeline(
    program: Vec<Instruction>,
    config: &Config,
) -> Result<Core, BuildError> {
    let registers = config.core.registers;
    if let Some(reg) = loader::max_register(&program) {
        if reg >= registers {
            return Err(BuildError::RegisterOutOfRange {
                reg,
                count: registers,
            });
        }
    }

    let mut builder =
        CoreBuilder::new(registers).trace_forwarding(config.general.trace_forwarding);

    let if_id = builder.pipe_register("FetchToDecode")?;
    let id_ex = builder.pipe_register("DecodeToExecute")?;
    let ex_mem = builder.pipe_register("ExecuteToMemory")?;
    let mem_wb = builder.pipe_register("MemoryToWriteback")?;

    if config.pipeline.forwarding {
        builder.forwarding_source("ExecuteToMemory")?;
        builder.forwarding_source("MemoryToWriteback")?;
    }

    builder.simple_stage("Fetch", Box::new(Fetch::new(program)), None, Some(if_id))?;
    builder.simple_stage("Decode", Box::new(Decode), Some(if_id), Some(id_ex))?;
    builder.simple_stage("Execute", Box::new(Execute), Some(id_ex), Some(ex_mem))?;
    builder.simple_stage(
        "Memory",
        Box::new(MemoryAccess::new(config.core.memory_words)),
        Some(ex_mem),
        Some(mem_wb),
    )?;
    builder.simple_stage("Writeback", Box::new(WriteBack), Some(mem_wb), None)?;

    builder.build()
}
