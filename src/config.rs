use serde::Deserialize;

const DEFAULT_MAX_CYCLES: u64 = 100_000;
const DEFAULT_REGISTERS: usize = 16;
const DEFAULT_MEMORY_WORDS: usize = 256;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,

    #[serde(default)]
    pub trace_forwarding: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            trace_forwarding: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CoreConfig {
    #[serde(default = "default_registers")]
    pub registers: usize,

    #[serde(default = "default_memory_words")]
    pub memory_words: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            registers: DEFAULT_REGISTERS,
            memory_words: DEFAULT_MEMORY_WORDS,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_forwarding")]
    pub forwarding: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { forwarding: true }
    }
}

fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}

fn default_registers() -> usize {
    DEFAULT_REGISTERS
}

fn default_memory_words() -> usize {
    DEFAULT_MEMORY_WORDS
}

fn default_forwarding() -> bool {
    true
}
