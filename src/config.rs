use crate::decode_loop::PullStrategy;
use crate::engine::EngineKind;
use crate::error::{PerfError, Result};
use std::path::PathBuf;

pub const DEFAULT_REPETITIONS: u32 = 1000;
pub const DEFAULT_THREADS: usize = 1;

/// Parameters of one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub codestream: PathBuf,
    pub repetitions: u32,
    pub threads: usize,
    pub strategy: PullStrategy,
    pub engine: EngineKind,
}

impl BenchConfig {
    pub fn new(codestream: impl Into<PathBuf>) -> Self {
        Self {
            codestream: codestream.into(),
            repetitions: DEFAULT_REPETITIONS,
            threads: DEFAULT_THREADS,
            strategy: PullStrategy::FullFrame,
            engine: EngineKind::default_available(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.repetitions == 0 {
            return Err(PerfError::InvalidConfig("repetitions must be at least 1"));
        }
        if self.threads == 0 {
            return Err(PerfError::InvalidConfig("thread count must be at least 1"));
        }
        if let PullStrategy::Striped { max_stripe_rows: 0 } = self.strategy {
            return Err(PerfError::InvalidConfig("stripe height must be at least 1"));
        }
        Ok(())
    }
}
