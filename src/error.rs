use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PerfError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Input is neither a JPEG 2000 codestream nor a JP2 file")]
    NotACodestream,
    #[error("Codestream truncated at byte {0}")]
    TruncatedCodestream(usize),
    #[error("Malformed codestream: {0}")]
    MalformedCodestream(&'static str),
    #[error("Unsupported number of components {count} (expected {min} to {max})")]
    UnsupportedComponentCount { count: usize, min: usize, max: usize },
    #[error("Component {component} has bit depth {depth}, expected {expected} like component 0")]
    MixedBitDepth {
        component: usize,
        depth: u8,
        expected: u8,
    },
    #[error("Unsupported bit depth {0} (expected 1 to 16)")]
    UnsupportedBitDepth(u8),
    #[error("Component {0} holds signed samples, only unsigned samples are supported")]
    SignedComponent(usize),
    #[error("Unsupported subsampling {dx}x{dy} on component {component}: {reason}")]
    UnsupportedSubsampling {
        component: usize,
        dx: u8,
        dy: u8,
        reason: &'static str,
    },
    #[error("Plane {plane} of {width}x{rows} samples does not fit in memory")]
    PlaneTooLarge { plane: usize, width: u32, rows: u32 },
    #[error("Failed to allocate {bytes} bytes for an output plane")]
    PlaneAllocation { bytes: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("Decode engine '{engine}' failed: {message}")]
    Engine {
        engine: &'static str,
        message: String,
    },
    #[error("Decode engine '{0}' is not available in this build")]
    EngineUnavailable(&'static str),
    #[error("Stripes covered {pulled} rows, image height is {expected}")]
    StripeAccounting { expected: u32, pulled: u32 },
    #[error("Worker thread {0} panicked")]
    WorkerPanicked(usize),
}

pub type Result<T, E = PerfError> = std::result::Result<T, E>;
