//! JPEG 2000 decode-throughput harness.
//!
//! Loads a codestream once, validates its layout, and drives a pluggable
//! decode engine through repeated full-frame or striped pulls on one or more
//! worker threads, reporting decodes per second.

pub mod codestream_reader;
pub mod config;
pub mod decode_loop;
pub mod engine;
pub mod error;
pub mod fan_out;
pub mod harness;
pub mod image_format;
pub mod jpeg2000;
pub mod plane_buffer;
pub mod throughput;

pub use config::BenchConfig;
pub use decode_loop::{DecodeLoop, LoopTiming, PullStrategy};
pub use engine::{DecodeEngine, DecodeSession, DiagnosticSink, EngineKind, LogSink, StdoutSink};
pub use error::{PerfError, Result};
pub use fan_out::{FanOut, FanOutReport};
pub use harness::{BenchReport, run_benchmark, run_on_buffer};
pub use image_format::ImageDescriptor;
pub use plane_buffer::{PlaneBuffer, SampleWidth};
pub use throughput::Throughput;
