//! End-to-end benchmark run: load, validate, fan out, aggregate.

use crate::config::BenchConfig;
use crate::engine::DiagnosticSink;
use crate::error::{PerfError, Result};
use crate::fan_out::FanOut;
use crate::image_format::ImageDescriptor;
use crate::jpeg2000::locate_codestream;
use crate::jpeg2000::parser::{CodingStyle, parse_main_header};
use crate::throughput::Throughput;
use std::fs;

#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub engine: &'static str,
    pub descriptor: ImageDescriptor,
    pub coding_style: Option<CodingStyle>,
    pub high_throughput: bool,
    pub throughput: Throughput,
}

/// Runs the benchmark described by `config` over the file it names.
pub fn run_benchmark(config: &BenchConfig, sink: &dyn DiagnosticSink) -> Result<BenchReport> {
    config.validate()?;
    let data = fs::read(&config.codestream).map_err(|source| PerfError::Io {
        path: config.codestream.clone(),
        source,
    })?;
    log::info!("Loaded {:?} ({} bytes)", config.codestream, data.len());
    run_on_buffer(config, &data, sink)
}

/// Runs the benchmark over an already loaded file.
pub fn run_on_buffer(
    config: &BenchConfig,
    data: &[u8],
    sink: &dyn DiagnosticSink,
) -> Result<BenchReport> {
    config.validate()?;
    let codestream = locate_codestream(data)?;
    let header = parse_main_header(codestream)?;
    let descriptor = ImageDescriptor::from_header(&header)?;
    log::info!("{}", descriptor);

    let engine = config.engine.build()?;
    let fan_out = FanOut {
        engine: engine.as_ref(),
        codestream,
        descriptor: &descriptor,
        strategy: config.strategy,
        sink,
    };
    let report = fan_out.run(config.threads, config.repetitions)?;
    let throughput =
        Throughput::from_fan_out(&report, config.repetitions, descriptor.total_bits());

    Ok(BenchReport {
        engine: engine.name(),
        coding_style: header.coding_style,
        high_throughput: header.high_throughput,
        descriptor,
        throughput,
    })
}
