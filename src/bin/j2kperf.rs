//! j2kperf CLI - JPEG 2000 decode throughput measurement.
//!
//! Decodes one codestream repeatedly, on one or more threads, and prints
//! decodes per second.

use clap::{Parser, ValueEnum};
use j2kperf_rs::config::{DEFAULT_REPETITIONS, DEFAULT_THREADS};
use j2kperf_rs::plane_buffer::DEFAULT_MAX_STRIPE_ROWS;
use j2kperf_rs::{BenchConfig, BenchReport, EngineKind, PullStrategy, StdoutSink};
use std::path::PathBuf;

/// JPEG 2000 decode throughput tester
#[derive(Parser)]
#[command(name = "j2kperf")]
#[command(version)]
#[command(about = "Measures JPEG 2000 decode throughput", long_about = None)]
#[command(after_help = "EXAMPLES:
    j2kperf image.j2c
    j2kperf -r 200 -t 8 image.jp2
    j2kperf --striped --max-stripe 32 image.j2c
    j2kperf -e pattern image.j2c

Set RUST_LOG=debug for setup and per-thread timings.")]
struct Cli {
    /// Path to the input codestream (J2K/J2C or JP2)
    codestream: PathBuf,

    /// Decodes per thread
    #[arg(short, long, default_value_t = DEFAULT_REPETITIONS)]
    repetitions: u32,

    /// Worker threads decoding concurrently
    #[arg(short, long, default_value_t = DEFAULT_THREADS)]
    threads: usize,

    /// Pull stripes of the engine's recommended height instead of full frames
    #[arg(short, long)]
    striped: bool,

    /// Tallest stripe, in rows, for striped pulls
    #[arg(long, default_value_t = DEFAULT_MAX_STRIPE_ROWS)]
    max_stripe: u32,

    /// Decode engine (default: openjpeg when compiled in, else pattern)
    #[arg(short, long, value_enum)]
    engine: Option<Engine>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Engine {
    /// Deterministic pattern, no codec: measures harness overhead
    Pattern,
    /// OpenJPEG (build with --features openjpeg)
    Openjpeg,
}

impl From<Engine> for EngineKind {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Pattern => EngineKind::Pattern,
            Engine::Openjpeg => EngineKind::OpenJpeg,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = BenchConfig {
        codestream: cli.codestream,
        repetitions: cli.repetitions,
        threads: cli.threads,
        strategy: if cli.striped {
            PullStrategy::Striped {
                max_stripe_rows: cli.max_stripe,
            }
        } else {
            PullStrategy::FullFrame
        },
        engine: cli.engine.map_or_else(EngineKind::default_available, EngineKind::from),
    };

    match j2kperf_rs::run_benchmark(&config, &StdoutSink) {
        Ok(report) => print_report(&config, &report),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_report(config: &BenchConfig, report: &BenchReport) {
    println!("File:       {:?}", config.codestream);
    println!("Image:      {}", report.descriptor);
    if let Some(cod) = &report.coding_style {
        println!(
            "Coding:     {} levels, {} layers, {}, {}x{} code-blocks, {}",
            cod.decomposition_levels,
            cod.layers,
            cod.progression_name(),
            cod.code_block.0,
            cod.code_block.1,
            if cod.reversible { "5-3" } else { "9-7" }
        );
    }
    if report.high_throughput {
        println!("HTJ2K:      Yes");
    }
    println!(
        "Run:        {} engine, {} thread(s) x {} repetitions, {}",
        report.engine,
        config.threads,
        config.repetitions,
        match config.strategy {
            PullStrategy::FullFrame => "full-frame pulls".to_string(),
            PullStrategy::Striped { max_stripe_rows } => {
                format!("striped pulls (max {} rows)", max_stripe_rows)
            }
        }
    );
    println!("{}", report.throughput);
}
