//! Fork-join replication of the decode loop over worker threads.
//!
//! Every worker opens its own session and planes over the shared codestream,
//! then waits at a barrier with the coordinator. The coordinator starts the
//! wall clock when the barrier releases and stops it after the last join.
//! A panic during setup is caught before the barrier. If any worker fails
//! setup, no worker enters its timed loop.

use crate::decode_loop::{DecodeLoop, LoopTiming, PullStrategy};
use crate::engine::{DecodeEngine, DiagnosticSink};
use crate::error::{PerfError, Result};
use crate::image_format::ImageDescriptor;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Results of one fan-out run, available only once every worker joined.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutReport {
    /// One entry per worker, in spawn order.
    pub threads: Vec<LoopTiming>,
    /// From barrier release to the last join.
    pub wall: Duration,
}

pub struct FanOut<'a> {
    pub engine: &'a dyn DecodeEngine,
    pub codestream: &'a [u8],
    pub descriptor: &'a ImageDescriptor,
    pub strategy: PullStrategy,
    pub sink: &'a dyn DiagnosticSink,
}

impl FanOut<'_> {
    pub fn run(&self, threads: usize, repetitions: u32) -> Result<FanOutReport> {
        if threads == 0 {
            return Err(PerfError::InvalidConfig("thread count must be at least 1"));
        }
        let barrier = Barrier::new(threads + 1);
        let setup_failed = AtomicBool::new(false);

        std::thread::scope(|scope| -> Result<FanOutReport> {
            let handles: Vec<_> = (0..threads)
                .map(|index| {
                    let barrier = &barrier;
                    let setup_failed = &setup_failed;
                    scope.spawn(move || -> Result<Option<LoopTiming>> {
                        let prepared = panic::catch_unwind(AssertUnwindSafe(|| {
                            DecodeLoop::new(
                                self.engine,
                                self.codestream,
                                self.descriptor,
                                self.strategy,
                                self.sink,
                            )
                        }))
                        .unwrap_or(Err(PerfError::WorkerPanicked(index)));
                        if prepared.is_err() {
                            setup_failed.store(true, Ordering::SeqCst);
                        }
                        // Reached even when setup failed so the coordinator
                        // never waits on a missing worker.
                        barrier.wait();
                        let mut decode_loop = prepared?;
                        if setup_failed.load(Ordering::SeqCst) {
                            log::debug!("worker {}: skipped, another worker failed setup", index);
                            return Ok(None);
                        }
                        let timing = decode_loop.run(repetitions)?;
                        log::debug!(
                            "worker {}: {} repetitions in {:?}",
                            index,
                            timing.repetitions,
                            timing.elapsed
                        );
                        Ok(Some(timing))
                    })
                })
                .collect();

            barrier.wait();
            let start = Instant::now();

            let joined: Vec<Result<Option<LoopTiming>>> = handles
                .into_iter()
                .enumerate()
                .map(|(index, handle)| {
                    handle
                        .join()
                        .unwrap_or(Err(PerfError::WorkerPanicked(index)))
                })
                .collect();
            let wall = start.elapsed();

            // A skipped worker reports nothing; the worker whose setup
            // failed carries the error.
            let mut timings = Vec::with_capacity(threads);
            for outcome in joined {
                if let Some(timing) = outcome? {
                    timings.push(timing);
                }
            }
            Ok(FanOutReport {
                threads: timings,
                wall,
            })
        })
    }
}
