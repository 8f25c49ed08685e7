//! Repeated decode of one codestream through one engine session.

use crate::engine::{DecodeEngine, DecodeSession, DiagnosticSink};
use crate::error::{PerfError, Result};
use crate::image_format::ImageDescriptor;
use crate::plane_buffer::{DEFAULT_MAX_STRIPE_ROWS, PlaneBuffer, allocate_planes};
use std::time::{Duration, Instant};

/// How each repetition pulls the image out of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStrategy {
    /// One pull of the whole image height.
    FullFrame,
    /// Successive stripes of the engine's recommended height, never taller
    /// than `max_stripe_rows`; planes are sized for one stripe.
    Striped { max_stripe_rows: u32 },
}

impl PullStrategy {
    pub fn striped() -> Self {
        Self::Striped {
            max_stripe_rows: DEFAULT_MAX_STRIPE_ROWS,
        }
    }
}

/// Timing of one decode loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopTiming {
    pub repetitions: u32,
    pub elapsed: Duration,
}

impl LoopTiming {
    pub fn average_per_repetition(&self) -> Duration {
        if self.repetitions == 0 {
            return Duration::ZERO;
        }
        self.elapsed / self.repetitions
    }

    pub fn decodes_per_second(&self) -> f64 {
        self.repetitions as f64 / self.elapsed.as_secs_f64()
    }
}

pub struct DecodeLoop<'a> {
    session: Box<dyn DecodeSession + 'a>,
    planes: Vec<PlaneBuffer>,
    height: u32,
    stripe_rows: u32,
}

impl<'a> DecodeLoop<'a> {
    /// Opens the engine session and allocates the planes. Nothing here is
    /// timed.
    pub fn new(
        engine: &'a dyn DecodeEngine,
        codestream: &'a [u8],
        descriptor: &'a ImageDescriptor,
        strategy: PullStrategy,
        sink: &'a dyn DiagnosticSink,
    ) -> Result<Self> {
        let session = engine.open_session(codestream, descriptor, sink)?;
        let stripe_rows = match strategy {
            PullStrategy::FullFrame => descriptor.height,
            PullStrategy::Striped { max_stripe_rows } => {
                if max_stripe_rows == 0 {
                    return Err(PerfError::InvalidConfig("stripe height must be at least 1"));
                }
                session
                    .recommended_stripe_height()
                    .clamp(1, max_stripe_rows.min(descriptor.height))
            }
        };
        let planes = allocate_planes(descriptor, stripe_rows)?;
        log::debug!(
            "{}: {:?} pulls of {} rows into {} plane(s), {} bytes",
            engine.name(),
            strategy,
            stripe_rows,
            planes.len(),
            planes.iter().map(PlaneBuffer::byte_len).sum::<usize>()
        );

        Ok(Self {
            session,
            planes,
            height: descriptor.height,
            stripe_rows,
        })
    }

    /// Rows requested per pull.
    pub fn stripe_rows(&self) -> u32 {
        self.stripe_rows
    }

    pub fn planes(&self) -> &[PlaneBuffer] {
        &self.planes
    }

    /// Restarts the session and pulls the whole image once. Returns the
    /// stripe heights delivered, which always sum to the image height.
    pub fn run_repetition(&mut self) -> Result<Vec<u32>> {
        let mut stripes = Vec::new();
        self.repetition(|rows| stripes.push(rows))?;
        Ok(stripes)
    }

    /// Runs `repetitions` restart-and-pull cycles and times them as a whole.
    pub fn run(&mut self, repetitions: u32) -> Result<LoopTiming> {
        let start = Instant::now();
        for _ in 0..repetitions {
            self.repetition(|_| {})?;
        }
        Ok(LoopTiming {
            repetitions,
            elapsed: start.elapsed(),
        })
    }

    fn repetition(&mut self, mut on_stripe: impl FnMut(u32)) -> Result<()> {
        self.session.restart()?;
        let mut pulled = 0u32;
        loop {
            let pull = self.session.pull_stripe(&mut self.planes, self.stripe_rows)?;
            if pull.rows > 0 {
                pulled += pull.rows;
                on_stripe(pull.rows);
            }
            if !pull.more || pull.rows == 0 {
                break;
            }
        }
        if pulled != self.height {
            return Err(PerfError::StripeAccounting {
                expected: self.height,
                pulled,
            });
        }
        Ok(())
    }
}
