//! Decode engine seam.
//!
//! The harness never decodes anything itself. An engine opens one session
//! per worker over the shared codestream; the session then delivers the
//! image as successive stripes into caller-owned planes. Engine diagnostics
//! go to the `DiagnosticSink` handed to `open_session`.

pub mod pattern;

#[cfg(feature = "openjpeg")]
pub mod openjpeg;

use crate::error::{PerfError, Result};
use crate::image_format::ImageDescriptor;
use crate::plane_buffer::PlaneBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Receives messages raised by a decode engine.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, engine: &'static str, severity: Severity, message: &str);
}

/// Relays engine messages to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl DiagnosticSink for StdoutSink {
    fn report(&self, engine: &'static str, severity: Severity, message: &str) {
        let tag = match severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        println!("[{}] {}: {}", engine, tag, message.trim_end());
    }
}

/// Relays engine messages through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, engine: &'static str, severity: Severity, message: &str) {
        match severity {
            Severity::Warning => log::warn!("[{}] {}", engine, message.trim_end()),
            Severity::Error => log::error!("[{}] {}", engine, message.trim_end()),
        }
    }
}

/// Result of one stripe pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripePull {
    /// Image rows delivered by this pull.
    pub rows: u32,
    /// True while the session still has rows to deliver.
    pub more: bool,
}

/// A decode backend shared by every worker thread.
pub trait DecodeEngine: Sync {
    fn name(&self) -> &'static str;

    /// Opens a session over `codestream`. All setup the engine needs before
    /// its first pull belongs here, outside the timed region.
    fn open_session<'a>(
        &'a self,
        codestream: &'a [u8],
        descriptor: &'a ImageDescriptor,
        sink: &'a dyn DiagnosticSink,
    ) -> Result<Box<dyn DecodeSession + 'a>>;
}

/// One decoder instance, owned by one thread.
pub trait DecodeSession {
    /// Stripe height, in image rows, the engine works best with.
    fn recommended_stripe_height(&self) -> u32;

    /// Seeks back to the start of the codestream and resets decode state so
    /// the next pull starts at image row 0.
    fn restart(&mut self) -> Result<()>;

    /// Decodes the next `max(1, min(rows, remaining))` image rows into the
    /// start of each plane. Once every row has been delivered the pull
    /// returns zero rows and `more == false`.
    fn pull_stripe(&mut self, planes: &mut [PlaneBuffer], rows: u32) -> Result<StripePull>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Codec-free reference pattern; measures harness overhead.
    Pattern,
    /// OpenJPEG through the `jpeg2k` crate.
    OpenJpeg,
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pattern => pattern::ENGINE_NAME,
            Self::OpenJpeg => "openjpeg",
        }
    }

    /// The codec-backed engine when compiled in, else the pattern engine.
    pub fn default_available() -> Self {
        if cfg!(feature = "openjpeg") {
            Self::OpenJpeg
        } else {
            Self::Pattern
        }
    }

    pub fn build(&self) -> Result<Box<dyn DecodeEngine>> {
        match self {
            Self::Pattern => Ok(Box::new(pattern::PatternEngine::default())),
            #[cfg(feature = "openjpeg")]
            Self::OpenJpeg => Ok(Box::new(openjpeg::OpenJpegEngine)),
            #[cfg(not(feature = "openjpeg"))]
            Self::OpenJpeg => Err(PerfError::EngineUnavailable(self.name())),
        }
    }
}

/// Relays `message` to `sink` and wraps it as a fatal engine error.
pub fn engine_failure(
    sink: &dyn DiagnosticSink,
    engine: &'static str,
    message: impl Into<String>,
) -> PerfError {
    let message = message.into();
    sink.report(engine, Severity::Error, &message);
    PerfError::Engine { engine, message }
}

/// Stripe bookkeeping shared by engines that emulate stripe delivery: tracks
/// the next image row and clamps requests to what remains.
#[derive(Debug, Clone, Copy)]
pub struct StripeCursor {
    next_row: u32,
    height: u32,
}

impl StripeCursor {
    pub fn new(height: u32) -> Self {
        Self {
            next_row: 0,
            height,
        }
    }

    pub fn rewind(&mut self) {
        self.next_row = 0;
    }

    pub fn next_row(&self) -> u32 {
        self.next_row
    }

    /// Claims the next stripe; returns `[y0, y1)` or `None` when exhausted.
    pub fn claim(&mut self, rows: u32) -> Option<(u32, u32)> {
        if self.next_row >= self.height {
            return None;
        }
        let y0 = self.next_row;
        let y1 = y0 + rows.clamp(1, self.height - y0);
        self.next_row = y1;
        Some((y0, y1))
    }

    pub fn finish(&self, rows: u32) -> StripePull {
        StripePull {
            rows,
            more: self.next_row < self.height,
        }
    }
}
