//! Codestream builders and instrumented engines shared by the integration
//! tests.

#![allow(dead_code)]

use j2kperf_rs::engine::{StripeCursor, StripePull};
use j2kperf_rs::{DecodeEngine, DecodeSession, DiagnosticSink, ImageDescriptor, PlaneBuffer, Result};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// SOC + SIZ + SOT + EOC for an image area of `width` x `height` with one
/// `(depth, dx, dy)` entry per component.
pub fn codestream(width: u32, height: u32, comps: &[(u8, u8, u8)]) -> Vec<u8> {
    let mut out = vec![0xFF, 0x4F, 0xFF, 0x51];
    out.extend_from_slice(&((38 + 3 * comps.len()) as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    for v in [width, height, 0, 0, width, height, 0, 0] {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out.extend_from_slice(&(comps.len() as u16).to_be_bytes());
    for &(depth, dx, dy) in comps {
        out.extend_from_slice(&[depth - 1, dx, dy]);
    }
    out.extend_from_slice(&[0xFF, 0x90, 0x00, 0x0A, 0, 0, 0, 0, 0, 0, 0, 1]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// Wraps `codestream` in a minimal JP2 file.
pub fn jp2(codestream: &[u8]) -> Vec<u8> {
    let mut out = b"\x00\x00\x00\x0CjP  \r\n\x87\n".to_vec();
    let ftyp = b"jp2 \x00\x00\x00\x00jp2 ";
    out.extend_from_slice(&((ftyp.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(b"ftyp");
    out.extend_from_slice(ftyp);
    out.extend_from_slice(&((codestream.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(b"jp2c");
    out.extend_from_slice(codestream);
    out
}

/// Collects every diagnostic it receives.
#[derive(Default)]
pub struct CaptureSink(pub Mutex<Vec<String>>);

impl DiagnosticSink for CaptureSink {
    fn report(&self, engine: &'static str, _: j2kperf_rs::engine::Severity, message: &str) {
        self.0.lock().unwrap().push(format!("{engine}: {message}"));
    }
}

/// Engine that records every stripe height and counts finished frames.
/// It writes nothing into the planes.
pub struct CountingEngine {
    pub stripe_height: u32,
    pub fail_on_pull: bool,
    pub frames: AtomicU32,
    pub stripes: Mutex<Vec<u32>>,
}

impl CountingEngine {
    pub fn new(stripe_height: u32) -> Self {
        Self {
            stripe_height,
            fail_on_pull: false,
            frames: AtomicU32::new(0),
            stripes: Mutex::new(Vec::new()),
        }
    }
}

struct CountingSession<'a> {
    engine: &'a CountingEngine,
    sink: &'a dyn DiagnosticSink,
    cursor: StripeCursor,
}

impl DecodeEngine for CountingEngine {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn open_session<'a>(
        &'a self,
        _codestream: &'a [u8],
        descriptor: &'a ImageDescriptor,
        sink: &'a dyn DiagnosticSink,
    ) -> Result<Box<dyn DecodeSession + 'a>> {
        Ok(Box::new(CountingSession {
            engine: self,
            sink,
            cursor: StripeCursor::new(descriptor.height),
        }))
    }
}

impl DecodeSession for CountingSession<'_> {
    fn recommended_stripe_height(&self) -> u32 {
        self.engine.stripe_height
    }

    fn restart(&mut self) -> Result<()> {
        self.cursor.rewind();
        Ok(())
    }

    fn pull_stripe(&mut self, _planes: &mut [PlaneBuffer], rows: u32) -> Result<StripePull> {
        if self.engine.fail_on_pull {
            return Err(j2kperf_rs::engine::engine_failure(
                self.sink,
                "counting",
                "corrupt code-block",
            ));
        }
        let Some((y0, y1)) = self.cursor.claim(rows) else {
            return Ok(self.cursor.finish(0));
        };
        self.engine.stripes.lock().unwrap().push(y1 - y0);
        let pull = self.cursor.finish(y1 - y0);
        if !pull.more {
            self.engine.frames.fetch_add(1, Ordering::SeqCst);
        }
        Ok(pull)
    }
}
