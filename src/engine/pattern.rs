//! Codec-free engine. Each pull writes a deterministic function of
//! (component, column, row) into the planes, following the same stripe
//! protocol a real decoder does. Running the harness with it measures the
//! harness's own overhead and gives tests a reproducible raster.

use super::{DecodeEngine, DecodeSession, DiagnosticSink, StripeCursor, StripePull, engine_failure};
use crate::error::Result;
use crate::image_format::ImageDescriptor;
use crate::plane_buffer::{PlaneBuffer, PlaneLayout, PlaneSamples, Sample};

pub const ENGINE_NAME: &str = "pattern";

/// Bytes of the codestream folded into the pattern seed.
const SEED_PREFIX: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct PatternEngine {
    /// Stripe height this engine recommends.
    pub stripe_height: u32,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self { stripe_height: 16 }
    }
}

impl DecodeEngine for PatternEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn open_session<'a>(
        &'a self,
        codestream: &'a [u8],
        descriptor: &'a ImageDescriptor,
        sink: &'a dyn DiagnosticSink,
    ) -> Result<Box<dyn DecodeSession + 'a>> {
        if codestream.is_empty() {
            return Err(engine_failure(sink, ENGINE_NAME, "empty codestream"));
        }
        Ok(Box::new(PatternSession {
            codestream,
            descriptor,
            sink,
            stripe_height: self.stripe_height.max(1),
            cursor: StripeCursor::new(descriptor.height),
            seed: 0,
        }))
    }
}

struct PatternSession<'a> {
    codestream: &'a [u8],
    descriptor: &'a ImageDescriptor,
    sink: &'a dyn DiagnosticSink,
    stripe_height: u32,
    cursor: StripeCursor,
    seed: u32,
}

impl DecodeSession for PatternSession<'_> {
    fn recommended_stripe_height(&self) -> u32 {
        self.stripe_height
    }

    fn restart(&mut self) -> Result<()> {
        self.cursor.rewind();
        self.seed = self
            .codestream
            .iter()
            .take(SEED_PREFIX)
            .fold(0x811C_9DC5u32, |h, &b| (h ^ b as u32).wrapping_mul(0x0100_0193));
        Ok(())
    }

    fn pull_stripe(&mut self, planes: &mut [PlaneBuffer], rows: u32) -> Result<StripePull> {
        let Some((y0, y1)) = self.cursor.claim(rows) else {
            return Ok(self.cursor.finish(0));
        };

        let mask = (1u32 << self.descriptor.bit_depth) - 1;
        for plane in planes.iter_mut() {
            let layout = *plane.layout();
            let plane_rows = layout.rows_for(y0, y1);
            if plane_rows > layout.rows {
                return Err(engine_failure(
                    self.sink,
                    ENGINE_NAME,
                    format!(
                        "stripe needs {} lines, plane holds {}",
                        plane_rows, layout.rows
                    ),
                ));
            }
            let first_line = y0.div_ceil(layout.y_sub as u32);
            match plane.samples_mut() {
                PlaneSamples::Eight(s) => {
                    fill(s.as_mut_slice(), &layout, first_line, plane_rows, self.seed, mask)
                }
                PlaneSamples::Sixteen(s) => {
                    fill(s.as_mut_slice(), &layout, first_line, plane_rows, self.seed, mask)
                }
            }
        }

        Ok(self.cursor.finish(y1 - y0))
    }
}

fn fill<T: Sample>(
    dst: &mut [T],
    layout: &PlaneLayout,
    first_line: u32,
    lines: u32,
    seed: u32,
    mask: u32,
) {
    let per_line = layout.samples_per_line();
    for (i, line) in dst
        .chunks_exact_mut(per_line)
        .take(lines as usize)
        .enumerate()
    {
        let row = first_line + i as u32;
        for (s, out) in line.iter_mut().enumerate() {
            let component = (layout.first_component + s % layout.interleave) as u32;
            let column = (s / layout.interleave) as u32;
            let value = column
                .wrapping_mul(3)
                .wrapping_add(row.wrapping_mul(7))
                .wrapping_add(component.wrapping_mul(61))
                ^ seed;
            *out = T::from_u32(value & mask);
        }
    }
}
