//! OpenJPEG backend through the `jpeg2k` crate.
//!
//! OpenJPEG decodes a whole frame per call, so the session decodes on the
//! first pull after a restart and serves stripes out of the decoded
//! components until the frame is exhausted.

use super::{DecodeEngine, DecodeSession, DiagnosticSink, StripeCursor, StripePull, engine_failure};
use crate::error::Result;
use crate::image_format::ImageDescriptor;
use crate::plane_buffer::{PlaneBuffer, PlaneSamples, copy_component_lines};

pub const ENGINE_NAME: &str = "openjpeg";

#[derive(Debug, Default, Clone, Copy)]
pub struct OpenJpegEngine;

impl DecodeEngine for OpenJpegEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn open_session<'a>(
        &'a self,
        codestream: &'a [u8],
        descriptor: &'a ImageDescriptor,
        sink: &'a dyn DiagnosticSink,
    ) -> Result<Box<dyn DecodeSession + 'a>> {
        Ok(Box::new(OpenJpegSession {
            codestream,
            descriptor,
            sink,
            cursor: StripeCursor::new(descriptor.height),
            frame: None,
        }))
    }
}

struct OpenJpegSession<'a> {
    codestream: &'a [u8],
    descriptor: &'a ImageDescriptor,
    sink: &'a dyn DiagnosticSink,
    cursor: StripeCursor,
    frame: Option<jpeg2k::Image>,
}

impl OpenJpegSession<'_> {
    fn decode_frame(&self) -> Result<jpeg2k::Image> {
        let image = jpeg2k::Image::from_bytes(self.codestream)
            .map_err(|e| engine_failure(self.sink, ENGINE_NAME, e.to_string()))?;
        let comps = image.components();
        if comps.len() != self.descriptor.component_count() {
            return Err(engine_failure(
                self.sink,
                ENGINE_NAME,
                format!(
                    "decoded {} components, header declares {}",
                    comps.len(),
                    self.descriptor.component_count()
                ),
            ));
        }
        for (i, (comp, info)) in comps.iter().zip(&self.descriptor.components).enumerate() {
            let expected_w = self.descriptor.width.div_ceil(info.dx as u32);
            let expected_h = self.descriptor.height.div_ceil(info.dy as u32);
            if comp.width() != expected_w || comp.height() != expected_h {
                return Err(engine_failure(
                    self.sink,
                    ENGINE_NAME,
                    format!(
                        "component {} decoded as {}x{}, expected {}x{}",
                        i,
                        comp.width(),
                        comp.height(),
                        expected_w,
                        expected_h
                    ),
                ));
            }
        }
        Ok(image)
    }
}

impl DecodeSession for OpenJpegSession<'_> {
    fn recommended_stripe_height(&self) -> u32 {
        self.descriptor.tile_height.clamp(1, self.descriptor.height)
    }

    fn restart(&mut self) -> Result<()> {
        self.cursor.rewind();
        self.frame = None;
        Ok(())
    }

    fn pull_stripe(&mut self, planes: &mut [PlaneBuffer], rows: u32) -> Result<StripePull> {
        let mut cursor = self.cursor;
        let Some((y0, y1)) = cursor.claim(rows) else {
            return Ok(cursor.finish(0));
        };
        let mask = (1u32 << self.descriptor.bit_depth) - 1;
        let sink = self.sink;

        // The decoded frame is taken out for the copy and put back after.
        let image = match self.frame.take() {
            Some(image) => image,
            None => self.decode_frame()?,
        };
        let comps: Vec<(&[i32], usize)> = image
            .components()
            .iter()
            .map(|c| (c.data(), c.width() as usize))
            .collect();

        for plane in planes.iter_mut() {
            let layout = *plane.layout();
            let lines = layout.rows_for(y0, y1);
            if lines > layout.rows {
                return Err(engine_failure(
                    sink,
                    ENGINE_NAME,
                    format!("stripe needs {} lines, plane holds {}", lines, layout.rows),
                ));
            }
            let first_line = y0.div_ceil(layout.y_sub as u32) as usize;
            match plane.samples_mut() {
                PlaneSamples::Eight(s) => {
                    copy_component_lines(s.as_mut_slice(), &layout, &comps, first_line, lines, mask)
                }
                PlaneSamples::Sixteen(s) => {
                    copy_component_lines(s.as_mut_slice(), &layout, &comps, first_line, lines, mask)
                }
            }
        }

        drop(comps);
        self.frame = Some(image);
        self.cursor = cursor;
        Ok(self.cursor.finish(y1 - y0))
    }
}
