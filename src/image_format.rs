//! Image layout derived from the SIZ segment and validated against what the
//! harness can size buffers for.
//!
//! Supported layouts: 3 or 4 unsigned components sharing one bit depth of
//! 1 to 16 bits. The first component is never subsampled; the second and
//! third share one factor of 1 or 2 per axis; a fourth component is never
//! subsampled. Any subsampled component makes the output planar. The image
//! origin must sit on the subsampling grid, and a full frame must fit in
//! addressable memory.

use crate::error::{PerfError, Result};
use crate::jpeg2000::parser::{ComponentInfo, MainHeader};
use crate::plane_buffer::{SampleWidth, plane_layouts};
use std::fmt;

pub const MIN_COMPONENTS: usize = 3;
pub const MAX_COMPONENTS: usize = 4;
pub const MAX_BIT_DEPTH: u8 = 16;

/// Chroma subsampling of the second and third components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chroma {
    Yuv444,
    Yuv422,
    Yuv420,
    Yuv440,
}

impl Chroma {
    fn from_factors(dx: u8, dy: u8) -> Self {
        match (dx, dy) {
            (2, 1) => Self::Yuv422,
            (2, 2) => Self::Yuv420,
            (1, 2) => Self::Yuv440,
            _ => Self::Yuv444,
        }
    }

    pub fn ratio(&self) -> &'static str {
        match self {
            Self::Yuv444 => "4:4:4",
            Self::Yuv422 => "4:2:2",
            Self::Yuv420 => "4:2:0",
            Self::Yuv440 => "4:4:0",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Bit depth shared by every component.
    pub bit_depth: u8,
    /// One entry per component, 3 or 4 long.
    pub components: Vec<ComponentInfo>,
    /// True iff any component is subsampled.
    pub planar: bool,
}

impl ImageDescriptor {
    /// Validates the main header and derives the decode layout.
    pub fn from_header(header: &MainHeader) -> Result<Self> {
        let siz = &header.siz;
        let comps = &siz.components;

        if !(MIN_COMPONENTS..=MAX_COMPONENTS).contains(&comps.len()) {
            return Err(PerfError::UnsupportedComponentCount {
                count: comps.len(),
                min: MIN_COMPONENTS,
                max: MAX_COMPONENTS,
            });
        }

        let bit_depth = comps[0].depth;
        if bit_depth == 0 || bit_depth > MAX_BIT_DEPTH {
            return Err(PerfError::UnsupportedBitDepth(bit_depth));
        }
        for (i, c) in comps.iter().enumerate() {
            if c.depth != bit_depth {
                return Err(PerfError::MixedBitDepth {
                    component: i,
                    depth: c.depth,
                    expected: bit_depth,
                });
            }
            if c.is_signed {
                return Err(PerfError::SignedComponent(i));
            }
        }

        validate_subsampling(comps, (siz.x_origin, siz.y_origin))?;

        let desc = Self {
            width: siz.width(),
            height: siz.height(),
            tile_width: siz.tile_width,
            tile_height: siz.tile_height,
            bit_depth,
            planar: comps.iter().any(|c| c.dx > 1 || c.dy > 1),
            components: comps.clone(),
        };
        desc.check_plane_sizes()?;
        Ok(desc)
    }

    /// Full-frame planes bound every stripe plane, so checking them once
    /// keeps all later size arithmetic in range.
    fn check_plane_sizes(&self) -> Result<()> {
        let sample_width = self.sample_width();
        for (plane, layout) in plane_layouts(self, self.height).iter().enumerate() {
            if layout.checked_byte_size(sample_width).is_none() {
                return Err(PerfError::PlaneTooLarge {
                    plane,
                    width: layout.width,
                    rows: layout.rows,
                });
            }
        }
        Ok(())
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn sample_width(&self) -> SampleWidth {
        SampleWidth::for_bit_depth(self.bit_depth)
    }

    pub fn chroma(&self) -> Chroma {
        Chroma::from_factors(self.components[1].dx, self.components[1].dy)
    }

    /// Short name of the layout, e.g. `RGB 8-bit interleaved` or
    /// `YCbCr 4:2:2 10-bit planar`.
    pub fn format_label(&self) -> String {
        let alpha = self.component_count() == 4;
        if self.planar {
            format!(
                "YCbCr{} {} {}-bit planar",
                if alpha { "A" } else { "" },
                self.chroma().ratio(),
                self.bit_depth
            )
        } else {
            format!(
                "RGB{} {}-bit interleaved",
                if alpha { "A" } else { "" },
                self.bit_depth
            )
        }
    }

    /// Bits carried by one decoded frame, counting every component sample.
    pub fn total_bits(&self) -> u64 {
        self.components
            .iter()
            .map(|c| {
                self.width.div_ceil(c.dx as u32) as u64
                    * self.height.div_ceil(c.dy as u32) as u64
                    * self.bit_depth as u64
            })
            .sum()
    }
}

impl fmt::Display for ImageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}, {} components, {}",
            self.width,
            self.height,
            self.component_count(),
            self.format_label()
        )
    }
}

fn validate_subsampling(comps: &[ComponentInfo], origin: (u32, u32)) -> Result<()> {
    let unsupported = |component: usize, reason: &'static str| PerfError::UnsupportedSubsampling {
        component,
        dx: comps[component].dx,
        dy: comps[component].dy,
        reason,
    };

    for (i, c) in comps.iter().enumerate() {
        if !matches!(c.dx, 1 | 2) || !matches!(c.dy, 1 | 2) {
            return Err(unsupported(i, "only factors 1 and 2 are supported"));
        }
    }
    if comps[0].dx != 1 || comps[0].dy != 1 {
        return Err(unsupported(0, "the first component must not be subsampled"));
    }
    if (comps[2].dx, comps[2].dy) != (comps[1].dx, comps[1].dy) {
        return Err(unsupported(2, "chroma components must share one subsampling"));
    }
    if let Some(c) = comps.get(3) {
        if c.dx != 1 || c.dy != 1 {
            return Err(unsupported(3, "the fourth component must not be subsampled"));
        }
    }
    // Component sizes are ceil(width / dx) only when the origin is a
    // multiple of the factor.
    for (i, c) in comps.iter().enumerate() {
        if origin.0 % c.dx as u32 != 0 || origin.1 % c.dy as u32 != 0 {
            return Err(unsupported(i, "image origin is not on the subsampling grid"));
        }
    }
    Ok(())
}
