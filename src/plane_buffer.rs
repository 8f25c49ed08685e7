//! Output plane sizing and storage.
//!
//! A plane holds either one component (planar output) or every component
//! interleaved per pixel. Samples are 8-bit for bit depths up to 8 and
//! 16-bit above that; the storage is tagged with the width so callers pick a
//! typed view instead of reinterpreting bytes.

use crate::error::{PerfError, Result};
use crate::image_format::ImageDescriptor;

/// Default row capacity for striped decoding.
pub const DEFAULT_MAX_STRIPE_ROWS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWidth {
    U8,
    U16,
}

impl SampleWidth {
    pub fn for_bit_depth(bit_depth: u8) -> Self {
        if bit_depth > 8 { Self::U16 } else { Self::U8 }
    }

    /// Bytes per component sample.
    pub fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
        }
    }
}

/// Sample types a decode engine may write into a plane.
pub trait Sample: Copy + Default + bytemuck::Pod + Send {
    /// Narrows `value`, which the caller keeps within the plane's bit depth.
    fn from_u32(value: u32) -> Self;
}

impl Sample for u8 {
    #[inline]
    fn from_u32(value: u32) -> Self {
        value as u8
    }
}

impl Sample for u16 {
    #[inline]
    fn from_u32(value: u32) -> Self {
        value as u16
    }
}

/// Geometry of one output plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Index of the first component stored in this plane.
    pub first_component: usize,
    /// Components stored per pixel: the component count when interleaved,
    /// 1 when planar.
    pub interleave: usize,
    pub x_sub: u8,
    pub y_sub: u8,
    /// Pixels per line, `ceil(width / x_sub)`.
    pub width: u32,
    /// Lines the plane can hold.
    pub rows: u32,
}

impl PlaneLayout {
    pub fn samples_per_line(&self) -> usize {
        self.width as usize * self.interleave
    }

    pub fn line_size(&self, sample_width: SampleWidth) -> usize {
        self.samples_per_line() * sample_width.bytes()
    }

    pub fn byte_size(&self, sample_width: SampleWidth) -> usize {
        self.line_size(sample_width) * self.rows as usize
    }

    /// `byte_size` without overflow, or `None` past `isize::MAX` bytes.
    pub fn checked_byte_size(&self, sample_width: SampleWidth) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.interleave)?
            .checked_mul(sample_width.bytes())?
            .checked_mul(self.rows as usize)
            .filter(|&bytes| bytes <= isize::MAX as usize)
    }

    /// Plane lines covering reference-grid rows `[y0, y1)`.
    pub fn rows_for(&self, y0: u32, y1: u32) -> u32 {
        let dy = self.y_sub as u32;
        y1.div_ceil(dy) - y0.div_ceil(dy)
    }
}

/// Plane geometry for `desc` when each pull delivers at most `row_capacity`
/// image rows. Pass the image height to size for full-frame pulls.
pub fn plane_layouts(desc: &ImageDescriptor, row_capacity: u32) -> Vec<PlaneLayout> {
    let row_capacity = row_capacity.min(desc.height);
    if desc.planar {
        desc.components
            .iter()
            .enumerate()
            .map(|(i, c)| PlaneLayout {
                first_component: i,
                interleave: 1,
                x_sub: c.dx,
                y_sub: c.dy,
                width: desc.width.div_ceil(c.dx as u32),
                rows: row_capacity.div_ceil(c.dy as u32),
            })
            .collect()
    } else {
        vec![PlaneLayout {
            first_component: 0,
            interleave: desc.component_count(),
            x_sub: 1,
            y_sub: 1,
            width: desc.width,
            rows: row_capacity,
        }]
    }
}

/// Byte size of every output plane, in plane order.
pub fn plane_sizes(desc: &ImageDescriptor, row_capacity: u32) -> Vec<usize> {
    let sample_width = desc.sample_width();
    plane_layouts(desc, row_capacity)
        .iter()
        .map(|l| l.byte_size(sample_width))
        .collect()
}

/// Tagged sample storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaneSamples {
    Eight(Vec<u8>),
    Sixteen(Vec<u16>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneBuffer {
    layout: PlaneLayout,
    samples: PlaneSamples,
}

fn zeroed<T: Sample>(len: usize) -> Result<Vec<T>> {
    let mut samples = Vec::new();
    samples
        .try_reserve_exact(len)
        .map_err(|_| PerfError::PlaneAllocation {
            bytes: len.saturating_mul(size_of::<T>()),
        })?;
    samples.resize(len, T::default());
    Ok(samples)
}

impl PlaneBuffer {
    /// Allocates a zeroed plane. The layout must come from a validated
    /// descriptor, which bounds its byte size.
    pub fn new(layout: PlaneLayout, sample_width: SampleWidth) -> Result<Self> {
        let len = layout.samples_per_line() * layout.rows as usize;
        let samples = match sample_width {
            SampleWidth::U8 => PlaneSamples::Eight(zeroed(len)?),
            SampleWidth::U16 => PlaneSamples::Sixteen(zeroed(len)?),
        };
        Ok(Self { layout, samples })
    }

    pub fn layout(&self) -> &PlaneLayout {
        &self.layout
    }

    pub fn sample_width(&self) -> SampleWidth {
        match self.samples {
            PlaneSamples::Eight(_) => SampleWidth::U8,
            PlaneSamples::Sixteen(_) => SampleWidth::U16,
        }
    }

    pub fn samples_mut(&mut self) -> &mut PlaneSamples {
        &mut self.samples
    }

    pub fn as_u8(&self) -> Option<&[u8]> {
        match &self.samples {
            PlaneSamples::Eight(s) => Some(s),
            PlaneSamples::Sixteen(_) => None,
        }
    }

    pub fn as_u16(&self) -> Option<&[u16]> {
        match &self.samples {
            PlaneSamples::Sixteen(s) => Some(s),
            PlaneSamples::Eight(_) => None,
        }
    }

    /// Raw bytes in native endianness.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.samples {
            PlaneSamples::Eight(s) => s,
            PlaneSamples::Sixteen(s) => bytemuck::cast_slice(s),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.as_bytes().len()
    }
}

/// Allocates zeroed output planes for `desc`.
pub fn allocate_planes(desc: &ImageDescriptor, row_capacity: u32) -> Result<Vec<PlaneBuffer>> {
    let sample_width = desc.sample_width();
    plane_layouts(desc, row_capacity)
        .into_iter()
        .map(|layout| PlaneBuffer::new(layout, sample_width))
        .collect()
}

/// Copies `lines` plane lines, starting at component line `first_line`, from
/// decoded component rasters into the start of `dst`.
///
/// `rasters` holds one `(samples, width)` pair per image component. Values
/// are clamped to `[0, mask]`. Interleaved planes take one sample from each
/// raster per pixel, in component order.
pub fn copy_component_lines<T: Sample>(
    dst: &mut [T],
    layout: &PlaneLayout,
    rasters: &[(&[i32], usize)],
    first_line: usize,
    lines: u32,
    mask: u32,
) {
    let per_line = layout.samples_per_line();
    let clamp = |v: i32| T::from_u32((v.max(0) as u32).min(mask));
    for (i, out) in dst
        .chunks_exact_mut(per_line)
        .take(lines as usize)
        .enumerate()
    {
        let line = first_line + i;
        if layout.interleave == 1 {
            let (data, width) = rasters[layout.first_component];
            let src = &data[line * width..line * width + layout.width as usize];
            for (o, &v) in out.iter_mut().zip(src) {
                *o = clamp(v);
            }
        } else {
            for (x, pixel) in out.chunks_exact_mut(layout.interleave).enumerate() {
                for (k, o) in pixel.iter_mut().enumerate() {
                    let (data, width) = rasters[k];
                    *o = clamp(data[line * width + x]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg2000::parser::ComponentInfo;

    fn descriptor(width: u32, height: u32, depth: u8, subs: &[(u8, u8)]) -> ImageDescriptor {
        ImageDescriptor {
            width,
            height,
            tile_width: width,
            tile_height: height,
            bit_depth: depth,
            planar: subs.iter().any(|&(dx, dy)| dx > 1 || dy > 1),
            components: subs
                .iter()
                .map(|&(dx, dy)| ComponentInfo {
                    depth,
                    is_signed: false,
                    dx,
                    dy,
                })
                .collect(),
        }
    }

    #[test]
    fn test_component_byte_width() {
        for depth in 1..=8 {
            assert_eq!(SampleWidth::for_bit_depth(depth).bytes(), 1);
        }
        for depth in 9..=16 {
            assert_eq!(SampleWidth::for_bit_depth(depth).bytes(), 2);
        }
    }

    #[test]
    fn test_planar_420_sizes() {
        let (w, h) = (640, 480);
        for (depth, bpp) in [(8u8, 1usize), (10, 2)] {
            let desc = descriptor(w, h, depth, &[(1, 1), (2, 2), (2, 2)]);
            let sizes = plane_sizes(&desc, h);
            let (w, h) = (w as usize, h as usize);
            assert_eq!(sizes, vec![w * h * bpp, (w / 2) * (h / 2) * bpp, (w / 2) * (h / 2) * bpp]);
        }
    }

    #[test]
    fn test_planar_odd_dimensions_round_up() {
        let desc = descriptor(5, 3, 10, &[(1, 1), (2, 2), (2, 2)]);
        assert_eq!(plane_sizes(&desc, 3), vec![5 * 3 * 2, 3 * 2 * 2, 3 * 2 * 2]);
    }

    #[test]
    fn test_interleaved_single_plane() {
        let desc = descriptor(100, 20, 8, &[(1, 1); 4]);
        let layouts = plane_layouts(&desc, 20);
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].interleave, 4);
        assert_eq!(layouts[0].line_size(SampleWidth::U8), 400);
        assert_eq!(plane_sizes(&desc, 20), vec![100 * 20 * 4]);
    }

    #[test]
    fn test_stripe_capacity_bounds_rows() {
        let desc = descriptor(64, 1000, 12, &[(1, 1), (2, 2), (2, 2)]);
        let layouts = plane_layouts(&desc, DEFAULT_MAX_STRIPE_ROWS);
        assert_eq!(layouts[0].rows, 64);
        assert_eq!(layouts[1].rows, 32);

        // Capacity never exceeds the image height.
        let short = descriptor(64, 10, 8, &[(1, 1); 3]);
        assert_eq!(plane_layouts(&short, DEFAULT_MAX_STRIPE_ROWS)[0].rows, 10);
    }

    #[test]
    fn test_rows_for_subsampled_stripes() {
        let layout = plane_layouts(&descriptor(8, 7, 8, &[(1, 1), (2, 2), (2, 2)]), 7)[1];
        // 3-row stripes over a 7-row image: chroma rows must total ceil(7/2).
        let total: u32 = [(0, 3), (3, 6), (6, 7)]
            .iter()
            .map(|&(y0, y1)| layout.rows_for(y0, y1))
            .sum();
        assert_eq!(total, 4);
        assert!(layout.rows_for(0, 3) <= 3u32.div_ceil(2));
    }

    #[test]
    fn test_typed_views() {
        let desc = descriptor(4, 2, 10, &[(1, 1); 3]);
        let planes = allocate_planes(&desc, 2).unwrap();
        assert_eq!(planes.len(), 1);
        assert!(planes[0].as_u8().is_none());
        assert_eq!(planes[0].as_u16().unwrap().len(), 4 * 2 * 3);
        assert_eq!(planes[0].byte_len(), 4 * 2 * 3 * 2);
    }

    #[test]
    fn test_checked_byte_size_limits() {
        let layout = plane_layouts(&descriptor(6, 4, 12, &[(1, 1); 3]), 4)[0];
        assert_eq!(layout.checked_byte_size(SampleWidth::U16), Some(6 * 4 * 3 * 2));

        let huge = plane_layouts(&descriptor(u32::MAX, u32::MAX, 8, &[(1, 1); 3]), u32::MAX)[0];
        assert_eq!(huge.checked_byte_size(SampleWidth::U8), None);
    }

    #[test]
    fn test_copy_interleaved_pixel_order() {
        let desc = descriptor(2, 2, 8, &[(1, 1); 3]);
        let layout = plane_layouts(&desc, 2)[0];
        let r: &[i32] = &[1, 2, 3, 4];
        let g: &[i32] = &[10, 20, 30, 40];
        let b: &[i32] = &[100, 200, 300, -5];
        let mut dst = vec![0u8; 12];
        copy_component_lines(&mut dst, &layout, &[(r, 2), (g, 2), (b, 2)], 0, 2, 255);
        assert_eq!(dst, [1, 10, 100, 2, 20, 200, 3, 30, 255, 4, 40, 0]);
    }

    #[test]
    fn test_copy_planar_stripe_offsets() {
        // 4x6 image, 4:2:0 chroma; the stripe covers image rows [2, 6).
        let desc = descriptor(4, 6, 10, &[(1, 1), (2, 2), (2, 2)]);
        let layouts = plane_layouts(&desc, 4);
        let luma: Vec<i32> = (0..24).collect();
        let chroma: Vec<i32> = vec![5, 6, 7, 8, 2000, -1];
        let rasters = [(&luma[..], 4), (&chroma[..], 2), (&chroma[..], 2)];

        let mut y = vec![0u16; layouts[0].width as usize * layouts[0].rows as usize];
        copy_component_lines(&mut y, &layouts[0], &rasters, 2, layouts[0].rows_for(2, 6), 1023);
        assert_eq!(y, (8..24).map(|v| v as u16).collect::<Vec<_>>());

        let mut cb = vec![0u16; layouts[1].width as usize * layouts[1].rows as usize];
        let lines = layouts[1].rows_for(2, 6);
        assert_eq!(lines, 2);
        copy_component_lines(&mut cb, &layouts[1], &rasters, 1, lines, 1023);
        assert_eq!(cb, [7, 8, 1023, 0]);
    }
}
