//! JPEG 2000 main-header parser.
//!
//! Walks the marker segments between SOC and the first SOT (or EOC) and keeps
//! what the harness needs to size output buffers: the SIZ segment, plus the
//! COD and CAP segments for reporting. Everything else is skipped by length.

use super::marker_code::{J2K_MARKER_START_BYTE, J2kMarkerCode};
use crate::codestream_reader::CodestreamReader;
use crate::error::{PerfError, Result};

/// Per-component SIZ fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Bit depth (Ssiz & 0x7F) + 1.
    pub depth: u8,
    pub is_signed: bool,
    /// Horizontal subsampling factor (XRsiz).
    pub dx: u8,
    /// Vertical subsampling factor (YRsiz).
    pub dy: u8,
}

/// SIZ segment contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizSegment {
    /// Rsiz capability word.
    pub capabilities: u16,
    /// Reference grid width (Xsiz).
    pub grid_width: u32,
    /// Reference grid height (Ysiz).
    pub grid_height: u32,
    pub x_origin: u32,
    pub y_origin: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_x_origin: u32,
    pub tile_y_origin: u32,
    pub components: Vec<ComponentInfo>,
}

impl SizSegment {
    /// Width of the image area, `Xsiz - XOsiz`.
    pub fn width(&self) -> u32 {
        self.grid_width - self.x_origin
    }

    /// Height of the image area, `Ysiz - YOsiz`.
    pub fn height(&self) -> u32 {
        self.grid_height - self.y_origin
    }
}

/// COD fields reported alongside the throughput figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingStyle {
    pub progression_order: u8,
    pub layers: u16,
    pub multiple_component_transform: bool,
    pub decomposition_levels: u8,
    /// Code-block width and height in samples.
    pub code_block: (u32, u32),
    /// 5-3 reversible wavelet (true) or 9-7 irreversible (false).
    pub reversible: bool,
}

impl CodingStyle {
    pub fn progression_name(&self) -> &'static str {
        match self.progression_order {
            0 => "LRCP",
            1 => "RLCP",
            2 => "RPCL",
            3 => "PCRL",
            4 => "CPRL",
            _ => "Unknown",
        }
    }
}

/// Everything the parser keeps from the main header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainHeader {
    pub siz: SizSegment,
    pub coding_style: Option<CodingStyle>,
    /// Set when a CAP segment advertises Part 15 (HTJ2K) block coding.
    pub high_throughput: bool,
}

/// Pcap bit for Part 15: bit i=15 counted from the MSB of the 32-bit word.
const PCAP_PART15: u32 = 1 << (32 - 15);

pub struct J2kParser<'a> {
    reader: CodestreamReader<'a>,
    siz: Option<SizSegment>,
    coding_style: Option<CodingStyle>,
    high_throughput: bool,
}

impl<'a> J2kParser<'a> {
    pub fn new(codestream: &'a [u8]) -> Self {
        Self {
            reader: CodestreamReader::new(codestream),
            siz: None,
            coding_style: None,
            high_throughput: false,
        }
    }

    pub fn parse_main_header(mut self) -> Result<MainHeader> {
        if self.read_marker()? != Some(J2kMarkerCode::StartOfCodestream) {
            return Err(PerfError::MalformedCodestream("missing SOC marker"));
        }

        loop {
            match self.read_marker()? {
                Some(J2kMarkerCode::ImageAndTileSize) => {
                    if self.siz.is_some() {
                        return Err(PerfError::MalformedCodestream("duplicate SIZ segment"));
                    }
                    self.parse_siz()?;
                }
                Some(J2kMarkerCode::CodingStyleDefault) => self.parse_cod()?,
                Some(J2kMarkerCode::Capability) => self.parse_cap()?,
                Some(J2kMarkerCode::StartOfTile) | Some(J2kMarkerCode::EndOfCodestream) => break,
                Some(J2kMarkerCode::StartOfCodestream) => {
                    return Err(PerfError::MalformedCodestream("duplicate SOC marker"));
                }
                _ => self.skip_segment()?,
            }
        }

        let siz = self
            .siz
            .ok_or(PerfError::MalformedCodestream("main header has no SIZ segment"))?;
        Ok(MainHeader {
            siz,
            coding_style: self.coding_style,
            high_throughput: self.high_throughput,
        })
    }

    /// Reads a two-byte marker. Unknown codes come back as `None` so their
    /// segment can be skipped.
    fn read_marker(&mut self) -> Result<Option<J2kMarkerCode>> {
        let b1 = self.reader.read_u8()?;
        if b1 != J2K_MARKER_START_BYTE {
            return Err(PerfError::MalformedCodestream("expected a marker"));
        }
        let b2 = self.reader.read_u8()?;
        Ok(J2kMarkerCode::try_from(u16::from_be_bytes([b1, b2])).ok())
    }

    /// Reads a segment length and checks it covers at least `minimum` bytes.
    fn read_segment_length(&mut self, minimum: u16) -> Result<u16> {
        let len = self.reader.read_u16()?;
        if len < minimum {
            return Err(PerfError::MalformedCodestream("marker segment too short"));
        }
        Ok(len)
    }

    fn skip_segment(&mut self) -> Result<()> {
        let len = self.read_segment_length(2)?;
        self.reader.advance((len - 2) as usize)
    }

    fn parse_siz(&mut self) -> Result<()> {
        let start = self.reader.position();
        let len = self.read_segment_length(41)?;
        let mut siz = SizSegment {
            capabilities: self.reader.read_u16()?,
            grid_width: self.reader.read_u32()?,
            grid_height: self.reader.read_u32()?,
            x_origin: self.reader.read_u32()?,
            y_origin: self.reader.read_u32()?,
            tile_width: self.reader.read_u32()?,
            tile_height: self.reader.read_u32()?,
            tile_x_origin: self.reader.read_u32()?,
            tile_y_origin: self.reader.read_u32()?,
            components: Vec::new(),
        };

        let comps = self.reader.read_u16()?;
        if comps == 0 {
            return Err(PerfError::MalformedCodestream("SIZ declares zero components"));
        }
        if len as usize != 38 + 3 * comps as usize {
            return Err(PerfError::MalformedCodestream("SIZ length does not match Csiz"));
        }
        if siz.grid_width <= siz.x_origin || siz.grid_height <= siz.y_origin {
            return Err(PerfError::MalformedCodestream("SIZ declares an empty image area"));
        }

        for _ in 0..comps {
            let depth_byte = self.reader.read_u8()?;
            let dx = self.reader.read_u8()?;
            let dy = self.reader.read_u8()?;
            if dx == 0 || dy == 0 {
                return Err(PerfError::MalformedCodestream("zero subsampling factor"));
            }
            siz.components.push(ComponentInfo {
                depth: (depth_byte & 0x7F) + 1,
                is_signed: (depth_byte & 0x80) != 0,
                dx,
                dy,
            });
        }
        debug_assert_eq!(self.reader.position() - start, len as usize);

        self.siz = Some(siz);
        Ok(())
    }

    fn parse_cod(&mut self) -> Result<()> {
        // Scod, SGcod (4 bytes) and SPcod without precincts (5 bytes).
        let len = self.read_segment_length(12)?;
        let _scod = self.reader.read_u8()?;
        let progression_order = self.reader.read_u8()?;
        let layers = self.reader.read_u16()?;
        let mct = self.reader.read_u8()?;
        let decomposition_levels = self.reader.read_u8()?;
        let cbw_exp = self.reader.read_u8()? & 0x0F;
        let cbh_exp = self.reader.read_u8()? & 0x0F;
        let _cb_style = self.reader.read_u8()?;
        let transformation = self.reader.read_u8()?;
        // Precinct sizes, if any, are not needed.
        self.reader.advance((len - 12) as usize)?;

        self.coding_style = Some(CodingStyle {
            progression_order,
            layers,
            multiple_component_transform: mct != 0,
            decomposition_levels,
            code_block: (1 << (cbw_exp + 2), 1 << (cbh_exp + 2)),
            reversible: transformation == 1,
        });
        Ok(())
    }

    fn parse_cap(&mut self) -> Result<()> {
        let len = self.read_segment_length(6)?;
        let pcap = self.reader.read_u32()?;
        self.reader.advance((len - 6) as usize)?;
        self.high_throughput = (pcap & PCAP_PART15) != 0;
        Ok(())
    }
}

/// Parses the main header of a raw codestream.
pub fn parse_main_header(codestream: &[u8]) -> Result<MainHeader> {
    J2kParser::new(codestream).parse_main_header()
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Builds SOC, SIZ, an optional COD, SOT and EOC for an image area of
    /// `width` x `height` with one `(depth, dx, dy)` entry per component.
    pub fn codestream(width: u32, height: u32, comps: &[(u8, u8, u8)], with_cod: bool) -> Vec<u8> {
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
        if with_cod {
            out.extend_from_slice(&[0xFF, 0x52, 0x00, 0x0C, 0x00, 0x02, 0x00, 0x03, 0x01, 0x05]);
            out.extend_from_slice(&[0x04, 0x04, 0x00, 0x01]);
        }
        // COM segment, skipped by the parser.
        out.extend_from_slice(&[0xFF, 0x64, 0x00, 0x06, 0x00, 0x01, b'h', b'i']);
        out.extend_from_slice(&[0xFF, 0x90, 0x00, 0x0A, 0, 0, 0, 0, 0, 0, 0, 1]);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_siz() {
        let data = fixtures::codestream(1920, 1080, &[(10, 1, 1), (10, 2, 1), (10, 2, 1)], false);
        let header = parse_main_header(&data).unwrap();

        assert_eq!(header.siz.width(), 1920);
        assert_eq!(header.siz.height(), 1080);
        assert_eq!(header.siz.components.len(), 3);
        assert_eq!(
            header.siz.components[1],
            ComponentInfo {
                depth: 10,
                is_signed: false,
                dx: 2,
                dy: 1
            }
        );
        assert!(header.coding_style.is_none());
        assert!(!header.high_throughput);
    }

    #[test]
    fn test_parse_cod() {
        let data = fixtures::codestream(64, 64, &[(8, 1, 1); 3], true);
        let cod = parse_main_header(&data).unwrap().coding_style.unwrap();
        assert_eq!(cod.progression_name(), "RPCL");
        assert_eq!(cod.layers, 3);
        assert!(cod.multiple_component_transform);
        assert_eq!(cod.decomposition_levels, 5);
        assert_eq!(cod.code_block, (64, 64));
        assert!(cod.reversible);
    }

    #[test]
    fn test_image_area_excludes_origin() {
        let mut data = fixtures::codestream(100, 50, &[(8, 1, 1); 3], false);
        // XOsiz = 20, YOsiz = 10
        data[16..20].copy_from_slice(&20u32.to_be_bytes());
        data[20..24].copy_from_slice(&10u32.to_be_bytes());
        let header = parse_main_header(&data).unwrap();
        assert_eq!(header.siz.width(), 80);
        assert_eq!(header.siz.height(), 40);
    }

    #[test]
    fn test_cap_flags_high_throughput() {
        let mut data = fixtures::codestream(16, 16, &[(8, 1, 1); 3], false);
        let cap = [0xFF, 0x50, 0x00, 0x08, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00];
        let at = data.len() - 14;
        data.splice(at..at, cap);
        assert!(parse_main_header(&data).unwrap().high_throughput);
    }

    #[test]
    fn test_missing_soc() {
        let mut data = fixtures::codestream(8, 8, &[(8, 1, 1); 3], false);
        data[1] = 0x51;
        assert!(matches!(
            parse_main_header(&data),
            Err(PerfError::MalformedCodestream(_))
        ));
    }

    #[test]
    fn test_missing_siz() {
        let data = [0xFF, 0x4F, 0xFF, 0x64, 0x00, 0x04, 0x00, 0x01, 0xFF, 0x90];
        assert!(matches!(
            parse_main_header(&data),
            Err(PerfError::MalformedCodestream("main header has no SIZ segment"))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let data = fixtures::codestream(8, 8, &[(8, 1, 1); 3], false);
        assert!(matches!(
            parse_main_header(&data[..30]),
            Err(PerfError::TruncatedCodestream(_))
        ));
    }

    #[test]
    fn test_zero_subsampling_is_malformed() {
        let data = fixtures::codestream(8, 8, &[(8, 1, 1), (8, 0, 1), (8, 1, 1)], false);
        assert!(parse_main_header(&data).is_err());
    }
}
