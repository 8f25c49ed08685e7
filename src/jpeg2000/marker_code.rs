use num_enum::TryFromPrimitive;

/// Marker codes of the JPEG 2000 codestream syntax (ISO/IEC 15444-1 Annex A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u16)]
pub enum J2kMarkerCode {
    /// SOC: Start of codestream.
    StartOfCodestream = 0xFF4F,
    /// CAP: Extended capabilities (Part 15).
    Capability = 0xFF50,
    /// SIZ: Image and tile size.
    ImageAndTileSize = 0xFF51,
    /// COD: Coding style default.
    CodingStyleDefault = 0xFF52,
    /// COC: Coding style component.
    CodingStyleComponent = 0xFF53,
    /// TLM: Tile-part lengths.
    TilePartLengths = 0xFF55,
    /// PLM: Packet lengths, main header.
    PacketLengthsMain = 0xFF57,
    /// PLT: Packet lengths, tile-part header.
    PacketLengthsTile = 0xFF58,
    /// CPF: Corresponding profile (Part 15).
    CorrespondingProfile = 0xFF59,
    /// QCD: Quantization default.
    QuantizationDefault = 0xFF5C,
    /// QCC: Quantization component.
    QuantizationComponent = 0xFF5D,
    /// RGN: Region of interest.
    RegionOfInterest = 0xFF5E,
    /// POC: Progression order change.
    ProgressionOrderChange = 0xFF5F,
    /// PPM: Packed packet headers, main header.
    PackedPacketHeadersMain = 0xFF60,
    /// PPT: Packed packet headers, tile-part header.
    PackedPacketHeadersTile = 0xFF61,
    /// CRG: Component registration.
    ComponentRegistration = 0xFF63,
    /// COM: Comment.
    Comment = 0xFF64,
    /// SOT: Start of tile-part. Ends the main header.
    StartOfTile = 0xFF90,
    /// SOD: Start of data.
    StartOfData = 0xFF93,
    /// EOC: End of codestream.
    EndOfCodestream = 0xFFD9,
}

pub const J2K_MARKER_START_BYTE: u8 = 0xFF;
