//! Encoder catalog: host encoder identifiers to codec descriptors.
//!
//! The identifiers are the ones the host transport sends (1-based, in the
//! order the host enum declares them). Unknown identifiers resolve to AAC.

/// Codec family selected by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderFormat {
    Aac,
    MpegLayer1,
    MpegLayer2,
    MpegLayer3,
    AacEld,
    AacHe,
    Opus,
    Amr,
    AmrWb,
    LinearPcm,
    AppleLossless,
    AacHeV2,
}

/// Concrete codec description for one encoder identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderDescriptor {
    /// Host-facing identifier.
    pub id: i64,
    pub format: EncoderFormat,
    /// Core Audio four-character format code, big-endian packed.
    pub format_id: u32,
    pub name: &'static str,
    /// Container extension used when the output file name is synthesized.
    pub file_extension: &'static str,
}

impl EncoderDescriptor {
    /// The four-character code as text, e.g. `"aac "`.
    pub fn format_code(&self) -> String {
        self.format_id
            .to_be_bytes()
            .iter()
            .map(|&b| b as char)
            .collect()
    }

    pub fn is_linear_pcm(&self) -> bool {
        self.format == EncoderFormat::LinearPcm
    }
}

const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

/// Identifier the catalog falls back to.
pub const DEFAULT_ENCODER_ID: i64 = 1;
pub const LINEAR_PCM_ID: i64 = 10;

const CATALOG: [EncoderDescriptor; 12] = [
    EncoderDescriptor { id: 1, format: EncoderFormat::Aac, format_id: fourcc(b"aac "), name: "AAC", file_extension: "m4a" },
    EncoderDescriptor { id: 2, format: EncoderFormat::MpegLayer1, format_id: fourcc(b".mp1"), name: "MPEG Layer 1", file_extension: "mp1" },
    EncoderDescriptor { id: 3, format: EncoderFormat::MpegLayer2, format_id: fourcc(b".mp2"), name: "MPEG Layer 2", file_extension: "mp2" },
    EncoderDescriptor { id: 4, format: EncoderFormat::MpegLayer3, format_id: fourcc(b".mp3"), name: "MPEG Layer 3", file_extension: "mp3" },
    EncoderDescriptor { id: 5, format: EncoderFormat::AacEld, format_id: fourcc(b"aace"), name: "AAC-ELD", file_extension: "m4a" },
    EncoderDescriptor { id: 6, format: EncoderFormat::AacHe, format_id: fourcc(b"aach"), name: "AAC-HE", file_extension: "m4a" },
    EncoderDescriptor { id: 7, format: EncoderFormat::Opus, format_id: fourcc(b"opus"), name: "Opus", file_extension: "caf" },
    EncoderDescriptor { id: 8, format: EncoderFormat::Amr, format_id: fourcc(b"samr"), name: "AMR", file_extension: "amr" },
    EncoderDescriptor { id: 9, format: EncoderFormat::AmrWb, format_id: fourcc(b"sawb"), name: "AMR-WB", file_extension: "awb" },
    EncoderDescriptor { id: 10, format: EncoderFormat::LinearPcm, format_id: fourcc(b"lpcm"), name: "Linear PCM", file_extension: "wav" },
    EncoderDescriptor { id: 11, format: EncoderFormat::AppleLossless, format_id: fourcc(b"alac"), name: "Apple Lossless", file_extension: "m4a" },
    EncoderDescriptor { id: 12, format: EncoderFormat::AacHeV2, format_id: fourcc(b"aacp"), name: "AAC-HE v2", file_extension: "m4a" },
];

/// Resolve a host encoder identifier. Never fails: unknown values map to AAC.
pub fn resolve(encoder_id: i64) -> &'static EncoderDescriptor {
    CATALOG
        .iter()
        .find(|d| d.id == encoder_id)
        .unwrap_or(&CATALOG[0])
}

/// All known descriptors, in identifier order.
pub fn all() -> &'static [EncoderDescriptor] {
    &CATALOG
}
