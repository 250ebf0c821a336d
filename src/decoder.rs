//! Decoding of low-frequency tag frames
//!
//! The LF module emits one of two layouts:
//!
//! - a short frame carrying a 15 character ASCII id at offset 2, recognised
//!   by a `#` (0x23) at offset 19
//! - an FDX/HDX frame `STX <10 hex id> <3 hex country> ... ETX|EOT`, where each
//!   hex field is transmitted least significant digit first

use std::fmt;

/// An identifier decoded from one raw frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedTag {
    /// 15 character id taken verbatim from the frame
    ShortFormat { id: String },
    /// FDX/HDX tag: decimal country (or species) code and 12 digit animal id
    LongFormat { country_code: String, animal_id: String },
}

impl DecodedTag {
    /// Render the tag the way it is published: the short id verbatim, or
    /// `<country_code><animal_id>` with no separator.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DecodedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedTag::ShortFormat { id } => f.write_str(id),
            DecodedTag::LongFormat {
                country_code,
                animal_id,
            } => write!(f, "{}{}", country_code, animal_id),
        }
    }
}

/// Stateless decoder for raw LF frames
pub struct FrameDecoder;

impl FrameDecoder {
    // Short format
    const SHORT_MIN_LEN: usize = 20;
    const SHORT_MARKER_POS: usize = 19;
    const SHORT_MARKER: u8 = 0x23;
    const SHORT_ID_START: usize = 2;
    const SHORT_ID_LEN: usize = 15;

    // Long (FDX/HDX) format
    const LONG_MIN_LEN: usize = 30;
    const STX: u8 = 0x02;
    const ETX_FDX: u8 = 0x03;
    const ETX_HDX: u8 = 0x07;
    const LONG_PAYLOAD_LEN: usize = 14;
    const ID_DIGITS: usize = 10;
    const COUNTRY_DIGITS: usize = 3;
    const ID_WIDTH: usize = 12;

    /// Decode one raw frame.
    ///
    /// Returns `None` for anything that is not a complete tag frame: noise,
    /// partial reads and undersized buffers are expected traffic.
    pub fn decode(buffer: &[u8]) -> Option<DecodedTag> {
        if buffer.len() >= Self::SHORT_MIN_LEN && buffer[Self::SHORT_MARKER_POS] == Self::SHORT_MARKER {
            return Some(Self::decode_short(buffer));
        }

        if buffer.len() >= Self::LONG_MIN_LEN {
            return Self::decode_long(buffer);
        }

        None
    }

    fn decode_short(buffer: &[u8]) -> DecodedTag {
        let id = buffer[Self::SHORT_ID_START..Self::SHORT_ID_START + Self::SHORT_ID_LEN]
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect();
        DecodedTag::ShortFormat { id }
    }

    fn decode_long(buffer: &[u8]) -> Option<DecodedTag> {
        let (start, _end) = Self::find_markers(buffer)?;

        let payload_start = start + 1;
        let payload = buffer.get(payload_start..payload_start + Self::LONG_PAYLOAD_LEN)?;

        let id_digits = &payload[..Self::ID_DIGITS];
        let country_digits = &payload[Self::ID_DIGITS..Self::ID_DIGITS + Self::COUNTRY_DIGITS];

        let animal_id = Self::reversed_hex_value(id_digits)?;
        let country_code = Self::reversed_hex_value(country_digits)?;

        Some(DecodedTag::LongFormat {
            country_code: country_code.to_string(),
            animal_id: format!("{:0width$}", animal_id, width = Self::ID_WIDTH),
        })
    }

    /// Locate the start marker and terminator.
    ///
    /// `start` is the last STX seen before the first terminator; scanning
    /// stops at that terminator.
    fn find_markers(buffer: &[u8]) -> Option<(usize, usize)> {
        let mut start = None;
        let mut end = None;

        for (i, &b) in buffer.iter().enumerate() {
            if b == Self::STX {
                start = Some(i);
            } else if b == Self::ETX_FDX || b == Self::ETX_HDX {
                end = Some(i);
                break;
            }
        }

        Some((start?, end?))
    }

    /// Parse ASCII hex digits transmitted least significant digit first.
    ///
    /// Ten digits need 40 bits, so `u64` never overflows for the fields used here.
    fn reversed_hex_value(digits: &[u8]) -> Option<u64> {
        digits.iter().rev().try_fold(0u64, |acc, &b| {
            let digit = (b as char).to_digit(16)?;
            acc.checked_mul(16)?.checked_add(digit as u64)
        })
    }

    /// Build a long-format payload (the 14 bytes following STX) for a
    /// country code and animal id. Inverse of the long-format decode.
    pub fn encode_long_payload(country_code: u16, animal_id: u64) -> Option<[u8; 14]> {
        if country_code > 0xFFF || animal_id > 0xFF_FFFF_FFFF {
            return None;
        }

        let id_hex = format!("{:010X}", animal_id);
        let country_hex = format!("{:03X}", country_code);

        let mut payload = [b'0'; 14];
        for (dst, src) in payload.iter_mut().zip(id_hex.bytes().rev().chain(country_hex.bytes().rev())) {
            *dst = src;
        }
        Some(payload)
    }
}

/// Decode one raw frame. See [`FrameDecoder::decode`].
pub fn decode(buffer: &[u8]) -> Option<DecodedTag> {
    FrameDecoder::decode(buffer)
}
