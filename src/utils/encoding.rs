//! Text decoding for delimited exports.
//!
//! Forecast exports arrive as UTF-8, UTF-8 with BOM, UTF-16 or a legacy
//! single-byte code page (Windows-1251 in practice). Decoding order:
//! - explicit encoding label, when configured
//! - BOM markers (UTF-8, UTF-16 LE/BE)
//! - strict UTF-8
//! - chardetng guess over a leading sample

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

const DETECT_SAMPLE_SIZE: usize = 8192;

/// Decoded text together with the label of the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub content: String,
    pub encoding: String,
}

/// Detect the encoding of a byte buffer.
///
/// Returns a lowercase label (e.g. "utf-8", "utf-8-sig", "utf-16le", "windows-1251").
pub fn detect_encoding(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xef, 0xbb, 0xbf]) {
        return "utf-8-sig".to_string();
    }
    if bytes.starts_with(&[0xff, 0xfe]) {
        return "utf-16le".to_string();
    }
    if bytes.starts_with(&[0xfe, 0xff]) {
        return "utf-16be".to_string();
    }
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let sample = &bytes[..bytes.len().min(DETECT_SAMPLE_SIZE)];
    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    let guess = detector.guess(None, true);

    let name = guess.name().to_lowercase();
    if name.contains("utf-8") || name == "ascii" {
        "utf-8".to_string()
    } else {
        name
    }
}

/// Decode bytes to a string.
///
/// Returns `None` when `explicit` names an encoding `encoding_rs` does not know.
/// Invalid sequences are replaced rather than rejected.
pub fn decode_text(bytes: &[u8], explicit: Option<&str>) -> Option<DecodedText> {
    let label = match explicit {
        Some(label) => label.trim().to_lowercase(),
        None => detect_encoding(bytes),
    };

    let encoding: &'static Encoding = match label.as_str() {
        "utf-8-sig" => UTF_8,
        "utf-16le" | "utf-16-le" => UTF_16LE,
        "utf-16be" | "utf-16-be" => UTF_16BE,
        other => Encoding::for_label(other.as_bytes())?,
    };

    // `decode` sniffs and strips a BOM itself, overriding the label if one is present.
    let (decoded, used, _had_errors) = encoding.decode(bytes);
    let encoding_name = if label == "utf-8-sig" { label } else { used.name().to_lowercase() };
    Some(DecodedText { content: decoded.into_owned(), encoding: encoding_name })
}
