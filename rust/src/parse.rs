//! UUID parsing, validation and analysis.
//!
//! Input: 32 hex digits, optionally grouped `8-4-4-4-12`, any case.
//!
//! Every function here is a pure function of its input string.

use chrono::{DateTime, SecondsFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 100-ns intervals between 1582-10-15 (Gregorian reform) and the Unix epoch.
pub const GREGORIAN_OFFSET: u64 = 122_192_928_000_000_000;

const HEX_DIGITS: usize = 32;

/// Errors that can occur during UUID operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UuidError {
    #[error("UUID input is required")]
    MissingInput,
    #[error("Invalid UUID length")]
    InvalidLength,
    #[error("Invalid UUID format")]
    InvalidFormat,
    #[error("Input must be a non-empty list of UUIDs")]
    EmptyBatch,
    #[error("Input must be a list of UUIDs")]
    NotAList,
}

/// Layout family encoded in the high bits of the 17th hex digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "NCS")]
    Ncs,
    #[serde(rename = "RFC 4122")]
    Rfc4122,
    #[serde(rename = "Microsoft")]
    Microsoft,
    #[serde(rename = "Reserved")]
    Reserved,
}

impl Variant {
    /// Classify a variant nibble. Patterns are tested in order, first match wins.
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0f {
            n if n & 0b1000 == 0 => Self::Ncs,
            n if n & 0b1100 == 0b1000 => Self::Rfc4122,
            n if n & 0b1110 == 0b1100 => Self::Microsoft,
            _ => Self::Reserved,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ncs => "NCS",
            Self::Rfc4122 => "RFC 4122",
            Self::Microsoft => "Microsoft",
            Self::Reserved => "Reserved",
        }
    }
}

/// Whether the caller's input carried dashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Standard,
    Compact,
}

impl SourceFormat {
    pub fn of(input: &str) -> Self {
        if input.contains('-') {
            Self::Standard
        } else {
            Self::Compact
        }
    }
}

/// Timestamp embedded in a version 1 UUID.
///
/// `raw` is exact. `unix` is derived by integer division and truncates the
/// sub-millisecond part of the interval count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UuidTimestamp {
    pub iso: String,
    pub unix: i64,
    pub raw: u64,
}

/// Formatting applied by [`convert_format`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    #[serde(default)]
    pub uppercase: bool,
    #[serde(default)]
    pub remove_dashes: bool,
}

/// Structured analysis of a single input string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UuidAnalysis {
    pub input: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<UuidTimestamp>,
}

impl UuidAnalysis {
    /// Analyze any string. Never fails: malformed input yields `valid == false`.
    pub fn of(input: &str) -> Self {
        match hyphenate(input) {
            Ok(standard) => Self::from_standard(input, standard),
            Err(err) => Self::invalid(input, &err),
        }
    }

    fn invalid(input: &str, err: &UuidError) -> Self {
        Self {
            input: input.to_string(),
            valid: false,
            error: Some(err.to_string()),
            normalized: None,
            version: None,
            variant: None,
            format: None,
            kind: None,
            timestamp: None,
        }
    }

    fn from_standard(input: &str, standard: String) -> Self {
        let digits = strip(&standard);
        let version = nibble_at(&digits, 12);
        let variant = nibble_at(&digits, 16).map(Variant::from_nibble);
        let timestamp = if version == Some(1) {
            v1_timestamp(&digits)
        } else {
            None
        };

        Self {
            input: input.to_string(),
            valid: true,
            error: None,
            version,
            variant,
            format: Some(SourceFormat::of(input)),
            kind: version.map(|v| version_label(v).to_string()),
            timestamp,
            normalized: Some(standard),
        }
    }
}

static STANDARD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

/// Lowercase and drop dashes.
pub fn normalize(input: &str) -> String {
    input.chars().filter(|c| *c != '-').collect::<String>().to_lowercase()
}

fn strip(standard: &str) -> String {
    standard.replace('-', "")
}

fn nibble_at(digits: &str, idx: usize) -> Option<u8> {
    digits
        .get(idx..idx + 1)
        .and_then(|d| u8::from_str_radix(d, 16).ok())
}

/// Normalize and regroup into canonical `8-4-4-4-12` lowercase form.
pub fn hyphenate(input: &str) -> Result<String, UuidError> {
    let digits = normalize(input);
    if digits.chars().count() != HEX_DIGITS {
        return Err(UuidError::InvalidLength);
    }
    if !digits.is_ascii() {
        return Err(UuidError::InvalidFormat);
    }

    let standard = format!(
        "{}-{}-{}-{}-{}",
        &digits[0..8],
        &digits[8..12],
        &digits[12..16],
        &digits[16..20],
        &digits[20..32]
    );

    if !STANDARD_PATTERN.is_match(&standard) {
        return Err(UuidError::InvalidFormat);
    }
    Ok(standard)
}

/// Decode a UUID into its 16 raw bytes.
pub fn to_bytes(input: &str) -> Result<[u8; 16], UuidError> {
    let standard = hyphenate(input)?;
    let mut out = [0u8; 16];
    hex::decode_to_slice(strip(&standard), &mut out).map_err(|_| UuidError::InvalidFormat)?;
    Ok(out)
}

/// True iff `input` is 32 hex digits (dashes ignored) with a recognised variant.
pub fn is_valid_uuid(input: &str) -> bool {
    hyphenate(input).is_ok()
}

/// Version nibble of a valid UUID, `None` otherwise.
pub fn uuid_version(input: &str) -> Option<u8> {
    let standard = hyphenate(input).ok()?;
    nibble_at(&strip(&standard), 12)
}

/// Human label for a version nibble.
pub fn version_label(version: u8) -> &'static str {
    match version {
        1 => "timestamp-based",
        2 => "DCE security",
        3 => "namespace-based (MD5)",
        4 => "random",
        5 => "namespace-based (SHA-1)",
        6 => "reordered timestamp",
        7 => "Unix epoch timestamp",
        8 => "custom",
        _ => "unknown",
    }
}

/// Reassemble the 60-bit interval count of a v1 UUID and convert it.
///
/// Any decoding failure yields `None`.
fn v1_timestamp(digits: &str) -> Option<UuidTimestamp> {
    let time_low = u64::from_str_radix(digits.get(0..8)?, 16).ok()?;
    let time_mid = u64::from_str_radix(digits.get(8..12)?, 16).ok()?;
    let time_hi = u64::from_str_radix(digits.get(12..16)?, 16).ok()? & 0x0fff;

    let raw = (time_hi << 48) | (time_mid << 32) | time_low;
    let since_epoch = i64::try_from(raw).ok()? - i64::try_from(GREGORIAN_OFFSET).ok()?;
    let unix = since_epoch.div_euclid(10_000);
    let dt = DateTime::from_timestamp_millis(unix)?;

    Some(UuidTimestamp {
        iso: dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        unix,
        raw,
    })
}

/// Analyze a single UUID.
///
/// Empty input is an error; any other malformed input is reported through
/// the returned analysis.
pub fn analyze_uuid(input: &str) -> Result<UuidAnalysis, UuidError> {
    if input.trim().is_empty() {
        return Err(UuidError::MissingInput);
    }
    Ok(UuidAnalysis::of(input))
}

/// Validate a single UUID, rejecting empty input.
pub fn validate_uuid(input: &str) -> Result<bool, UuidError> {
    if input.trim().is_empty() {
        return Err(UuidError::MissingInput);
    }
    Ok(is_valid_uuid(input))
}

/// Reformat an existing UUID. Dashes are removed first, then case applied.
pub fn convert_format(input: &str, opts: FormatOptions) -> Result<String, UuidError> {
    if input.trim().is_empty() {
        return Err(UuidError::MissingInput);
    }
    let mut out = hyphenate(input)?;
    if opts.remove_dashes {
        out = strip(&out);
    }
    if opts.uppercase {
        out = out.to_uppercase();
    }
    Ok(out)
}
