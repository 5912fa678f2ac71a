//! uuidkit: UUID generation, validation, analysis and batch reporting.
//!
//! Accepts UUIDs as 32 hex digits, optionally grouped `8-4-4-4-12`, in any
//! case. Analysis extracts the version nibble, the variant family, the input
//! format and, for version 1, the embedded timestamp.
//!
//! # Example
//!
//! ```
//! use uuidkit::{UuidAnalysis, Variant, check_collisions};
//!
//! let a = UuidAnalysis::of("f47ac10b-58cc-4372-a567-0e02b2c3d479");
//! assert_eq!(a.version, Some(4));
//! assert_eq!(a.variant, Some(Variant::Rfc4122));
//!
//! let report = check_collisions(&["F47AC10B58CC4372A5670E02B2C3D479", "f47ac10b-58cc-4372-a567-0e02b2c3d479"])
//!     .expect("non-empty input");
//! assert_eq!(report.duplicates, 1);
//! ```

mod batch;
mod generate;
mod job;
pub mod mcp;
mod parse;
mod render;

pub use batch::{
    BatchAnalysis, BatchInput, BatchValidation, Collision, CollisionReport, FormatHistogram,
    Statistics, ValidationEntry, batch_analyze, batch_validate, check_collisions,
    generate_statistics, inputs_from_value,
};
pub use generate::{GenerateError, NAMESPACES, UuidGen, UuidVersion, resolve_namespace};
pub use job::{JobConfig, JobError, JobOutput, MAX_COUNT, MIN_COUNT, Operation, run_job};
pub use parse::{
    FormatOptions, GREGORIAN_OFFSET, SourceFormat, UuidAnalysis, UuidError, UuidTimestamp,
    Variant, analyze_uuid, convert_format, hyphenate, is_valid_uuid, normalize, to_bytes,
    uuid_version, validate_uuid, version_label,
};
pub use render::{OutputFormat, render, to_csv, to_text};
