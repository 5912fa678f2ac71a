//! Batch-job driver.
//!
//! A job is a JSON configuration naming one operation plus its inputs. The
//! driver validates the configuration, runs the operation and renders the
//! result in the requested output format.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::batch::{
    batch_analyze, batch_validate, check_collisions, generate_statistics, inputs_from_value,
};
use crate::generate::{GenerateError, UuidGen, UuidVersion, resolve_namespace};
use crate::parse::{
    FormatOptions, UuidError, analyze_uuid, convert_format, uuid_version, validate_uuid,
};
use crate::render::{OutputFormat, render};

/// Inclusive bounds on `count` for generation.
pub const MIN_COUNT: usize = 1;
pub const MAX_COUNT: usize = 100_000;

#[derive(Error, Debug)]
/// Errors that abort a whole job.
pub enum JobError {
    #[error(transparent)]
    Uuid(#[from] UuidError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("Count must be between 1 and 100000, got {0}")]
    CountOutOfRange(usize),
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Operation selected by a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[default]
    Generate,
    Validate,
    Analyze,
    Convert,
    #[serde(alias = "collisions")]
    CheckCollisions,
    #[serde(alias = "stats")]
    Statistics,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Validate => "validate",
            Self::Analyze => "analyze",
            Self::Convert => "convert",
            Self::CheckCollisions => "check_collisions",
            Self::Statistics => "statistics",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "generate" | "gen" => Some(Self::Generate),
            "validate" => Some(Self::Validate),
            "analyze" | "analyse" => Some(Self::Analyze),
            "convert" => Some(Self::Convert),
            "check_collisions" | "collisions" => Some(Self::CheckCollisions),
            "statistics" | "stats" => Some(Self::Statistics),
            _ => None,
        }
    }
}

/// Job configuration. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub operation: Operation,
    pub version: u8,
    pub count: usize,
    pub namespace: String,
    pub name: Option<String>,
    /// Single target for `validate`, `analyze` and `convert`.
    pub uuid: Option<String>,
    /// Sequence of strings or `{ "identifier": ... }` objects.
    pub uuids: Option<Value>,
    pub uppercase: bool,
    pub remove_dashes: bool,
    pub output_format: OutputFormat,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            operation: Operation::Generate,
            version: 4,
            count: 1,
            namespace: "DNS".to_string(),
            name: None,
            uuid: None,
            uuids: None,
            uppercase: false,
            remove_dashes: false,
            output_format: OutputFormat::Json,
        }
    }
}

impl JobConfig {
    pub fn from_json(data: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load(path: &Path) -> Result<Self, JobError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            uppercase: self.uppercase,
            remove_dashes: self.remove_dashes,
        }
    }

    /// Resolve `uuids` into plain strings, `None` when absent.
    pub fn batch_inputs(&self) -> Result<Option<Vec<String>>, JobError> {
        match &self.uuids {
            Some(value) => Ok(Some(inputs_from_value(value)?)),
            None => Ok(None),
        }
    }

    fn require_batch(&self) -> Result<Vec<String>, JobError> {
        self.batch_inputs()?.ok_or(JobError::MissingParameter("uuids"))
    }

    /// Batch inputs if given, else the single `uuid` as a one-element list.
    fn targets(&self) -> Result<Targets, JobError> {
        if let Some(list) = self.batch_inputs()? {
            return Ok(Targets::Many(list));
        }
        match &self.uuid {
            Some(u) => Ok(Targets::One(u.clone())),
            None => Err(JobError::MissingParameter("uuid")),
        }
    }
}

enum Targets {
    One(String),
    Many(Vec<String>),
}

/// Result of a job: the report, its per-row view, and the rendered payload.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutput {
    pub operation: Operation,
    pub format: OutputFormat,
    pub report: Value,
    pub rows: Vec<Value>,
    pub rendered: String,
}

impl JobOutput {
    pub fn save(&self, path: &Path) -> Result<(), JobError> {
        fs::write(path, &self.rendered)?;
        Ok(())
    }
}

fn rows_of(report: &Value, key: &str) -> Vec<Value> {
    report
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_else(|| vec![report.clone()])
}

fn run_generate(config: &JobConfig) -> Result<(Value, Vec<Value>), JobError> {
    if !(MIN_COUNT..=MAX_COUNT).contains(&config.count) {
        return Err(JobError::CountOutOfRange(config.count));
    }
    let version = UuidVersion::from_number(config.version)?;
    let namespace = resolve_namespace(&config.namespace)?;
    let mut generator = UuidGen::new(
        version,
        namespace,
        config.name.clone(),
        config.format_options(),
    )?;

    let uuids = generator.next_n(config.count);
    debug!(count = uuids.len(), version = version.number(), "generated uuids");
    let rows: Vec<Value> = uuids.iter().map(|u| json!(u)).collect();
    let report = json!({
        "version": version.number(),
        "count": uuids.len(),
        "uuids": uuids,
    });
    Ok((report, rows))
}

fn run_validate(config: &JobConfig) -> Result<(Value, Vec<Value>), JobError> {
    let report = match config.targets()? {
        Targets::One(u) => {
            let valid = validate_uuid(&u)?;
            json!({ "input": u, "valid": valid, "version": uuid_version(&u) })
        }
        Targets::Many(list) => serde_json::to_value(batch_validate(&list)?)?,
    };
    let rows = rows_of(&report, "results");
    Ok((report, rows))
}

fn run_analyze(config: &JobConfig) -> Result<(Value, Vec<Value>), JobError> {
    let report = match config.targets()? {
        Targets::One(u) => serde_json::to_value(analyze_uuid(&u)?)?,
        Targets::Many(list) => serde_json::to_value(batch_analyze(&list)?)?,
    };
    let rows = rows_of(&report, "results");
    Ok((report, rows))
}

fn run_convert(config: &JobConfig) -> Result<(Value, Vec<Value>), JobError> {
    let opts = config.format_options();
    let list = match config.targets()? {
        Targets::One(u) => vec![u],
        Targets::Many(list) => list,
    };
    let mut results = Vec::with_capacity(list.len());
    for input in list {
        let output = convert_format(&input, opts)?;
        results.push(json!({ "input": input, "output": output }));
    }
    let report = json!({
        "uppercase": opts.uppercase,
        "remove_dashes": opts.remove_dashes,
        "results": results,
    });
    let rows = rows_of(&report, "results");
    Ok((report, rows))
}

fn run_collisions(config: &JobConfig) -> Result<(Value, Vec<Value>), JobError> {
    let report = serde_json::to_value(check_collisions(&config.require_batch()?)?)?;
    let rows = rows_of(&report, "collisions");
    Ok((report, rows))
}

fn run_statistics(config: &JobConfig) -> Result<(Value, Vec<Value>), JobError> {
    let report = serde_json::to_value(generate_statistics(&config.require_batch()?)?)?;
    Ok((report.clone(), vec![report]))
}

/// Run a job to completion.
pub fn run_job(config: &JobConfig) -> Result<JobOutput, JobError> {
    info!(
        operation = config.operation.as_str(),
        format = config.output_format.as_str(),
        "running job"
    );

    let (report, rows) = match config.operation {
        Operation::Generate => run_generate(config)?,
        Operation::Validate => run_validate(config)?,
        Operation::Analyze => run_analyze(config)?,
        Operation::Convert => run_convert(config)?,
        Operation::CheckCollisions => run_collisions(config)?,
        Operation::Statistics => run_statistics(config)?,
    };

    let rendered = render(config.output_format, &report, &rows)?;
    info!(rows = rows.len(), "job finished");

    Ok(JobOutput {
        operation: config.operation,
        format: config.output_format,
        report,
        rows,
        rendered,
    })
}
