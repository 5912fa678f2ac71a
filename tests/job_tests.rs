//! End-to-end job runs from configuration files.

use serde_json::json;
use std::fs;
use uuidkit::{JobConfig, JobError, OutputFormat, UuidError, run_job};

fn write_config(dir: &tempfile::TempDir, value: serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join("job.json");
    fs::write(&path, value.to_string()).unwrap();
    path
}

#[test]
fn test_analyze_job_from_file_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        json!({
            "operation": "analyze",
            "uuids": [
                "f47ac10b-58cc-4372-a567-0e02b2c3d479",
                {"identifier": "not-a-uuid"}
            ],
            "output_format": "csv"
        }),
    );

    let config = JobConfig::load(&path).unwrap();
    assert_eq!(config.output_format, OutputFormat::Csv);

    let out = run_job(&config).unwrap();
    assert_eq!(out.report["total"], 2);
    assert_eq!(out.report["versions"]["4"], 1);

    let mut lines = out.rendered.lines();
    let header = lines.next().unwrap();
    assert_eq!(header, "input,valid,normalized,version,variant,format,type");
    assert_eq!(
        lines.next().unwrap(),
        "f47ac10b-58cc-4372-a567-0e02b2c3d479,true,f47ac10b-58cc-4372-a567-0e02b2c3d479,4,RFC 4122,standard,random"
    );
    assert_eq!(lines.next().unwrap(), "not-a-uuid,false,,,,,");

    let saved = dir.path().join("out.csv");
    out.save(&saved).unwrap();
    assert_eq!(fs::read_to_string(saved).unwrap(), out.rendered);
}

#[test]
fn test_generate_job_text_output() {
    let config = JobConfig::from_json(
        r#"{"operation": "generate", "version": 1, "count": 4, "uppercase": true, "output_format": "text"}"#,
    )
    .unwrap();
    let out = run_job(&config).unwrap();
    let lines: Vec<&str> = out.rendered.lines().collect();
    assert_eq!(lines.len(), 4);
    for line in lines {
        assert_eq!(line, line.to_uppercase());
        assert_eq!(uuidkit::uuid_version(line), Some(1));
    }
}

#[test]
fn test_malformed_config_is_rejected() {
    assert!(matches!(
        JobConfig::from_json(r#"{"operation": "explode"}"#),
        Err(JobError::Json(_))
    ));
    let config = JobConfig::from_json(r#"{"operation": "validate", "uuids": {"a": 1}}"#).unwrap();
    assert!(matches!(
        run_job(&config),
        Err(JobError::Uuid(UuidError::NotAList))
    ));
}
