use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use uuidkit::mcp::McpServer;
use uuidkit::{
    FormatOptions, JobConfig, Operation, OutputFormat, analyze_uuid, batch_analyze,
    batch_validate, check_collisions, convert_format, generate_statistics, run_job,
    validate_uuid,
};

#[derive(Debug, Clone, Default)]
struct ListOpts {
    uuids: Vec<String>,
    format: OutputFormat,
}

#[derive(Debug, Clone, Default)]
struct GenerateOpts {
    version: Option<u8>,
    count: Option<usize>,
    namespace: Option<String>,
    name: Option<String>,
    format: FormatOptions,
    output: Option<OutputFormat>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("UUIDKIT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

const USAGE: &str = "uuidkit - UUID generate/validate/analyze/convert toolkit\n\n\
Usage:\n  uuidkit generate [--version 1|4|5] [--count <n>] [--namespace DNS|URL|OID|X500|<uuid>] [--name <s>] [--uppercase] [--no-dashes] [--format json|csv|text]\n  uuidkit validate <uuid>...\n  uuidkit analyze <uuid>...\n  uuidkit convert <uuid> [--uppercase] [--no-dashes]\n  uuidkit collisions <uuid>... [--file <path>] [--format json|csv|text]\n  uuidkit stats <uuid>... [--file <path>]\n  uuidkit job <config.json> [--out <path>]\n  uuidkit serve\n  uuidkit version\n\
Canonical mode:\n  uuidkit A=<operation> UUID=<uuid> UUIDS=<a,b,...> V=1|4|5 N=<count> NS=<namespace> NAME=<s> U=true D=true F=json|csv|text OUT=<path>\n\
Logging:\n  UUIDKIT_LOG=debug uuidkit serve\n";

fn print_help() {
    eprintln!("{USAGE}");
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(s).ok_or_else(|| "format must be json, csv or text".to_string())
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on")
}

fn flag_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn read_lines(path: &Path) -> Result<Vec<String>, String> {
    let data = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn parse_list_flags(args: &[String]) -> Result<ListOpts, String> {
    let mut opts = ListOpts::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--file" => {
                let path = flag_value(args, i, "--file")?;
                opts.uuids.extend(read_lines(Path::new(path))?);
                i += 2;
            }
            "--format" => {
                opts.format = parse_output_format(flag_value(args, i, "--format")?)?;
                i += 2;
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            value => {
                opts.uuids.push(value.to_string());
                i += 1;
            }
        }
    }

    Ok(opts)
}

fn parse_generate_flags(args: &[String]) -> Result<GenerateOpts, String> {
    let mut opts = GenerateOpts::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--version" | "-v" => {
                opts.version = Some(
                    flag_value(args, i, "--version")?
                        .parse()
                        .map_err(|_| "invalid integer for --version".to_string())?,
                );
                i += 2;
            }
            "--count" | "-n" => {
                opts.count = Some(
                    flag_value(args, i, "--count")?
                        .parse()
                        .map_err(|_| "invalid integer for --count".to_string())?,
                );
                i += 2;
            }
            "--namespace" => {
                opts.namespace = Some(flag_value(args, i, "--namespace")?.to_string());
                i += 2;
            }
            "--name" => {
                opts.name = Some(flag_value(args, i, "--name")?.to_string());
                i += 2;
            }
            "--format" => {
                opts.output = Some(parse_output_format(flag_value(args, i, "--format")?)?);
                i += 2;
            }
            "--uppercase" => {
                opts.format.uppercase = true;
                i += 1;
            }
            "--no-dashes" | "--remove-dashes" => {
                opts.format.remove_dashes = true;
                i += 1;
            }
            _ => return Err(format!("unknown flag: {}", args[i])),
        }
    }

    Ok(opts)
}

fn print_json(value: &Value) -> Result<(), String> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).map_err(|e| e.to_string())?
    );
    Ok(())
}

fn run_generate(args: &[String]) -> Result<(), String> {
    let opts = parse_generate_flags(args)?;
    let defaults = JobConfig::default();
    let config = JobConfig {
        operation: Operation::Generate,
        version: opts.version.unwrap_or(defaults.version),
        count: opts.count.unwrap_or(defaults.count),
        namespace: opts.namespace.unwrap_or(defaults.namespace),
        name: opts.name,
        uppercase: opts.format.uppercase,
        remove_dashes: opts.format.remove_dashes,
        output_format: opts.output.unwrap_or(OutputFormat::Text),
        ..defaults
    };
    let out = run_job(&config).map_err(|e| e.to_string())?;
    println!("{}", out.rendered);
    Ok(())
}

fn run_validate(args: &[String]) -> Result<(), String> {
    let opts = parse_list_flags(args)?;
    match opts.uuids.as_slice() {
        [] => Err("validate requires a uuid".to_string()),
        [one] => {
            let ok = validate_uuid(one).map_err(|e| e.to_string())?;
            println!("{}", if ok { "true" } else { "false" });
            if ok {
                Ok(())
            } else {
                Err("invalid uuid".to_string())
            }
        }
        many => {
            let report = batch_validate(many).map_err(|e| e.to_string())?;
            print_json(&serde_json::to_value(report).map_err(|e| e.to_string())?)
        }
    }
}

fn run_analyze(args: &[String]) -> Result<(), String> {
    let opts = parse_list_flags(args)?;
    let value = match opts.uuids.as_slice() {
        [] => return Err("analyze requires a uuid".to_string()),
        [one] => serde_json::to_value(analyze_uuid(one).map_err(|e| e.to_string())?),
        many => serde_json::to_value(batch_analyze(many).map_err(|e| e.to_string())?),
    }
    .map_err(|e| e.to_string())?;
    print_json(&value)
}

fn run_convert(args: &[String]) -> Result<(), String> {
    let mut format = FormatOptions::default();
    let mut target: Option<&str> = None;
    for arg in args {
        match arg.as_str() {
            "--uppercase" => format.uppercase = true,
            "--no-dashes" | "--remove-dashes" => format.remove_dashes = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            value => target = Some(value),
        }
    }
    let target = target.ok_or_else(|| "convert requires a uuid".to_string())?;
    println!(
        "{}",
        convert_format(target, format).map_err(|e| e.to_string())?
    );
    Ok(())
}

fn run_collisions(args: &[String]) -> Result<(), String> {
    let opts = parse_list_flags(args)?;
    let report = check_collisions(&opts.uuids).map_err(|e| e.to_string())?;
    let value = serde_json::to_value(&report).map_err(|e| e.to_string())?;
    match opts.format {
        OutputFormat::Json => print_json(&value),
        other => {
            let rows = value["collisions"].as_array().cloned().unwrap_or_default();
            let rendered = uuidkit::render(other, &value, &rows).map_err(|e| e.to_string())?;
            println!("{rendered}");
            Ok(())
        }
    }
}

fn run_stats(args: &[String]) -> Result<(), String> {
    let opts = parse_list_flags(args)?;
    let stats = generate_statistics(&opts.uuids).map_err(|e| e.to_string())?;
    print_json(&serde_json::to_value(stats).map_err(|e| e.to_string())?)
}

fn run_config(config: &JobConfig, out: Option<PathBuf>) -> Result<(), String> {
    let output = run_job(config).map_err(|e| e.to_string())?;
    match out {
        Some(path) => {
            output.save(&path).map_err(|e| e.to_string())?;
            tracing::info!(path = %path.display(), "wrote job output");
        }
        None => println!("{}", output.rendered),
    }
    Ok(())
}

fn run_job_file(args: &[String]) -> Result<(), String> {
    let Some(path) = args.first() else {
        return Err("job requires a config path".to_string());
    };
    let mut out = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                out = Some(PathBuf::from(flag_value(args, i, "--out")?));
                i += 2;
            }
            _ => return Err(format!("unknown flag: {}", args[i])),
        }
    }
    let config = JobConfig::load(Path::new(path)).map_err(|e| e.to_string())?;
    run_config(&config, out)
}

fn parse_canonical(args: &[String]) -> Result<(JobConfig, Option<PathBuf>), String> {
    let mut c = JobConfig::default();
    let mut out = None;

    for arg in args {
        let Some((k, v)) = arg.split_once('=') else {
            return Err(format!("expected KEY=VALUE, got '{arg}'"));
        };

        match k.to_ascii_uppercase().as_str() {
            "A" => {
                c.operation =
                    Operation::parse(v).ok_or_else(|| format!("unknown operation: {v}"))?
            }
            "V" => c.version = v.parse().map_err(|_| "invalid V".to_string())?,
            "N" => c.count = v.parse().map_err(|_| "invalid N".to_string())?,
            "NS" => c.namespace = v.to_string(),
            "NAME" => c.name = Some(v.to_string()),
            "UUID" => c.uuid = Some(v.to_string()),
            "UUIDS" => {
                let list: Vec<Value> = v
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| json!(s))
                    .collect();
                c.uuids = Some(Value::Array(list));
            }
            "FILE" => {
                let list: Vec<Value> = read_lines(Path::new(v))?.into_iter().map(Value::from).collect();
                c.uuids = Some(Value::Array(list));
            }
            "U" => c.uppercase = parse_bool(v),
            "D" => c.remove_dashes = parse_bool(v),
            "F" => c.output_format = parse_output_format(v)?,
            "OUT" => out = Some(PathBuf::from(v)),
            _ => return Err(format!("unknown key: {k}")),
        }
    }

    Ok((c, out))
}

fn run_canonical(args: &[String]) -> Result<(), String> {
    let (config, out) = parse_canonical(args)?;
    run_config(&config, out)
}

fn run_serve() -> Result<(), String> {
    McpServer::new().run().map_err(|e| e.to_string())
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        print_help();
        process::exit(2);
    }

    if args[0] == "-h" || args[0] == "--help" || args[0] == "help" {
        print_help();
        return;
    }

    init_logging();

    if args.iter().all(|a| a.contains('=') && !a.starts_with("--")) {
        if let Err(err) = run_canonical(&args) {
            eprintln!("error: {err}");
            process::exit(1);
        }
        return;
    }

    let cmd = args[0].as_str();
    let rest = &args[1..];

    let res = match cmd {
        "generate" | "gen" => run_generate(rest),
        "validate" => run_validate(rest),
        "analyze" => run_analyze(rest),
        "convert" => run_convert(rest),
        "collisions" => run_collisions(rest),
        "stats" => run_stats(rest),
        "job" => run_job_file(rest),
        "serve" => run_serve(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        _ => Err(format!("unknown command: {}", cmd)),
    };

    if let Err(err) = res {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("csv").unwrap(), OutputFormat::Csv);
        assert!(parse_output_format("xml").is_err());
    }

    #[test]
    fn test_usage_lists_every_command() {
        for cmd in [
            "generate", "validate", "analyze", "convert", "collisions", "stats", "job", "serve",
            "version",
        ] {
            assert!(USAGE.contains(&format!("uuidkit {cmd}")), "{cmd} missing from usage");
        }
        assert!(!USAGE.contains("selftest"));
    }

    #[test]
    fn test_parse_generate_flags() {
        let opts = parse_generate_flags(&args(&[
            "--version", "5", "--name", "example.com", "--count", "3", "--uppercase",
        ]))
        .unwrap();
        assert_eq!(opts.version, Some(5));
        assert_eq!(opts.count, Some(3));
        assert_eq!(opts.name.as_deref(), Some("example.com"));
        assert!(opts.format.uppercase);
        assert!(!opts.format.remove_dashes);
        assert!(parse_generate_flags(&args(&["--count"])).is_err());
        assert!(parse_generate_flags(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_parse_list_flags() {
        let opts = parse_list_flags(&args(&["a", "b", "--format", "csv"])).unwrap();
        assert_eq!(opts.uuids, vec!["a", "b"]);
        assert_eq!(opts.format, OutputFormat::Csv);
    }

    #[test]
    fn test_parse_canonical() {
        let (c, out) = parse_canonical(&args(&[
            "A=stats",
            "UUIDS=a, b,c",
            "F=csv",
            "OUT=/tmp/x.csv",
        ]))
        .unwrap();
        assert_eq!(c.operation, Operation::Statistics);
        assert_eq!(c.uuids, Some(json!(["a", "b", "c"])));
        assert_eq!(c.output_format, OutputFormat::Csv);
        assert_eq!(out, Some(PathBuf::from("/tmp/x.csv")));
        assert!(parse_canonical(&args(&["A=nope"])).is_err());
        assert!(parse_canonical(&args(&["Q=1"])).is_err());
    }
}
