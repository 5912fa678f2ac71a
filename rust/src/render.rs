//! Output encodings for job results: `json`, `csv`, `text`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output encoding selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Text,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "text" | "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

fn csv_cell(value: &Value) -> String {
    let raw = match value {
        Value::Null => return String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => return b.to_string(),
        Value::Number(n) => return n.to_string(),
        other => other.to_string(),
    };
    if raw.contains(',') || raw.contains('"') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw
    }
}

/// Render rows as CSV. The header comes from the keys of the first row, in
/// insertion order; scalar rows render under a single `value` column.
pub fn to_csv(rows: &[Value]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let headers: Vec<String> = match first {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => vec!["value".to_string()],
    };

    let mut out = headers.join(",");
    for row in rows {
        out.push('\n');
        let line: Vec<String> = match row {
            Value::Object(map) => headers
                .iter()
                .map(|h| csv_cell(map.get(h).unwrap_or(&Value::Null)))
                .collect(),
            scalar => vec![csv_cell(scalar)],
        };
        out.push_str(&line.join(","));
    }
    out
}

/// One line per row: strings as-is, anything else as compact JSON.
pub fn to_text(rows: &[Value]) -> String {
    rows.iter()
        .map(|row| match row {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render `report` (json) or `rows` (csv, text).
pub fn render(
    format: OutputFormat,
    report: &Value,
    rows: &[Value],
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report),
        OutputFormat::Csv => Ok(to_csv(rows)),
        OutputFormat::Text => Ok(to_text(rows)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::parse("txt"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("xml"), None);
        assert_eq!(OutputFormat::Text.as_str(), "text");
    }

    #[test]
    fn test_csv_header_and_rows() {
        let rows = vec![
            json!({"input": "a", "valid": true, "version": 4}),
            json!({"input": "b", "valid": false, "version": null}),
        ];
        assert_eq!(to_csv(&rows), "input,valid,version\na,true,4\nb,false,");
    }

    #[test]
    fn test_csv_quotes_commas_and_quotes() {
        let rows = vec![json!({"value": "x,y", "note": "say \"hi\""})];
        assert_eq!(to_csv(&rows), "value,note\n\"x,y\",\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_header_follows_first_row_key_order() {
        let rows = vec![
            json!({"valid": true, "input": "a", "version": 4}),
            json!({"version": 5, "input": "b", "valid": false}),
        ];
        assert_eq!(to_csv(&rows), "valid,input,version\ntrue,a,4\nfalse,b,5");
    }

    #[test]
    fn test_csv_scalar_rows_and_empty() {
        assert_eq!(to_csv(&[json!("u1"), json!("u2")]), "value\nu1\nu2");
        assert_eq!(to_csv(&[]), "");
    }

    #[test]
    fn test_text_lines() {
        let rows = vec![json!("u1"), json!({"a": 1})];
        assert_eq!(to_text(&rows), "u1\n{\"a\":1}");
    }

    #[test]
    fn test_render_json_uses_report() {
        let out = render(OutputFormat::Json, &json!({"total": 1}), &[]).unwrap();
        let back: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(back["total"], 1);
    }
}
