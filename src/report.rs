use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat, Utc};

use crate::errors::BenchError;
use crate::stats::{Latency, RunSummary, Summary};
use crate::types::{OperationResult, Scenario};

pub const CSV_COLUMNS: [&str; 8] = [
    "operation_type",
    "operation_number",
    "duration_ms",
    "success",
    "status_code",
    "post_id",
    "error_message",
    "timestamp",
];

const RULE_WIDTH: usize = 60;

/// Run details printed in the TXT header. Fields unknown when re-reading a
/// CSV are left out.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated_at: DateTime<Local>,
    pub base_url: Option<String>,
    pub scenario: Option<Scenario>,
    pub operation_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub csv: PathBuf,
    pub txt: PathBuf,
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// One row per result under a fixed header. Durations keep two decimals.
pub fn format_csv(results: &[OperationResult]) -> String {
    let mut out = CSV_COLUMNS.join(",");
    out.push('\n');

    for r in results {
        let post_id = r.post_id.as_deref().map(csv_escape).unwrap_or_default();
        // Infallible for String.
        let _ = writeln!(
            out,
            "{},{},{:.2},{},{},{},{},{}",
            r.operation_type,
            r.operation_number,
            r.duration_ms,
            r.success,
            r.status_code,
            post_id,
            csv_escape(&r.error_message),
            r.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    }

    out
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Split CSV text into records, honouring quoted fields. Returns each record
/// with the 1-based line it starts on.
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, BenchError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut fields)));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(BenchError::CsvParseError {
            line: record_line,
            detail: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push((record_line, fields));
    }

    Ok(records)
}

/// Parse CSV text produced by [`format_csv`] back into results.
pub fn parse_csv(text: &str) -> Result<Vec<OperationResult>, BenchError> {
    let mut records = split_records(text)?.into_iter();

    match records.next() {
        Some((_, header)) if header == CSV_COLUMNS => {}
        Some((line, _)) => {
            return Err(BenchError::CsvParseError {
                line,
                detail: format!("expected header '{}'", CSV_COLUMNS.join(",")),
            });
        }
        None => {
            return Err(BenchError::CsvParseError {
                line: 1,
                detail: "empty file".to_string(),
            });
        }
    }

    records
        .filter(|(_, fields)| !(fields.len() == 1 && fields[0].is_empty()))
        .map(|(line, fields)| parse_row(line, &fields))
        .collect()
}

fn parse_row(line: usize, fields: &[String]) -> Result<OperationResult, BenchError> {
    let err = |detail: String| BenchError::CsvParseError { line, detail };

    if fields.len() != CSV_COLUMNS.len() {
        return Err(err(format!(
            "expected {} fields, found {}",
            CSV_COLUMNS.len(),
            fields.len()
        )));
    }

    let operation_type = fields[0].parse().map_err(err)?;
    let operation_number = fields[1]
        .parse()
        .map_err(|_| err(format!("invalid operation_number '{}'", fields[1])))?;
    let duration_ms: f64 = fields[2]
        .parse()
        .map_err(|_| err(format!("invalid duration_ms '{}'", fields[2])))?;
    if !duration_ms.is_finite() || duration_ms < 0.0 {
        return Err(err(format!("duration_ms out of range '{}'", fields[2])));
    }
    let success = match fields[3].as_str() {
        "true" | "True" => true,
        "false" | "False" => false,
        other => return Err(err(format!("invalid success '{}'", other))),
    };
    let status_code = fields[4]
        .parse()
        .map_err(|_| err(format!("invalid status_code '{}'", fields[4])))?;
    let post_id = (!fields[5].is_empty()).then(|| fields[5].clone());
    let timestamp = DateTime::parse_from_rfc3339(&fields[7])
        .map_err(|e| err(format!("invalid timestamp '{}': {}", fields[7], e)))?
        .with_timezone(&Utc);

    Ok(OperationResult {
        operation_type,
        operation_number,
        duration_ms,
        success,
        status_code,
        post_id,
        error_message: fields[6].clone(),
        timestamp,
    })
}

pub fn read_results_csv(path: &Path) -> Result<Vec<OperationResult>, BenchError> {
    let text = std::fs::read_to_string(path).map_err(|source| BenchError::ResultsReadError {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(&text)
}

// ---------------------------------------------------------------------------
// TXT
// ---------------------------------------------------------------------------

fn push_section_title(out: &mut String, title: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(title.chars().count()));
    out.push('\n');
}

fn push_latency(out: &mut String, l: &Latency) {
    let rows = [
        ("Mean", l.mean),
        ("Median", l.median),
        ("Std deviation", l.std_dev),
        ("Min", l.min),
        ("Max", l.max),
        ("Total time", l.sum),
        ("P50", l.p50),
        ("P90", l.p90),
        ("P95", l.p95),
        ("P99", l.p99),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "{}: {:.2} ms", label, value);
    }
}

fn push_summary(out: &mut String, title: &str, summary: &Summary) {
    push_section_title(out, title);
    let _ = writeln!(out, "Total operations: {}", summary.count);
    let _ = writeln!(
        out,
        "Successful: {}/{} ({:.1}%)",
        summary.successes, summary.count, summary.success_rate
    );
    match &summary.latency {
        Some(latency) => push_latency(out, latency),
        None => out.push_str("No successful samples; latency statistics omitted.\n"),
    }
    out.push('\n');
}

/// Human-readable digest: one section per operation type, an overall
/// section and a command/query comparison.
pub fn format_statistics(run: &RunSummary, ctx: &ReportContext) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let _ = writeln!(out, "{}", rule);
    out.push_str("CQRS API PERFORMANCE STATISTICS\n");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Date: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(url) = &ctx.base_url {
        let _ = writeln!(out, "Base URL: {}", url);
    }
    if let Some(scenario) = ctx.scenario {
        let _ = writeln!(out, "Scenario: {}", scenario);
    }
    if let Some(count) = ctx.operation_count {
        let _ = writeln!(out, "Operations per phase: {}", count);
    }
    out.push('\n');

    for entry in &run.by_type {
        push_summary(&mut out, entry.operation_type.as_str(), &entry.summary);
    }
    push_summary(&mut out, "OVERALL", &run.overall);

    push_section_title(&mut out, "COMPARISON");
    match run.comparison() {
        Some(cmp) => {
            let _ = write!(
                out,
                "{} is {:.2} ms slower than {} on average",
                cmp.slower, cmp.difference_ms, cmp.faster
            );
            if let Some(ratio) = cmp.ratio {
                let _ = write!(out, " ({:.2}x)", ratio);
            }
            out.push('\n');
        }
        None => out.push_str("Not enough successful samples to compare.\n"),
    }
    for entry in run
        .by_type
        .iter()
        .filter(|t| t.operation_type.is_command() || t.operation_type.is_query())
    {
        let _ = writeln!(
            out,
            "{} success rate: {:.1}%",
            entry.operation_type, entry.summary.success_rate
        );
    }

    out
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub fn results_file_name(at: DateTime<Local>) -> String {
    format!("performance_results_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

pub fn statistics_file_name(at: DateTime<Local>) -> String {
    format!("performance_statistics_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

fn write_file(path: &Path, contents: &str) -> Result<(), BenchError> {
    std::fs::write(path, contents).map_err(|source| BenchError::OutputWriteError {
        path: path.to_path_buf(),
        source,
    })
}

/// Write both artifacts into `dir`, creating it if needed.
pub fn write_reports(
    dir: &Path,
    results: &[OperationResult],
    run: &RunSummary,
    ctx: &ReportContext,
) -> Result<ReportFiles, BenchError> {
    std::fs::create_dir_all(dir).map_err(|source| BenchError::OutputWriteError {
        path: dir.to_path_buf(),
        source,
    })?;

    let files = ReportFiles {
        csv: dir.join(results_file_name(ctx.generated_at)),
        txt: dir.join(statistics_file_name(ctx.generated_at)),
    };
    write_file(&files.csv, &format_csv(results))?;
    write_file(&files.txt, &format_statistics(run, ctx))?;

    tracing::info!(csv = %files.csv.display(), txt = %files.txt.display(), "reports written");
    Ok(files)
}
