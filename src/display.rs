use owo_colors::{OwoColorize, Stream, Style};
use serde::Serialize;

use crate::runner::ProbeResult;
use crate::stats::{Comparison, RunSummary, StatusCount, Summary, TypeSummary, status_breakdown};
use crate::types::OperationResult;

/// Characters of an example error shown in the console summary.
const EXAMPLE_CHARS: usize = 50;

fn style_heading() -> Style {
    Style::new().bold()
}

fn rate_colored(rate: f64) -> String {
    let text = format!("{:.1}%", rate);
    if rate >= 100.0 {
        text.if_supports_color(Stream::Stdout, |s| s.green()).to_string()
    } else if rate > 0.0 {
        text.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string()
    } else {
        text.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
    }
}

/// One progress line per finished operation.
pub fn format_progress(result: &OperationResult) -> String {
    let mark = if result.success {
        "\u{2713}".if_supports_color(Stream::Stdout, |s| s.green()).to_string()
    } else {
        "\u{2717}".if_supports_color(Stream::Stdout, |s| s.red()).to_string()
    };

    let id = match (&result.post_id, result.operation_type.is_query()) {
        (Some(id), true) => format!(" (id {})", id),
        _ => String::new(),
    };

    let mut line = format!(
        "{} {:>3}{}: {:>8.2} ms - {}",
        result.operation_type, result.operation_number, id, result.duration_ms, mark
    );
    if !result.success && !result.error_message.is_empty() {
        let first_line = result.error_message.lines().next().unwrap_or("");
        line.push_str(&format!(" [{}] {}", result.status_code, first_line));
    }
    line
}

/// One-line success tally printed at the end of a phase.
pub fn format_phase_tally(label: &str, summary: &Summary) -> String {
    format!(
        "{} successful: {}/{} ({})",
        label,
        summary.successes,
        summary.count,
        rate_colored(summary.success_rate)
    )
}

fn push_type_block(out: &mut String, title: &str, summary: &Summary) {
    out.push_str(
        &title
            .if_supports_color(Stream::Stdout, |s| s.style(style_heading()))
            .to_string(),
    );
    out.push('\n');
    out.push_str(&format!("  Total: {}\n", summary.count));
    out.push_str(&format!(
        "  Successful: {} ({})\n",
        summary.successes,
        rate_colored(summary.success_rate)
    ));
    if let Some(l) = &summary.latency {
        out.push_str(&format!("  Mean: {:.2} ms\n", l.mean));
        out.push_str(&format!("  Median: {:.2} ms\n", l.median));
        out.push_str(&format!(
            "  P90/P95/P99: {:.2} / {:.2} / {:.2} ms\n",
            l.p90, l.p95, l.p99
        ));
    }
    out.push('\n');
}

/// Final console summary: overall tally, per-type blocks, and failed
/// operations grouped by status code.
pub fn format_summary(run: &RunSummary, results: &[OperationResult]) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    out.push_str(&rule.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string());
    out.push('\n');
    out.push_str(
        &"RESULTS SUMMARY"
            .if_supports_color(Stream::Stdout, |s| s.style(style_heading()))
            .to_string(),
    );
    out.push('\n');
    out.push_str(&rule.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string());
    out.push_str("\n\n");

    push_type_block(&mut out, "OVERALL", &run.overall);
    for TypeSummary {
        operation_type,
        summary,
    } in &run.by_type
    {
        push_type_block(&mut out, operation_type.as_str(), summary);
    }

    if let Some(cmp) = run.comparison() {
        out.push_str(&format!(
            "{} is {:.2} ms slower than {} on average\n\n",
            cmp.slower, cmp.difference_ms, cmp.faster
        ));
    }

    let breakdown = status_breakdown(results);
    if !breakdown.is_empty() {
        let failed: usize = breakdown.iter().map(|b| b.count).sum();
        let heading = format!("ERRORS ({} failed operations)", failed);
        out.push_str(&heading.if_supports_color(Stream::Stdout, |s| s.red()).to_string());
        out.push('\n');
        for entry in &breakdown {
            out.push_str(&format!(
                "  Status {}: {} occurrences\n",
                entry.status_code, entry.count
            ));
            if !entry.example.is_empty() {
                let example: String = entry.example.chars().take(EXAMPLE_CHARS).collect();
                out.push_str(&format!(
                    "    {}\n",
                    format!("Example: {}", example)
                        .if_supports_color(Stream::Stdout, |s| s.dimmed())
                ));
            }
        }
    }

    out
}

/// Endpoint availability list: 2xx/3xx, 4xx, and no response.
pub fn format_probe(probes: &[ProbeResult]) -> String {
    let mut out = String::new();
    for probe in probes {
        let (mark, detail) = match &probe.outcome {
            Ok(status) if *status < 400 => (
                "\u{2713}".if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
                status.to_string(),
            ),
            Ok(status) => (
                "\u{26A0}".if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
                status.to_string(),
            ),
            Err(err) => (
                "\u{2717}".if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
                err.to_string(),
            ),
        };
        out.push_str(&format!("  {} {} {}: {}\n", mark, probe.method, probe.path, detail));
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    summary: &'a RunSummary,
    comparison: Option<Comparison>,
    failures: Vec<StatusCount>,
}

/// Summaries, comparison and failure breakdown as pretty JSON.
pub fn format_json(run: &RunSummary, results: &[OperationResult]) -> String {
    let report = JsonReport {
        summary: run,
        comparison: run.comparison(),
        failures: status_breakdown(results),
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
}
