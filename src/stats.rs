use serde::Serialize;

use crate::types::{OperationResult, OperationType};

/// Linear-interpolation quantile over an ascending sample.
///
/// Uses `h = (n - 1) * q` and interpolates between the neighbouring order
/// statistics. Returns `None` for an empty sample and the single value when
/// `n == 1`. `q` is clamped to `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    let fraction = h - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Latency statistics over successful samples, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Latency {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Latency {
    /// `None` when there are no samples. Standard deviation is the sample
    /// deviation and degrades to 0 below two samples.
    pub fn from_samples(samples: &[f64]) -> Option<Latency> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let sum: f64 = sorted.iter().sum();
        let mean = sum / n;
        let std_dev = if sorted.len() < 2 {
            0.0
        } else {
            let squares: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
            (squares / (n - 1.0)).sqrt()
        };

        let q = |p: f64| quantile(&sorted, p).unwrap_or(0.0);
        let median = q(0.5);

        Some(Latency {
            mean,
            median,
            std_dev,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            sum,
            p50: median,
            p90: q(0.90),
            p95: q(0.95),
            p99: q(0.99),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub successes: usize,
    /// Percentage, `successes / count * 100`; 0 for an empty partition.
    pub success_rate: f64,
    pub latency: Option<Latency>,
}

impl Summary {
    pub fn from_results<'a, I>(results: I) -> Summary
    where
        I: IntoIterator<Item = &'a OperationResult>,
    {
        let mut count = 0;
        let mut samples = Vec::new();
        for result in results {
            count += 1;
            if result.success {
                samples.push(result.duration_ms);
            }
        }

        let successes = samples.len();
        let success_rate = if count == 0 {
            0.0
        } else {
            successes as f64 / count as f64 * 100.0
        };

        Summary {
            count,
            successes,
            success_rate,
            latency: Latency::from_samples(&samples),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub operation_type: OperationType,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub by_type: Vec<TypeSummary>,
    pub overall: Summary,
}

impl RunSummary {
    pub fn get(&self, operation_type: OperationType) -> Option<&Summary> {
        self.by_type
            .iter()
            .find(|t| t.operation_type == operation_type)
            .map(|t| &t.summary)
    }

    /// Compare the first command type against the first query type.
    pub fn comparison(&self) -> Option<Comparison> {
        let command = self.by_type.iter().find(|t| t.operation_type.is_command())?;
        let query = self.by_type.iter().find(|t| t.operation_type.is_query())?;
        compare(
            (command.operation_type, &command.summary),
            (query.operation_type, &query.summary),
        )
    }
}

/// Partition by operation type, in order of first appearance.
pub fn summarize(results: &[OperationResult]) -> RunSummary {
    let mut order: Vec<OperationType> = Vec::new();
    for result in results {
        if !order.contains(&result.operation_type) {
            order.push(result.operation_type);
        }
    }

    let by_type = order
        .into_iter()
        .map(|operation_type| TypeSummary {
            operation_type,
            summary: Summary::from_results(
                results.iter().filter(|r| r.operation_type == operation_type),
            ),
        })
        .collect();

    RunSummary {
        by_type,
        overall: Summary::from_results(results),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub slower: OperationType,
    pub faster: OperationType,
    pub difference_ms: f64,
    /// `None` when the faster mean is zero.
    pub ratio: Option<f64>,
}

/// Which side is slower on mean latency. `None` unless both sides have
/// successful samples.
pub fn compare(a: (OperationType, &Summary), b: (OperationType, &Summary)) -> Option<Comparison> {
    let a_mean = a.1.latency.as_ref()?.mean;
    let b_mean = b.1.latency.as_ref()?.mean;

    let ((slower, slow_mean), (faster, fast_mean)) = if a_mean > b_mean {
        ((a.0, a_mean), (b.0, b_mean))
    } else {
        ((b.0, b_mean), (a.0, a_mean))
    };

    Some(Comparison {
        slower,
        faster,
        difference_ms: slow_mean - fast_mean,
        ratio: (fast_mean > 0.0).then(|| slow_mean / fast_mean),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status_code: i32,
    pub count: usize,
    pub example: String,
}

/// Failed operations grouped by status code, in order of first appearance.
pub fn status_breakdown(results: &[OperationResult]) -> Vec<StatusCount> {
    let mut out: Vec<StatusCount> = Vec::new();
    for result in results.iter().filter(|r| !r.success) {
        match out.iter_mut().find(|s| s.status_code == result.status_code) {
            Some(entry) => entry.count += 1,
            None => out.push(StatusCount {
                status_code: result.status_code,
                count: 1,
                example: result.error_message.clone(),
            }),
        }
    }
    out
}
