use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::client::{HttpMethod, Request, Transport, TransportError};
use crate::config::{BenchConfig, DiscoveredEndpoints};
use crate::display;
use crate::errors::BenchError;
use crate::executor::{self, Execution, MAX_ERROR_CHARS, truncate_chars};
use crate::payload;
use crate::stats::Summary;
use crate::types::{OperationResult, OperationType, Scenario};

/// Tried in order; any HTTP response means the server is up.
pub const HEALTH_PATHS: &[&str] = &["/actuator/health", "/health", "/info", "/"];

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Post resources tried for inserts, the configured default first.
const INSERT_CANDIDATES: &[&str] = &[
    "/post",
    "/api/post",
    "/api/posts",
    "/command/post",
    "/posts",
];

/// Single-post reads tried for queries; the trailing `/1` is the probe id.
const QUERY_CANDIDATES: &[&str] = &[
    "/post/1",
    "/api/post/1",
    "/api/posts/1",
    "/query/post/1",
    "/posts/1",
];

fn probe_targets() -> impl Iterator<Item = (HttpMethod, &'static str)> {
    HEALTH_PATHS
        .iter()
        .map(|p| (HttpMethod::Get, *p))
        .chain(INSERT_CANDIDATES.iter().map(|p| (HttpMethod::Post, *p)))
        .chain(QUERY_CANDIDATES.iter().map(|p| (HttpMethod::Get, *p)))
        .chain([(HttpMethod::Get, "/posts"), (HttpMethod::Post, "/sync")])
}

/// Upper bound for ids guessed when no real id is known.
const FALLBACK_ID_RANGE: u32 = 1000;

/// Fail fast when nothing answers on any health path.
pub fn check_server<T: Transport + ?Sized>(transport: &T) -> Result<(), BenchError> {
    let mut last_error = None;
    for path in HEALTH_PATHS {
        match transport.send(&Request::get(*path, PROBE_TIMEOUT)) {
            Ok(response) => {
                tracing::info!(path, status = response.status, "server reachable");
                return Ok(());
            }
            Err(err) => {
                tracing::debug!(path, error = %err, "health probe failed");
                last_error = Some(err);
            }
        }
    }

    Err(BenchError::ServerUnreachable {
        url: transport.base_url().to_string(),
        detail: last_error
            .map(|e| truncate_chars(&e.to_string(), MAX_ERROR_CHARS))
            .unwrap_or_else(|| "no response".to_string()),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub method: HttpMethod,
    pub path: &'static str,
    pub outcome: Result<u16, TransportError>,
}

impl ProbeResult {
    /// Answered below 400.
    pub fn works(&self) -> bool {
        matches!(self.outcome, Ok(status) if status < 400)
    }
}

/// Hit each known endpoint once and report what answers.
pub fn probe_endpoints<T: Transport + ?Sized>(transport: &T) -> Vec<ProbeResult> {
    probe_targets()
        .map(|(method, path)| {
            let request = match method {
                HttpMethod::Get => Request::get(path, PROBE_TIMEOUT),
                HttpMethod::Post if path != "/sync" => Request::post(
                    path,
                    Some(serde_json::json!({ "content": "endpoint probe" })),
                    PROBE_TIMEOUT,
                ),
                HttpMethod::Post => Request::post(path, None, PROBE_TIMEOUT),
            };
            ProbeResult {
                method,
                path,
                outcome: transport.send(&request).map(|r| r.status),
            }
        })
        .collect()
}

/// First working insert and query resources among the probed candidates.
pub fn discover_endpoints(probes: &[ProbeResult]) -> DiscoveredEndpoints {
    DiscoveredEndpoints {
        insert_path: first_working(probes, HttpMethod::Post, INSERT_CANDIDATES)
            .map(str::to_string),
        query_path: first_working(probes, HttpMethod::Get, QUERY_CANDIDATES)
            .and_then(|path| path.strip_suffix("/1"))
            .map(str::to_string),
    }
}

fn first_working(
    probes: &[ProbeResult],
    method: HttpMethod,
    candidates: &[&str],
) -> Option<&'static str> {
    probes
        .iter()
        .find(|p| p.method == method && candidates.contains(&p.path) && p.works())
        .map(|p| p.path)
}

/// Drives one benchmark run. Results are appended in program order.
pub struct Runner<'a, T: Transport + ?Sized> {
    transport: &'a T,
    config: &'a BenchConfig,
    rng: StdRng,
    results: Vec<OperationResult>,
    progress: bool,
    health_check: bool,
}

impl<'a, T: Transport + ?Sized> Runner<'a, T> {
    pub fn new(transport: &'a T, config: &'a BenchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Runner {
            transport,
            config,
            rng,
            results: Vec::with_capacity(config.operation_count * 2 + 1),
            progress: true,
            health_check: true,
        }
    }

    /// Print per-operation progress lines to stdout.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Skip the startup health check when the caller already ran one.
    pub fn with_health_check(mut self, health_check: bool) -> Self {
        self.health_check = health_check;
        self
    }

    /// Health check, scenario setup, command phase, optional sync, query
    /// phase. Per-operation failures are recorded, not returned.
    pub fn run(mut self) -> Result<Vec<OperationResult>, BenchError> {
        if self.health_check {
            check_server(self.transport)?;
        }

        tracing::info!(
            base_url = %self.transport.base_url(),
            insert_path = %self.config.insert_path,
            query_path = %self.config.query_path,
            scenario = %self.config.scenario,
            operations = self.config.operation_count,
            "starting benchmark"
        );

        match self.config.scenario {
            Scenario::Posts => self.run_posts(),
            Scenario::Comments => self.run_comments()?,
            Scenario::Reactions => self.run_reactions(),
        }

        Ok(self.results)
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    fn record(&mut self, result: OperationResult) {
        if self.progress {
            println!("{}", display::format_progress(&result));
        }
        self.results.push(result);
    }

    fn pause(&self) {
        if self.config.pause_ms > 0 {
            std::thread::sleep(self.config.pause());
        }
    }

    fn phase_header(&self, number: usize, operation_type: OperationType) {
        tracing::info!(phase = number, operation = %operation_type, "phase started");
        if self.progress {
            println!(
                "\n--- PHASE {}: {} ({} operations) ---",
                number, operation_type, self.config.operation_count
            );
        }
    }

    fn phase_tally(&self, operation_type: OperationType) {
        let summary = Summary::from_results(
            self.results
                .iter()
                .filter(|r| r.operation_type == operation_type),
        );
        tracing::info!(
            operation = %operation_type,
            successes = summary.successes,
            total = summary.count,
            "phase finished"
        );
        if self.progress {
            println!("{}", display::format_phase_tally(operation_type.as_str(), &summary));
        }
    }

    fn execute(
        &self,
        request: &Request,
        operation_type: OperationType,
        number: usize,
    ) -> Execution {
        executor::execute(self.transport, request, operation_type, number)
    }

    fn random_fallback_id(&mut self) -> String {
        self.rng.random_range(1..=FALLBACK_ID_RANGE).to_string()
    }

    fn query_phase<F>(&mut self, phase: usize, operation_type: OperationType, mut pick_id: F)
    where
        F: FnMut(&mut Self, usize) -> String,
    {
        self.phase_header(phase, operation_type);
        for number in 1..=self.config.operation_count {
            let id = pick_id(self, number);
            let path = format!("{}/{}", self.config.query_path, id);
            let request = Request::get(path, self.timeout());
            let exec = self.execute(&request, operation_type, number);
            self.record(OperationResult {
                post_id: Some(id),
                ..exec.result
            });
            self.pause();
        }
        self.phase_tally(operation_type);
    }

    fn maybe_sync(&mut self) {
        if !self.config.sync {
            return;
        }
        if self.progress {
            println!("\n--- SYNC ---");
        }
        let request = Request::post("/sync", None, self.config.sync_timeout());
        let exec = self.execute(&request, OperationType::Sync, 1);
        self.record(OperationResult {
            post_id: None,
            ..exec.result
        });
    }

    // -----------------------------------------------------------------------
    // posts
    // -----------------------------------------------------------------------

    fn run_posts(&mut self) {
        let mut inserted = Vec::new();

        self.phase_header(1, OperationType::Insert);
        for number in 1..=self.config.operation_count {
            let body = payload::generate_post(number, &mut self.rng);
            let path = self.config.insert_path.clone();
            let request = Request::post(path, Some(body), self.timeout());
            let exec = self.execute(&request, OperationType::Insert, number);
            if let Some(id) = &exec.id {
                inserted.push(id.clone());
            }
            self.record(exec.result);
            self.pause();
        }
        self.phase_tally(OperationType::Insert);

        self.maybe_sync();

        let available = self.fetch_post_ids();
        tracing::info!(listed = available.len(), inserted = inserted.len(), "query id pool");

        self.query_phase(2, OperationType::Query, |runner, _| {
            if let Some(id) = available.choose(&mut runner.rng) {
                id.clone()
            } else if let Some(id) = inserted.choose(&mut runner.rng) {
                id.clone()
            } else {
                runner.random_fallback_id()
            }
        });
    }

    /// Ids listed by `GET /posts`; empty when the listing is unavailable.
    fn fetch_post_ids(&self) -> Vec<String> {
        let request = Request::get("/posts", self.timeout());
        match self.transport.send(&request) {
            Ok(response) if response.status == 200 => parse_post_ids(&response.body),
            Ok(response) => {
                tracing::warn!(status = response.status, "post listing unavailable");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "post listing failed");
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // comments
    // -----------------------------------------------------------------------

    fn run_comments(&mut self) -> Result<(), BenchError> {
        let base = self.create_base_post()?;
        if self.progress {
            println!("Base post created with id {}", base);
        }

        self.phase_header(1, OperationType::InsertComment);
        let path = format!("{}/{}/comment", self.config.insert_path, base);
        for number in 1..=self.config.operation_count {
            let body = payload::generate_comment(&mut self.rng);
            let request = Request::post(path.clone(), Some(body), self.timeout());
            let exec = self.execute(&request, OperationType::InsertComment, number);
            self.record(exec.result);
            self.pause();
        }
        self.phase_tally(OperationType::InsertComment);

        self.maybe_sync();

        self.query_phase(2, OperationType::QueryPost, |_, _| base.clone());
        Ok(())
    }

    fn create_base_post(&mut self) -> Result<String, BenchError> {
        let body = payload::generate_post(0, &mut self.rng);
        let path = self.config.insert_path.clone();
        let request = Request::post(path, Some(body), self.timeout());
        let exec = self.execute(&request, OperationType::Insert, 0);
        match exec.id {
            Some(id) if exec.result.success => Ok(id),
            _ => Err(BenchError::SetupFailed {
                detail: format!(
                    "could not create base post (status {}): {}",
                    exec.result.status_code, exec.result.error_message
                ),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // reactions
    // -----------------------------------------------------------------------

    fn run_reactions(&mut self) {
        let mut chained_posts = Vec::new();

        self.phase_header(1, OperationType::InsertReaction);
        for number in 1..=self.config.operation_count {
            let result = self.reaction_chain(number);
            if result.success
                && let Some(id) = &result.post_id
            {
                chained_posts.push(id.clone());
            }
            self.record(result);
            self.pause();
        }
        self.phase_tally(OperationType::InsertReaction);

        self.maybe_sync();

        self.query_phase(2, OperationType::QueryPost, |runner, number| {
            if chained_posts.is_empty() {
                runner.random_fallback_id()
            } else {
                chained_posts[(number - 1) % chained_posts.len()].clone()
            }
        });
    }

    /// post -> comment -> reaction. Only the reaction is measured; a broken
    /// chain still yields a failed `INSERT_REACTION` record.
    fn reaction_chain(&mut self, number: usize) -> OperationResult {
        let timeout = self.timeout();
        let insert_path = self.config.insert_path.clone();

        let post_body = payload::generate_post(number, &mut self.rng);
        let post = self.execute(
            &Request::post(insert_path.clone(), Some(post_body), timeout),
            OperationType::Insert,
            number,
        );
        let Some(post_id) = post.id.clone().filter(|_| post.result.success) else {
            return chain_failure("post", post, number);
        };

        let comment_body = payload::generate_comment(&mut self.rng);
        let comment = self.execute(
            &Request::post(
                format!("{}/{}/comment", insert_path, post_id),
                Some(comment_body),
                timeout,
            ),
            OperationType::InsertComment,
            number,
        );
        let Some(comment_id) = comment.id.clone().filter(|_| comment.result.success) else {
            return chain_failure("comment", comment, number);
        };

        let reaction_body = payload::generate_reaction(&mut self.rng);
        let reaction = self.execute(
            &Request::post(
                format!("{}/{}/comment/{}/reaction", insert_path, post_id, comment_id),
                Some(reaction_body),
                timeout,
            ),
            OperationType::InsertReaction,
            number,
        );
        OperationResult {
            post_id: Some(post_id),
            ..reaction.result
        }
    }
}

/// Failed measured record for a chain abandoned at `step`. Keeps the failing
/// step's status and elapsed time.
fn chain_failure(step: &str, failed: Execution, number: usize) -> OperationResult {
    let detail = format!("chain aborted at {} step: {}", step, failed.result.error_message);
    OperationResult {
        operation_type: OperationType::InsertReaction,
        operation_number: number,
        success: false,
        post_id: None,
        error_message: truncate_chars(&detail, MAX_ERROR_CHARS),
        ..failed.result
    }
}

/// Ids from a `GET /posts` body: an array of objects with an `id`.
pub fn parse_post_ids(body: &str) -> Vec<String> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.get("id"))
        .filter_map(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::client::testing::{ScriptedTransport, ok, refused, status};
    use crate::stats::summarize;
    use crate::types::TRANSPORT_FAILURE;

    fn config(scenario: Scenario, n: usize) -> BenchConfig {
        BenchConfig {
            operation_count: n,
            scenario,
            seed: Some(1),
            ..BenchConfig::default()
        }
    }

    fn assert_contiguous(results: &[OperationResult], op: OperationType, n: usize) {
        let numbers: Vec<usize> = results
            .iter()
            .filter(|r| r.operation_type == op)
            .map(|r| r.operation_number)
            .collect();
        assert_eq!(numbers, (1..=n).collect::<Vec<_>>(), "{} numbering", op);
    }

    #[test]
    fn posts_against_always_ok_server() {
        let next = Cell::new(0);
        let transport = ScriptedTransport::new(|req| match (req.method, req.path.as_str()) {
            (HttpMethod::Post, "/post") => {
                next.set(next.get() + 1);
                ok(&format!(r#"{{"id": {}}}"#, next.get()))
            }
            (HttpMethod::Get, "/posts") => status(404, ""),
            _ => ok("{}"),
        });
        let cfg = config(Scenario::Posts, 50);

        let results = Runner::new(&transport, &cfg).with_progress(false).run().unwrap();
        let run = summarize(&results);

        assert_eq!(results.len(), 100);
        assert_eq!(run.get(OperationType::Insert).unwrap().successes, 50);
        assert_eq!(run.get(OperationType::Query).unwrap().successes, 50);
        assert_contiguous(&results, OperationType::Insert, 50);
        assert_contiguous(&results, OperationType::Query, 50);
        assert!(results.iter().all(|r| r.duration_ms >= 0.0 && r.duration_ms.is_finite()));

        // Queries reuse inserted ids when the listing is unavailable.
        let ids: Vec<u32> = results
            .iter()
            .filter(|r| r.operation_type == OperationType::Query)
            .map(|r| r.post_id.as_deref().unwrap().parse().unwrap())
            .collect();
        assert!(ids.iter().all(|id| (1..=50).contains(id)));
    }

    #[test]
    fn posts_queries_prefer_listed_ids() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/posts" => ok(r#"[{"id": "abc"}, {"id": "def"}, {"title": "no id"}]"#),
            _ => ok(r#"{"id": 1}"#),
        });
        let cfg = config(Scenario::Posts, 10);

        let results = Runner::new(&transport, &cfg).with_progress(false).run().unwrap();
        assert!(
            results
                .iter()
                .filter(|r| r.operation_type == OperationType::Query)
                .all(|r| matches!(r.post_id.as_deref(), Some("abc") | Some("def")))
        );
    }

    #[test]
    fn connection_errors_after_health_check_are_recorded() {
        let transport = ScriptedTransport::new(|req| {
            if req.path == "/actuator/health" {
                ok(r#"{"status": "UP"}"#)
            } else {
                refused()
            }
        });
        let cfg = config(Scenario::Posts, 50);

        let results = Runner::new(&transport, &cfg).with_progress(false).run().unwrap();
        let run = summarize(&results);

        let inserts = run.get(OperationType::Insert).unwrap();
        assert_eq!(inserts.count, 50);
        assert_eq!(inserts.successes, 0);
        assert!(inserts.latency.is_none());
        assert!(results.iter().all(|r| r.status_code == TRANSPORT_FAILURE));
        assert_contiguous(&results, OperationType::Query, 50);
    }

    #[test]
    fn unreachable_server_aborts_before_phases() {
        let transport = ScriptedTransport::new(|_| refused());
        let cfg = config(Scenario::Posts, 5);

        let err = Runner::new(&transport, &cfg).with_progress(false).run().unwrap_err();
        assert!(matches!(err, BenchError::ServerUnreachable { .. }));
        assert_eq!(transport.requests.borrow().len(), HEALTH_PATHS.len());
    }

    #[test]
    fn health_check_accepts_any_status() {
        let transport = ScriptedTransport::new(|_| status(404, ""));
        assert!(check_server(&transport).is_ok());
        assert_eq!(transport.paths(), vec!["GET /actuator/health"]);
    }

    #[test]
    fn comments_use_base_post() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/post" => ok(r#"{"id": 77}"#),
            _ => ok(r#"{"id": 5}"#),
        });
        let cfg = config(Scenario::Comments, 3);

        let results = Runner::new(&transport, &cfg).with_progress(false).run().unwrap();

        assert_contiguous(&results, OperationType::InsertComment, 3);
        assert_contiguous(&results, OperationType::QueryPost, 3);
        let paths = transport.paths();
        assert_eq!(paths.iter().filter(|p| *p == "POST /post/77/comment").count(), 3);
        assert_eq!(paths.iter().filter(|p| *p == "GET /post/77").count(), 3);
        assert!(
            results
                .iter()
                .filter(|r| r.operation_type == OperationType::QueryPost)
                .all(|r| r.post_id.as_deref() == Some("77"))
        );
    }

    #[test]
    fn comments_abort_when_base_post_fails() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/post" => status(500, "database down"),
            _ => ok("{}"),
        });
        let cfg = config(Scenario::Comments, 3);

        let err = Runner::new(&transport, &cfg).with_progress(false).run().unwrap_err();
        assert!(matches!(err, BenchError::SetupFailed { .. }));
        assert!(err.to_string().contains("database down"));
    }

    #[test]
    fn reactions_broken_chain_still_records_failure() {
        let comment_calls = Cell::new(0);
        let transport = ScriptedTransport::new(|req| {
            let path = req.path.as_str();
            if path == "/post" {
                ok(r#"{"id": 9}"#)
            } else if path.ends_with("/reaction") {
                ok(r#"{"id": "r"}"#)
            } else if path.ends_with("/comment") {
                comment_calls.set(comment_calls.get() + 1);
                if comment_calls.get() == 2 {
                    status(400, "bad comment")
                } else {
                    ok(r#"{"id": 3}"#)
                }
            } else {
                ok("{}")
            }
        });
        let cfg = config(Scenario::Reactions, 4);

        let results = Runner::new(&transport, &cfg).with_progress(false).run().unwrap();

        assert_contiguous(&results, OperationType::InsertReaction, 4);
        assert_contiguous(&results, OperationType::QueryPost, 4);
        let reactions: Vec<_> = results
            .iter()
            .filter(|r| r.operation_type == OperationType::InsertReaction)
            .collect();
        assert!(reactions[0].success);
        assert_eq!(reactions[0].post_id.as_deref(), Some("9"));
        assert!(!reactions[1].success);
        assert_eq!(reactions[1].status_code, 400);
        assert_eq!(reactions[1].error_message, "chain aborted at comment step: bad comment");
        assert!(transport.paths().contains(&"POST /post/9/comment/3/reaction".to_string()));
        assert_eq!(
            transport
                .paths()
                .iter()
                .filter(|p| p.ends_with("/reaction"))
                .count(),
            3
        );
    }

    #[test]
    fn sync_recorded_between_phases() {
        let transport = ScriptedTransport::new(|_| ok(r#"{"id": 1}"#));
        let cfg = BenchConfig {
            sync: true,
            ..config(Scenario::Posts, 2)
        };

        let results = Runner::new(&transport, &cfg).with_progress(false).run().unwrap();
        let ops: Vec<_> = results.iter().map(|r| r.operation_type).collect();
        assert_eq!(
            ops,
            vec![
                OperationType::Insert,
                OperationType::Insert,
                OperationType::Sync,
                OperationType::Query,
                OperationType::Query,
            ]
        );
        let sync = transport
            .requests
            .borrow()
            .iter()
            .find(|r| r.path == "/sync")
            .map(|r| r.timeout)
            .unwrap();
        assert_eq!(sync, Duration::from_secs(30));
    }

    #[test]
    fn probe_reports_each_endpoint() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/sync" => refused(),
            "/post/1" => status(404, ""),
            _ => ok("{}"),
        });
        let probes = probe_endpoints(&transport);
        assert_eq!(probes.len(), probe_targets().count());
        let sync = probes.iter().find(|p| p.path == "/sync").unwrap();
        assert!(sync.outcome.is_err());
        let missing = probes.iter().find(|p| p.path == "/post/1").unwrap();
        assert_eq!(missing.outcome, Ok(404));
    }

    #[test]
    fn discovery_finds_alternative_spring_paths() {
        let transport = ScriptedTransport::new(|req| match (req.method, req.path.as_str()) {
            (HttpMethod::Get, "/actuator/health") => ok(r#"{"status": "UP"}"#),
            (HttpMethod::Post, "/api/post") => status(201, r#"{"id": 1}"#),
            (HttpMethod::Get, "/query/post/1") => ok(r#"{"id": 1}"#),
            _ => status(404, ""),
        });

        let found = discover_endpoints(&probe_endpoints(&transport));
        assert_eq!(found.insert_path.as_deref(), Some("/api/post"));
        assert_eq!(found.query_path.as_deref(), Some("/query/post"));
    }

    #[test]
    fn discovery_ignores_errors_and_unrelated_paths() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/posts" | "/sync" | "/" => ok("[]"),
            "/api/posts" => status(500, "boom"),
            _ => refused(),
        });

        let found = discover_endpoints(&probe_endpoints(&transport));
        assert_eq!(found.insert_path.as_deref(), Some("/posts"));
        assert_eq!(found.query_path, None);
    }

    #[test]
    fn run_uses_discovered_insert_path() {
        let transport = ScriptedTransport::new(|req| match (req.method, req.path.as_str()) {
            (HttpMethod::Post, "/api/post") => ok(r#"{"id": 11}"#),
            (HttpMethod::Get, path) if path.starts_with("/api/post/") => ok(r#"{"id": 11}"#),
            (HttpMethod::Get, "/actuator/health") => ok("{}"),
            _ => status(404, ""),
        });
        let mut cfg = config(Scenario::Posts, 3);
        cfg.use_endpoints(&discover_endpoints(&probe_endpoints(&transport)));
        transport.requests.borrow_mut().clear();

        let results = Runner::new(&transport, &cfg)
            .with_progress(false)
            .with_health_check(false)
            .run()
            .unwrap();

        assert!(results.iter().all(|r| r.success));
        let paths = transport.paths();
        assert_eq!(paths.iter().filter(|p| *p == "POST /api/post").count(), 3);
        assert_eq!(paths.iter().filter(|p| *p == "GET /api/post/11").count(), 3);
        assert!(!paths.iter().any(|p| p.contains("/actuator/health")));
    }

    #[test]
    fn queries_reuse_sent_ids_when_inserts_echo_none() {
        let transport = ScriptedTransport::new(|req| match req.path.as_str() {
            "/post" => ok(r#"{"acknowledged": true}"#),
            "/posts" => status(404, ""),
            _ => ok("{}"),
        });
        let cfg = config(Scenario::Posts, 4);

        let results = Runner::new(&transport, &cfg).with_progress(false).run().unwrap();
        assert!(
            results
                .iter()
                .filter(|r| r.operation_type == OperationType::Query)
                .all(|r| r.post_id.as_deref().is_some_and(|id| id.starts_with("bench_post_")))
        );
    }

    #[test]
    fn parse_post_ids_variants() {
        assert_eq!(parse_post_ids(r#"[{"id": 1}, {"id": "x"}]"#), vec!["1", "x"]);
        assert!(parse_post_ids(r#"{"id": 1}"#).is_empty());
        assert!(parse_post_ids("oops").is_empty());
    }

    fn comment_bodies<F>(transport: &ScriptedTransport<F>) -> Vec<Option<Value>>
    where
        F: Fn(&Request) -> Result<crate::client::Response, TransportError>,
    {
        transport
            .requests
            .borrow()
            .iter()
            .filter(|r| r.path.ends_with("/comment"))
            .map(|r| r.body.clone())
            .collect()
    }

    #[test]
    fn seeded_runs_send_identical_comment_bodies() {
        let cfg = config(Scenario::Comments, 2);
        let a = ScriptedTransport::new(|_| ok(r#"{"id": 1}"#));
        let b = ScriptedTransport::new(|_| ok(r#"{"id": 1}"#));
        Runner::new(&a, &cfg).with_progress(false).run().unwrap();
        Runner::new(&b, &cfg).with_progress(false).run().unwrap();
        assert_eq!(comment_bodies(&a).len(), 2);
        assert_eq!(comment_bodies(&a), comment_bodies(&b));
    }
}
