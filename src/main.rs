use std::path::PathBuf;
use std::process;

use anyhow::Result;
use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cqrsbench::client::HttpTransport;
use cqrsbench::config::{self, BenchConfig, ConfigLayer};
use cqrsbench::display;
use cqrsbench::report::{self, ReportContext};
use cqrsbench::runner::{self, Runner};
use cqrsbench::stats;
use cqrsbench::types::Scenario;

#[derive(Parser)]
#[command(name = "cqrsbench", version, about = "Sequential latency benchmark for CQRS web APIs")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the command and query phases and write CSV and TXT reports
    Run(RunArgs),
    /// Show which known endpoints answer
    Probe(TargetArgs),
    /// Recompute statistics from a results CSV
    Summarize {
        csv: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Target API, e.g. http://localhost:8087
    #[arg(long)]
    base_url: Option<String>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Operations per phase
    #[arg(short = 'n', long)]
    operations: Option<usize>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    #[arg(long)]
    sync_timeout_ms: Option<u64>,

    #[arg(long)]
    scenario: Option<Scenario>,

    /// Call POST /sync between the phases
    #[arg(long)]
    sync: bool,

    /// Probe known endpoints and use the first working insert and query paths
    #[arg(long)]
    probe: bool,

    /// Post creation path, e.g. /api/post
    #[arg(long)]
    insert_path: Option<String>,

    /// Post lookup path; queries call {path}/{id}
    #[arg(long)]
    query_path: Option<String>,

    /// Pause between operations
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Seed for payload generation
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the CSV and TXT reports
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print the summary as JSON instead of progress and text
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "cqrsbench=warn",
        1 => "cqrsbench=info",
        _ => "cqrsbench=debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(target: &TargetArgs, mut overrides: ConfigLayer) -> Result<BenchConfig> {
    overrides.base_url = target.base_url.clone();
    let config = config::load(target.config.as_deref(), |key| std::env::var(key).ok(), overrides)?;
    Ok(config)
}

fn run_benchmark(args: RunArgs) -> Result<()> {
    let overrides = ConfigLayer {
        operation_count: args.operations,
        timeout_ms: args.timeout_ms,
        sync_timeout_ms: args.sync_timeout_ms,
        scenario: args.scenario,
        sync: args.sync.then_some(true),
        pause_ms: args.pause_ms,
        seed: args.seed,
        output_dir: args.output_dir.clone(),
        insert_path: args.insert_path.clone(),
        query_path: args.query_path.clone(),
        ..ConfigLayer::default()
    };
    let mut config = load_config(&args.target, overrides)?;
    let transport = HttpTransport::new(&config.base_url)?;

    if !args.json {
        println!("CQRS API benchmark");
        println!("URL: {}", config.base_url);
        println!("Scenario: {}", config.scenario);
        println!("Operations per phase: {}", config.operation_count);
    }

    if args.probe {
        runner::check_server(&transport)?;
        let probes = runner::probe_endpoints(&transport);
        let mut found = runner::discover_endpoints(&probes);
        // Explicit path flags win over discovery.
        if args.insert_path.is_some() {
            found.insert_path = None;
        }
        if args.query_path.is_some() {
            found.query_path = None;
        }
        config.use_endpoints(&found);
        if !args.json {
            println!("\nEndpoint availability:");
            print!("{}", display::format_probe(&probes));
            println!("Insert endpoint: POST {}", config.insert_path);
            println!("Query endpoint: GET {}/{{id}}", config.query_path);
        }
    }

    let results = Runner::new(&transport, &config)
        .with_progress(!args.json)
        .with_health_check(!args.probe)
        .run()?;

    let run = stats::summarize(&results);
    let ctx = ReportContext {
        generated_at: Local::now(),
        base_url: Some(config.base_url.clone()),
        scenario: Some(config.scenario),
        operation_count: Some(config.operation_count),
    };
    let files = report::write_reports(&config.output_dir, &results, &run, &ctx)?;

    if args.json {
        println!("{}", display::format_json(&run, &results));
    } else {
        println!();
        print!("{}", display::format_summary(&run, &results));
        println!("\nResults saved to: {}", files.csv.display());
        println!("Statistics saved to: {}", files.txt.display());
    }

    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => run_benchmark(args)?,
        Command::Probe(target) => {
            let config = load_config(&target, ConfigLayer::default())?;
            let transport = HttpTransport::new(&config.base_url)?;
            runner::check_server(&transport)?;
            println!("Endpoint availability at {}:", config.base_url);
            let probes = runner::probe_endpoints(&transport);
            print!("{}", display::format_probe(&probes));
            let found = runner::discover_endpoints(&probes);
            if let Some(path) = &found.insert_path {
                println!("Working insert endpoint: POST {}", path);
            }
            if let Some(path) = &found.query_path {
                println!("Working query endpoint: GET {}/{{id}}", path);
            }
        }
        Command::Summarize { csv, json } => {
            let results = report::read_results_csv(&csv)?;
            let run = stats::summarize(&results);
            if json {
                println!("{}", display::format_json(&run, &results));
            } else {
                let ctx = ReportContext {
                    generated_at: Local::now(),
                    base_url: None,
                    scenario: None,
                    operation_count: None,
                };
                print!("{}", report::format_statistics(&run, &ctx));
            }
        }
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}
