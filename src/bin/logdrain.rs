use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use logdrain::report::Report;
use logdrain::{Drain, DrainConfig, LineId};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

#[derive(Parser, Debug)]
#[command(name = "logdrain", version, about = "Online log template mining")]
struct Cli {
    /// Input files (`-` for stdin). May be repeated.
    #[arg(required = false)]
    input: Vec<String>,

    /// Depth of leaf nodes, counting the root and the length layer
    #[arg(long = "depth", default_value_t = 4)]
    depth: usize,
    /// Similarity threshold in [0, 1]
    #[arg(long = "st", default_value_t = 0.4)]
    st: f64,
    /// Max children per internal node
    #[arg(long = "max-child", default_value_t = 100)]
    max_child: usize,
    /// Preprocess regex replaced by the wildcard. May be repeated; applied in order.
    #[arg(long = "rex")]
    rex: Vec<String>,
    /// Prepend the built-in masking rules (timestamps, addresses, ids, numbers)
    #[arg(long = "mask-defaults", default_value_t = false)]
    mask_defaults: bool,

    /// Resume from a saved state; its configuration replaces the flags above
    #[arg(long = "load")]
    load: Option<String>,
    /// Write the final state to this path
    #[arg(long = "save")]
    save: Option<String>,

    /// Report section
    #[arg(long = "output", default_value = "templates", value_parser = ["templates", "lines", "clusters"])]
    output: String,
    /// Report format
    #[arg(long = "format", default_value = "json", value_parser = ["json", "table", "csv"])]
    format: String,
    /// Print the prefix tree to stderr after mining
    #[arg(long = "print-tree", default_value_t = false)]
    print_tree: bool,
    /// Mine every input file with its own engine, in parallel
    #[arg(long = "per-file", default_value_t = false)]
    per_file: bool,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false);
    tracing_subscriber::registry().with(fmt_layer.with_filter(filter)).init();
}

fn build_config(cli: &Cli) -> DrainConfig {
    let mut rules = if cli.mask_defaults { logdrain::masking::default_rules() } else { Vec::new() };
    rules.extend(cli.rex.iter().cloned());
    DrainConfig::new(cli.depth, cli.st, cli.max_child).with_rules(rules)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let input_files = if cli.input.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.input.clone()
    };

    if cli.per_file {
        return run_per_file(&cli, &input_files);
    }

    let mut drain = match cli.load.as_deref() {
        Some(path) => {
            let d = Drain::load_from_path(path).with_context(|| format!("loading state from {path}"))?;
            info!(path, clusters = d.len(), "resumed from saved state");
            d
        }
        None => Drain::new(build_config(&cli))?,
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        let _ = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst));
    }

    // Ids continue after the highest line id already held by a resumed state.
    let mut next_id: LineId = drain.assignments().last().map(|(id, _)| id + 1).unwrap_or(1);
    let start = Instant::now();
    let mut count = 0usize;
    let keep_content = cli.output == "lines";
    let mut contents: HashMap<LineId, String> = HashMap::new();
    'files: for path in &input_files {
        let source = logdrain::source::open_path(path, next_id).with_context(|| format!("opening {path}"))?;
        for item in source {
            if !running.load(Ordering::SeqCst) {
                warn!(lines = count, "interrupted; reporting what was mined so far");
                break 'files;
            }
            let (line_id, line) = item.with_context(|| format!("reading {path}"))?;
            drain.process(line_id, &line);
            if keep_content {
                contents.insert(line_id, line);
            }
            next_id = line_id + 1;
            count += 1;
            if count % 100_000 == 0 {
                info!(lines = count, clusters = drain.len(), "progress");
            }
        }
    }
    info!(lines = count, clusters = drain.len(), elapsed = ?start.elapsed(), "mining done");

    if cli.print_tree {
        eprint!("{}", drain.render_tree());
    }
    if let Some(path) = cli.save.as_deref() {
        drain.save_to_path(path).with_context(|| format!("saving state to {path}"))?;
        info!(path, "state saved");
    }
    emit_report(&Report::from_engine_with_content(&drain, &contents), &cli.output, &cli.format)
}

fn run_per_file(cli: &Cli, input_files: &[String]) -> anyhow::Result<()> {
    init_parallelism();
    if cli.load.is_some() || cli.save.is_some() {
        warn!("--load/--save are ignored with --per-file");
    }
    let mut shards = Vec::with_capacity(input_files.len());
    for path in input_files {
        let source = logdrain::source::open_path(path, 1).with_context(|| format!("opening {path}"))?;
        let lines = source.collect::<std::io::Result<Vec<_>>>().with_context(|| format!("reading {path}"))?;
        shards.push(lines);
    }
    let engines = logdrain::shard::mine_shards(&build_config(cli), &shards)?;
    for ((path, lines), drain) in input_files.iter().zip(&shards).zip(&engines) {
        if cli.format == "table" {
            println!("# {path}");
        }
        if cli.print_tree {
            eprintln!("# {path}");
            eprint!("{}", drain.render_tree());
        }
        let contents: HashMap<LineId, String> = if cli.output == "lines" {
            lines.iter().cloned().collect()
        } else {
            HashMap::new()
        };
        emit_report(&Report::from_engine_with_content(drain, &contents), &cli.output, &cli.format)?;
    }
    Ok(())
}

fn emit_report(report: &Report, output: &str, format: &str) -> anyhow::Result<()> {
    match format {
        "table" => {
            let text = match output {
                "lines" => report.lines_table(),
                "clusters" => report.clusters_table(),
                _ => report.templates_table(),
            };
            print!("{text}");
        }
        "csv" => {
            let mut out = io::stdout().lock();
            match output {
                "lines" => report.lines_csv(&mut out)?,
                "clusters" => report.clusters_csv(&mut out)?,
                _ => report.templates_csv(&mut out)?,
            }
            out.flush()?;
        }
        _ => {
            let json = match output {
                "lines" => serde_json::to_string_pretty(&report.lines)?,
                "clusters" => serde_json::to_string_pretty(&report.clusters)?,
                _ => serde_json::to_string_pretty(&report.templates)?,
            };
            println!("{json}");
        }
    }
    Ok(())
}
