use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gitidx::backend::{CodeIndex, write_index};
use gitidx::config::{DEFAULT_MAX_SUBMODULE_DEPTH, IndexSpec, WalkOptions};
use gitidx::index::GitIndexer;
use gitidx::index::stats::{format_size, resolve_index_dir, show_stats};
use gitidx::metrics::Metrics;
use gitidx::score::PathScorer;
use gitidx::store::GitStore;
use gitidx::utils::default_index_dir;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitidx")]
#[command(about = "Walk git repositories and build a locality-ordered code index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the repositories listed in a config file and build an index
    Index(IndexArgs),
    /// Show statistics for a written index
    Stats {
        /// Index directory, or the name of an index in the default location
        index: String,
    },
}

#[derive(Args)]
struct IndexArgs {
    /// JSON index configuration
    config: PathBuf,

    /// Space-separated top-level directories to walk first
    #[arg(long, default_value = "")]
    order_root: String,

    /// Report resolved commit ids as tree versions
    #[arg(long)]
    revparse: bool,

    /// Deepest submodule nesting to follow
    #[arg(long, default_value_t = DEFAULT_MAX_SUBMODULE_DEPTH)]
    max_submodule_depth: usize,

    /// Output directory (defaults to the per-user data directory)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write the metrics dump here instead of stderr
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    /// Print the order files would be indexed in, without indexing
    #[arg(long)]
    dry_run: bool,

    /// Hide progress bars
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Index(args) => run_index(args),
        Commands::Stats { index } => resolve_index_dir(&index).and_then(|dir| show_stats(&dir)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_index(args: IndexArgs) -> Result<()> {
    let spec = IndexSpec::load(&args.config)?;
    let options = WalkOptions {
        order_root: args.order_root,
        revparse: args.revparse,
        max_submodule_depth: args.max_submodule_depth,
    };

    let store = GitStore::new();
    let scorer = PathScorer::new(spec.scoring.clone());
    let metrics = Metrics::new();
    let indexer = GitIndexer::new(&store, &scorer, &metrics)
        .options(options)
        .silent(args.quiet);
    let mut backend = CodeIndex::new(spec.backend.clone());

    if args.dry_run {
        let batch = indexer.plan(&spec.repositories, &backend)?;
        let mut out = BufWriter::new(io::stdout().lock());
        for file in batch.files() {
            writeln!(out, "{} {} {}", file.score, file.repo_path.display(), file.path)?;
        }
        out.flush()?;
        return Ok(());
    }

    let start = Instant::now();
    let summary = match indexer.index(&spec.repositories, &mut backend) {
        Ok(summary) => summary,
        Err(err) => {
            if let Some(store_err) = err.store_error() {
                error!(
                    code = store_err.code,
                    class = %store_err.class,
                    "{}",
                    store_err.message
                );
            }
            return Err(err.into());
        }
    };

    let out_dir = match args.out {
        Some(dir) => dir,
        None => default_index_dir(&spec.name)?,
    };
    let meta = write_index(&backend, &spec.name, &out_dir)?;
    let elapsed = start.elapsed();

    info!(
        repos = summary.repos,
        revisions = summary.revisions,
        files = summary.files,
        "walked in {:?}, indexed in {:?}",
        summary.walk_elapsed,
        summary.index_elapsed
    );
    if !args.quiet {
        let stats = backend.stats();
        println!(
            "Indexed {} files ({}) into {} unique contents, {} chunks",
            stats.files_indexed,
            format_size(summary.bytes),
            meta.content_count,
            meta.chunk_count
        );
        println!("Index stored at: {}", out_dir.display());
    }

    match args.metrics_file {
        Some(path) => metrics.dump_to_file(&path, elapsed)?,
        None => metrics.report(&mut io::stderr().lock(), elapsed)?,
    }

    Ok(())
}
