//! linespace CLI
//!
//! Reads one graph (or explicit metric) per line on stdin and writes results
//! on stdout. Progress, summaries and the verbose line trace go to stderr.
//!
//! Examples:
//!   linespace analyze < graphs.txt                   # CSV record per graph
//!   linespace analyze --skip-universal --output graph # keep graphs without universal lines
//!   linespace expand --strategy clones < graphs.txt  # one-vertex clone extensions
//!   linespace distances < graphs.txt                 # distance lists
//!   linespace selftest

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use linespace::analysis::{AnalysisConfig, MetricSpaceAnalyzer};
use linespace::codec::{AdjacencyCodec, DistanceCodec};
use linespace::expand::{CombinatorialExpander, ExpansionStrategy};
use linespace::pipeline::{
    dump_distances, expand_stream, EmitFilter, OutputMode, Pipeline, PipelineOptions,
    RecordFormat, RunSummary, DEFAULT_BATCH_SIZE,
};
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "linespace")]
#[command(version)]
#[command(about = "Line structure of graphs and finite metric spaces")]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Worker threads (default: one per core)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Input lines per parallel batch (analyze and distances)
    #[arg(long, global = true, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze the line structure of every input space
    Analyze(AnalyzeArgs),

    /// Emit every one-vertex extension of every input graph
    Expand {
        /// How the new vertex is attached
        #[arg(short, long, value_enum, default_value_t = StrategyArg::All)]
        strategy: StrategyArg,

        /// Only clone this vertex (clone strategies)
        #[arg(long)]
        vertex: Option<usize>,

        /// Minimum degree of the new vertex
        #[arg(short = 'd', long, default_value_t = 2)]
        min_degree: u32,
    },

    /// Print `n d(0,1) … d(n-2,n-1) <graph>` for every input graph
    Distances,

    /// Check the analyzer against bundled spaces
    Selftest,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Input format
    #[arg(short, long, value_enum, default_value_t = InputArg::Adjacency)]
    input: InputArg,

    /// JSON file with an analysis configuration; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log the line of every analyzed pair
    #[arg(long)]
    trace_lines: bool,

    /// Count bridges (O(n^4) per graph)
    #[arg(long)]
    count_bridges: bool,

    /// Report distinct lines by generating distance
    #[arg(long)]
    by_distance: bool,

    /// Leave the universal line out of the line tally
    #[arg(long)]
    exclude_universal: bool,

    /// Drop spaces that have a universal line
    #[arg(short = 'u', long)]
    skip_universal: bool,

    /// Smallest pair distance counted towards lines
    #[arg(long)]
    dmin: Option<u32>,

    /// Largest pair distance counted towards lines
    #[arg(long)]
    dmax: Option<u32>,

    /// Smallest pair distance counted as universal
    #[arg(long)]
    dumin: Option<u32>,

    /// Largest pair distance counted as universal
    #[arg(long)]
    dumax: Option<u32>,

    /// Largest number of points per space (1..=64)
    #[arg(long)]
    capacity: Option<usize>,

    /// What to write per emitted space
    #[arg(short, long, value_enum, default_value_t = OutputArg::Record)]
    output: OutputArg,

    /// Record encoding
    #[arg(short, long, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,

    /// Write a CSV header line first
    #[arg(long)]
    header: bool,

    /// Only emit spaces with fewer lines than points
    #[arg(short = 'n', long)]
    fewer_lines: bool,

    /// Only emit spaces whose AMRZ gap is at most this value
    #[arg(long, allow_negative_numbers = true)]
    max_gap: Option<i64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputArg {
    /// Whitespace-separated 0/1 adjacency rows
    Adjacency,
    /// `n` followed by the upper triangle of the distance matrix
    Distances,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputArg {
    Graph,
    Record,
    Both,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    /// Every neighbor subset
    All,
    /// Adjacent and non-adjacent clones
    Clones,
    /// Adjacent clones only
    AdjacentClones,
    /// Non-adjacent clones only
    NonAdjacentClones,
}

impl AnalyzeArgs {
    fn config(&self) -> Result<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => AnalysisConfig::default(),
        };
        cfg.verbose |= self.trace_lines;
        cfg.count_bridges |= self.count_bridges;
        cfg.count_lines_by_distance |= self.by_distance;
        cfg.include_universal_in_lines &= !self.exclude_universal;
        cfg.skip_spaces_with_universal_line |= self.skip_universal;
        cfg.dmin = self.dmin.unwrap_or(cfg.dmin);
        cfg.dmax = self.dmax.unwrap_or(cfg.dmax);
        cfg.dumin = self.dumin.unwrap_or(cfg.dumin);
        cfg.dumax = self.dumax.unwrap_or(cfg.dumax);
        cfg.capacity = self.capacity.unwrap_or(cfg.capacity);
        Ok(cfg)
    }

    fn options(&self, batch_size: usize) -> PipelineOptions {
        PipelineOptions {
            output: match self.output {
                OutputArg::Graph => OutputMode::Graph,
                OutputArg::Record => OutputMode::Record,
                OutputArg::Both => OutputMode::Both,
            },
            format: match self.format {
                FormatArg::Csv => RecordFormat::Csv,
                FormatArg::Json => RecordFormat::Json,
            },
            filter: EmitFilter {
                fewer_lines_only: self.fewer_lines,
                max_gap: self.max_gap,
            },
            header: self.header,
            batch_size,
        }
    }
}

impl From<StrategyArg> for ExpansionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::All => Self::AllSubsets,
            StrategyArg::Clones => Self::Clones,
            StrategyArg::AdjacentClones => Self::AdjacentClones,
            StrategyArg::NonAdjacentClones => Self::NonAdjacentClones,
        }
    }
}

fn init_tracing(quiet: bool, trace_lines: bool) {
    let default = match (quiet, trace_lines) {
        (true, true) => "warn,linespace::lines=info",
        (true, false) => "warn",
        (false, _) => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn report(tool: &str, summary: &RunSummary) {
    info!(
        processed = summary.processed,
        emitted = summary.emitted,
        skipped = summary.skipped,
        "{tool} finished in {:.3} seconds",
        summary.elapsed.as_secs_f64()
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let trace_lines = matches!(&cli.command, Commands::Analyze(args) if args.trace_lines);
    init_tracing(cli.quiet, trace_lines);

    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("configuring worker pool")?;
    }

    let input = BufReader::new(io::stdin().lock());
    let output = BufWriter::new(io::stdout().lock());

    match cli.command {
        Commands::Analyze(args) => {
            let config = args.config()?;
            let summary_json = serde_json::to_string(&config)?;
            info!(config = %summary_json, "analyze");
            let analyzer = MetricSpaceAnalyzer::new(config).context("invalid configuration")?;
            let options = args.options(cli.batch_size);
            let summary = match args.input {
                InputArg::Adjacency => {
                    Pipeline::new(&analyzer, AdjacencyCodec, options).run(input, output)?
                }
                InputArg::Distances => {
                    Pipeline::new(&analyzer, DistanceCodec, options).run(input, output)?
                }
            };
            report("analyze", &summary);
        }
        Commands::Expand {
            strategy,
            vertex,
            min_degree,
        } => {
            let mut expander = CombinatorialExpander::new(strategy.into(), min_degree);
            if let Some(vertex) = vertex {
                expander = expander.only_vertex(vertex);
            }
            info!(strategy = ?expander.strategy(), min_degree, "expand");
            let summary = expand_stream(&AdjacencyCodec, &expander, input, output)?;
            report("expand", &summary);
        }
        Commands::Distances => {
            let summary = dump_distances(&AdjacencyCodec, input, output, cli.batch_size)?;
            report("distances", &summary);
        }
        Commands::Selftest => match linespace::validate::validate_known_spaces() {
            Ok(()) => println!("Validation OK: bundled spaces have the expected line structure."),
            Err(e) => {
                eprintln!("Validation FAILED: {e}");
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
