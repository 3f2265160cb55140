use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use evalgate_adapters::JsonFileStore;
use evalgate_app::{
    AnalysisRequest, AnalysisUseCase, ExportFormat, ExportUseCase, StatisticsRequest,
    StatisticsUseCase, SystemClock, analysis_options, load_config, parse_window, render_markdown,
    render_statistics_markdown, resolve_range,
};
use evalgate_domain::AnalysisOptions;
use evalgate_types::{ComparisonStatistics, ConfigFile, DateRange, StatisticalAnalysisResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "evalgate.toml";
const LOG_ENV: &str = "EVALGATE_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "evalgate",
    version,
    about = "Statistical comparison of AI and baseline response scores"
)]
struct Cli {
    /// Log filter used when EVALGATE_LOG is unset (e.g. "info", "evalgate_domain=debug")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Comparison records (JSON array or JSON Lines). Falls back to `defaults.records`.
    #[arg(long)]
    records: Option<PathBuf>,

    /// Earliest `createdAt` to include (RFC 3339, inclusive)
    #[arg(long, value_parser = parse_timestamp)]
    start: Option<OffsetDateTime>,

    /// Latest `createdAt` to include (RFC 3339, inclusive)
    #[arg(long, value_parser = parse_timestamp)]
    end: Option<OffsetDateTime>,

    /// Trailing window ending now or at --end (e.g. "30d")
    #[arg(long, conflicts_with = "start")]
    last: Option<String>,

    /// Absolute overall-score difference below which a pair is a tie
    #[arg(long)]
    tie_epsilon: Option<f64>,

    /// Config file (default: ./evalgate.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (default: `defaults.out_dir`, else stdout)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Descriptive statistics and win/loss/tie tally (JSON).
    Stats {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Full statistical analysis with t-test, effect size and conclusion (JSON).
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        /// Exit 2 when the report is partial (not enough data or no variance).
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Render a Markdown summary from an analysis or statistics JSON file.
    Md {
        #[arg(long, conflicts_with = "statistics", required_unless_present = "statistics")]
        analysis: Option<PathBuf>,

        #[arg(long)]
        statistics: Option<PathBuf>,

        /// Output markdown path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Export an analysis or statistics JSON file as CSV or JSON Lines.
    Export {
        #[arg(long, conflicts_with = "statistics", required_unless_present = "statistics")]
        analysis: Option<PathBuf>,

        #[arg(long)]
        statistics: Option<PathBuf>,

        /// csv | jsonl
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Output path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.cmd {
        Command::Stats { source } => {
            let ctx = SourceContext::resolve(&source, "statistics.json")?;
            let stats = StatisticsUseCase::new(ctx.store).execute(StatisticsRequest {
                range: ctx.range,
                options: ctx.options,
            })?;
            emit_json(ctx.out.as_deref(), &stats, source.pretty)?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Analyze { source, strict } => {
            let ctx = SourceContext::resolve(&source, "analysis.json")?;
            // The report is always written; --strict only changes the exit code.
            let report = AnalysisUseCase::new(ctx.store).execute(AnalysisRequest {
                range: ctx.range,
                options: ctx.options,
                strict: false,
            })?;
            emit_json(ctx.out.as_deref(), &report, source.pretty)?;

            if strict && !report.is_complete() {
                tracing::warn!(status = ?report.status, "analysis is partial");
                return Ok(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Md {
            analysis,
            statistics,
            out,
        } => {
            let md = match (analysis, statistics) {
                (Some(path), _) => render_markdown(&read_json::<StatisticalAnalysisResult>(&path)?),
                (None, Some(path)) => {
                    render_statistics_markdown(&read_json::<ComparisonStatistics>(&path)?)
                }
                (None, None) => anyhow::bail!("either --analysis or --statistics is required"),
            };
            emit_text(out.as_deref(), &md)?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Export {
            analysis,
            statistics,
            format,
            out,
        } => {
            let text = match (analysis, statistics) {
                (Some(path), _) => ExportUseCase::export_analysis(
                    &read_json::<StatisticalAnalysisResult>(&path)?,
                    format,
                )?,
                (None, Some(path)) => ExportUseCase::export_statistics(
                    &read_json::<ComparisonStatistics>(&path)?,
                    format,
                )?,
                (None, None) => anyhow::bail!("either --analysis or --statistics is required"),
            };
            emit_text(out.as_deref(), &text)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Everything `stats` and `analyze` need once flags and config are merged.
struct SourceContext {
    store: JsonFileStore,
    range: DateRange,
    options: AnalysisOptions,
    out: Option<PathBuf>,
}

impl SourceContext {
    /// `default_name` is the file written under `defaults.out_dir` when no
    /// `--out` is given.
    fn resolve(args: &SourceArgs, default_name: &str) -> anyhow::Result<Self> {
        let config = resolve_config(args.config.as_deref())?;

        let records = args
            .records
            .clone()
            .or_else(|| config.defaults.records.as_ref().map(PathBuf::from))
            .context("no records file given (use --records or `defaults.records` in the config)")?;

        let last = args.last.as_deref().map(parse_window).transpose()?;
        let range = resolve_range(args.start, args.end, last, &SystemClock)?;
        let options = analysis_options(&config, args.tie_epsilon)?;

        tracing::debug!(
            records = %records.display(),
            tie_epsilon = options.tie_tolerance.epsilon(),
            "resolved record source"
        );

        Ok(Self {
            store: JsonFileStore::new(records),
            range,
            options,
            out: args.out.clone().or_else(|| {
                config
                    .defaults
                    .out_dir
                    .as_ref()
                    .map(|dir| Path::new(dir).join(default_name))
            }),
        })
    }
}

fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    match explicit {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG).is_file() => load_config(Path::new(DEFAULT_CONFIG)),
        None => Ok(ConfigFile::default()),
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

fn parse_timestamp(s: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(s, &Rfc3339).map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let v =
        serde_json::from_slice(&bytes).with_context(|| format!("parse json {}", path.display()))?;
    Ok(v)
}

fn emit_json<T: serde::Serialize>(
    out: Option<&Path>,
    value: &T,
    pretty: bool,
) -> anyhow::Result<()> {
    match out {
        Some(path) => write_json(path, value, pretty),
        None => {
            let s = if pretty {
                serde_json::to_string_pretty(value)?
            } else {
                serde_json::to_string(value)?
            };
            println!("{s}");
            Ok(())
        }
    }
}

fn emit_text(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            ensure_parent(path)?;
            atomic_write(path, text.as_bytes())
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T, pretty: bool) -> anyhow::Result<()> {
    ensure_parent(path)?;

    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };

    atomic_write(path, &bytes)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    Ok(())
}

fn atomic_write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));

    let result = write_then_rename(&tmp, path, bytes);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    use std::io::Write;

    {
        let mut f =
            fs::File::create(tmp).with_context(|| format!("create temp {}", tmp.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("write temp {}", tmp.display()))?;
        f.sync_all().ok();
    }

    fs::rename(tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))
}
