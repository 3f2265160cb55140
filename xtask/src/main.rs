use anyhow::Context;
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Repo automation for evalgate")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// (Re)generate JSON Schemas for records, reports and config.
    Schema {
        /// Output directory
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },

    /// Run the usual repo checks (fmt, clippy, test, schema).
    Ci,

    /// Run mutation testing over the statistics crates via cargo-mutants.
    Mutants {
        /// Extra args forwarded to cargo-mutants
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

/// Crates whose arithmetic is worth mutating.
const MUTANT_PACKAGES: [&str; 3] = [
    "evalgate-stats",
    "evalgate-significance",
    "evalgate-domain",
];

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Schema { out_dir } => cmd_schema(&out_dir),
        Command::Ci => cmd_ci(),
        Command::Mutants { args } => cmd_mutants(args),
    }
}

fn cmd_ci() -> anyhow::Result<()> {
    run("cargo", &["fmt", "--all", "--", "--check"])?;
    run(
        "cargo",
        &["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"],
    )?;
    run("cargo", &["test", "--workspace"])?;
    run("cargo", &["run", "-p", "xtask", "--", "schema"])?;
    Ok(())
}

fn cmd_mutants(extra: Vec<String>) -> anyhow::Result<()> {
    let mut args = vec!["mutants".to_string()];
    for p in MUTANT_PACKAGES {
        args.push("--package".to_string());
        args.push(p.to_string());
    }
    args.extend(extra);

    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    run("cargo", &refs).context("cargo-mutants must be installed (`cargo install cargo-mutants`)")
}

fn run(bin: &str, args: &[&str]) -> anyhow::Result<()> {
    let status = std::process::Command::new(bin)
        .args(args)
        .status()
        .with_context(|| format!("running {bin}"))?;
    if !status.success() {
        anyhow::bail!("{bin} {} failed: {status}", args.join(" "));
    }
    Ok(())
}

fn cmd_schema(out_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("create dir {}", out_dir.display()))?;

    write_schema(
        out_dir,
        "evalgate.record.v1.schema.json",
        schema_for!(evalgate_types::ComparisonRecord),
    )?;

    write_schema(
        out_dir,
        "evalgate.statistics.v1.schema.json",
        schema_for!(evalgate_types::ComparisonStatistics),
    )?;

    write_schema(
        out_dir,
        "evalgate.analysis.v1.schema.json",
        schema_for!(evalgate_types::StatisticalAnalysisResult),
    )?;

    write_schema(
        out_dir,
        "evalgate.config.v1.schema.json",
        schema_for!(evalgate_types::ConfigFile),
    )?;

    Ok(())
}

fn write_schema<T: serde::Serialize>(out_dir: &Path, name: &str, schema: T) -> anyhow::Result<()> {
    let path = out_dir.join(name);
    let mut json = serde_json::to_vec_pretty(&schema)?;
    json.push(b'\n');
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
