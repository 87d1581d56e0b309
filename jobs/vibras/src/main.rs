mod errors;
mod jobs;
mod lexicon;
mod record;
mod regions;
mod sentiment;

use anyhow::{Context, Result};
use clap::Parser;
use molino::io::{list_files_recursive, open_reader, open_writer, write_tsv};
use molino::LocalPipeline;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::jobs::JobKind;
use crate::lexicon::SentimentLexicon;
use crate::record::{parse_records, ParseStats, Tweet};
use crate::regions::RegionIndex;

#[derive(Parser, Debug)]
struct Args {
    /// Input file or directory of line-delimited JSON records (repeatable)
    #[arg(long, required = true)]
    input: Vec<PathBuf>,
    /// Output directory for part-00000.tsv; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
    /// Aggregation to run
    #[arg(long, value_enum, default_value = "sentiments")]
    job: JobKind,
    /// Tab-separated term<TAB>score lexicon (sentiment jobs)
    #[arg(long)]
    lexicon: Option<PathBuf>,
    /// JSON object of region name to GeoJSON boundary (sentiment jobs)
    #[arg(long)]
    regions: Option<PathBuf>,
    /// Parallel map tasks (default: CPU count, or MOLINO_TASKS)
    #[arg(long)]
    tasks: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    if !args.job.needs_sentiment_inputs() && (args.lexicon.is_some() || args.regions.is_some()) {
        warn!("--lexicon/--regions are ignored by the trending job");
    }
    match args.job {
        JobKind::Sentiments => run_sentiments_cmd(&args),
        JobKind::MostHappy => run_most_happy_cmd(&args),
        JobKind::Trending => run_trending_cmd(&args),
    }
}

fn run_sentiments_cmd(args: &Args) -> Result<()> {
    let (lexicon, regions) = load_sentiment_inputs(args)?;
    let (records, stats) = read_records(&args.input)?;
    let mut pipeline = build_pipeline(args);
    let pairs = jobs::run_sentiments(&mut pipeline, records, &lexicon, &regions);
    let written = write_pairs(&pairs, args.output.as_deref())?;
    log_run_summary("sentiments", &pipeline, &stats, written);
    Ok(())
}

fn run_most_happy_cmd(args: &Args) -> Result<()> {
    let (lexicon, regions) = load_sentiment_inputs(args)?;
    let (records, stats) = read_records(&args.input)?;
    let mut pipeline = build_pipeline(args);
    let pairs = jobs::run_most_happy(&mut pipeline, records, &lexicon, &regions);
    let written = write_pairs(&pairs, args.output.as_deref())?;
    log_run_summary("most-happy", &pipeline, &stats, written);
    Ok(())
}

fn run_trending_cmd(args: &Args) -> Result<()> {
    let (records, stats) = read_records(&args.input)?;
    let mut pipeline = build_pipeline(args);
    let pairs = jobs::run_trending(&mut pipeline, records);
    let written = write_pairs(&pairs, args.output.as_deref())?;
    log_run_summary("trending", &pipeline, &stats, written);
    Ok(())
}

/// Loads the lexicon and region index before any record is read, so a bad
/// file aborts the run with nothing mapped.
fn load_sentiment_inputs(args: &Args) -> Result<(SentimentLexicon, RegionIndex)> {
    let lexicon_path = args
        .lexicon
        .as_ref()
        .context("--lexicon is required for sentiment jobs")?;
    let regions_path = args
        .regions
        .as_ref()
        .context("--regions is required for sentiment jobs")?;
    let lexicon = SentimentLexicon::load(open_reader(lexicon_path)?)
        .with_context(|| format!("load lexicon {}", lexicon_path.display()))?;
    info!(terms = lexicon.len(), path = %lexicon_path.display(), "lexicon loaded");
    if lexicon.is_empty() {
        warn!("lexicon has no terms; every score will be zero");
    }
    let regions = RegionIndex::load(open_reader(regions_path)?)
        .with_context(|| format!("load regions {}", regions_path.display()))?;
    info!(regions = regions.len(), path = %regions_path.display(), "region index loaded");
    if regions.is_empty() {
        warn!("region index is empty; every record will resolve to no region");
    }
    Ok((lexicon, regions))
}

fn read_records(inputs: &[PathBuf]) -> Result<(Vec<Tweet>, ParseStats)> {
    let mut files = Vec::new();
    for input in inputs {
        let mut found = list_files_recursive(input)
            .with_context(|| format!("list input files under {}", input.display()))?;
        files.append(&mut found);
    }
    let mut stats = ParseStats::default();
    let mut records = Vec::new();
    for file in &files {
        let reader = open_reader(file)?;
        let mut parsed =
            parse_records(reader, &mut stats).with_context(|| format!("read {}", file.display()))?;
        records.append(&mut parsed);
    }
    if stats.malformed > 0 {
        warn!(malformed = stats.malformed, lines = stats.lines, "skipped malformed input lines");
    }
    info!(files = files.len(), lines = stats.lines, records = records.len(), "input loaded");
    Ok((records, stats))
}

fn build_pipeline(args: &Args) -> LocalPipeline {
    match args.tasks {
        Some(tasks) => LocalPipeline::with_tasks(tasks),
        None => LocalPipeline::new(),
    }
}

fn write_pairs<K: Serialize, V: Serialize>(pairs: &[(K, V)], output: Option<&Path>) -> Result<u64> {
    match output {
        Some(dir) => {
            let path = dir.join("part-00000.tsv");
            let mut writer = open_writer(&path)?;
            for (key, value) in pairs {
                write_tsv(&mut writer, key, value)?;
            }
            writer.flush()?;
            info!(path = %path.display(), pairs = pairs.len(), "output written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            for (key, value) in pairs {
                write_tsv(&mut writer, key, value)?;
            }
            writer.flush()?;
        }
    }
    Ok(pairs.len() as u64)
}

fn log_run_summary(job: &str, pipeline: &LocalPipeline, stats: &ParseStats, pairs_out: u64) {
    let emits = pipeline.stats().map.as_ref().map(|m| m.emits).unwrap_or(0);
    info!(
        job,
        lines = stats.lines,
        malformed = stats.malformed,
        emits,
        pairs_out,
        "run complete"
    );
}
