use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Serialize;

use phoneme_align_core::alignment::domain::align_error::AlignError;
use phoneme_align_core::alignment::domain::span_match::SpanMatch;
use phoneme_align_core::alignment::infrastructure::batch_aligner::{AlignmentJob, BatchAligner};
use phoneme_align_core::alignment::infrastructure::shared_substitution_model::{
    SharedSubstitutionModel,
};
use phoneme_align_core::phonemes::domain::substitution_cost_table::SubstitutionCostTable;
use phoneme_align_core::phonemes::domain::substitution_model::SubstitutionModel;
use phoneme_align_core::phonemes::infrastructure::cost_table_loader;
use phoneme_align_core::pipeline::align_segment_use_case::{
    AlignSegmentUseCase, SegmentAlignment,
};
use phoneme_align_core::reference::domain::reference_text::{ReferenceText, ReferenceWord};
use phoneme_align_core::shared::align_config::AlignConfig;

/// Locate recognized phonemes within a phonetically transcribed reference text.
#[derive(Parser)]
#[command(name = "phoneme-align")]
struct Cli {
    /// Substitution cost table (JSON sections of "a|b": cost).
    #[arg(long)]
    costs: Option<PathBuf>,

    /// Scoring config (JSON); flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference words: JSON array of {text, phonemes, location?}.
    #[arg(long, required_unless_present = "batch")]
    reference: Option<PathBuf>,

    /// Recognized phonemes, whitespace separated.
    #[arg(long, required_unless_present = "batch", allow_hyphen_values = true)]
    query: Option<String>,

    /// Phonemes belonging to no word, matched in front of the window.
    #[arg(long, allow_hyphen_values = true, conflicts_with = "batch")]
    prefix: Option<String>,

    /// First word of the search window (default: 0).
    #[arg(long, default_value = "0")]
    window_start: usize,

    /// End of the search window, exclusive (default: end of text).
    #[arg(long)]
    window_end: Option<usize>,

    /// Word where the speaker is expected to be (default: window start).
    #[arg(long)]
    expected_word: Option<usize>,

    /// Score penalty per word away from the expected word.
    #[arg(long)]
    prior_weight: Option<f64>,

    /// Default substitution cost.
    #[arg(long)]
    cost_sub: Option<f64>,

    /// Cost of an extra recognized phoneme.
    #[arg(long)]
    cost_del: Option<f64>,

    /// Cost of a skipped reference phoneme.
    #[arg(long)]
    cost_ins: Option<f64>,

    /// Largest accepted normalized edit cost (0.0-1.0).
    #[arg(long)]
    max_edit_distance: Option<f64>,

    /// Align a JSON array of independent jobs instead of a single segment.
    #[arg(long, conflicts_with_all = ["reference", "query"])]
    batch: Option<PathBuf>,

    /// Worker threads for --batch (default: available CPUs).
    #[arg(long)]
    workers: Option<usize>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli)?;

    let costs = match &cli.costs {
        Some(path) => cost_table_loader::load(path)?,
        None => SubstitutionCostTable::new(),
    };
    let model = SharedSubstitutionModel::new(SubstitutionModel::from_cost_table(
        &costs,
        config.cost_substitution,
    ));
    log::info!(
        "Loaded {} substitution overrides, default cost {}",
        costs.len(),
        config.cost_substitution
    );

    if let Some(batch_path) = &cli.batch {
        return run_batch(batch_path, model, cli.workers, cli.json);
    }

    let (Some(reference_path), Some(query)) = (&cli.reference, &cli.query) else {
        return Err("--reference and --query are required unless --batch is used".into());
    };
    run_segment(&cli, reference_path, query, model, config)
}

fn run_segment(
    cli: &Cli,
    reference_path: &Path,
    query: &str,
    model: SharedSubstitutionModel,
    config: AlignConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let words: Vec<ReferenceWord> = serde_json::from_str(&fs::read_to_string(reference_path)?)?;
    let reference = ReferenceText::new(words);
    log::info!(
        "Reference: {} words, {} phonemes",
        reference.num_words(),
        reference.phonemes().len()
    );

    let window_end = cli.window_end.unwrap_or(reference.num_words());
    let expected_word = cli.expected_word.unwrap_or(cli.window_start);
    let query: Vec<&str> = query.split_whitespace().collect();
    let prefix: Vec<&str> = cli
        .prefix
        .as_deref()
        .map(|p| p.split_whitespace().collect())
        .unwrap_or_default();

    let use_case = AlignSegmentUseCase::new(&reference, model, config);
    let result = use_case.execute_with_prefix(
        &query,
        &prefix,
        cli.window_start,
        window_end,
        expected_word,
    )?;

    if cli.json {
        let report = result.as_ref().map(|r| SegmentReport::new(&reference, r));
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match result {
        Some(found) => print_segment(&reference, &found),
        None => println!("Could not align this segment"),
    }
    Ok(())
}

fn run_batch(
    path: &Path,
    model: SharedSubstitutionModel,
    workers: Option<usize>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let jobs: Vec<AlignmentJob> = serde_json::from_str(&fs::read_to_string(path)?)?;
    let aligner = match workers {
        Some(n) => BatchAligner::new(model, n),
        None => BatchAligner::with_available_parallelism(model),
    };
    log::info!(
        "Aligning {} jobs on up to {} workers",
        jobs.len(),
        aligner.workers()
    );
    let results = aligner.run(&jobs);

    if json {
        let reports: Vec<BatchReport> = results.iter().map(BatchReport::from).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for (index, result) in results.iter().enumerate() {
        match result {
            Ok(Some(span)) => println!(
                "#{index}: columns {}..{}  cost {:.3}  normalized {:.3}",
                span.start_column, span.end_column, span.raw_cost, span.normalized_cost
            ),
            Ok(None) => println!("#{index}: could not align this segment"),
            Err(e) => println!("#{index}: error: {e}"),
        }
    }
    Ok(())
}

fn print_segment(reference: &ReferenceText, found: &SegmentAlignment) {
    println!(
        "Words {}-{}: {}",
        word_label(reference, found.start_word),
        word_label(reference, found.end_word),
        matched_text(reference, found)
    );
    println!(
        "Columns {}..{}  cost {:.3}  normalized {:.3}  confidence {:.2}",
        found.span.start_column,
        found.span.end_column,
        found.span.raw_cost,
        found.span.normalized_cost,
        found.confidence
    );
    if found.prefix_consumed {
        println!("Match begins inside the prefix");
    }
}

fn word_label(reference: &ReferenceText, index: usize) -> String {
    reference
        .word(index)
        .and_then(|w| w.location.clone())
        .unwrap_or_else(|| index.to_string())
}

fn matched_text(reference: &ReferenceText, found: &SegmentAlignment) -> String {
    reference.words()[found.start_word..=found.end_word]
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Serialize)]
struct SegmentReport<'a> {
    start_word: usize,
    end_word: usize,
    start_location: Option<&'a str>,
    end_location: Option<&'a str>,
    text: String,
    confidence: f64,
    prefix_consumed: bool,
    span: &'a SpanMatch,
}

impl<'a> SegmentReport<'a> {
    fn new(reference: &'a ReferenceText, found: &'a SegmentAlignment) -> Self {
        let location = |i: usize| reference.word(i).and_then(|w| w.location.as_deref());
        Self {
            start_word: found.start_word,
            end_word: found.end_word,
            start_location: location(found.start_word),
            end_location: location(found.end_word),
            text: matched_text(reference, found),
            confidence: found.confidence,
            prefix_consumed: found.prefix_consumed,
            span: &found.span,
        }
    }
}

#[derive(Serialize)]
struct BatchReport<'a> {
    span: Option<&'a SpanMatch>,
    error: Option<String>,
}

impl<'a> From<&'a Result<Option<SpanMatch>, AlignError>> for BatchReport<'a> {
    fn from(result: &'a Result<Option<SpanMatch>, AlignError>) -> Self {
        match result {
            Ok(span) => Self {
                span: span.as_ref(),
                error: None,
            },
            Err(e) => Self {
                span: None,
                error: Some(e.to_string()),
            },
        }
    }
}

fn build_config(cli: &Cli) -> Result<AlignConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AlignConfig::load(path)?,
        None => AlignConfig::default(),
    };
    if let Some(v) = cli.prior_weight {
        config.prior_weight = v;
    }
    if let Some(v) = cli.cost_sub {
        config.cost_substitution = v;
    }
    if let Some(v) = cli.cost_del {
        config.cost_deletion = v;
    }
    if let Some(v) = cli.cost_ins {
        config.cost_insertion = v;
    }
    if let Some(v) = cli.max_edit_distance {
        config.max_edit_distance = v;
    }
    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    // A missing cost table is tolerated by the loader.
    for path in [&cli.config, &cli.reference, &cli.batch].into_iter().flatten() {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
    }
    if let Some(end) = cli.window_end {
        if end < cli.window_start {
            return Err(format!(
                "Window end ({end}) must not be before window start ({})",
                cli.window_start
            )
            .into());
        }
    }
    if cli.workers == Some(0) {
        return Err("Workers must be at least 1".into());
    }
    if let Some(query) = &cli.query {
        if query.split_whitespace().next().is_none() {
            return Err("Query must contain at least one phoneme".into());
        }
    }
    Ok(())
}
