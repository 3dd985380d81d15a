// Copyright 2026 Glimpse Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use tracing::warn;

use glimpse::cli::Cli;
use glimpse::cli::Commands;
use glimpse::cli::EvaluateArgs;
use glimpse::cli::IngestArgs;
use glimpse::cli::SearchArgs;
use glimpse::cli::TrendArgs;
use glimpse::config::Config;
use glimpse::config::load_config;
use glimpse::embed::build_embedder;
use glimpse::evaluate::EvaluationReport;
use glimpse::evaluate::evaluate;
use glimpse::evaluate::strategy_hints;
use glimpse::ingest::LoadOptions;
use glimpse::ingest::LoadReport;
use glimpse::ingest::load_records;
use glimpse::logging::LogFormat;
use glimpse::logging::init_logging;
use glimpse::model::SearchResult;
use glimpse::model::Signals;
use glimpse::output::JsonResponse;
use glimpse::output::StatsOut;
use glimpse::output::print_json;
use glimpse::pipeline::Pipeline;
use glimpse::rubric::MAX_SCORE;
use glimpse::rubric::RUBRIC;
use glimpse::rubric::render_table;
use glimpse::search::SearchBackend;
use glimpse::search::backend_for;
use glimpse::tracker::PerformanceSummary;
use glimpse::tracker::PerformanceTracker;

const SNIPPET_CHARS: usize = 80;

const SEARCH_HINT: &str = "check --input paths and the config file";
const INGEST_HINT: &str = "check record paths and the config file";
const EVALUATE_HINT: &str = "pass --ocr/--ocr-file or --visual/--visual-file";
const TREND_HINT: &str = "pass a JSONL file of {\"strategy\", \"score\"} lines";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "warn".to_string());
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(&level, format);

    match cli.command {
        Commands::Search(args) => {
            let json = args.json;
            handle_result(config.and_then(|c| cmd_search(&c, args)), json, Some(SEARCH_HINT))
        }
        Commands::Ingest(args) => {
            let json = args.json;
            handle_result(config.and_then(|c| cmd_ingest(&c, args)), json, Some(INGEST_HINT))
        }
        Commands::Evaluate(args) => {
            let json = args.json;
            handle_result(cmd_evaluate(args), json, Some(EVALUATE_HINT))
        }
        Commands::Trend(args) => {
            let json = args.json;
            handle_result(cmd_trend(args), json, Some(TREND_HINT))
        }
        Commands::Rubric { json } => handle_result(cmd_rubric(json), json, None),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "glimpse", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn handle_result(result: Result<()>, json: bool, hint: Option<&str>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            if json {
                let mut resp = JsonResponse::error("error", &format!("{err:#}"));
                if let Some(hint) = hint {
                    resp = resp.with_hint(hint);
                }
                print_json(&resp)?;
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

/// Picks semantic ranking when an embedder can be built, lexical otherwise.
/// The second value is a warning to surface when falling back.
fn select_backend(config: &Config, force_lexical: bool) -> (Box<dyn SearchBackend>, Option<String>) {
    if force_lexical {
        info!("lexical ranking requested");
        return (backend_for(None), None);
    }
    match build_embedder(config) {
        Ok(Some(embedder)) => {
            info!(embedder = embedder.name(), "semantic ranking");
            (backend_for(Some(embedder)), None)
        }
        Ok(None) => {
            info!("embeddings disabled; lexical ranking");
            (backend_for(None), None)
        }
        Err(err) => {
            let message = format!("embedder unavailable, using lexical ranking: {err:#}");
            warn!("{message}");
            (backend_for(None), Some(message))
        }
    }
}

fn cmd_search(config: &Config, args: SearchArgs) -> Result<()> {
    let start = Instant::now();
    let opts = LoadOptions {
        glob: args.glob,
        ignore: Vec::new(),
    };
    let LoadReport {
        docs,
        files,
        mut warnings,
    } = load_records(args.input, &opts)?;

    let (backend, fallback) = select_backend(config, args.lexical);
    warnings.extend(fallback);
    let mut pipeline = Pipeline::new(backend, config.strategy.as_str());
    if args.skip_eval {
        pipeline = pipeline.without_evaluation();
    }
    pipeline.ingest_all(docs);

    let k = args.k.unwrap_or(config.default_k);
    let results = pipeline.query(&args.query, k);
    let took_ms = start.elapsed().as_millis() as i64;

    if args.json {
        let values = results
            .iter()
            .map(|r| result_json(r, args.explain))
            .collect::<Result<Vec<_>>>()?;
        let resp = JsonResponse::ok()
            .with_query(&args.query, k, pipeline.backend_name())
            .with_results(values)
            .with_stats(StatsOut {
                took_ms,
                total_hits: results.len() as i64,
                doc_count: Some(pipeline.count() as i64),
                files: Some(files as i64),
                backend: Some(pipeline.backend_name().to_string()),
            })
            .with_warnings(warnings);
        print_json(&resp)?;
    } else {
        for warning in warnings {
            eprintln!("warning: {warning}");
        }
        print_results(&results, args.explain);
    }
    Ok(())
}

fn result_json(result: &SearchResult, explain: bool) -> Result<Value> {
    let mut value = serde_json::to_value(result)?;
    if !explain && let Value::Object(map) = &mut value {
        map.remove("signals");
    }
    Ok(value)
}

fn print_results(results: &[SearchResult], explain: bool) {
    if results.is_empty() {
        println!("No matches");
        return;
    }
    for r in results {
        println!(
            "{:.3}\t{}\t{}\t{}",
            r.confidence_score,
            r.match_type.as_label(),
            r.name,
            snippet(&r.ocr_text)
        );
        if explain && let Some(signals) = &r.signals {
            println!("\t{}", describe_signals(r.score, signals));
        }
    }
}

fn snippet(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SNIPPET_CHARS {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(SNIPPET_CHARS).collect();
    format!("{cut}...")
}

fn describe_signals(score: f32, signals: &Signals) -> String {
    let mut parts = vec![format!("score={score:.3}")];
    if let Some(semantic) = signals.semantic {
        parts.push(format!("semantic={semantic:.3}"));
    }
    if let Some(exact) = signals.exact {
        parts.push(format!("exact={exact:.3}"));
    }
    parts.push(format!("text={:.3}", signals.text));
    parts.push(format!("visual={:.3}", signals.visual));
    if let Some(fuzzy) = signals.fuzzy {
        parts.push(format!("fuzzy={fuzzy:.3}"));
    }
    parts.join(" ")
}

fn cmd_ingest(config: &Config, args: IngestArgs) -> Result<()> {
    let start = Instant::now();
    let opts = LoadOptions {
        glob: args.glob,
        ignore: args.ignore,
    };
    let LoadReport {
        docs,
        files,
        mut warnings,
    } = load_records(args.paths, &opts)?;

    let strategy = args.strategy.unwrap_or_else(|| config.strategy.clone());
    let (backend, fallback) = select_backend(config, args.lexical);
    warnings.extend(fallback);
    let mut pipeline = Pipeline::new(backend, strategy);
    let outcomes = pipeline.ingest_all(docs);
    let summary = pipeline.summary();
    let took_ms = start.elapsed().as_millis() as i64;

    if args.json {
        let results: Vec<Value> = outcomes
            .iter()
            .map(|outcome| {
                json!({
                    "name": outcome.name,
                    "hash": outcome.hash,
                    "replaced": outcome.replaced,
                    "confidence_score": outcome.report.as_ref().map(|r| r.confidence_score),
                    "quality_level": outcome.report.as_ref().map(|r| r.quality_level.as_label()),
                })
            })
            .collect();
        let resp = JsonResponse::ok()
            .with_results(results)
            .with_performance(serde_json::to_value(&summary)?)
            .with_stats(StatsOut {
                took_ms,
                total_hits: outcomes.len() as i64,
                doc_count: Some(pipeline.count() as i64),
                files: Some(files as i64),
                backend: Some(pipeline.backend_name().to_string()),
            })
            .with_warnings(warnings);
        print_json(&resp)?;
    } else {
        for warning in warnings {
            eprintln!("warning: {warning}");
        }
        for outcome in &outcomes {
            match &outcome.report {
                Some(report) => println!(
                    "{:<10}\t{:.3}\t{}",
                    report.quality_level.as_label(),
                    report.confidence_score,
                    outcome.name
                ),
                None => println!("{:<10}\t-\t{}", "precomputed", outcome.name),
            }
        }
        println!(
            "Indexed {} docs from {} files ({} backend)",
            pipeline.count(),
            files,
            pipeline.backend_name()
        );
        print_summary(&summary);
    }
    Ok(())
}

fn read_field(text: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (text, file) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Some(text))
        }
        (None, None) => Ok(None),
    }
}

fn cmd_evaluate(args: EvaluateArgs) -> Result<()> {
    let ocr = read_field(args.ocr, args.ocr_file)?;
    let visual = read_field(args.visual, args.visual_file)?;
    if ocr.is_none() && visual.is_none() {
        anyhow::bail!("nothing to evaluate: pass --ocr/--ocr-file or --visual/--visual-file");
    }
    let report = evaluate(
        ocr.as_deref().unwrap_or_default(),
        visual.as_deref().unwrap_or_default(),
    );
    let hints = strategy_hints(&report);

    if args.json {
        let actions = hints
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        let resp = JsonResponse::ok()
            .with_evaluation(serde_json::to_value(&report)?)
            .with_actions(actions);
        print_json(&resp)?;
    } else {
        print_report(&report);
        for hint in hints {
            println!("hint [{}]: {}", hint.category, hint.suggestion);
        }
    }
    Ok(())
}

fn print_report(report: &EvaluationReport) {
    println!(
        "Quality: {} ({:.3})",
        report.quality_level.as_label(),
        report.confidence_score
    );
    for result in &report.evaluations {
        println!(
            "{:<28}{:>5.1}/{}  {:>5.1}%  {}",
            result.criteria, result.score, MAX_SCORE, result.percentage, result.reasoning
        );
    }
    for suggestion in &report.overall_suggestions {
        println!("- {suggestion}");
    }
}

#[derive(Debug, Deserialize)]
struct ScoreLine {
    strategy: String,
    score: f64,
    #[serde(default)]
    metadata: Value,
    timestamp: Option<String>,
}

fn load_scores(path: &Path) -> Result<(PerformanceTracker, Vec<String>)> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut tracker = PerformanceTracker::new();
    let mut warnings = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: ScoreLine = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(err) => {
                warnings.push(format!("skip line {}: {err}", idx + 1));
                continue;
            }
        };
        let timestamp = entry
            .timestamp
            .as_deref()
            .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
            .unwrap_or_else(OffsetDateTime::now_utc);
        tracker.record_at(&entry.strategy, entry.score, entry.metadata, timestamp);
    }
    Ok((tracker, warnings))
}

fn cmd_trend(args: TrendArgs) -> Result<()> {
    let (tracker, warnings) = load_scores(&args.path)?;
    let summaries: Vec<PerformanceSummary> = match &args.strategy {
        Some(strategy) => vec![tracker.summarize(strategy)],
        None => tracker
            .strategies()
            .map(|strategy| tracker.summarize(strategy))
            .collect(),
    };

    if args.json {
        let resp = JsonResponse::ok()
            .with_performance(serde_json::to_value(&summaries)?)
            .with_warnings(warnings);
        print_json(&resp)?;
    } else {
        for warning in warnings {
            eprintln!("warning: {warning}");
        }
        if summaries.is_empty() {
            println!("No scores recorded");
        }
        for summary in &summaries {
            print_summary(summary);
        }
    }
    Ok(())
}

fn print_summary(summary: &PerformanceSummary) {
    println!(
        "{}\tuses={}\tavg={:.2}\tmin={}\tmax={}\ttrend={}",
        summary.version,
        summary.total_uses,
        summary.average_score,
        summary.min_score,
        summary.max_score,
        summary.trend.as_label()
    );
}

fn cmd_rubric(json: bool) -> Result<()> {
    if json {
        let results: Vec<Value> = RUBRIC
            .iter()
            .map(|spec| {
                json!({
                    "name": spec.name,
                    "weight": spec.weight(),
                    "max_score": MAX_SCORE,
                    "description": spec.description,
                })
            })
            .collect();
        print_json(&JsonResponse::ok().with_results(results))?;
    } else {
        println!("{}", render_table());
    }
    Ok(())
}
