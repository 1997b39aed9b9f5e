use anyhow::{Context, Result};
use clap::Parser;
use engine::eval::{self, Gain, MetricReport};
use engine::persist::{load_index, IndexPaths};
use engine::rank::{Bm25Params, Model, QlmParams, Rm3Params};
use engine::SearchEngine;
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;

/// Run a query batch against an index under one or more ranking models and
/// score the runs against a relevance-judgment file.
#[derive(Parser)]
#[command(name = "evaluate")]
struct Args {
    /// Index directory produced by the indexer
    #[arg(long)]
    index: String,
    /// Queries file, one query per line (qids are 1-based line numbers)
    #[arg(long)]
    queries: String,
    /// Qrels file with `qid docid grade` lines
    #[arg(long)]
    qrels: String,
    /// Comma-separated model selectors
    #[arg(long, default_value = "tfidf,bm25,bm25_rm3,qlm")]
    models: String,
    /// Evaluation cutoff depth
    #[arg(long, default_value_t = 10)]
    k: usize,
    /// BM25 term-frequency saturation
    #[arg(long, default_value_t = 0.9)]
    k1: f32,
    /// BM25 length normalization
    #[arg(long, default_value_t = 0.4)]
    b: f32,
    /// Jelinek-Mercer lambda; when set, qlm switches from Dirichlet to JM
    #[arg(long)]
    lambda: Option<f32>,
    /// Dirichlet prior strength for qlm
    #[arg(long, default_value_t = 1000.0)]
    mu: f32,
    /// RM3 feedback document count
    #[arg(long, default_value_t = 10)]
    fb_docs: usize,
    /// RM3 expansion term count
    #[arg(long, default_value_t = 10)]
    fb_terms: usize,
    /// RM3 weight of the original query
    #[arg(long, default_value_t = 0.5)]
    alpha: f32,
    /// Use 2^grade - 1 gains for nDCG instead of the grade itself
    #[arg(long, default_value_t = false)]
    exp_gain: bool,
    /// Where to write the comparison report
    #[arg(long, default_value = "retrieval_comparison.json")]
    output: String,
    /// Print the top results of the first few queries
    #[arg(long, default_value_t = 3)]
    sample_queries: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let index = load_index(&IndexPaths::new(&args.index))
        .with_context(|| format!("loading index from {}", args.index))?;
    let engine = SearchEngine::new(index);
    let queries = eval::load_queries(&args.queries)?;
    let qrels = eval::load_qrels(&args.qrels)?;
    let gain = if args.exp_gain { Gain::Exponential } else { Gain::Linear };

    let models: Vec<Model> = args
        .models
        .split(',')
        .map(|name| build_model(name.trim(), &args))
        .collect::<Result<_>>()?;

    let mut comparison = serde_json::Map::new();
    let mut reports: Vec<(&'static str, MetricReport)> = Vec::new();
    for model in &models {
        tracing::info!(model = model.selector(), num_queries = queries.len(), "running batch");
        let report = eval::run_and_evaluate(&engine, model, &queries, &qrels, args.k, gain);
        comparison.insert(
            model.selector().to_string(),
            serde_json::to_value(&report)?,
        );
        reports.push((model.selector(), report));
    }

    print_summary(&reports, args.k);
    if args.sample_queries > 0 {
        if let Some(model) = models.first() {
            print_samples(&engine, model, &queries, args.sample_queries)?;
        }
    }

    let output = serde_json::json!({
        "algorithm_comparison": comparison,
        "num_queries": queries.len(),
        "num_qrels": qrels.len(),
        "evaluation_metric": format!("k={}", args.k),
    });
    fs::write(&args.output, serde_json::to_string_pretty(&output)?)?;
    tracing::info!(output = args.output.as_str(), "report written");
    Ok(())
}

fn build_model(name: &str, args: &Args) -> Result<Model> {
    let bm25 = Bm25Params { k1: args.k1, b: args.b };
    let model = match name {
        "tfidf" => Model::Tfidf,
        "bm25" => Model::Bm25(bm25),
        "bm25_rm3" => Model::Bm25Rm3(Rm3Params {
            bm25,
            fb_docs: args.fb_docs,
            fb_terms: args.fb_terms,
            alpha: args.alpha,
        }),
        "qlm" => Model::Qlm(match args.lambda {
            Some(lambda) => QlmParams::jelinek_mercer(lambda),
            None => QlmParams::dirichlet(args.mu),
        }),
        other => anyhow::bail!("unknown ranking model: {other}"),
    };
    model.validate()?;
    Ok(model)
}

fn print_summary(reports: &[(&'static str, MetricReport)], k: usize) {
    println!("\nRESULTS SUMMARY");
    println!(
        "{:<12} {:<14} {:<14} {:<10} {:<10}",
        "Algorithm",
        format!("Precision@{k}"),
        format!("Recall@{k}"),
        "MAP",
        format!("nDCG@{k}")
    );
    for (name, report) in reports {
        println!(
            "{:<12} {:<14.4} {:<14.4} {:<10.4} {:<10.4}",
            name, report.mean_precision, report.mean_recall, report.map, report.mean_ndcg
        );
        if !report.skipped.is_empty() {
            println!("  (skipped {} unjudged queries)", report.skipped.len());
        }
        if !report.errors.is_empty() {
            println!("  ({} queries failed)", report.errors.len());
        }
    }
}

fn print_samples(
    engine: &SearchEngine,
    model: &Model,
    queries: &[(String, String)],
    n_queries: usize,
) -> Result<()> {
    println!("\nSAMPLE SEARCH RESULTS ({})", model.selector());
    for (qid, text) in queries.iter().take(n_queries) {
        println!("\nQuery {qid}: \"{text}\"");
        match engine.search(text, model, 5) {
            Ok(hits) => {
                for (rank, hit) in hits.iter().enumerate() {
                    println!("{}. {} (score {:.4})", rank + 1, hit.title, hit.score);
                }
            }
            Err(err) => println!("  failed: {err}"),
        }
    }
    Ok(())
}
