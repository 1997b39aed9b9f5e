use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use engine::persist::{save_index, save_meta, IndexPaths, MetaFile};
use engine::{Analyzer, AnalyzerConfig, FieldPolicy, InvertedIndex, RecipeDoc};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a recipe search index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from JSON/JSONL recipe files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Repeat the title this many times in the indexed text
        #[arg(long, default_value_t = 1)]
        title_boost: usize,
        /// Index without Snowball stemming
        #[arg(long, default_value_t = false)]
        no_stem: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            title_boost,
            no_stem,
        } => build(&input, &output, title_boost, no_stem),
    }
}

fn build(input: &str, output: &str, title_boost: usize, no_stem: bool) -> Result<()> {
    let docs = collect_docs(Path::new(input))?;
    if docs.is_empty() {
        bail!("no recipe documents found under {input}");
    }
    tracing::info!(num_docs = docs.len(), input, "ingested recipe records");

    let analyzer = Analyzer::new(AnalyzerConfig {
        stem: !no_stem,
        ..AnalyzerConfig::default()
    });
    let policy = FieldPolicy { title_boost };
    let index = InvertedIndex::build(&docs, &analyzer, policy)?;

    let paths = IndexPaths::new(output);
    save_index(&paths, &index)?;
    let meta = MetaFile {
        num_docs: index.num_docs(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| String::new()),
        version: 1,
    };
    save_meta(&paths, &meta)?;

    let stats = index.stats();
    tracing::info!(
        output,
        num_docs = stats.document_count,
        vocabulary = stats.vocabulary_size,
        avg_doc_len = stats.avg_doc_length,
        "index build complete"
    );
    Ok(())
}

fn collect_docs(input: &Path) -> Result<Vec<RecipeDoc>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }

    let mut docs = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    Ok(docs)
}

fn read_jsonl(file: &Path, docs: &mut Vec<RecipeDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: RecipeDoc = serde_json::from_str(&line)
            .with_context(|| format!("invalid recipe record in {}", file.display()))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<RecipeDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => {}
    }
    Ok(())
}
