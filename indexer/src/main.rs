use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use telusur_core::evaluate::{evaluate_system, load_judgments, QueryRun};
use telusur_core::keywords::keywords_by_frequency;
use telusur_core::persist::{load_engine, load_meta, save_engine, IndexPaths};
use telusur_core::stemmer::StemmerKind;
use telusur_core::{Engine, EngineConfig, SearchMode};
use tracing_subscriber::{fmt, EnvFilter};

mod loader;
mod metadata;

#[derive(Parser)]
#[command(name = "telusur-indexer")]
#[command(about = "Build, inspect and evaluate a TF-IDF document index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a JSON/JSONL/TXT/PDF file or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Minimum document frequency; overrides the configuration file
        #[arg(long, allow_hyphen_values = true)]
        min_df: Option<i64>,
        /// indonesian, english or none
        #[arg(long)]
        stemmer: Option<String>,
    },
    /// Print index statistics and the most widespread terms
    Inspect {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long, default_value_t = 20)]
        terms: usize,
    },
    Search {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        /// vector, and, or
        #[arg(long, default_value = "vector")]
        mode: String,
        #[arg(long)]
        k: Option<usize>,
        query: String,
    },
    Summarize {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long, default_value_t = 3)]
        sentences: usize,
        doc_id: u32,
    },
    /// Score the ranking against a relevance judgment file
    Evaluate {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long)]
        judgments: PathBuf,
        #[arg(long, default_value = "vector")]
        mode: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, config, min_df, stemmer } => {
            build_index(input, output, config, min_df, stemmer.as_deref())
        }
        Commands::Inspect { index, terms } => inspect(index, terms),
        Commands::Search { index, mode, k, query } => search(index, &mode, k, &query),
        Commands::Summarize { index, sentences, doc_id } => summarize(index, doc_id, sentences),
        Commands::Evaluate { index, judgments, mode, k } => evaluate(index, judgments, &mode, k),
    }
}

fn parse_stemmer(name: &str) -> Result<StemmerKind> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "indonesian" | "id" => StemmerKind::Indonesian,
        "english" | "en" => StemmerKind::English,
        "none" => StemmerKind::None,
        other => bail!("unknown stemmer {other:?}"),
    })
}

fn build_index(
    input: PathBuf,
    output: PathBuf,
    config_path: Option<PathBuf>,
    min_df: Option<i64>,
    stemmer: Option<&str>,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => EngineConfig::from_file(path).with_context(|| format!("reading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(min_df) = min_df {
        config = config.with_min_df(min_df)?;
    }
    if let Some(name) = stemmer {
        config.stemmer = parse_stemmer(name)?;
    }

    let source = loader::source_for(&input)?;
    let documents = source.load_documents().with_context(|| format!("loading {}", input.display()))?;
    if documents.is_empty() {
        bail!("no documents found in {}", input.display());
    }
    tracing::info!(documents = documents.len(), "ingested documents");

    let engine = Engine::build(documents, config)?;
    let paths = IndexPaths::new(&output);
    save_engine(&paths, &engine)?;

    let stats = engine.index_stats();
    tracing::info!(output = %output.display(), docs = stats.document_count, terms = stats.term_count, "index build complete");
    Ok(())
}

fn open(index: &Path) -> Result<Engine> {
    load_engine(&IndexPaths::new(index)).with_context(|| format!("loading index from {}", index.display()))
}

fn inspect(index: PathBuf, top: usize) -> Result<()> {
    let engine = open(&index)?;
    let stats = engine.index_stats();
    println!("documents:       {}", stats.document_count);
    println!("unique terms:    {}", stats.term_count);
    println!("avg doc length:  {:.1}", stats.avg_doc_length);
    if let Ok(meta) = load_meta(&IndexPaths::new(&index)) {
        println!("built at:        {} (format v{}, min_df {})", meta.created_at, meta.version, meta.min_df);
    }

    let mut terms: Vec<_> = engine.index().terms().collect();
    terms.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
    println!("\n{:<20} {:>4}  postings", "term", "df");
    for (term, plist) in terms.into_iter().take(top) {
        let sample: Vec<String> = plist.iter().take(5).map(|p| format!("({}, {})", p.doc_id, p.frequency)).collect();
        println!("{:<20} {:>4}  {}", term, plist.len(), sample.join(" "));
    }
    Ok(())
}

fn search(index: PathBuf, mode: &str, k: Option<usize>, query: &str) -> Result<()> {
    let engine = open(&index)?;
    let mode: SearchMode = mode.parse()?;
    let k = k.unwrap_or(engine.config().default_top_k);
    let hits = engine.search(query, mode, k);
    if hits.is_empty() {
        println!("no results");
    }
    for (rank, hit) in hits.iter().enumerate() {
        let title = engine.document(hit.doc_id).map(|d| d.title.as_str()).unwrap_or("");
        println!("{:>2}. [{}] {:.4}  {}", rank + 1, hit.doc_id, hit.score, title);
    }
    Ok(())
}

fn summarize(index: PathBuf, doc_id: u32, sentences: usize) -> Result<()> {
    let engine = open(&index)?;
    let doc = engine.document(doc_id)?;
    println!("{}\n", doc.title);
    for sentence in engine.summarize(doc_id, sentences)? {
        println!("- {sentence}");
    }
    let keywords: Vec<String> = engine.keywords(doc_id, 5)?.into_iter().map(|(t, _)| t).collect();
    println!("\nkeywords: {}", keywords.join(", "));
    let frequent: Vec<String> = keywords_by_frequency(&doc.content, engine.tokenizer(), 5)
        .into_iter()
        .map(|(t, n)| format!("{t} ({n})"))
        .collect();
    println!("frequent: {}", frequent.join(", "));

    let found = engine.entities(doc_id)?;
    for (kind, mentions) in &found.mentions {
        println!("{kind:?}: {}", mentions.join(", "));
    }
    let figures: Vec<String> = found.statistics.iter().map(|m| format!("{} {}", m.value, m.unit)).collect();
    if !figures.is_empty() {
        println!("figures: {}", figures.join(", "));
    }
    Ok(())
}

fn evaluate(index: PathBuf, judgments: PathBuf, mode: &str, k: usize) -> Result<()> {
    let engine = open(&index)?;
    let mode: SearchMode = mode.parse()?;
    let judgments = load_judgments(&judgments).with_context(|| format!("reading {}", judgments.display()))?;
    let runs: Vec<QueryRun> = judgments
        .into_iter()
        .map(|j| QueryRun {
            ranked: engine.search(&j.query, mode, k).into_iter().map(|h| h.doc_id).collect(),
            query: j.query,
            relevant: j.relevant,
        })
        .collect();
    let report = evaluate_system(&runs, k);
    tracing::info!(queries = runs.len(), map = report.map, "evaluation complete");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
