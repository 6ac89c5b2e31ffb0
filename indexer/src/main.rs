use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use webdex_core::config::IndexerConfig;
use webdex_core::index::ZonePostings;
use webdex_core::source::load_documents;
use webdex_core::tokenizer::Tokenizer;
use webdex_core::{DocId, Indexer};

#[derive(Parser)]
#[command(name = "webdex")]
#[command(about = "Concurrently fetch and index retrieved web documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index documents from a JSON/JSONL file or directory and print a report
    Build {
        /// Input path (file or directory) of {ID, Url, Description} records
        #[arg(long)]
        input: PathBuf,
        /// JSON config file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: Overrides,
        /// Print full postings for this term (repeatable)
        #[arg(long = "term")]
        terms: Vec<String>,
        /// Number of most frequent terms to report
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Print the admitted (term, position) pairs for a piece of text
    Tokenize {
        #[arg(long, default_value_t = false)]
        stem: bool,
        text: String,
    },
}

/// Command-line settings layered over the config file. Unset flags keep the file's value.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Number of indexing workers
    #[arg(long)]
    workers: Option<usize>,
    /// Bound on documents waiting in the queue
    #[arg(long)]
    queue_capacity: Option<usize>,
    /// Stem terms with the English stemmer
    #[arg(long, overrides_with = "no_stem")]
    stem: bool,
    /// Disable stemming even if the config file enables it
    #[arg(long, overrides_with = "stem")]
    no_stem: bool,
    /// Token delimiter regex
    #[arg(long)]
    delimiters: Option<String>,
    /// Fetch timeout seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Overrides {
    fn apply(self, cfg: &mut IndexerConfig) {
        if let Some(n) = self.workers { cfg.workers = n; }
        if self.queue_capacity.is_some() { cfg.queue_capacity = self.queue_capacity; }
        if self.stem { cfg.tokenizer.stem = true; }
        if self.no_stem { cfg.tokenizer.stem = false; }
        if let Some(d) = self.delimiters { cfg.tokenizer.delimiters = d; }
        if let Some(t) = self.timeout_secs { cfg.fetch.timeout_secs = t; }
    }
}

#[derive(Serialize)]
struct TermReport {
    frequency: u64,
    documents: HashMap<DocId, ZonePostings>,
}

#[derive(Serialize)]
struct BuildReport {
    generated_at: String,
    documents: u64,
    fetch_failures: u64,
    terms: usize,
    top_terms: Vec<(String, u64)>,
    postings: HashMap<String, TermReport>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, config, overrides, terms, top } => {
            let mut cfg = match config {
                Some(path) => IndexerConfig::from_json_file(path)?,
                None => IndexerConfig::default(),
            };
            overrides.apply(&mut cfg);
            build(&input, cfg, &terms, top)
        }
        Commands::Tokenize { stem, text } => {
            let mut cfg = IndexerConfig::default();
            cfg.tokenizer.stem = stem;
            let tokenizer = Tokenizer::new(&cfg.tokenizer)?;
            for (term, pos) in tokenizer.tokenize(&text) {
                println!("{pos}\t{term}");
            }
            Ok(())
        }
    }
}

fn build(input: &Path, cfg: IndexerConfig, terms: &[String], top: usize) -> Result<()> {
    let docs = load_documents(input)?;
    let indexer = Indexer::new(cfg)?;
    for doc in docs {
        indexer.index_document(doc)?;
    }
    indexer.wait_for_indexer();
    indexer.shutdown();

    let stats = indexer.stats();
    let index = indexer.index();
    tracing::info!(documents = stats.documents_indexed, fetch_failures = stats.fetch_failures, terms = index.num_terms(), "indexing complete");

    let postings = terms
        .iter()
        .map(|t| {
            let report = TermReport {
                frequency: index.term_frequency(t),
                documents: index.documents(t).unwrap_or_default(),
            };
            (t.clone(), report)
        })
        .collect();
    let report = BuildReport {
        generated_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        documents: stats.documents_indexed,
        fetch_failures: stats.fetch_failures,
        terms: index.num_terms(),
        top_terms: index.top_terms(top),
        postings,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(args: &[&str]) -> Overrides {
        let mut argv = vec!["webdex", "build", "--input", "docs.jsonl"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Build { overrides, .. } => overrides,
            Commands::Tokenize { .. } => unreachable!(),
        }
    }

    fn stemming_config() -> IndexerConfig {
        let mut cfg = IndexerConfig::default();
        cfg.tokenizer.stem = true;
        cfg
    }

    #[test]
    fn no_stem_overrides_config_file() {
        let mut cfg = stemming_config();
        overrides(&["--no-stem"]).apply(&mut cfg);
        assert!(!cfg.tokenizer.stem);
    }

    #[test]
    fn unset_flags_keep_config_values() {
        let mut cfg = stemming_config();
        cfg.workers = 7;
        overrides(&[]).apply(&mut cfg);
        assert!(cfg.tokenizer.stem);
        assert_eq!(cfg.workers, 7);
    }

    #[test]
    fn last_stem_flag_wins() {
        let mut cfg = IndexerConfig::default();
        overrides(&["--no-stem", "--stem", "--workers", "2"]).apply(&mut cfg);
        assert!(cfg.tokenizer.stem);
        assert_eq!(cfg.workers, 2);
    }
}
