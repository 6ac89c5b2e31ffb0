//! Concurrent positional inverted indexing of retrieved web documents.
//!
//! Documents are queued with [`Indexer::index_document`], fetched and tokenized by a
//! fixed pool of worker threads, and merged into one shared [`InvertedIndex`].

pub mod config;
pub mod document;
pub mod fetch;
pub mod index;
pub mod indexer;
pub mod normalize;
pub mod queue;
pub mod source;
pub mod tokenizer;

pub use config::{FetchConfig, IndexerConfig, PositionCounting, TokenizerConfig};
pub use document::{DocId, Document, TfVector};
pub use fetch::{Fetcher, HttpFetcher};
pub use index::{IndexSnapshot, InvertedIndex, Zone, ZonePostings};
pub use indexer::{Indexer, IndexerStats};
pub use normalize::Normalizer;
pub use queue::WorkQueue;
pub use tokenizer::Tokenizer;
