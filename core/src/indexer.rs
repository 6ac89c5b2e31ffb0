//! Concurrent indexing worker pool.
//!
//! A fixed number of worker threads pull documents from a shared
//! [`WorkQueue`], fetch the body (falling back to the description), tokenize
//! it and merge the tokens into the shared [`InvertedIndex`].

use crate::config::IndexerConfig;
use crate::document::Document;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::index::{InvertedIndex, Zone};
use crate::queue::WorkQueue;
use crate::tokenizer::Tokenizer;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerStats {
    /// Documents waiting to be picked up.
    pub pending: usize,
    /// Documents taken by a worker and not yet merged.
    pub in_flight: usize,
    pub documents_indexed: u64,
    pub fetch_failures: u64,
    pub workers: usize,
}

struct Shared {
    queue: WorkQueue<Document>,
    index: Arc<InvertedIndex>,
    tokenizer: Tokenizer,
    fetcher: Arc<dyn Fetcher>,
    /// `None` unless the caller asked for finished records.
    processed: Option<Mutex<Vec<Document>>>,
    documents_indexed: AtomicU64,
    fetch_failures: AtomicU64,
}

pub struct Indexer {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    num_workers: usize,
}

impl Indexer {
    /// Start the pool with an HTTP fetcher built from `config.fetch`.
    pub fn new(config: IndexerConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    pub fn with_fetcher(config: IndexerConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let tokenizer = Tokenizer::new(&config.tokenizer)?;
        Self::with_parts(config, tokenizer, fetcher)
    }

    /// Start the pool with an explicit tokenizer, e.g. one carrying a custom normalizer.
    pub fn with_parts(config: IndexerConfig, tokenizer: Tokenizer, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;
        info!(workers = config.workers, queue_capacity = ?config.queue_capacity, "initializing indexer");

        let shared = Arc::new(Shared {
            queue: WorkQueue::new(config.queue_capacity),
            index: Arc::new(InvertedIndex::new()),
            tokenizer,
            fetcher,
            processed: config.retain_processed.then(|| Mutex::new(Vec::new())),
            documents_indexed: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
        });

        let indexer = Self {
            shared: Arc::clone(&shared),
            workers: Mutex::new(Vec::with_capacity(config.workers)),
            num_workers: config.workers,
        };
        for i in 0..config.workers {
            let shared = Arc::clone(&shared);
            // on error, workers already started are joined by Drop
            let handle = std::thread::Builder::new()
                .name(format!("webdex-indexer-{i}"))
                .spawn(move || worker_loop(i, &shared))
                .with_context(|| format!("spawning indexer worker {i}"))?;
            indexer.workers.lock().push(handle);
        }
        Ok(indexer)
    }

    /// Queue a document for indexing. Blocks only when a bounded queue is full.
    pub fn index_document(&self, document: Document) -> Result<()> {
        debug!(doc_id = %document.id, "enqueueing document");
        self.shared
            .queue
            .push(document)
            .context("indexer has been shut down")
    }

    /// Block until every document enqueued so far has been merged.
    pub fn wait_for_indexer(&self) {
        self.shared.queue.wait_until_drained();
    }

    /// Discard all postings and frequencies.
    ///
    /// Does not wait for in-flight documents; call [`Indexer::wait_for_indexer`] first.
    pub fn clear_index(&self) {
        info!("clearing index");
        self.shared.index.reset();
    }

    /// Shared handle to the index for read-side queries.
    pub fn index(&self) -> Arc<InvertedIndex> {
        Arc::clone(&self.shared.index)
    }

    /// Take the documents finished since the last call, with body and tf vector filled in.
    ///
    /// Always empty unless the pool was built with `retain_processed`.
    pub fn take_processed(&self) -> Vec<Document> {
        self.shared
            .processed
            .as_ref()
            .map(|processed| std::mem::take(&mut *processed.lock()))
            .unwrap_or_default()
    }

    pub fn stats(&self) -> IndexerStats {
        let (pending, unfinished) = self.shared.queue.counts();
        IndexerStats {
            pending,
            in_flight: unfinished.saturating_sub(pending),
            documents_indexed: self.shared.documents_indexed.load(Ordering::Relaxed),
            fetch_failures: self.shared.fetch_failures.load(Ordering::Relaxed),
            workers: self.num_workers,
        }
    }

    /// Stop accepting documents, let the workers finish what is queued, and join them.
    pub fn shutdown(&self) {
        self.shared.queue.close();
        let mut workers = self.workers.lock();
        if workers.is_empty() {
            return;
        }
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                error!("indexer worker exited by panic");
            }
        }
        info!("indexer shut down");
    }
}

impl Drop for Indexer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Marks the current document done even if processing panics.
struct TaskDoneGuard<'a> {
    queue: &'a WorkQueue<Document>,
}

impl Drop for TaskDoneGuard<'_> {
    fn drop(&mut self) {
        self.queue.task_done();
    }
}

fn worker_loop(i: usize, shared: &Shared) {
    loop {
        debug!(worker = i, "waiting for next document");
        let Some(document) = shared.queue.pop() else {
            debug!(worker = i, "queue closed, worker exiting");
            return;
        };
        let _done = TaskDoneGuard { queue: &shared.queue };
        let doc_id = document.id.clone();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            process_document(i, shared, document)
        }));
        match outcome {
            Ok(document) => {
                shared.documents_indexed.fetch_add(1, Ordering::Relaxed);
                if let Some(processed) = &shared.processed {
                    processed.lock().push(document);
                }
            }
            Err(e) => {
                error!(
                    worker = i,
                    doc_id = %doc_id,
                    "panic while indexing document: {}",
                    e.downcast_ref::<&str>()
                        .copied()
                        .or_else(|| e.downcast_ref::<String>().map(String::as_str))
                        .unwrap_or("(non-string panic)")
                );
            }
        }
    }
}

fn process_document(i: usize, shared: &Shared, mut document: Document) -> Document {
    info!(worker = i, doc_id = %document.id, url = %document.url, "indexing document");

    let body = match shared.fetcher.fetch(&document.url) {
        Ok(body) => body,
        Err(e) => {
            shared.fetch_failures.fetch_add(1, Ordering::Relaxed);
            warn!(worker = i, doc_id = %document.id, url = %document.url, error = %e, "fetch failed, using description");
            document.description.clone()
        }
    };

    let tokens = shared.tokenizer.tokenize(&body);
    debug!(worker = i, doc_id = %document.id, admitted = tokens.len(), "tokenized document");

    let tf = shared.index.merge_document(&document.id, Zone::Body, &tokens);
    document.body = Some(body);
    document.tf_vector = Some(tf);

    info!(worker = i, doc_id = %document.id, "finished indexing document");
    document
}
