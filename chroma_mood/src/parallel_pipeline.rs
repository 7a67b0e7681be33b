// THEORY:
// The `parallel_pipeline` module analyzes a batch of images concurrently and
// collects the results into a shared store that the graph builder later reads.
//
// Architecture:
// 1.  **Worker Pool**: a single dispatcher task receives `ImageTask`s and hands
//     them round-robin to N worker tasks. Each worker runs the CPU-bound decode
//     and analysis on tokio's blocking pool and replies over a oneshot channel,
//     so the async side never stalls on pixel work.
// 2.  **Results Store**: a cloneable handle over an `RwLock`ed map keyed by image
//     id. Each id is written exactly once, in a single locked insert, so no
//     reader can observe a partial result. Submission order is remembered so
//     snapshots (and therefore graphs) are deterministic.
// 3.  **Failure Isolation**: a failed decode is logged, reported in the
//     `BatchReport`, and never written to the store. Every other image in the
//     batch is unaffected.
// 4.  **Snapshot Reads**: graph building and reporting take a snapshot of the
//     store and then run lock-free over it.

use crate::core_modules::report::{LibraryReport, library_report};
use crate::core_modules::similarity_graph::{GraphItem, SimilarityGraph, build_similarity_graph};
use crate::errors::{AnalysisError, Result};
use crate::pipeline::{Analysis, AnalysisPipeline, AnalysisRecord, GraphOptions, PipelineConfig};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info, warn};

/// Encoded image bytes plus their identity.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub id: String,
    pub label: String,
    pub bytes: Vec<u8>,
}

impl ImageSource {
    pub fn new(id: impl Into<String>, label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            bytes,
        }
    }

    /// Reads a file; the path is the id and the file name is the label.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AnalysisError::io(path, e))?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(path.display().to_string(), label, bytes))
    }
}

pub struct ImageTask {
    pub source: ImageSource,
    pub result_sender: oneshot::Sender<Result<Analysis>>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<ImageTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the dispatcher and `worker_count` workers. Must be called from
    /// within a tokio runtime.
    pub fn new(pipeline: AnalysisPipeline, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<ImageTask>();
        let mut workers = Vec::with_capacity(worker_count);

        // Create a single dispatcher that distributes tasks to workers
        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<ImageTask>())
            .unzip();

        // Spawn dispatcher
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                // A dropped task closes its oneshot, which the caller sees.
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        // Spawn workers
        for mut worker_receiver in worker_receivers {
            let worker_pipeline = pipeline.clone();

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let result = Self::analyze_worker(worker_pipeline.clone(), task.source).await;
                    let _ = task.result_sender.send(result);
                }
            });

            workers.push(worker);
        }

        Self {
            task_sender,
            workers,
        }
    }

    async fn analyze_worker(pipeline: AnalysisPipeline, source: ImageSource) -> Result<Analysis> {
        tokio::task::spawn_blocking(move || pipeline.analyze_encoded(&source.id, &source.bytes))
            .await
            .map_err(|_| AnalysisError::WorkerUnavailable)?
    }

    pub async fn analyze(&self, source: ImageSource) -> Result<Analysis> {
        let (result_sender, result_receiver) = oneshot::channel();

        self.task_sender
            .send(ImageTask {
                source,
                result_sender,
            })
            .map_err(|_| AnalysisError::WorkerUnavailable)?;

        result_receiver
            .await
            .map_err(|_| AnalysisError::WorkerUnavailable)?
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<String, AnalysisRecord>,
    order: Vec<String>,
}

/// Shared, write-once map of analysis results keyed by image id.
#[derive(Debug, Clone, Default)]
pub struct ResultsStore {
    state: Arc<RwLock<StoreState>>,
}

impl ResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record`; a second write to the same id is rejected.
    pub async fn record(&self, record: AnalysisRecord) -> Result<()> {
        let mut state = self.state.write().await;
        if state.records.contains_key(&record.id) {
            return Err(AnalysisError::DuplicateResult(record.id));
        }
        state.order.push(record.id.clone());
        state.records.insert(record.id.clone(), record);
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<AnalysisRecord> {
        self.state.read().await.records.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.state.read().await.records.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Every record, in the order it was stored.
    pub async fn snapshot(&self) -> Vec<AnalysisRecord> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedImage {
    pub id: String,
    pub error: String,
}

/// Outcome of one batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Ids recorded in the store, in submission order.
    pub analyzed: Vec<String>,
    /// Ids excluded from the store, with the reason.
    pub failed: Vec<FailedImage>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.analyzed.len() + self.failed.len()
    }
}

pub struct ParallelPipeline {
    config: PipelineConfig,
    worker_pool: WorkerPool,
    store: ResultsStore,
}

impl ParallelPipeline {
    /// Validates `config`, loads the lexicon and starts the worker pool.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_store(config, ResultsStore::new())
    }

    pub fn with_store(config: PipelineConfig, store: ResultsStore) -> Result<Self> {
        let pipeline = AnalysisPipeline::from_config(&config)?;
        let worker_pool = WorkerPool::new(pipeline, config.worker_count());
        Ok(Self {
            config,
            worker_pool,
            store,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &ResultsStore {
        &self.store
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    /// Analyzes one image and records it.
    pub async fn analyze(&self, source: ImageSource) -> Result<AnalysisRecord> {
        let id = source.id.clone();
        let label = source.label.clone();
        let analysis = self.worker_pool.analyze(source).await?;
        let record = AnalysisRecord { id, label, analysis };
        self.store.record(record.clone()).await?;
        Ok(record)
    }

    /// Analyzes every source concurrently, then records the successes in
    /// submission order. Failures are excluded and reported; they never abort
    /// the batch.
    pub async fn analyze_batch(&self, sources: Vec<ImageSource>) -> BatchReport {
        info!(
            images = sources.len(),
            workers = self.worker_count(),
            "Starting batch analysis"
        );

        let tasks = sources.into_iter().map(|source| async move {
            let id = source.id.clone();
            let label = source.label.clone();
            let outcome = self.worker_pool.analyze(source).await;
            (id, label, outcome)
        });
        let outcomes = join_all(tasks).await;

        let mut report = BatchReport::default();
        for (id, label, outcome) in outcomes {
            let stored = match outcome {
                Ok(analysis) => {
                    self.store
                        .record(AnalysisRecord {
                            id: id.clone(),
                            label,
                            analysis,
                        })
                        .await
                }
                Err(error) => Err(error),
            };
            match stored {
                Ok(()) => {
                    debug!(%id, "Recorded analysis");
                    report.analyzed.push(id);
                }
                Err(error) => {
                    warn!(%id, %error, "Excluding image from analysis");
                    report.failed.push(FailedImage {
                        id,
                        error: error.to_string(),
                    });
                }
            }
        }

        info!(
            analyzed = report.analyzed.len(),
            failed = report.failed.len(),
            "Batch analysis finished"
        );
        report
    }

    /// Builds the similarity graph over the current store contents.
    pub async fn build_graph(&self, options: &GraphOptions) -> SimilarityGraph {
        let records = self.store.snapshot().await;
        let items: Vec<GraphItem<'_>> = records.iter().map(AnalysisRecord::as_graph_item).collect();
        build_similarity_graph(&items, options.metric, options.vector_type, options.threshold)
    }

    /// Summary and matrices over the current store contents. `total_items`
    /// counts every submitted image, including failed ones.
    pub async fn library_report(&self, total_items: usize) -> LibraryReport {
        let records = self.store.snapshot().await;
        let items: Vec<GraphItem<'_>> = records.iter().map(AnalysisRecord::as_graph_item).collect();
        library_report(total_items, &items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> AnalysisRecord {
        AnalysisRecord {
            id: id.to_string(),
            label: id.to_string(),
            analysis: Analysis::default(),
        }
    }

    #[tokio::test]
    async fn store_accepts_one_write_per_id() {
        let store = ResultsStore::new();
        store.record(record("a")).await.unwrap();
        store.record(record("b")).await.unwrap();

        let err = store.record(record("a")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::DuplicateResult(ref id) if id == "a"));
        assert_eq!(store.len().await, 2);
        assert!(store.contains("b").await);
        assert!(store.get("c").await.is_none());
    }

    #[tokio::test]
    async fn snapshot_keeps_submission_order() {
        let store = ResultsStore::new();
        for id in ["z", "m", "a"] {
            store.record(record(id)).await.unwrap();
        }
        let ids: Vec<String> = store.snapshot().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["z", "m", "a"]);
    }

    #[tokio::test]
    async fn concurrent_writers_land_exactly_once() {
        let store = ResultsStore::new();
        let writers = (0..16).map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.record(record(&format!("img-{}", i % 4))).await })
        });
        let results = join_all(writers).await;
        let accepted = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(()))))
            .count();
        assert_eq!(accepted, 4);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn worker_pool_round_trips_failures() {
        let pool = WorkerPool::new(AnalysisPipeline::default(), 2);
        assert_eq!(pool.worker_count(), 2);
        let result = pool.analyze(ImageSource::new("bad", "bad", vec![1, 2, 3])).await;
        assert!(matches!(result, Err(AnalysisError::Decode { .. })));
    }

    #[tokio::test]
    async fn empty_batch_builds_empty_graph() {
        let pipeline = ParallelPipeline::new(PipelineConfig {
            worker_count: Some(1),
            ..PipelineConfig::default()
        })
        .unwrap();
        let report = pipeline.analyze_batch(Vec::new()).await;
        assert_eq!(report.total(), 0);
        let graph = pipeline.build_graph(&GraphOptions::default()).await;
        assert_eq!(graph.stats.node_count, 0);
        assert_eq!(graph.stats.density, 0.0);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = ImageSource::from_path(Path::new("/no/such/image.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }
}
