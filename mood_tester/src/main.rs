use anyhow::{Context, Result, bail};
use chroma_mood::core_modules::report::LibraryReport;
use chroma_mood::core_modules::similarity_graph::SimilarityGraph;
use chroma_mood::parallel_pipeline::FailedImage;
use chroma_mood::{
    AnalysisRecord, ImageSource, Metric, ParallelPipeline, PipelineConfig, VectorType, config,
};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Analyzes a folder of images and prints their color/emotion profiles and
/// similarity graph as JSON.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory to scan recursively for images.
    pub image_dir: PathBuf,

    /// TOML configuration file. Flags below override its values.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Similarity metric: cosine, euclidean, pearson, jaccard, manhattan or custom.
    #[clap(long)]
    pub metric: Option<Metric>,

    /// Vector compared by the graph: color or emotion.
    #[clap(long = "vector")]
    pub vector_type: Option<VectorType>,

    /// Minimum similarity for an edge, in [0, 1].
    #[clap(long)]
    pub threshold: Option<f64>,

    /// Number of analysis workers. Defaults to the number of CPUs.
    #[clap(long)]
    pub workers: Option<usize>,

    /// TOML emotion lexicon replacing the built-in table.
    #[clap(long)]
    pub lexicon: Option<PathBuf>,

    /// Include the library summary and the color/emotion matrices.
    #[clap(long)]
    pub report: bool,
}

#[derive(Serialize)]
struct Output {
    results: Vec<AnalysisRecord>,
    graph: SimilarityGraph,
    failures: Vec<FailedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<LibraryReport>,
}

fn resolve_config(args: &CliArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => config::load(path)
            .with_context(|| format!("Failed to load config file: {:?}", path))?,
        None => PipelineConfig::default(),
    };
    if let Some(metric) = args.metric {
        config.graph.metric = metric;
    }
    if let Some(vector_type) = args.vector_type {
        config.graph.vector_type = vector_type;
    }
    if let Some(threshold) = args.threshold {
        config.graph.threshold = threshold;
    }
    if let Some(workers) = args.workers {
        config.worker_count = Some(workers);
    }
    if let Some(lexicon) = &args.lexicon {
        config.lexicon_path = Some(lexicon.clone());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn find_images(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        })
        .collect();
    paths.sort();
    paths
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    if !args.image_dir.is_dir() {
        bail!("Not a directory: {:?}", args.image_dir);
    }

    let config = resolve_config(&args)?;
    let pipeline = ParallelPipeline::new(config).context("Failed to start analysis pipeline")?;

    let paths = find_images(&args.image_dir);
    info!("Found {} images in {:?}", paths.len(), args.image_dir);

    let mut sources = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();
    for path in &paths {
        match ImageSource::from_path(path).await {
            Ok(source) => sources.push(source),
            Err(error) => {
                warn!("Skipping {:?}: {}", path, error);
                failures.push(FailedImage {
                    id: path.display().to_string(),
                    error: error.to_string(),
                });
            }
        }
    }

    let batch = pipeline.analyze_batch(sources).await;
    failures.extend(batch.failed);

    let graph = pipeline.build_graph(&pipeline.config().graph).await;
    info!(
        "Graph: {} nodes, {} edges, average degree {:.2}, density {:.3}",
        graph.stats.node_count,
        graph.stats.edge_count,
        graph.stats.average_degree,
        graph.stats.density
    );

    let report = if args.report {
        Some(pipeline.library_report(paths.len()).await)
    } else {
        None
    };

    let output = Output {
        results: pipeline.store().snapshot().await,
        graph,
        failures,
        report,
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize results")?;
    println!("{json}");

    Ok(())
}
