// THEORY:
// The `pipeline` module is the top-level, single-image API of the engine. It
// wires the core modules into one pass:
//
//   RGBA buffer -> ColorClusterer -> ColorClassifier (per cluster)
//               -> ColorVector -> EmotionMapper -> Analysis
//
// The pass itself is pure and synchronous. The only fallible step is turning
// encoded bytes (PNG, JPEG, ...) into an RGBA buffer, and a failure there only
// ever concerns that one image.
//
// It also owns the configuration types shared with the parallel pipeline and
// the command-line tool.

use crate::core_modules::color_clusterer::{ClusterOptions, extract_dominant_colors};
use crate::core_modules::color_vector::build_color_vector;
use crate::core_modules::emotion_lexicon::EmotionLexicon;
use crate::core_modules::emotion_mapper::build_emotion_vector;
use crate::core_modules::similarity_graph::GraphItem;
use crate::errors::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

// Re-export key data structures for the public API.
pub use crate::core_modules::color_clusterer::DominantColor;
pub use crate::core_modules::color_vector::ColorVector;
pub use crate::core_modules::emotion_mapper::{EmotionScore, EmotionVector, Mood};
pub use crate::core_modules::similarity::Metric;
pub use crate::core_modules::similarity_graph::{SimilarityGraph, VectorType};

/// How the similarity graph is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    pub metric: Metric,
    pub vector_type: VectorType,
    /// Minimum similarity for an edge, in [0, 1].
    pub threshold: f64,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            metric: Metric::Cosine,
            vector_type: VectorType::Color,
            threshold: 0.5,
        }
    }
}

impl GraphOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(AnalysisError::Config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Configuration for the pipelines, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cluster: ClusterOptions,
    pub graph: GraphOptions,
    /// Number of analysis workers. Defaults to the number of CPUs.
    pub worker_count: Option<usize>,
    /// TOML emotion lexicon replacing the built-in table.
    pub lexicon_path: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.graph.validate()?;
        if self.worker_count == Some(0) {
            return Err(AnalysisError::Config("worker_count must be at least 1".into()));
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(num_cpus::get).max(1)
    }

    /// The configured lexicon, or the built-in one.
    pub fn load_lexicon(&self) -> Result<EmotionLexicon> {
        match &self.lexicon_path {
            Some(path) => EmotionLexicon::load(path),
            None => Ok(EmotionLexicon::builtin().clone()),
        }
    }
}

/// Everything derived from one image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub color_vector: ColorVector,
    pub emotion_vector: EmotionVector,
}

impl Analysis {
    /// False when no sampled pixel survived filtering.
    pub fn has_color_data(&self) -> bool {
        !self.color_vector.is_empty()
    }

    pub fn dominant_colors(&self) -> &[DominantColor] {
        &self.color_vector.dominant_colors
    }
}

/// An analysis stored under its image id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    /// Display name, usually the file name.
    pub label: String,
    pub analysis: Analysis,
}

impl AnalysisRecord {
    pub fn as_graph_item(&self) -> GraphItem<'_> {
        GraphItem {
            id: &self.id,
            label: &self.label,
            color_vector: &self.analysis.color_vector,
            emotion_vector: &self.analysis.emotion_vector,
        }
    }
}

/// The single-image analysis engine.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    options: ClusterOptions,
    lexicon: Arc<EmotionLexicon>,
}

impl AnalysisPipeline {
    pub fn new(options: ClusterOptions, lexicon: Arc<EmotionLexicon>) -> Result<Self> {
        options.validate()?;
        Ok(Self { options, lexicon })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.cluster.clone(), Arc::new(config.load_lexicon()?))
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    pub fn lexicon(&self) -> &EmotionLexicon {
        &self.lexicon
    }

    /// Analyzes a raw RGBA buffer (4 bytes per pixel, row-major).
    pub fn analyze_rgba(&self, buffer: &[u8]) -> Analysis {
        // Stage 1: Sampling and clustering
        let dominant_colors = extract_dominant_colors(buffer, &self.options);

        // Stage 2: Color summary
        let color_vector = build_color_vector(dominant_colors);

        // Stage 3: Emotional reading
        let emotion_vector = build_emotion_vector(&color_vector, &self.lexicon);

        Analysis {
            color_vector,
            emotion_vector,
        }
    }

    /// Decodes `bytes` with the `image` crate and analyzes the result.
    pub fn analyze_encoded(&self, id: &str, bytes: &[u8]) -> Result<Analysis> {
        let decoded = image::load_from_memory(bytes).map_err(|source| AnalysisError::Decode {
            id: id.to_string(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let analysis = self.analyze_rgba(rgba.as_raw());

        if analysis.has_color_data() {
            debug!(
                id,
                width = rgba.width(),
                height = rgba.height(),
                colors = analysis.color_vector.dominant_colors.len(),
                mood = %analysis.emotion_vector.overall_mood,
                "Analyzed image"
            );
        } else {
            debug!(id, "No usable color data after filtering");
        }
        Ok(analysis)
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self {
            options: ClusterOptions::default(),
            lexicon: Arc::new(EmotionLexicon::builtin().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn red_image_reads_as_positive() {
        let pipeline = AnalysisPipeline::default();
        let image = RgbaImage::from_pixel(32, 32, Rgba([255, 0, 0, 255]));
        let analysis = pipeline.analyze_encoded("red", &encode_png(&image)).unwrap();

        assert!(analysis.has_color_data());
        assert_eq!(analysis.dominant_colors()[0].name, "red");
        assert_eq!(analysis.dominant_colors()[0].percentage, 100.0);
        assert_eq!(analysis.emotion_vector.overall_mood, Mood::Positive);
    }

    #[test]
    fn transparent_buffer_has_no_color_data() {
        let pipeline = AnalysisPipeline::default();
        let analysis = pipeline.analyze_rgba(&vec![0u8; 64 * 4]);
        assert!(!analysis.has_color_data());
        assert!(analysis.emotion_vector.is_empty());
        assert_eq!(analysis.emotion_vector.overall_mood, Mood::Neutral);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let pipeline = AnalysisPipeline::default();
        let err = pipeline.analyze_encoded("junk", b"not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::Decode { ref id, .. } if id == "junk"));
    }

    #[test]
    fn config_validation() {
        let mut config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.worker_count() >= 1);

        config.worker_count = Some(0);
        assert!(config.validate().is_err());

        config.worker_count = Some(2);
        config.graph.threshold = 1.5;
        assert!(config.validate().is_err());

        config.graph.threshold = 0.5;
        config.cluster.cluster_count = 0;
        assert!(AnalysisPipeline::from_config(&config).is_err());
    }

    #[test]
    fn missing_lexicon_file_is_an_io_error() {
        let config = PipelineConfig {
            lexicon_path: Some(PathBuf::from("/definitely/not/here.toml")),
            ..PipelineConfig::default()
        };
        assert!(matches!(config.load_lexicon(), Err(AnalysisError::Io { .. })));
    }
}
