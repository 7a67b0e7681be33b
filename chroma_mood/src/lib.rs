// THEORY:
// `lib.rs` is the public face of the `chroma_mood` crate: it declares the modules
// and re-exports the handful of types a consumer (like the `mood_tester` binary)
// actually needs.
//
// The engine reads images through two lenses. The color lens reduces an image to
// its few dominant colors; the emotion lens reads those colors through a lexicon
// and reduces them to a normalized emotion profile and a mood. Collections of
// analyzed images are then compared under one of six similarity metrics and
// connected into a thresholded similarity graph.
//
// `AnalysisPipeline` is the single-image interface and `ParallelPipeline` the
// batch interface with its shared `ResultsStore`. The leaf algorithms live in
// `core_modules` and are public for callers that want one stage in isolation.

pub mod config;
pub mod core_modules;
pub mod errors;
pub mod parallel_pipeline;
pub mod pipeline;

pub use crate::core_modules::color_clusterer::{ClusterOptions, extract_dominant_colors};
pub use crate::core_modules::color_vector::build_color_vector;
pub use crate::core_modules::emotion_lexicon::{EmotionLexicon, EmotionProfile};
pub use crate::core_modules::emotion_mapper::build_emotion_vector;
pub use crate::core_modules::report::{LibraryReport, LibrarySummary, emotion_chart};
pub use crate::core_modules::similarity::{custom_similarity, similarity};
pub use crate::core_modules::similarity_graph::{GraphItem, build_similarity_graph};
pub use crate::errors::{AnalysisError, Result};
pub use crate::parallel_pipeline::{BatchReport, ImageSource, ParallelPipeline, ResultsStore};
pub use crate::pipeline::{
    Analysis, AnalysisPipeline, AnalysisRecord, GraphOptions, Metric, Mood, PipelineConfig,
    VectorType,
};
