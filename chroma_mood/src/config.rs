// THEORY:
// Configuration is read from a TOML file into `PipelineConfig`. Every section and
// every field is optional; anything missing falls back to its default, so an
// empty file is a valid configuration. The result is validated before it is
// returned, so callers never hold an out-of-range config.
//
//   worker_count = 8
//   lexicon_path = "lexicon.toml"
//
//   [cluster]
//   quantization_step = 16
//   sample_cap = 2000
//   cluster_count = 5
//
//   [graph]
//   metric = "cosine"        # cosine | euclidean | pearson | jaccard | manhattan | custom
//   vector_type = "color"    # color | emotion
//   threshold = 0.5

use crate::errors::{AnalysisError, Result};
use crate::pipeline::PipelineConfig;
use std::path::Path;

pub fn from_toml_str(source: &str) -> Result<PipelineConfig> {
    let config: PipelineConfig =
        toml::from_str(source).map_err(|e| AnalysisError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Loads and validates a TOML config file. A relative `lexicon_path` is
/// resolved against the config file's directory.
pub fn load(path: &Path) -> Result<PipelineConfig> {
    let source = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
    let mut config = from_toml_str(&source)?;
    if let Some(lexicon) = &config.lexicon_path
        && lexicon.is_relative()
        && let Some(dir) = path.parent()
    {
        let resolved = dir.join(lexicon);
        config.lexicon_path = Some(resolved);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Metric, VectorType};
    use std::path::PathBuf;

    #[test]
    fn empty_file_is_the_default_config() {
        assert_eq!(from_toml_str("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = from_toml_str(
            r#"
            worker_count = 3

            [cluster]
            cluster_count = 8

            [graph]
            metric = "pearson"
            vector_type = "emotion"
            threshold = 0.75
            "#,
        )
        .unwrap();
        assert_eq!(config.worker_count, Some(3));
        assert_eq!(config.cluster.cluster_count, 8);
        assert_eq!(config.cluster.quantization_step, 16);
        assert_eq!(config.graph.metric, Metric::Pearson);
        assert_eq!(config.graph.vector_type, VectorType::Emotion);
        assert_eq!(config.graph.threshold, 0.75);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let unknown_metric = from_toml_str("[graph]\nmetric = \"hamming\"\n");
        assert!(matches!(unknown_metric, Err(AnalysisError::Config(_))));

        let bad_step = from_toml_str("[cluster]\nquantization_step = 0\n");
        assert!(matches!(bad_step, Err(AnalysisError::Config(_))));
    }

    #[test]
    fn relative_lexicon_path_follows_the_config_file() {
        let dir = std::env::temp_dir().join(format!("chroma_mood_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let relative = dir.join("relative.toml");
        std::fs::write(&relative, "lexicon_path = \"moods/lexicon.toml\"\n").unwrap();
        let config = load(&relative).unwrap();
        assert_eq!(config.lexicon_path, Some(dir.join("moods/lexicon.toml")));

        let absolute = dir.join("absolute.toml");
        std::fs::write(&absolute, "lexicon_path = \"/etc/lexicon.toml\"\n").unwrap();
        let config = load(&absolute).unwrap();
        assert_eq!(config.lexicon_path, Some(PathBuf::from("/etc/lexicon.toml")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load(Path::new("/no/such/chroma_mood.toml")).unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }
}
