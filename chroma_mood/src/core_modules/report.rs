// THEORY:
// The `Report` module summarizes a whole library of analyzed images in tabular
// form, for whoever wants to chart or export it. It reads the same borrowed item
// views the graph builder reads and never recomputes any analysis.
//
// - `LibrarySummary`: how many images there are, how many were analyzed, and
//   how many distinct color names and emotion names the analyzed ones use.
// - `FeatureMatrix`: one column per distinct name (sorted), one row per analyzed
//   image. The color matrix holds dominant-color percentages; the emotion matrix
//   holds emotion shares as percentages with one decimal.
//
// Formatting these tables as CSV or HTML is left to the caller.

use crate::core_modules::emotion_mapper::EmotionVector;
use crate::core_modules::similarity_graph::GraphItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LibrarySummary {
    pub total_items: usize,
    pub analyzed_items: usize,
    pub color_types: usize,
    pub emotion_types: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub id: String,
    pub label: String,
    /// One value per column, in column order.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

impl FeatureMatrix {
    pub fn value(&self, row_id: &str, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        let row = self.rows.iter().find(|r| r.id == row_id)?;
        row.values.get(col).copied()
    }
}

pub type ColorMatrix = FeatureMatrix;
pub type EmotionMatrix = FeatureMatrix;

/// Summary plus both matrices, for one library.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LibraryReport {
    pub summary: LibrarySummary,
    pub color_matrix: ColorMatrix,
    pub emotion_matrix: EmotionMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub name: String,
    /// Share as a percentage with one decimal.
    pub percentage: f64,
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn color_names(items: &[GraphItem<'_>]) -> BTreeSet<String> {
    items
        .iter()
        .flat_map(|item| item.color_vector.dominant_colors.iter())
        .map(|color| color.name.clone())
        .collect()
}

fn emotion_names(items: &[GraphItem<'_>]) -> BTreeSet<String> {
    items
        .iter()
        .flat_map(|item| item.emotion_vector.emotions.keys())
        .cloned()
        .collect()
}

/// `total_items` counts every submitted image, analyzed or not.
pub fn library_summary(total_items: usize, items: &[GraphItem<'_>]) -> LibrarySummary {
    LibrarySummary {
        total_items,
        analyzed_items: items.len(),
        color_types: color_names(items).len(),
        emotion_types: emotion_names(items).len(),
    }
}

pub fn color_matrix(items: &[GraphItem<'_>]) -> ColorMatrix {
    let columns: Vec<String> = color_names(items).into_iter().collect();
    let rows = items
        .iter()
        .map(|item| MatrixRow {
            id: item.id.to_string(),
            label: item.label.to_string(),
            values: columns
                .iter()
                .map(|name| {
                    // First (highest-ranked) dominant color with that name.
                    item.color_vector
                        .dominant_colors
                        .iter()
                        .find(|c| &c.name == name)
                        .map_or(0.0, |c| c.percentage)
                })
                .collect(),
        })
        .collect();
    FeatureMatrix { columns, rows }
}

pub fn emotion_matrix(items: &[GraphItem<'_>]) -> EmotionMatrix {
    let columns: Vec<String> = emotion_names(items).into_iter().collect();
    let rows = items
        .iter()
        .map(|item| MatrixRow {
            id: item.id.to_string(),
            label: item.label.to_string(),
            values: columns
                .iter()
                .map(|name| round_to_tenth(item.emotion_vector.value_of(name) * 100.0))
                .collect(),
        })
        .collect();
    FeatureMatrix { columns, rows }
}

pub fn library_report(total_items: usize, items: &[GraphItem<'_>]) -> LibraryReport {
    LibraryReport {
        summary: library_summary(total_items, items),
        color_matrix: color_matrix(items),
        emotion_matrix: emotion_matrix(items),
    }
}

/// Emotion entries by descending share, as percentages. Equal shares keep
/// accumulation order, as dominant emotions do.
pub fn emotion_chart(vector: &EmotionVector) -> Vec<ChartEntry> {
    let mut entries = vector.ordered_emotions();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries
        .into_iter()
        .map(|(name, value)| ChartEntry {
            name: name.to_string(),
            percentage: round_to_tenth(value * 100.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_clusterer::DominantColor;
    use crate::core_modules::color_vector::{ColorVector, build_color_vector};
    use crate::core_modules::emotion_lexicon::EmotionLexicon;
    use crate::core_modules::emotion_mapper::build_emotion_vector;
    use crate::core_modules::pixel::pixel::Rgb;

    fn dominant(name: &str, percentage: f64) -> DominantColor {
        DominantColor {
            rgb: Rgb::new(100, 100, 100),
            hex: "#646464".to_string(),
            name: name.to_string(),
            percentage,
            cluster_size: 1,
        }
    }

    fn emotions(pairs: &[(&str, f64)]) -> EmotionVector {
        EmotionVector {
            emotions: pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            ..EmotionVector::default()
        }
    }

    fn fixtures() -> Vec<(String, ColorVector, EmotionVector)> {
        vec![
            (
                "one".to_string(),
                build_color_vector(vec![
                    dominant("red", 70.0),
                    dominant("blue", 20.0),
                    dominant("red", 5.0),
                ]),
                emotions(&[("joy", 0.75), ("calm", 0.25)]),
            ),
            (
                "two".to_string(),
                build_color_vector(vec![dominant("green", 90.0)]),
                emotions(&[("nature", 0.6666), ("calm", 0.3334)]),
            ),
        ]
    }

    fn items(fixtures: &[(String, ColorVector, EmotionVector)]) -> Vec<GraphItem<'_>> {
        fixtures
            .iter()
            .map(|(id, color, emotion)| GraphItem {
                id,
                label: id,
                color_vector: color,
                emotion_vector: emotion,
            })
            .collect()
    }

    #[test]
    fn summary_counts_distinct_names() {
        let fixtures = fixtures();
        let summary = library_summary(3, &items(&fixtures));
        assert_eq!(
            summary,
            LibrarySummary {
                total_items: 3,
                analyzed_items: 2,
                color_types: 3,
                emotion_types: 3,
            }
        );
    }

    #[test]
    fn color_matrix_uses_sorted_columns_and_first_match() {
        let fixtures = fixtures();
        let matrix = color_matrix(&items(&fixtures));
        assert_eq!(matrix.columns, vec!["blue", "green", "red"]);
        assert_eq!(matrix.rows[0].values, vec![20.0, 0.0, 70.0]);
        assert_eq!(matrix.value("two", "green"), Some(90.0));
        assert_eq!(matrix.value("two", "red"), Some(0.0));
        assert_eq!(matrix.value("three", "red"), None);
    }

    #[test]
    fn emotion_matrix_holds_rounded_percentages() {
        let fixtures = fixtures();
        let matrix = emotion_matrix(&items(&fixtures));
        assert_eq!(matrix.columns, vec!["calm", "joy", "nature"]);
        assert_eq!(matrix.rows[0].values, vec![25.0, 75.0, 0.0]);
        assert_eq!(matrix.rows[1].values, vec![33.3, 0.0, 66.7]);
    }

    #[test]
    fn full_report_bundles_everything() {
        let fixtures = fixtures();
        let report = library_report(2, &items(&fixtures));
        assert_eq!(report.summary.analyzed_items, 2);
        assert_eq!(report.color_matrix.rows.len(), 2);
        assert_eq!(report.emotion_matrix.columns.len(), report.summary.emotion_types);
    }

    #[test]
    fn chart_is_sorted_by_share() {
        let chart = emotion_chart(&emotions(&[("calm", 0.2), ("joy", 0.5), ("trust", 0.3)]));
        let names: Vec<&str> = chart.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["joy", "trust", "calm"]);
        assert_eq!(chart[0].percentage, 50.0);
        assert!(emotion_chart(&EmotionVector::default()).is_empty());
    }

    #[test]
    fn chart_ties_keep_accumulation_order() {
        let vector = build_color_vector(vec![dominant("red", 100.0)]);
        let emotions = build_emotion_vector(&vector, EmotionLexicon::builtin());
        let chart = emotion_chart(&emotions);
        let names: Vec<&str> = chart.iter().map(|e| e.name.as_str()).collect();
        // joy and energy tie; joy accumulates first, ahead of alphabetical order.
        assert_eq!(names, vec!["excitement", "joy", "energy", "passion", "anger"]);
        let top: Vec<&str> = emotions
            .dominant_emotions
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(top, names[..3].to_vec());
    }
}
