// THEORY:
// The `SimilarityGraph` builder is the collection-level layer. Every other module
// looks at one image at a time; this one looks at all analyzed images at once and
// connects the ones that resemble each other.
//
// Algorithm:
// 1.  **All Pairs**: for every unordered pair (i, j) with i < j, in input order,
//     pick the chosen vector kind from both items and score it with one metric.
// 2.  **Thresholding**: an edge exists iff the score is at least the threshold.
//     There are no self-loops and never more than one edge per pair.
// 3.  **Statistics**: node and edge counts, average degree 2E/N and density
//     E / (N(N-1)/2), both 0 when undefined.
//
// Color vectors are compared through their ranked percentage features. Emotion
// vectors are compared over the sorted union of both items' emotion names, so a
// coordinate always means the same emotion on both sides. The `Custom` metric
// always uses both kinds, whatever vector kind was requested.
//
// The builder emits the abstract graph only. Layout and rendering belong to
// whoever consumes it.

use crate::core_modules::color_vector::ColorVector;
use crate::core_modules::emotion_mapper::{EmotionVector, Mood, aligned_emotion_features};
use crate::core_modules::similarity::{Metric, custom_similarity, similarity};
use crate::errors::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Which per-image vector the graph compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorType {
    #[default]
    Color,
    Emotion,
}

impl VectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorType::Color => "color",
            VectorType::Emotion => "emotion",
        }
    }
}

impl fmt::Display for VectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VectorType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "color" => Ok(VectorType::Color),
            "emotion" => Ok(VectorType::Emotion),
            _ => Err(AnalysisError::Config(format!("unknown vector type '{}'", s))),
        }
    }
}

/// A borrowed view of one analyzed item.
#[derive(Debug, Clone, Copy)]
pub struct GraphItem<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub color_vector: &'a ColorVector,
    pub emotion_vector: &'a EmotionVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub mood: Mood,
    /// Hex of the top dominant color, if the item has any.
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub metric: Metric,
    pub vector_type: VectorType,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub average_degree: f64,
    pub density: f64,
}

impl GraphStats {
    pub fn compute(node_count: usize, edge_count: usize) -> Self {
        let n = node_count as f64;
        let e = edge_count as f64;
        let average_degree = if node_count == 0 { 0.0 } else { 2.0 * e / n };
        let density = if node_count < 2 {
            0.0
        } else {
            e / (n * (n - 1.0) / 2.0)
        };
        Self {
            node_count,
            edge_count,
            average_degree,
            density,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimilarityGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
}

/// Clamps the threshold into [0, 1]; NaN becomes 1 (only perfect matches).
pub fn normalize_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        1.0
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

/// Scores one pair of items under `metric` and `vector_type`.
pub fn pair_similarity(
    a: &GraphItem<'_>,
    b: &GraphItem<'_>,
    metric: Metric,
    vector_type: VectorType,
) -> f64 {
    match (metric, vector_type) {
        (Metric::Custom, _) => {
            let (emotion_a, emotion_b) =
                aligned_emotion_features(a.emotion_vector, b.emotion_vector);
            custom_similarity(
                &a.color_vector.features(),
                &b.color_vector.features(),
                &emotion_a,
                &emotion_b,
            )
        }
        (_, VectorType::Color) => similarity(
            &a.color_vector.features(),
            &b.color_vector.features(),
            metric,
        ),
        (_, VectorType::Emotion) => {
            let (emotion_a, emotion_b) =
                aligned_emotion_features(a.emotion_vector, b.emotion_vector);
            similarity(&emotion_a, &emotion_b, metric)
        }
    }
}

pub fn build_similarity_graph(
    items: &[GraphItem<'_>],
    metric: Metric,
    vector_type: VectorType,
    threshold: f64,
) -> SimilarityGraph {
    let threshold = normalize_threshold(threshold);

    let nodes: Vec<GraphNode> = items
        .iter()
        .map(|item| GraphNode {
            id: item.id.to_string(),
            label: item.label.to_string(),
            mood: item.emotion_vector.overall_mood,
            color: item.color_vector.primary_hex().map(str::to_string),
        })
        .collect();

    let mut edges = Vec::new();
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            let weight = pair_similarity(a, b, metric, vector_type);
            if weight >= threshold {
                edges.push(GraphEdge {
                    source: a.id.to_string(),
                    target: b.id.to_string(),
                    weight,
                    metric,
                    vector_type,
                });
            }
        }
    }

    let stats = GraphStats::compute(nodes.len(), edges.len());
    debug!(
        nodes = stats.node_count,
        edges = stats.edge_count,
        %metric,
        %vector_type,
        threshold,
        "Built similarity graph"
    );

    SimilarityGraph {
        nodes,
        edges,
        stats,
    }
}
