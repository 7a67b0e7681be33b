// THEORY:
// The `Similarity` engine scores two numeric feature vectors. It knows nothing
// about colors or emotions; the graph builder decides which vectors to feed it.
//
// Every metric obeys the same contract so thresholds behave predictably:
// 1.  **Zero Padding**: the shorter vector is extended with zeros to the longer
//     one's length before any math happens.
// 2.  **Total**: a degenerate input (empty, all-zero, constant) never fails. Any
//     non-finite intermediate result is coerced to 0.
// 3.  **Bounded**: every result is clamped to its metric's range, [-1, 1] for
//     Pearson and [0, 1] for the rest.
//
// `Custom` is the one metric that needs two pairs: it blends the cosine of the
// color pair with the cosine of the emotion pair (0.6 / 0.4). A missing half drops
// out of the blend, so a single pair scores as its plain cosine.

use crate::errors::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const CUSTOM_COLOR_WEIGHT: f64 = 0.6;
const CUSTOM_EMOTION_WEIGHT: f64 = 0.4;
/// Spread, relative to the largest magnitude, below which a vector counts as constant.
const PEARSON_RELATIVE_SPREAD: f64 = 16.0 * f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    Pearson,
    Jaccard,
    Manhattan,
    Custom,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Cosine,
        Metric::Euclidean,
        Metric::Pearson,
        Metric::Jaccard,
        Metric::Manhattan,
        Metric::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::Pearson => "pearson",
            Metric::Jaccard => "jaccard",
            Metric::Manhattan => "manhattan",
            Metric::Custom => "custom",
        }
    }

    /// Closed range every score of this metric falls in.
    pub fn range(&self) -> (f64, f64) {
        match self {
            Metric::Pearson => (-1.0, 1.0),
            _ => (0.0, 1.0),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| AnalysisError::Config(format!("unknown similarity metric '{}'", s)))
    }
}

/// Copies of `a` and `b` zero-padded to a common length.
pub fn pad_to_common_length(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let len = a.len().max(b.len());
    let pad = |v: &[f64]| {
        let mut padded = v.to_vec();
        padded.resize(len, 0.0);
        padded
    };
    (pad(a), pad(b))
}

fn bounded(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        0.0
    }
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    bounded(dot / (norm_a * norm_b), 0.0, 1.0)
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    let distance = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt();
    bounded(1.0 / (1.0 + distance), 0.0, 1.0)
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

/// True when the spread of `v` around `center` is rounding noise for its magnitude.
fn is_constant(v: &[f64], center: f64, sum_sq_dev: f64) -> bool {
    let scale = v.iter().fold(center.abs(), |acc, x| acc.max(x.abs()));
    let floor = PEARSON_RELATIVE_SPREAD * scale;
    sum_sq_dev <= v.len() as f64 * floor * floor
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    // Centered sums: raw power sums cancel badly for offset vectors.
    let mean_a = mean(a);
    let mean_b = mean(b);
    let (mut covariance, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    // Constant vectors have no variance to correlate.
    if is_constant(a, mean_a, var_a) || is_constant(b, mean_b, var_b) {
        return 0.0;
    }
    bounded(covariance / (var_a.sqrt() * var_b.sqrt()), -1.0, 1.0)
}

fn jaccard(a: &[f64], b: &[f64]) -> f64 {
    let intersection: f64 = a.iter().zip(b).map(|(x, y)| x.min(*y)).sum();
    let union: f64 = a.iter().zip(b).map(|(x, y)| x.max(*y)).sum();
    if union == 0.0 {
        return 0.0;
    }
    bounded(intersection / union, 0.0, 1.0)
}

fn manhattan(a: &[f64], b: &[f64]) -> f64 {
    let distance: f64 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
    bounded(1.0 / (1.0 + distance), 0.0, 1.0)
}

/// Scores one pair of vectors under `metric`.
pub fn similarity(a: &[f64], b: &[f64], metric: Metric) -> f64 {
    let (a, b) = pad_to_common_length(a, b);
    match metric {
        Metric::Cosine => cosine(&a, &b),
        Metric::Euclidean => euclidean(&a, &b),
        Metric::Pearson => pearson(&a, &b),
        Metric::Jaccard => jaccard(&a, &b),
        Metric::Manhattan => manhattan(&a, &b),
        Metric::Custom => custom_similarity(&a, &b, &[], &[]),
    }
}

/// 0.6 * cosine(color pair) + 0.4 * cosine(emotion pair). A pair with no
/// coordinates on either side is left out and the other half carries full weight.
pub fn custom_similarity(
    color_a: &[f64],
    color_b: &[f64],
    emotion_a: &[f64],
    emotion_b: &[f64],
) -> f64 {
    let color = similarity(color_a, color_b, Metric::Cosine);
    let emotion = similarity(emotion_a, emotion_b, Metric::Cosine);
    if emotion_a.is_empty() && emotion_b.is_empty() {
        return color;
    }
    if color_a.is_empty() && color_b.is_empty() {
        return emotion;
    }
    bounded(
        CUSTOM_COLOR_WEIGHT * color + CUSTOM_EMOTION_WEIGHT * emotion,
        0.0,
        1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    #[test]
    fn cosine_self_similarity_is_one() {
        let v = [0.42, 0.3, 0.15, 0.08, 0.05];
        assert!((similarity(&v, &v, Metric::Cosine) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn pearson_of_negated_vector_is_minus_one() {
        let v = [0.6, 0.2, 0.1, 0.05];
        let negated: Vec<f64> = v.iter().map(|x| -x).collect();
        assert!((similarity(&v, &negated, Metric::Pearson) + 1.0).abs() < EPSILON);
    }

    #[test]
    fn pearson_survives_offset_and_closely_spaced_vectors() {
        let vectors: [&[f64]; 4] = [
            &[1e8, 1e8 + 1.0, 1e8 + 2.0][..],
            &[0.3, 0.3000001][..],
            &[1000.0, 1000.000001][..],
            &[12345.6, 12345.7, 12345.8][..],
        ];
        for v in vectors {
            let negated: Vec<f64> = v.iter().map(|x| -x).collect();
            let anti = similarity(v, &negated, Metric::Pearson);
            let same = similarity(v, v, Metric::Pearson);
            assert!((anti + 1.0).abs() < EPSILON, "{v:?} against its negation gave {anti}");
            assert!((same - 1.0).abs() < EPSILON, "{v:?} against itself gave {same}");
        }
    }

    #[test]
    fn pearson_treats_rounding_noise_as_constant() {
        let flat = [0.1, 0.1, 0.1];
        assert_eq!(similarity(&flat, &[0.1, 0.2, 0.3], Metric::Pearson), 0.0);
        assert_eq!(similarity(&[1e8; 4], &[1.0, 2.0, 3.0, 4.0], Metric::Pearson), 0.0);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(similarity(&[0.0, 0.0], &[0.0, 0.0], Metric::Jaccard), 0.0);
        assert_eq!(similarity(&[0.0, 0.0], &[0.3, 0.1], Metric::Cosine), 0.0);
        assert_eq!(similarity(&[0.5, 0.5, 0.5], &[0.1, 0.2, 0.3], Metric::Pearson), 0.0);
        assert_eq!(similarity(&[], &[], Metric::Pearson), 0.0);
        assert_eq!(similarity(&[], &[], Metric::Custom), 0.0);
    }

    #[test]
    fn shorter_vector_is_zero_padded() {
        let a = [0.5, 0.5];
        let b = [0.5, 0.5, 0.0];
        assert!((similarity(&a, &b, Metric::Cosine) - 1.0).abs() < EPSILON);
        assert_eq!(similarity(&a, &b, Metric::Euclidean), 1.0);
        assert_eq!(similarity(&a, &b, Metric::Manhattan), 1.0);
        assert_eq!(similarity(&a, &b, Metric::Jaccard), 1.0);
    }

    #[test]
    fn distance_metrics_follow_their_formulas() {
        let a = [1.0, 0.0];
        let b = [0.0, 0.0];
        assert!((similarity(&a, &b, Metric::Euclidean) - 0.5).abs() < EPSILON);
        assert!((similarity(&[1.0, 1.0], &b, Metric::Manhattan) - 1.0 / 3.0).abs() < EPSILON);
        assert!((similarity(&[0.6, 0.4], &[0.4, 0.4], Metric::Jaccard) - 0.8).abs() < EPSILON);
    }

    #[test]
    fn every_metric_stays_in_range() {
        let pairs: [(&[f64], &[f64]); 4] = [
            (&[0.9, 0.1][..], &[0.1, 0.9][..]),
            (&[0.5, 0.3, 0.2][..], &[0.2][..]),
            (&[-1.0, 2.0, 0.5][..], &[3.0, -0.5, 0.0][..]),
            (&[0.0][..], &[1.0][..]),
        ];
        for metric in Metric::ALL {
            let (min, max) = metric.range();
            for (a, b) in pairs {
                let score = similarity(a, b, metric);
                assert!(score.is_finite());
                assert!(score >= min && score <= max, "{metric} gave {score}");
            }
        }
    }

    #[test]
    fn custom_blends_color_and_emotion_pairs() {
        let color = [0.7, 0.3];
        let emotion_a = [1.0, 0.0];
        let emotion_b = [0.0, 1.0];
        let blended = custom_similarity(&color, &color, &emotion_a, &emotion_b);
        assert!((blended - 0.6).abs() < EPSILON);
        let identical = custom_similarity(&color, &color, &emotion_a, &emotion_a);
        assert!((identical - 1.0).abs() < EPSILON);
        // A lone pair has no emotion half, so it scores as its cosine.
        assert!((similarity(&color, &color, Metric::Custom) - 1.0).abs() < EPSILON);
        let cosine = similarity(&color, &[0.3, 0.7], Metric::Cosine);
        assert_eq!(similarity(&color, &[0.3, 0.7], Metric::Custom), cosine);
        assert_eq!(custom_similarity(&[], &[], &emotion_a, &emotion_a), 1.0);
    }

    #[test]
    fn metrics_parse_from_lowercase_names() {
        assert_eq!("pearson".parse::<Metric>().unwrap(), Metric::Pearson);
        assert_eq!(" Manhattan ".parse::<Metric>().unwrap(), Metric::Manhattan);
        assert!("hamming".parse::<Metric>().is_err());
        for metric in Metric::ALL {
            assert_eq!(metric.to_string().parse::<Metric>().unwrap(), metric);
        }
    }
}
