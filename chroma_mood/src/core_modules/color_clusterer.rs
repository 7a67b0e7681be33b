// THEORY:
// The `ColorClusterer` is the first analytical layer: it turns a decoded RGBA
// buffer into a short, ranked list of dominant colors. It plays the role the
// chunk grid plays for motion analysis, pooling many samples into a few
// meaningful summaries.
//
// Algorithm, one pass per image:
// 1.  **Deterministic Sampling**: visit at most `sample_cap` pixels by walking the
//     buffer with a fixed stride, starting at pixel 0. No randomness, so the same
//     buffer always yields the same colors.
// 2.  **Noise Filtering**: drop transparent samples (alpha < 128) and samples whose
//     luminance sits outside [20, 240]; near-black and near-white carry no color.
// 3.  **Exact Histogram**: count every surviving exact RGB value.
// 4.  **Quantized Grouping**: snap every exact color to the quantization grid and
//     fold exact colors that land on the same grid point into one `ColorCluster`.
//     The cluster center IS the grid point, not the centroid of its members.
// 5.  **Ranking**: sort clusters by total weight and keep the top K.
//
// Percentages are relative to the number of visited pixels, so filtered-out
// samples still count against every color. An image with nothing left after
// filtering yields an empty list, which downstream layers treat as "no usable
// color data" rather than as an error.

use crate::core_modules::color_classifier::classify;
use crate::core_modules::pixel::pixel::{self, Luminance, Pixel, Rgb};
use crate::errors::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MIN_ALPHA: u8 = 128;
const MIN_LUMINANCE: Luminance = 20.0;
const MAX_LUMINANCE: Luminance = 240.0;
const MAX_QUANTIZATION_STEP: u32 = 128;

/// Tunables for one clustering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    /// Grid spacing used to merge visually similar colors.
    pub quantization_step: u32,
    /// Upper bound on the number of pixels visited.
    pub sample_cap: usize,
    /// Number of dominant colors to keep (K).
    pub cluster_count: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            quantization_step: 16,
            sample_cap: 2000,
            cluster_count: 5,
        }
    }
}

impl ClusterOptions {
    pub fn validate(&self) -> Result<()> {
        if self.quantization_step == 0 || self.quantization_step > MAX_QUANTIZATION_STEP {
            return Err(AnalysisError::Config(format!(
                "quantization_step must be within 1..={}, got {}",
                MAX_QUANTIZATION_STEP, self.quantization_step
            )));
        }
        if self.sample_cap == 0 {
            return Err(AnalysisError::Config("sample_cap must be at least 1".into()));
        }
        if self.cluster_count == 0 {
            return Err(AnalysisError::Config("cluster_count must be at least 1".into()));
        }
        Ok(())
    }
}

/// A group of exact colors that share one quantized grid point.
/// Lives only for the duration of a single clustering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCluster {
    /// The quantized grid point every member snapped to.
    pub center: Rgb,
    /// Number of distinct exact colors folded into this cluster.
    pub member_count: usize,
    /// Sum of the sample frequencies of all members.
    pub total_weight: u32,
}

/// One of the top-K colors of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantColor {
    pub rgb: Rgb,
    pub hex: String,
    /// Canonical color name from the classifier.
    pub name: String,
    /// Share of the visited samples, 0-100 with one decimal.
    pub percentage: f64,
    /// Distinct exact colors in the cluster.
    pub cluster_size: usize,
}

/// Stride so that at most `sample_cap` of `pixel_count` pixels are visited.
pub fn sampling_stride(pixel_count: usize, sample_cap: usize) -> usize {
    pixel_count.div_ceil(sample_cap.max(1)).max(1)
}

fn is_noise(sample: &Pixel) -> bool {
    if sample.alpha < MIN_ALPHA {
        return true;
    }
    let luminance = sample.luminance();
    !(MIN_LUMINANCE..=MAX_LUMINANCE).contains(&luminance)
}

/// Exact-color frequencies of the surviving samples, in first-seen order,
/// together with the number of visited pixels.
fn sample_histogram(buffer: &[u8], sample_cap: usize) -> (Vec<(Rgb, u32)>, usize) {
    let stride = sampling_stride(pixel::pixel_count(buffer), sample_cap);
    let mut histogram: Vec<(Rgb, u32)> = Vec::new();
    let mut index_of: HashMap<Rgb, usize> = HashMap::new();
    let mut visited = 0usize;

    for sample in pixel::pixels(buffer).step_by(stride) {
        visited += 1;
        if is_noise(&sample) {
            continue;
        }
        let rgb = sample.rgb();
        match index_of.get(&rgb) {
            Some(&i) => histogram[i].1 += 1,
            None => {
                index_of.insert(rgb, histogram.len());
                histogram.push((rgb, 1));
            }
        }
    }

    (histogram, visited)
}

/// Folds exact colors into quantized clusters, in first-seen order.
pub fn group_clusters(histogram: &[(Rgb, u32)], step: u32) -> Vec<ColorCluster> {
    let mut clusters: Vec<ColorCluster> = Vec::new();
    let mut index_of: HashMap<Rgb, usize> = HashMap::new();

    for (rgb, count) in histogram {
        let center = rgb.quantize(step);
        match index_of.get(&center) {
            Some(&i) => {
                let cluster = &mut clusters[i];
                cluster.member_count += 1;
                cluster.total_weight += count;
            }
            None => {
                index_of.insert(center, clusters.len());
                clusters.push(ColorCluster {
                    center,
                    member_count: 1,
                    total_weight: *count,
                });
            }
        }
    }

    clusters
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Extracts the top-K dominant colors of a raw RGBA buffer.
///
/// The result holds at most `cluster_count` entries sorted by descending
/// percentage, and is empty when no sample survives filtering.
pub fn extract_dominant_colors(buffer: &[u8], options: &ClusterOptions) -> Vec<DominantColor> {
    let (histogram, visited) = sample_histogram(buffer, options.sample_cap);
    if histogram.is_empty() || visited == 0 {
        return Vec::new();
    }

    let mut clusters = group_clusters(&histogram, options.quantization_step);
    // Stable: equal weights keep first-seen order.
    clusters.sort_by(|a, b| b.total_weight.cmp(&a.total_weight));
    clusters.truncate(options.cluster_count);

    clusters
        .into_iter()
        .map(|cluster| DominantColor {
            rgb: cluster.center,
            hex: cluster.center.hex(),
            name: classify(&cluster.center).to_string(),
            percentage: round_to_tenth(cluster.total_weight as f64 / visited as f64 * 100.0),
            cluster_size: cluster.member_count,
        })
        .collect()
}
