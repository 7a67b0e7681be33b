// THEORY:
// A `ColorVector` is the per-image color signature: the ranked dominant colors
// plus three summaries derived from them. It is the input of the emotion layer
// and one of the two vector kinds the similarity graph compares.
//
// Every summary is weighted by the dominant colors' percentages, so a color that
// covers 60% of the sampled pixels moves the average six times as much as one
// covering 10%. `color_distribution` sums percentages per canonical name, which
// means its values always add up to the same total as the dominant percentages.

use crate::core_modules::color_clusterer::DominantColor;
use crate::core_modules::pixel::pixel::Rgb;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorVector {
    /// At most K dominant colors, descending by percentage.
    pub dominant_colors: Vec<DominantColor>,
    /// Percentage-weighted mean of the dominant colors.
    pub average_rgb: Rgb,
    /// Canonical name -> cumulative percentage.
    pub color_distribution: BTreeMap<String, f64>,
    /// Luminance of `average_rgb` scaled to [0, 1].
    pub total_intensity: f64,
}

impl ColorVector {
    pub fn is_empty(&self) -> bool {
        self.dominant_colors.is_empty()
    }

    /// Sum of the dominant percentages.
    pub fn total_weight(&self) -> f64 {
        self.dominant_colors.iter().map(|c| c.percentage).sum()
    }

    /// Numeric form used by the similarity engine: percentages / 100 in rank order.
    pub fn features(&self) -> Vec<f64> {
        self.dominant_colors
            .iter()
            .map(|c| c.percentage / 100.0)
            .collect()
    }

    /// Hex of the top-ranked dominant color.
    pub fn primary_hex(&self) -> Option<&str> {
        self.dominant_colors.first().map(|c| c.hex.as_str())
    }
}

pub fn build_color_vector(dominant_colors: Vec<DominantColor>) -> ColorVector {
    let mut total_weight = 0.0;
    let (mut sum_r, mut sum_g, mut sum_b) = (0.0, 0.0, 0.0);
    let mut color_distribution: BTreeMap<String, f64> = BTreeMap::new();

    for color in &dominant_colors {
        let weight = color.percentage;
        total_weight += weight;
        sum_r += color.rgb.r as f64 * weight;
        sum_g += color.rgb.g as f64 * weight;
        sum_b += color.rgb.b as f64 * weight;
        *color_distribution.entry(color.name.clone()).or_insert(0.0) += weight;
    }

    let average_rgb = if total_weight > 0.0 {
        let mean = |sum: f64| (sum / total_weight).round().clamp(0.0, 255.0) as u8;
        Rgb::new(mean(sum_r), mean(sum_g), mean(sum_b))
    } else {
        Rgb::default()
    };

    ColorVector {
        dominant_colors,
        average_rgb,
        color_distribution,
        total_intensity: average_rgb.luminance() / 255.0,
    }
}
