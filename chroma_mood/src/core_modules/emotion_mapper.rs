// THEORY:
// The `EmotionMapper` is the interpretive layer. It reads a `ColorVector` through
// an `EmotionLexicon` and produces an `EmotionVector`: how much of each emotion
// the image expresses, the three strongest ones, and a coarse mood category.
//
// Aggregation, per image:
// 1.  Every dominant color contributes its profile, weighted by its raw
//     percentage (not divided by 100).
// 2.  The weighted sums are divided by the total weight, giving a weighted
//     average per emotion.
// 3.  The averages are L1-normalized so the final emotions sum to 1.
// 4.  Intensity is copied from the color vector, not recomputed.
// 5.  The mood is the category whose member emotions carry the most mass.
//
// Accumulation keeps first-seen order (dominant color rank, then profile order),
// which is the order used to break ties among dominant emotions and chart
// entries. `emotion_order` carries it past the name-keyed map. Degenerate input
// yields an empty vector with a `neutral` mood, never an error.

use crate::core_modules::color_vector::ColorVector;
use crate::core_modules::emotion_lexicon::EmotionLexicon;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const DOMINANT_EMOTION_COUNT: usize = 3;

/// Coarse mood categories, in tie-breaking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Calm,
    Sophisticated,
    Natural,
    Mysterious,
    #[default]
    Neutral,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Positive,
        Mood::Calm,
        Mood::Sophisticated,
        Mood::Natural,
        Mood::Mysterious,
        Mood::Neutral,
    ];

    /// Emotion names that count toward this mood.
    pub fn emotions(&self) -> &'static [&'static str] {
        match self {
            Mood::Positive => &[
                "joy",
                "excitement",
                "optimism",
                "energy",
                "love",
                "warmth",
                "creativity",
            ],
            Mood::Calm => &["calm", "peace", "trust", "stability", "harmony", "balance"],
            Mood::Sophisticated => &[
                "luxury",
                "sophistication",
                "authority",
                "professionalism",
                "elegance",
            ],
            Mood::Natural => &["nature", "growth", "freshness", "earthiness"],
            Mood::Mysterious => &["mystery", "spirituality", "wisdom", "imagination"],
            Mood::Neutral => &["neutrality", "simplicity", "cleanliness"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Calm => "calm",
            Mood::Sophisticated => "sophisticated",
            Mood::Natural => "natural",
            Mood::Mysterious => "mysterious",
            Mood::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub name: String,
    /// Rounded to two decimals.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionVector {
    /// Emotion name -> share; sums to 1 unless empty.
    pub emotions: BTreeMap<String, f64>,
    /// Names of `emotions` in accumulation order.
    #[serde(default)]
    pub emotion_order: Vec<String>,
    pub overall_mood: Mood,
    pub intensity: f64,
    /// At most three entries, descending by value.
    pub dominant_emotions: Vec<EmotionScore>,
}

impl EmotionVector {
    pub fn is_empty(&self) -> bool {
        self.emotions.is_empty()
    }

    pub fn value_of(&self, emotion: &str) -> f64 {
        self.emotions.get(emotion).copied().unwrap_or(0.0)
    }

    /// Emotions in accumulation order. Names missing from `emotion_order`
    /// follow in name order.
    pub fn ordered_emotions(&self) -> Vec<(&str, f64)> {
        let mut ordered: Vec<(&str, f64)> = self
            .emotion_order
            .iter()
            .filter_map(|name| self.emotions.get_key_value(name))
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        for (name, value) in &self.emotions {
            if !self.emotion_order.contains(name) {
                ordered.push((name.as_str(), *value));
            }
        }
        ordered
    }

    /// Values over `names`, with 0 for emotions this vector lacks.
    pub fn features_over<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<f64> {
        names.into_iter().map(|name| self.value_of(name)).collect()
    }
}

/// Feature forms of two emotion vectors over the sorted union of their emotion
/// names, so each coordinate means the same emotion in both.
pub fn aligned_emotion_features(a: &EmotionVector, b: &EmotionVector) -> (Vec<f64>, Vec<f64>) {
    let names: BTreeSet<&str> = a
        .emotions
        .keys()
        .chain(b.emotions.keys())
        .map(String::as_str)
        .collect();
    (
        a.features_over(names.iter().copied()),
        b.features_over(names.iter().copied()),
    )
}

/// Category with the largest summed share. Ties keep the earlier category;
/// all-zero scores give `Neutral`.
pub fn determine_mood(emotions: &BTreeMap<String, f64>) -> Mood {
    let mut mood = Mood::Neutral;
    let mut best = 0.0;
    for candidate in Mood::ALL {
        let score: f64 = candidate
            .emotions()
            .iter()
            .filter_map(|name| emotions.get(*name))
            .sum();
        if score > best {
            best = score;
            mood = candidate;
        }
    }
    mood
}

fn round_to_hundredth(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn build_emotion_vector(color_vector: &ColorVector, lexicon: &EmotionLexicon) -> EmotionVector {
    // Ordered accumulation: (emotion, weighted sum) in first-seen order.
    let mut accumulated: Vec<(String, f64)> = Vec::new();
    let mut total_weight = 0.0;

    for color in &color_vector.dominant_colors {
        let weight = color.percentage;
        let profile = lexicon.lookup(&color.name);
        for emotion in &profile.emotions {
            match accumulated.iter_mut().find(|(name, _)| *name == emotion.name) {
                Some((_, sum)) => *sum += emotion.weight * weight,
                None => accumulated.push((emotion.name.clone(), emotion.weight * weight)),
            }
        }
        total_weight += weight;
    }

    let mut vector = EmotionVector {
        intensity: color_vector.total_intensity,
        ..EmotionVector::default()
    };
    if total_weight <= 0.0 {
        return vector;
    }

    for (_, sum) in accumulated.iter_mut() {
        *sum /= total_weight;
    }
    let mass: f64 = accumulated.iter().map(|(_, value)| value).sum();
    if mass <= 0.0 || !mass.is_finite() {
        return vector;
    }
    for (_, value) in accumulated.iter_mut() {
        *value /= mass;
    }

    let mut ranked = accumulated.clone();
    // Stable: ties keep accumulation order.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    vector.dominant_emotions = ranked
        .into_iter()
        .take(DOMINANT_EMOTION_COUNT)
        .map(|(name, value)| EmotionScore {
            name,
            value: round_to_hundredth(value),
        })
        .collect();

    vector.emotion_order = accumulated.iter().map(|(name, _)| name.clone()).collect();
    vector.emotions = accumulated.into_iter().collect();
    vector.overall_mood = determine_mood(&vector.emotions);
    vector
}
