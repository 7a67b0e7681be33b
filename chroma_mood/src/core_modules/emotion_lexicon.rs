// THEORY:
// The `EmotionLexicon` is the reference data of the emotion layer: an immutable
// table from canonical color name to `EmotionProfile`. It is data, not logic. The
// mapper never hardcodes an emotion; it only asks the lexicon.
//
// Key principles:
// 1.  **Built Once**: the default table is materialized into a process-wide
//     `OnceLock` on first use and shared read-only after that. Custom lexicons are
//     plain values owned by whoever loaded them.
// 2.  **Ordered Profiles**: each profile keeps its emotions in declaration order.
//     The mapper's tie-breaking for dominant emotions follows that order, so it is
//     part of the data, not an accident of a hash map.
// 3.  **Total Lookup**: names are matched case-insensitively, and anything unknown
//     resolves to the `neutral` fallback instead of failing.
// 4.  **Loadable**: a lexicon can be read from TOML with `[[colors]]` entries, so
//     the artistic choices stay outside the code.

use crate::errors::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

static DEFAULT_LEXICON: OnceLock<EmotionLexicon> = OnceLock::new();

const NEUTRAL_EMOTION: &str = "neutral";
const NEUTRAL_WEIGHT: f64 = 0.5;
const NEUTRAL_INTENSITY: f64 = 0.5;

/// One weighted emotion inside a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionWeight {
    pub name: String,
    pub weight: f64,
}

/// The emotional reading of a single canonical color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionProfile {
    /// Emotions in declaration order, each weighted in [0, 1].
    pub emotions: Vec<EmotionWeight>,
    /// How strongly the color expresses its emotions, in [0, 1].
    pub intensity: f64,
}

impl EmotionProfile {
    fn from_table(emotions: &[(&str, f64)], intensity: f64) -> Self {
        Self {
            emotions: emotions
                .iter()
                .map(|(name, weight)| EmotionWeight {
                    name: name.to_string(),
                    weight: *weight,
                })
                .collect(),
            intensity,
        }
    }

    /// Profile used for names the lexicon does not know.
    pub fn neutral() -> Self {
        Self::from_table(&[(NEUTRAL_EMOTION, NEUTRAL_WEIGHT)], NEUTRAL_INTENSITY)
    }

    pub fn weight_of(&self, emotion: &str) -> Option<f64> {
        self.emotions
            .iter()
            .find(|e| e.name == emotion)
            .map(|e| e.weight)
    }
}

/// On-disk shape of a single lexicon entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub name: String,
    pub intensity: f64,
    #[serde(default)]
    pub emotions: Vec<EmotionWeight>,
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    colors: Vec<LexiconEntry>,
}

/// Immutable color name -> profile table with case-insensitive lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionLexicon {
    /// Lower-cased names in declaration order.
    names: Vec<String>,
    profiles: HashMap<String, EmotionProfile>,
    fallback: EmotionProfile,
}

impl EmotionLexicon {
    /// Builds a lexicon from entries, rejecting out-of-range values and
    /// duplicate names.
    pub fn from_entries(entries: Vec<LexiconEntry>) -> Result<Self> {
        let mut names = Vec::with_capacity(entries.len());
        let mut profiles = HashMap::with_capacity(entries.len());

        for entry in entries {
            let key = entry.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(AnalysisError::Lexicon("color name must not be empty".into()));
            }
            if !in_unit_range(entry.intensity) {
                return Err(AnalysisError::Lexicon(format!(
                    "intensity of '{}' must be within [0, 1], got {}",
                    key, entry.intensity
                )));
            }
            for emotion in &entry.emotions {
                if emotion.name.trim().is_empty() {
                    return Err(AnalysisError::Lexicon(format!(
                        "'{}' has an emotion with an empty name",
                        key
                    )));
                }
                if !in_unit_range(emotion.weight) {
                    return Err(AnalysisError::Lexicon(format!(
                        "weight of '{}' in '{}' must be within [0, 1], got {}",
                        emotion.name, key, emotion.weight
                    )));
                }
            }
            if profiles.contains_key(&key) {
                return Err(AnalysisError::Lexicon(format!(
                    "color '{}' is defined more than once",
                    key
                )));
            }

            profiles.insert(
                key.clone(),
                EmotionProfile {
                    emotions: entry.emotions,
                    intensity: entry.intensity,
                },
            );
            names.push(key);
        }

        Ok(Self {
            names,
            profiles,
            fallback: EmotionProfile::neutral(),
        })
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: LexiconFile =
            toml::from_str(source).map_err(|e| AnalysisError::Lexicon(e.to_string()))?;
        Self::from_entries(file.colors)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Shared instance of the built-in table.
    pub fn builtin() -> &'static EmotionLexicon {
        DEFAULT_LEXICON.get_or_init(default_lexicon)
    }

    /// Profile for `color`, or the neutral fallback.
    pub fn lookup(&self, color: &str) -> &EmotionProfile {
        self.profiles
            .get(&color.to_lowercase())
            .unwrap_or(&self.fallback)
    }

    pub fn contains(&self, color: &str) -> bool {
        self.profiles.contains_key(&color.to_lowercase())
    }

    /// Every (name, profile) pair in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &EmotionProfile)> + '_ {
        self.names
            .iter()
            .filter_map(|name| self.profiles.get(name).map(|p| (name.as_str(), p)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for EmotionLexicon {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

type ProfileRow = (&'static str, &'static [(&'static str, f64)], f64);

const DEFAULT_TABLE: [ProfileRow; 16] = [
    (
        "red",
        &[("joy", 0.8), ("excitement", 0.9), ("passion", 0.7), ("anger", 0.6), ("energy", 0.8)],
        0.9,
    ),
    (
        "crimson",
        &[("passion", 0.8), ("intensity", 0.7), ("love", 0.6), ("power", 0.7)],
        0.8,
    ),
    (
        "blue",
        &[("calm", 0.8), ("trust", 0.7), ("stability", 0.6), ("sadness", 0.5), ("peace", 0.7)],
        0.6,
    ),
    (
        "navy",
        &[("trust", 0.8), ("authority", 0.7), ("stability", 0.8), ("professionalism", 0.7)],
        0.7,
    ),
    (
        "green",
        &[("nature", 0.8), ("growth", 0.7), ("harmony", 0.6), ("balance", 0.7), ("freshness", 0.6)],
        0.6,
    ),
    (
        "emerald",
        &[("luxury", 0.7), ("wealth", 0.6), ("sophistication", 0.7), ("nature", 0.6)],
        0.7,
    ),
    (
        "yellow",
        &[("joy", 0.9), ("optimism", 0.8), ("energy", 0.7), ("creativity", 0.6), ("warmth", 0.7)],
        0.8,
    ),
    (
        "gold",
        &[("luxury", 0.8), ("wealth", 0.7), ("success", 0.6), ("prestige", 0.7)],
        0.8,
    ),
    (
        "purple",
        &[
            ("mystery", 0.7),
            ("creativity", 0.6),
            ("luxury", 0.6),
            ("spirituality", 0.7),
            ("wisdom", 0.6),
        ],
        0.7,
    ),
    (
        "violet",
        &[("creativity", 0.7), ("imagination", 0.6), ("spirituality", 0.6), ("luxury", 0.5)],
        0.6,
    ),
    (
        "orange",
        &[
            ("energy", 0.8),
            ("enthusiasm", 0.7),
            ("warmth", 0.6),
            ("creativity", 0.5),
            ("adventure", 0.6),
        ],
        0.7,
    ),
    (
        "pink",
        &[
            ("love", 0.8),
            ("romance", 0.7),
            ("sweetness", 0.6),
            ("gentleness", 0.7),
            ("innocence", 0.6),
        ],
        0.6,
    ),
    (
        "brown",
        &[
            ("stability", 0.7),
            ("reliability", 0.6),
            ("earthiness", 0.7),
            ("comfort", 0.6),
            ("warmth", 0.5),
        ],
        0.5,
    ),
    (
        "gray",
        &[("neutrality", 0.8), ("sophistication", 0.6), ("professionalism", 0.7), ("calm", 0.5)],
        0.4,
    ),
    (
        "black",
        &[
            ("power", 0.8),
            ("elegance", 0.7),
            ("mystery", 0.6),
            ("sophistication", 0.7),
            ("authority", 0.8),
        ],
        0.9,
    ),
    (
        "white",
        &[
            ("purity", 0.8),
            ("innocence", 0.7),
            ("cleanliness", 0.7),
            ("simplicity", 0.6),
            ("peace", 0.6),
        ],
        0.3,
    ),
];

fn default_lexicon() -> EmotionLexicon {
    let mut names = Vec::with_capacity(DEFAULT_TABLE.len());
    let mut profiles = HashMap::with_capacity(DEFAULT_TABLE.len());
    for (name, emotions, intensity) in DEFAULT_TABLE.iter() {
        names.push(name.to_string());
        profiles.insert(name.to_string(), EmotionProfile::from_table(emotions, *intensity));
    }
    EmotionLexicon {
        names,
        profiles,
        fallback: EmotionProfile::neutral(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_sixteen_colors_in_order() {
        let lexicon = EmotionLexicon::builtin();
        assert_eq!(lexicon.len(), 16);
        let names: Vec<&str> = lexicon.entries().map(|(name, _)| name).collect();
        assert_eq!(names.first(), Some(&"red"));
        assert_eq!(names.last(), Some(&"white"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let lexicon = EmotionLexicon::builtin();
        let red = lexicon.lookup("RED");
        assert_eq!(red.intensity, 0.9);
        assert_eq!(red.weight_of("excitement"), Some(0.9));
        assert_eq!(red.emotions[0].name, "joy");
        assert!(lexicon.contains("Navy"));
    }

    #[test]
    fn unknown_names_fall_back_to_neutral() {
        let profile = EmotionLexicon::builtin().lookup("chartreuse");
        assert_eq!(profile, &EmotionProfile::neutral());
        assert_eq!(profile.weight_of("neutral"), Some(0.5));
        assert_eq!(profile.intensity, 0.5);
    }

    #[test]
    fn loads_from_toml() {
        let source = r#"
            [[colors]]
            name = "Teal"
            intensity = 0.6
            emotions = [
                { name = "calm", weight = 0.7 },
                { name = "clarity", weight = 0.5 },
            ]

            [[colors]]
            name = "rust"
            intensity = 0.4
            emotions = [{ name = "warmth", weight = 0.6 }]
        "#;
        let lexicon = EmotionLexicon::from_toml_str(source).unwrap();
        assert_eq!(lexicon.len(), 2);
        let teal = lexicon.lookup("teal");
        assert_eq!(teal.emotions.len(), 2);
        assert_eq!(teal.emotions[1].name, "clarity");
        assert_eq!(lexicon.lookup("red"), &EmotionProfile::neutral());
    }

    #[test]
    fn rejects_invalid_entries() {
        let out_of_range = r#"
            [[colors]]
            name = "red"
            intensity = 1.5
        "#;
        assert!(matches!(
            EmotionLexicon::from_toml_str(out_of_range),
            Err(AnalysisError::Lexicon(_))
        ));

        let duplicate = r#"
            [[colors]]
            name = "red"
            intensity = 0.5

            [[colors]]
            name = "RED"
            intensity = 0.5
        "#;
        assert!(EmotionLexicon::from_toml_str(duplicate).is_err());

        assert!(EmotionLexicon::from_toml_str("colors = 3").is_err());
    }
}
