// THEORY:
// The `ColorClassifier` turns an arbitrary RGB triple into one of a small, fixed
// vocabulary of canonical color names. That name is the key the emotion lexicon
// is indexed by, so this is the bridge between "what the pixels are" and "what
// the colors mean".
//
// The vocabulary is an ordered table of anchors. Classification is nearest
// anchor by Euclidean distance; when two anchors are equally close the one that
// appears first in the table wins, which keeps the function deterministic. The
// function is total: every input gets a name.

use crate::core_modules::pixel::pixel::Rgb;

/// A canonical reference color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAnchor {
    pub name: &'static str,
    pub rgb: Rgb,
}

/// Canonical anchors in tie-breaking order.
pub const CANONICAL_COLORS: [ColorAnchor; 11] = [
    ColorAnchor { name: "red", rgb: Rgb::new(255, 0, 0) },
    ColorAnchor { name: "blue", rgb: Rgb::new(0, 0, 255) },
    ColorAnchor { name: "green", rgb: Rgb::new(0, 255, 0) },
    ColorAnchor { name: "yellow", rgb: Rgb::new(255, 255, 0) },
    ColorAnchor { name: "purple", rgb: Rgb::new(128, 0, 128) },
    ColorAnchor { name: "orange", rgb: Rgb::new(255, 165, 0) },
    ColorAnchor { name: "pink", rgb: Rgb::new(255, 192, 203) },
    ColorAnchor { name: "brown", rgb: Rgb::new(165, 42, 42) },
    ColorAnchor { name: "gray", rgb: Rgb::new(128, 128, 128) },
    ColorAnchor { name: "black", rgb: Rgb::new(0, 0, 0) },
    ColorAnchor { name: "white", rgb: Rgb::new(255, 255, 255) },
];

/// Name of the nearest canonical anchor.
pub fn classify(rgb: &Rgb) -> &'static str {
    let mut closest = &CANONICAL_COLORS[0];
    let mut min_distance = rgb.distance(&closest.rgb);

    for anchor in CANONICAL_COLORS.iter().skip(1) {
        let distance = rgb.distance(&anchor.rgb);
        // Strict comparison: the earlier anchor keeps ties.
        if distance < min_distance {
            min_distance = distance;
            closest = anchor;
        }
    }

    closest.name
}
