// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the analysis engine. It is a
// "dumb" data container for a single RGBA sample plus the handful of single-pixel
// heuristics the color pipeline needs: perceived luminance, opacity, and the
// quantization that folds visually similar colors onto one grid point.
//
// Two shapes live here:
// - `Pixel`: the raw RGBA sample read out of a decoded buffer. Alpha matters only
//   for the transparency filter and is dropped as soon as a sample survives it.
// - `Rgb`: an opaque color triple. This is what clusters, dominant colors and the
//   color classifier speak. It knows how to print itself as hex and how far it is
//   from another color.
//
// Key principles:
// 1) Single-pixel scope: nothing here reads neighbors or other samples.
// 2) Integer channels, f64 math: luminance and distances are computed in f64 so
//    thresholds like [20, 240] compare exactly the way they read.

pub mod pixel {
    use serde::{Deserialize, Serialize};

    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Luminance = f64;
    pub type Distance = f64;

    pub const CHANNELS: usize = 4;

    /// Largest possible distance between two RGB colors: sqrt(3 * 255^2).
    pub const MAX_RGB_DISTANCE: Distance = 441.67;

    /// A single RGBA sample taken from a decoded pixel buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Luminance estimate (Rec. 601 luma) over the 0..255 channels.
        pub fn luminance(&self) -> Luminance {
            self.rgb().luminance()
        }

        /// Drops alpha.
        pub fn rgb(&self) -> Rgb {
            Rgb::new(self.red, self.green, self.blue)
        }
    }

    /// An opaque color triple.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Rgb {
        pub r: Channel,
        pub g: Channel,
        pub b: Channel,
    }

    impl Rgb {
        pub const fn new(r: Channel, g: Channel, b: Channel) -> Self {
            Rgb { r, g, b }
        }

        /// Luminance estimate (Rec. 601 luma): 0.299r + 0.587g + 0.114b.
        pub fn luminance(&self) -> Luminance {
            0.299_f64 * self.r as f64 + 0.587_f64 * self.g as f64 + 0.114_f64 * self.b as f64
        }

        /// Rounds every channel to the nearest multiple of `step`.
        ///
        /// The top of the range can round past 255 (e.g. 255 with a step of 16
        /// rounds to 256); such channels are clamped back to 255.
        pub fn quantize(&self, step: u32) -> Rgb {
            let step = step.max(1);
            let snap = |channel: Channel| -> Channel {
                let snapped = (channel as f64 / step as f64).round() as u32 * step;
                snapped.min(u8::MAX as u32) as Channel
            };
            Rgb::new(snap(self.r), snap(self.g), snap(self.b))
        }

        /// Lowercase `#rrggbb`.
        pub fn hex(&self) -> String {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        }

        /// Euclidean distance in RGB space.
        pub fn distance(&self, other: &Rgb) -> Distance {
            let dr = self.r as f64 - other.r as f64;
            let dg = self.g as f64 - other.g as f64;
            let db = self.b as f64 - other.b as f64;
            (dr * dr + dg * dg + db * db).sqrt()
        }
    }

    /// Similarity of two individual colors in [0, 1]: 1 - distance / max distance.
    pub fn rgb_similarity(a: &Rgb, b: &Rgb) -> f64 {
        (1.0 - a.distance(b) / MAX_RGB_DISTANCE).clamp(0.0, 1.0)
    }

    /// Iterates the complete RGBA pixels of a raw buffer. Trailing bytes that do
    /// not form a whole pixel are ignored.
    pub fn pixels(buffer: &[Byte]) -> impl Iterator<Item = Pixel> + '_ {
        buffer
            .chunks_exact(CHANNELS)
            .map(|bytes| Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3]))
    }

    pub fn pixel_count(buffer: &[Byte]) -> usize {
        buffer.len() / CHANNELS
    }
}
