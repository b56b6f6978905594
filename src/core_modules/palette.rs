// THEORY:
// The `Palette` is the single piece of shared state in the entire engine. It is
// loaded once per conversion run from a plain text source and is strictly
// read-only afterwards, which is what lets the frame batch driver hand one
// `Arc<Palette>` to every worker with no locking at all.
//
// Key architectural principles:
// 1.  **Ordered, non-empty**: The palette preserves source order, and lookup
//     ties are broken by the lowest index. This makes every conversion
//     deterministic — the same input and palette always produce the same
//     output, regardless of thread count or chunking.
// 2.  **All-or-nothing loading**: One malformed record fails the whole load.
//     A palette missing colors the author intended would silently recolor the
//     entire output, so partial palettes are never constructed.
// 3.  **Real-valued lookup**: Block averages arrive as fractional triples.
//     Distance is computed in f64 against the integer palette entries, so no
//     rounding happens before the comparison.

use crate::core_modules::error::PaletteError;
use crate::core_modules::pixel::pixel::Pixel;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The fixed, ordered set of colors a conversion is allowed to output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Pixel>,
}

impl Palette {
    /// Parses a palette from a line-oriented reader. Each line holds one color
    /// as three comma-separated base-10 integers, e.g. `34,32,52`.
    pub fn load(reader: impl BufRead) -> Result<Palette, PaletteError> {
        let mut colors = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let record = line.trim();
            if record.is_empty() {
                continue;
            }
            colors.push(Self::parse_record(record, index + 1)?);
        }
        if colors.is_empty() {
            return Err(PaletteError::EmptySource);
        }
        log::debug!("loaded palette with {} colors", colors.len());
        Ok(Palette { colors })
    }

    /// Opens and parses a palette file from disk.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Palette, PaletteError> {
        let file = File::open(path)?;
        Self::load(BufReader::new(file))
    }

    fn parse_record(record: &str, line: usize) -> Result<Pixel, PaletteError> {
        let malformed = || PaletteError::Parse {
            line,
            record: record.to_string(),
        };
        let mut channels = record.split(',');
        let mut next_channel = || -> Result<u8, PaletteError> {
            channels
                .next()
                .ok_or_else(malformed)?
                .parse::<u8>()
                .map_err(|_| malformed())
        };
        let pixel = Pixel::new(next_channel()?, next_channel()?, next_channel()?);
        if channels.next().is_some() {
            return Err(malformed());
        }
        Ok(pixel)
    }

    /// Returns the palette entry with the minimum squared Euclidean distance to
    /// `target`. A single left-to-right scan with a strict `<` comparison, so
    /// on equal distances the lowest-indexed entry always wins.
    pub fn nearest(&self, target: [f64; 3]) -> Pixel {
        let mut closest = self.colors[0];
        let mut minimum_distance = f64::INFINITY;
        for color in &self.colors {
            let distance = squared_distance(color, target);
            if distance < minimum_distance {
                minimum_distance = distance;
                closest = *color;
            }
        }
        closest
    }

    /// Snaps an integer pixel to its nearest palette entry. Used by exact mode
    /// to pre-quantize every pixel before block averaging.
    pub fn snap(&self, pixel: Pixel) -> Pixel {
        self.nearest(pixel.channels_f64())
    }

    pub fn colors(&self) -> &[Pixel] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn squared_distance(color: &Pixel, target: [f64; 3]) -> f64 {
    let dr = color.red as f64 - target[0];
    let dg = color.green as f64 - target[1];
    let db = color.blue as f64 - target[2];
    dr * dr + dg * dg + db * db
}
