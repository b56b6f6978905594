// THEORY:
// The `pipeline` module is the top-level API for single-image conversion and the
// home of the engine's configuration. It encapsulates the palette + pixelator
// stack into one entry point: give it a decoded buffer and a config, get back a
// pixelated buffer or the untouched original.
//
// Configuration is an explicit value passed in by the caller. There is no
// process-wide mutable state and no per-call-site constant to edit; everything
// tunable lives in `PipelineConfig`.
//
// The image path has one deliberate softness in its failure policy: if the
// palette cannot be loaded, the caller gets their original buffer back,
// unmodified, together with the error. The engine never destroys or degrades
// the user's input, and single-shot callers decide for themselves whether an
// unconverted image is a failure.

use crate::core_modules::palette::Palette;
use crate::core_modules::pixelator::Pixelator;
use std::path::PathBuf;
use std::sync::Arc;

// Re-export key data structures for the public API.
pub use crate::core_modules::error::{
    ConversionError, FrameAccessError, PaletteError, PixelateError,
};
pub use crate::core_modules::frame::{FrameSequence, FrameSource, PixelBuffer};
pub use crate::core_modules::pixel::pixel::Pixel;

const DEFAULT_BLOCK_SIZE: u32 = 8;
const DEFAULT_CHUNK_SIZE: usize = 100;

/// Configuration for a conversion run, allowing for tunable behavior.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Side length of one pixelart block in source pixels.
    pub block_size: u32,
    /// Path of the text file holding the palette, one `r,g,b` record per line.
    pub palette_source: PathBuf,
    /// Snap every pixel to the palette before block averaging. Slower, and
    /// deliberately produces different (but equally deterministic) output.
    pub exact_mode: bool,
    /// How many frames the batch driver materializes at once (video only).
    /// Bounds peak memory regardless of sequence length.
    pub chunk_size: usize,
    /// Nominal output frame rate (video only). `None` reuses the source rate.
    pub output_frame_rate: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            palette_source: PathBuf::from("palette_16"),
            exact_mode: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            output_frame_rate: None,
        }
    }
}

/// The result of a single-image conversion.
#[derive(Debug)]
pub enum ImageOutcome {
    /// The image was fully pixelated.
    Pixelated(PixelBuffer),
    /// The palette could not be loaded; the original buffer is returned
    /// untouched along with the reason.
    Unmodified {
        image: PixelBuffer,
        error: PaletteError,
    },
}

/// Converts one image. Palette problems hand the input back unmodified;
/// transform problems (zero block size, zero-area buffer) are hard errors.
pub fn convert_image(
    image: PixelBuffer,
    config: &PipelineConfig,
) -> Result<ImageOutcome, PixelateError> {
    log::info!("opening palette {:?}", config.palette_source);
    let palette = match Palette::load_path(&config.palette_source) {
        Ok(palette) => Arc::new(palette),
        Err(error) => {
            log::warn!("palette load failed, image returned without modification: {error}");
            return Ok(ImageOutcome::Unmodified { image, error });
        }
    };
    let pixelated = pixelate_image(image, palette, config)?;
    Ok(ImageOutcome::Pixelated(pixelated))
}

/// Converts one image against an already-loaded palette. This is the path the
/// batch driver shares; `convert_image` is the file-source convenience.
pub fn pixelate_image(
    image: PixelBuffer,
    palette: Arc<Palette>,
    config: &PipelineConfig,
) -> Result<PixelBuffer, PixelateError> {
    let pixelator = Pixelator::new(config.block_size, config.exact_mode, palette)?;
    log::info!(
        "pixelating {}x{} buffer with block size {}",
        image.width(),
        image.height(),
        config.block_size
    );
    pixelator.pixelate(image)
}
