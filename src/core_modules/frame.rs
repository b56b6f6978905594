// THEORY:
// The `frame` module holds the data containers that flow through the pipeline:
// a `PixelBuffer` is one decoded image or one video frame, a `FrameSequence` is
// the reassembled output of a video conversion, and `FrameSource` is the seam
// behind which the decode collaborator lives.
//
// Key architectural principles:
// 1.  **Exclusive ownership**: A `PixelBuffer` is owned by whichever stage
//     currently holds it and moves on every pipeline hop. There is no aliasing
//     between stages, which is what makes per-frame parallelism trivially safe.
// 2.  **Flattened storage**: Pixels live in one row-major `Vec`, the same shape
//     the raw decoder output arrives in, so slicing a block out of a frame is
//     plain index arithmetic rather than nested containers.
// 3.  **The core never does I/O**: Frames are produced by a `FrameSource` and
//     consumed by the caller. File formats, codecs, and audio stay on the other
//     side of that trait.

use crate::core_modules::error::FrameAccessError;
use crate::core_modules::pixel::pixel::{Pixel, CHANNELS};
use image::RgbImage;

/// A 2D grid of pixels with explicit dimensions: one image, or one video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelBuffer {
    /// Builds a buffer from already-structured pixels.
    /// Panics if `pixels` does not hold exactly `width * height` entries.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Self {
        if pixels.len() != (width * height) as usize {
            panic!(
                "Cannot build a {}x{} buffer from {} pixels.",
                width,
                height,
                pixels.len()
            );
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Builds a buffer filled with a single color. Mostly useful in tests and
    /// for callers that compose frames programmatically.
    pub fn filled(width: u32, height: u32, color: Pixel) -> Self {
        Self::new(width, height, vec![color; (width * height) as usize])
    }

    /// Builds a buffer from a raw interleaved RGB byte stream, the shape frame
    /// decoders hand over.
    pub fn from_rgb_bytes(width: u32, height: u32, bytes: &[u8]) -> Self {
        let expected = (width * height) as usize * CHANNELS;
        if bytes.len() != expected {
            panic!(
                "Cannot build a {}x{} buffer from {} bytes.",
                width,
                height,
                bytes.len()
            );
        }
        let pixels = bytes.chunks_exact(CHANNELS).map(Pixel::from).collect();
        Self::new(width, height, pixels)
    }

    pub fn from_image(image: &RgbImage) -> Self {
        Self::from_rgb_bytes(image.width(), image.height(), image.as_raw())
    }

    /// Converts the buffer back into an `image::RgbImage` for the encode
    /// collaborator.
    pub fn into_image(self) -> RgbImage {
        let mut bytes = Vec::with_capacity(self.pixels.len() * CHANNELS);
        for pixel in &self.pixels {
            bytes.extend_from_slice(&[pixel.red, pixel.green, pixel.blue]);
        }
        RgbImage::from_raw(self.width, self.height, bytes)
            .expect("pixel count matches dimensions by construction")
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        self.pixels[(y * self.width + x) as usize] = pixel;
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Crops the buffer by truncating trailing columns and rows so both
    /// dimensions become multiples of `block_size`. The discarded margin is
    /// gone for good; nothing is scaled or padded. `block_size` must be
    /// nonzero; the pixelator validates it before this is reached.
    pub fn crop_to_multiple(self, block_size: u32) -> PixelBuffer {
        debug_assert!(block_size > 0, "block_size must be nonzero");
        let cropped_width = self.width - self.width % block_size;
        let cropped_height = self.height - self.height % block_size;
        if cropped_width == self.width && cropped_height == self.height {
            return self;
        }
        let mut pixels = Vec::with_capacity((cropped_width * cropped_height) as usize);
        for y in 0..cropped_height {
            let row_start = (y * self.width) as usize;
            pixels.extend_from_slice(&self.pixels[row_start..row_start + cropped_width as usize]);
        }
        PixelBuffer {
            width: cropped_width,
            height: cropped_height,
            pixels,
        }
    }
}

/// The reassembled output of a video conversion: pixelated frames in order
/// plus the timing metadata the encode collaborator needs.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    pub frames: Vec<PixelBuffer>,
    /// Nominal output rate in frames per second. Reassembly timing only; it
    /// never influences the per-frame transform.
    pub frame_rate: f64,
    /// Optional total duration in seconds, applied post-hoc to compensate for
    /// frame-count rounding against the nominal rate.
    pub target_duration: Option<f64>,
}

impl FrameSequence {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// The decode collaborator: supplies frames by index and knows the source's
/// nominal frame rate. Implementations may block on I/O inside `fetch`; the
/// driver awaits them synchronously and never reads past `frame_count`.
pub trait FrameSource {
    fn frame_count(&self) -> usize;

    fn frame_rate(&self) -> f64;

    fn fetch(&mut self, index: usize) -> Result<PixelBuffer, FrameAccessError>;
}
