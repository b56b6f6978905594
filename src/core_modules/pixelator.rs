// THEORY:
// The `Pixelator` is the algorithmic heart of the engine. It owns the whole
// transform for one buffer: crop to a block-size multiple, walk the grid of
// non-overlapping square blocks in raster order, average each block's channels,
// snap the average to the nearest palette color, and flood the block with the
// winner. One image conversion is one call; a video conversion is the frame
// batch driver making this call once per frame.
//
// Key architectural principles:
// 1.  **Spatial pooling**: Averaging a block collapses `block_size²` pixels into
//     one representative color before the palette lookup, which is both the
//     visual point of pixelart and the reason the transform is cheap.
// 2.  **Real-valued averaging**: Channel sums are divided in f64 and the
//     fractional triple goes straight into nearest-color matching. Rounding the
//     average first would shift results near palette-distance boundaries.
// 3.  **One algorithm, one flag**: Exact mode snaps each sampled pixel to the
//     palette before it enters the sum. It is a branch inside the same loop,
//     not a second code path, so the two modes cannot drift apart.
// 4.  **Stateless per call**: `pixelate` takes `&self` and touches nothing but
//     the buffer it was given. Frames and blocks share no mutable state, so any
//     number of pixelations may run concurrently over one shared palette.

use crate::core_modules::error::PixelateError;
use crate::core_modules::frame::PixelBuffer;
use crate::core_modules::palette::Palette;
use std::sync::Arc;

/// Applies the block-averaging palette snap to single pixel buffers.
pub struct Pixelator {
    /// Side length of one output "pixel", in source pixels.
    block_size: u32,
    /// When set, every pixel is individually snapped to the palette before the
    /// block average is taken.
    exact_mode: bool,
    /// Shared, read-only after construction.
    palette: Arc<Palette>,
}

impl Pixelator {
    pub fn new(
        block_size: u32,
        exact_mode: bool,
        palette: Arc<Palette>,
    ) -> Result<Self, PixelateError> {
        if block_size == 0 {
            return Err(PixelateError::InvalidBlockSize);
        }
        Ok(Self {
            block_size,
            exact_mode,
            palette,
        })
    }

    /// Pixelates one buffer, consuming it and returning the quantized result at
    /// the cropped dimensions.
    pub fn pixelate(&self, buffer: PixelBuffer) -> Result<PixelBuffer, PixelateError> {
        let (source_width, source_height) = (buffer.width(), buffer.height());
        let mut buffer = buffer.crop_to_multiple(self.block_size);
        if buffer.width() == 0 || buffer.height() == 0 {
            return Err(PixelateError::EmptyBuffer {
                width: source_width,
                height: source_height,
                block_size: self.block_size,
            });
        }

        let grid_width = buffer.width() / self.block_size;
        let grid_height = buffer.height() / self.block_size;
        let block_area = (self.block_size * self.block_size) as f64;

        // Raster order over blocks: top-to-bottom, left-to-right.
        for block_index in 0..grid_width * grid_height {
            let block_y = block_index / grid_width;
            let block_x = block_index % grid_width;
            let start_x = block_x * self.block_size;
            let start_y = block_y * self.block_size;

            let mut sum_red = 0u64;
            let mut sum_green = 0u64;
            let mut sum_blue = 0u64;
            for y in start_y..start_y + self.block_size {
                for x in start_x..start_x + self.block_size {
                    let mut pixel = buffer.pixel(x, y);
                    if self.exact_mode {
                        pixel = self.palette.snap(pixel);
                    }
                    sum_red += pixel.red as u64;
                    sum_green += pixel.green as u64;
                    sum_blue += pixel.blue as u64;
                }
            }

            let average = [
                sum_red as f64 / block_area,
                sum_green as f64 / block_area,
                sum_blue as f64 / block_area,
            ];
            let color = self.palette.nearest(average);

            for y in start_y..start_y + self.block_size {
                for x in start_x..start_x + self.block_size {
                    buffer.set_pixel(x, y, color);
                }
            }
        }

        Ok(buffer)
    }
}
