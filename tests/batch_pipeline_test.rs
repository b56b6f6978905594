use pixelart_engine::core_modules::error::{ConversionError, FrameAccessError};
use pixelart_engine::core_modules::frame::{FrameSource, PixelBuffer};
use pixelart_engine::core_modules::palette::Palette;
use pixelart_engine::core_modules::pixel::pixel::Pixel;
use pixelart_engine::parallel_pipeline::BatchPipeline;
use pixelart_engine::pipeline::PipelineConfig;
use std::io::Cursor;
use std::sync::Arc;

fn test_palette() -> Arc<Palette> {
    let source = "0,0,0\n255,0,0\n0,255,0\n0,0,255\n255,255,255\n";
    Arc::new(Palette::load(Cursor::new(source.to_string())).unwrap())
}

fn test_config(chunk_size: usize) -> PipelineConfig {
    PipelineConfig {
        block_size: 4,
        chunk_size,
        ..PipelineConfig::default()
    }
}

/// Deterministic synthetic frame: every frame index produces different pixel
/// data, so reordering or index mix-ups show up as content mismatches.
fn synthetic_frame(index: usize, width: u32, height: u32) -> PixelBuffer {
    let pixels = (0..width * height)
        .map(|i| {
            let seed = i as usize * 31 + index * 101;
            Pixel::new(seed as u8, (seed / 3) as u8, (seed * 7) as u8)
        })
        .collect();
    PixelBuffer::new(width, height, pixels)
}

/// An in-memory decode collaborator.
struct VecSource {
    frames: Vec<PixelBuffer>,
    frame_rate: f64,
}

impl VecSource {
    fn new(count: usize, width: u32, height: u32) -> Self {
        Self {
            frames: (0..count).map(|i| synthetic_frame(i, width, height)).collect(),
            frame_rate: 24.0,
        }
    }
}

impl FrameSource for VecSource {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn fetch(&mut self, index: usize) -> Result<PixelBuffer, FrameAccessError> {
        Ok(self.frames[index].clone())
    }
}

/// A decode collaborator that fails partway through the sequence.
struct FailingSource {
    inner: VecSource,
    fail_at: usize,
}

impl FrameSource for FailingSource {
    fn frame_count(&self) -> usize {
        self.inner.frame_count()
    }

    fn frame_rate(&self) -> f64 {
        self.inner.frame_rate()
    }

    fn fetch(&mut self, index: usize) -> Result<PixelBuffer, FrameAccessError> {
        if index == self.fail_at {
            return Err(FrameAccessError::message(format!(
                "decoder gave up at frame {index}"
            )));
        }
        self.inner.fetch(index)
    }
}

#[tokio::test]
async fn chunking_does_not_alter_per_frame_results() {
    let total = 10;
    let palette = test_palette();

    let whole = BatchPipeline::with_palette(test_config(total), palette.clone()).unwrap();
    let mut source = VecSource::new(total, 12, 8);
    let reference = whole.process(&mut source, None).await.unwrap();
    assert_eq!(reference.len(), total);

    for chunk_size in [1, 3, 4, 7, 100] {
        let chunked = BatchPipeline::with_palette(test_config(chunk_size), palette.clone()).unwrap();
        let mut source = VecSource::new(total, 12, 8);
        let output = chunked.process(&mut source, None).await.unwrap();
        assert_eq!(output.len(), total, "chunk_size {chunk_size} lost frames");
        for (index, (a, b)) in output.frames.iter().zip(reference.frames.iter()).enumerate() {
            assert_eq!(a, b, "chunk_size {chunk_size} diverged at frame {index}");
        }
    }
}

#[tokio::test]
async fn final_chunk_holds_exactly_the_remainder() {
    // 7 frames in chunks of 3: the last chunk must carry 1 frame, not 3.
    let pipeline = BatchPipeline::with_palette(test_config(3), test_palette()).unwrap();
    let mut source = VecSource::new(7, 8, 8);
    let output = pipeline.process(&mut source, None).await.unwrap();
    assert_eq!(output.len(), 7);
}

#[tokio::test]
async fn every_output_frame_is_fully_quantized() {
    let palette = test_palette();
    let pipeline = BatchPipeline::with_palette(test_config(4), palette.clone()).unwrap();
    let mut source = VecSource::new(6, 8, 8);
    let output = pipeline.process(&mut source, None).await.unwrap();
    for frame in &output.frames {
        for pixel in frame.pixels() {
            assert!(palette.colors().contains(pixel));
        }
    }
}

#[tokio::test]
async fn zero_block_size_is_rejected_at_construction() {
    let config = PipelineConfig {
        block_size: 0,
        ..test_config(4)
    };
    let error = BatchPipeline::with_palette(config, test_palette()).unwrap_err();
    assert!(matches!(error, ConversionError::Config(_)));
}

#[tokio::test]
async fn frame_access_failure_aborts_the_whole_conversion() {
    let pipeline = BatchPipeline::with_palette(test_config(2), test_palette()).unwrap();
    let mut source = FailingSource {
        inner: VecSource::new(10, 8, 8),
        fail_at: 5,
    };
    let error = pipeline.process(&mut source, None).await.unwrap_err();
    assert!(matches!(error, ConversionError::FrameAccess { index: 5, .. }));
}

#[tokio::test]
async fn transform_failure_on_one_frame_aborts_the_whole_conversion() {
    let pipeline = BatchPipeline::with_palette(test_config(2), test_palette()).unwrap();
    let mut source = VecSource::new(8, 8, 8);
    // One mid-sequence frame smaller than the block size crops to zero area
    // inside the pixelator; the whole run must fail with that frame's index.
    source.frames[3] = synthetic_frame(3, 2, 2);
    let error = pipeline.process(&mut source, None).await.unwrap_err();
    assert!(matches!(error, ConversionError::Transform { index: 3, .. }));
}

#[tokio::test]
async fn abort_flag_stops_the_run_at_a_chunk_boundary() {
    let pipeline = BatchPipeline::with_palette(test_config(2), test_palette()).unwrap();
    let handle = pipeline.abort_handle();
    handle.abort();
    let mut source = VecSource::new(10, 8, 8);
    let error = pipeline.process(&mut source, None).await.unwrap_err();
    assert!(matches!(error, ConversionError::Aborted));
}

#[tokio::test]
async fn sequence_metadata_uses_source_rate_unless_overridden() {
    let palette = test_palette();

    let pipeline = BatchPipeline::with_palette(test_config(4), palette.clone()).unwrap();
    let mut source = VecSource::new(3, 8, 8);
    let output = pipeline.process(&mut source, Some(0.125)).await.unwrap();
    assert_eq!(output.frame_rate, 24.0);
    assert_eq!(output.target_duration, Some(0.125));

    let config = PipelineConfig {
        output_frame_rate: Some(60.0),
        ..test_config(4)
    };
    let pipeline = BatchPipeline::with_palette(config, palette).unwrap();
    let mut source = VecSource::new(3, 8, 8);
    let output = pipeline.process(&mut source, None).await.unwrap();
    assert_eq!(output.frame_rate, 60.0);
    assert_eq!(output.target_duration, None);
}

#[tokio::test]
async fn frames_are_cropped_consistently_across_the_sequence() {
    // 10x7 frames with block size 4 come out 8x4, every frame.
    let pipeline = BatchPipeline::with_palette(test_config(5), test_palette()).unwrap();
    let mut source = VecSource::new(4, 10, 7);
    let output = pipeline.process(&mut source, None).await.unwrap();
    for frame in &output.frames {
        assert_eq!((frame.width(), frame.height()), (8, 4));
    }
}
